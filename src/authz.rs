//! Row-level access rules, checked before every read and write.
//!
//! | table       | read                     | write                        |
//! |-------------|--------------------------|------------------------------|
//! | profiles    | any signed-in caller     | the profile's own identity   |
//! | connections | `user_id` or target      | insert by `user_id` only     |
//! | chats       | sender or receiver       | insert by sender; `read` by receiver |

use uuid::Uuid;

use crate::{
    db::{Connection, Message},
    ChatError,
};

pub fn ensure_profile_owner(caller: Uuid, profile_id: Uuid) -> Result<(), ChatError> {
    if caller != profile_id {
        return Err(ChatError::forbidden("profiles can only be edited by their owner"));
    }
    Ok(())
}

pub fn can_read_connection(caller: Uuid, connection: &Connection) -> bool {
    caller == connection.user_id || caller == connection.connected_user_id
}

pub fn ensure_connection_insert(caller: Uuid, user_id: Uuid) -> Result<(), ChatError> {
    if caller != user_id {
        return Err(ChatError::forbidden("connections can only be added by their owner"));
    }
    Ok(())
}

pub fn can_read_chat(caller: Uuid, msg: &Message) -> bool {
    msg.involves(caller)
}

/// A conversation is the set of chats between two identities, so only one of
/// them may ask for it.
pub fn ensure_conversation_party(caller: Uuid, user_a: Uuid, user_b: Uuid) -> Result<(), ChatError> {
    if caller != user_a && caller != user_b {
        return Err(ChatError::forbidden("conversations are visible to their participants only"));
    }
    Ok(())
}

pub fn ensure_chat_insert(caller: Uuid, sender_id: Uuid) -> Result<(), ChatError> {
    if caller != sender_id {
        return Err(ChatError::forbidden("messages can only be sent as yourself"));
    }
    Ok(())
}

pub fn ensure_chat_receiver(caller: Uuid, msg: &Message) -> Result<(), ChatError> {
    if caller != msg.receiver_id {
        return Err(ChatError::forbidden("only the receiver can mark a message read"));
    }
    Ok(())
}
