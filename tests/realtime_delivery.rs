mod common;

use std::time::Duration;

use futures_util::StreamExt;
use pinchat::{chats, db::Message, realtime::{Event, Notifier, Subscription}};
use tokio::time::timeout;

use common::{seed_profile, test_pool};

async fn next_within(sub: &mut Subscription, millis: u64) -> Option<Message> {
    match timeout(Duration::from_millis(millis), sub.next()).await.ok().flatten() {
        Some(Event::Message(msg)) => Some(msg),
        Some(other) => panic!("unexpected event {other:?}"),
        None => None,
    }
}

#[tokio::test]
async fn subscriber_gets_both_directions_once() {
    let db_pool = test_pool().await;
    let notifier = Notifier::new(16);
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    let b = seed_profile(&db_pool, "222222", "Bob").await;
    let c = seed_profile(&db_pool, "333333", "Cy").await;
    let d = seed_profile(&db_pool, "444444", "Di").await;

    let mut sub = notifier.subscribe(a.id);

    let outgoing = chats::send_message(&db_pool, &notifier, a.id, b.id, "hi bob").await.unwrap();
    let unrelated = chats::send_message(&db_pool, &notifier, c.id, d.id, "hi di").await.unwrap();
    let incoming = chats::send_message(&db_pool, &notifier, b.id, a.id, "hi ada").await.unwrap();

    assert_eq!(next_within(&mut sub, 200).await.map(|m| m.id), Some(outgoing.id));
    assert_eq!(next_within(&mut sub, 200).await.map(|m| m.id), Some(incoming.id));
    assert_eq!(next_within(&mut sub, 50).await, None);

    let mut d_sub = notifier.subscribe(d.id);
    chats::send_message(&db_pool, &notifier, a.id, b.id, "still not for di").await.unwrap();
    assert_eq!(next_within(&mut d_sub, 50).await, None);
    assert_ne!(unrelated.id, outgoing.id);
}

#[tokio::test]
async fn pushed_messages_extend_the_fetched_conversation() {
    let db_pool = test_pool().await;
    let notifier = Notifier::new(16);
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    let b = seed_profile(&db_pool, "222222", "Bob").await;

    chats::send_message(&db_pool, &notifier, a.id, b.id, "one").await.unwrap();
    let mut view = chats::fetch_conversation(&db_pool, b.id, b.id, a.id).await.unwrap();

    let mut sub = notifier.subscribe(b.id);
    chats::send_message(&db_pool, &notifier, a.id, b.id, "two").await.unwrap();
    chats::send_message(&db_pool, &notifier, b.id, a.id, "three").await.unwrap();
    for _ in 0..2 {
        view.push(next_within(&mut sub, 200).await.unwrap());
    }

    let refetched = chats::fetch_conversation(&db_pool, b.id, b.id, a.id).await.unwrap();
    assert_eq!(
        view.iter().map(|m| m.id).collect::<Vec<_>>(),
        refetched.iter().map(|m| m.id).collect::<Vec<_>>(),
    );
}

#[tokio::test]
async fn unsubscribing_twice_is_harmless() {
    let db_pool = test_pool().await;
    let notifier = Notifier::new(16);
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    let b = seed_profile(&db_pool, "222222", "Bob").await;

    let mut sub = notifier.subscribe(a.id);
    assert_eq!(notifier.active_subscriptions(), 1);

    sub.unsubscribe();
    sub.unsubscribe();
    assert_eq!(notifier.active_subscriptions(), 0);

    chats::send_message(&db_pool, &notifier, b.id, a.id, "gone").await.unwrap();
    assert_eq!(sub.next().await, None);
}
