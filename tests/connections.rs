mod common;

use pinchat::{connections, ChatError};

use common::{seed_profile, test_pool};

#[tokio::test]
async fn adding_a_pin_creates_one_directed_edge() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    let b = seed_profile(&db_pool, "222222", "Bob").await;

    let edge = connections::add_connection(&db_pool, a.id, "222222").await.unwrap();
    assert_eq!(edge.user_id, a.id);
    assert_eq!(edge.connected_user_id, b.id);

    let a_contacts = connections::list_contacts(&db_pool, a.id).await.unwrap();
    let ids: Vec<_> = a_contacts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![b.id]);
    assert_eq!(a_contacts[0].pin, "222222");

    // B can see the edge but has no contact entry for A.
    let b_contacts = connections::list_contacts(&db_pool, b.id).await.unwrap();
    assert!(b_contacts.is_empty());
    let b_edges = connections::list_connections(&db_pool, b.id).await.unwrap();
    assert_eq!(b_edges.len(), 1);
    assert_eq!(b_edges[0].id, edge.id);
}

#[tokio::test]
async fn adding_the_same_pin_twice_is_a_duplicate() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    seed_profile(&db_pool, "222222", "Bob").await;

    connections::add_connection(&db_pool, a.id, "222222").await.unwrap();
    let err = connections::add_connection(&db_pool, a.id, "222222").await.unwrap_err();
    assert!(matches!(err, ChatError::DuplicateConnection), "got {err:?}");

    assert_eq!(connections::list_connections(&db_pool, a.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn own_pin_is_rejected() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;

    let err = connections::add_connection(&db_pool, a.id, "111111").await.unwrap_err();
    assert!(matches!(err, ChatError::SelfReference), "got {err:?}");
}

#[tokio::test]
async fn unknown_pin_is_not_found() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;

    let err = connections::add_connection(&db_pool, a.id, "999999").await.unwrap_err();
    assert!(matches!(err, ChatError::ContactNotFound { ref pin } if pin == "999999"), "got {err:?}");
}

#[tokio::test]
async fn malformed_pin_is_a_validation_error() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;

    let err = connections::add_connection(&db_pool, a.id, "12ab56").await.unwrap_err();
    assert!(matches!(err, ChatError::Validation { field: "pin", .. }), "got {err:?}");
}

#[tokio::test]
async fn reciprocal_add_creates_a_second_edge() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    let b = seed_profile(&db_pool, "222222", "Bob").await;

    connections::add_connection(&db_pool, a.id, "222222").await.unwrap();
    connections::add_connection(&db_pool, b.id, "111111").await.unwrap();

    let b_contacts = connections::list_contacts(&db_pool, b.id).await.unwrap();
    assert_eq!(b_contacts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id]);
    assert_eq!(connections::list_connections(&db_pool, a.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn edges_can_only_be_inserted_by_their_owner() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    let b = seed_profile(&db_pool, "222222", "Bob").await;
    let c = seed_profile(&db_pool, "333333", "Cy").await;

    let err = connections::insert_connection(&db_pool, c.id, a.id, b.id).await.unwrap_err();
    assert!(matches!(err, ChatError::Forbidden(_)), "got {err:?}");

    let err = connections::insert_connection(&db_pool, a.id, a.id, a.id).await.unwrap_err();
    assert!(matches!(err, ChatError::SelfReference), "got {err:?}");
}

#[tokio::test]
async fn unrelated_profiles_see_no_edges() {
    let db_pool = test_pool().await;
    let a = seed_profile(&db_pool, "111111", "Ada").await;
    seed_profile(&db_pool, "222222", "Bob").await;
    let c = seed_profile(&db_pool, "333333", "Cy").await;

    connections::add_connection(&db_pool, a.id, "222222").await.unwrap();
    assert!(connections::list_connections(&db_pool, c.id).await.unwrap().is_empty());
}
