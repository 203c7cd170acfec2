use crate::directory::{Contact, ContactDirectory, OutgoingRequest, PendingContact};
use crate::store::{shared, MemoryStore};
use crate::token::Token;

fn directory() -> ContactDirectory {
    ContactDirectory::new(shared(MemoryStore::new()))
}

fn contact(their: &str, username: &str, address: &str) -> Contact {
    Contact {
        category: "individual".to_string(),
        my_token: Token::mint(),
        their_token: Token::new(their.to_string()),
        username: username.to_string(),
        address: address.to_string(),
        added_at_ms: 1,
    }
}

#[tokio::test]
async fn contact_round_trip_and_listing() {
    let directory = directory();
    directory
        .add_contact(&contact("t1", "bob", "zs1b"))
        .await
        .expect("add");
    directory
        .add_contact(&contact("t2", "alice", "zs1a"))
        .await
        .expect("add");
    let listed = directory.contacts().await;
    assert_eq!(listed.len(), 2);
    // Sorted by username for stable display.
    assert_eq!(listed[0].username, "alice");
    let by_token = directory
        .contact_by_token(&Token::new("t1"))
        .await
        .expect("lookup");
    assert_eq!(by_token.username, "bob");
    let by_address = directory.contact_by_address("zs1a").await.expect("lookup");
    assert_eq!(by_address.their_token, Token::new("t2"));
}

#[tokio::test]
async fn their_token_is_the_unique_key() {
    let directory = directory();
    directory
        .add_contact(&contact("t1", "bob", "zs1b"))
        .await
        .expect("add");
    directory
        .add_contact(&contact("t1", "bobby", "zs1b"))
        .await
        .expect("overwrite");
    let listed = directory.contacts().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].username, "bobby");
}

#[tokio::test]
async fn update_username_touches_only_the_name() {
    let directory = directory();
    let original = contact("t1", "bob", "zs1b");
    directory.add_contact(&original).await.expect("add");
    directory
        .update_username(&Token::new("t1"), "robert")
        .await
        .expect("update");
    let updated = directory
        .contact_by_token(&Token::new("t1"))
        .await
        .expect("lookup");
    assert_eq!(updated.username, "robert");
    assert_eq!(updated.my_token, original.my_token);
    assert_eq!(updated.address, original.address);
}

#[tokio::test]
async fn delete_contact_removes_record_and_index_entry() {
    let directory = directory();
    directory
        .add_contact(&contact("t1", "bob", "zs1b"))
        .await
        .expect("add");
    directory
        .delete_contact(&Token::new("t1"))
        .await
        .expect("delete");
    assert!(directory.contact_by_token(&Token::new("t1")).await.is_none());
    assert!(directory.contacts().await.is_empty());
}

#[tokio::test]
async fn pending_crud() {
    let directory = directory();
    let pending = PendingContact {
        category: "individual".to_string(),
        their_token: Token::new("p1"),
        username: "mallory".to_string(),
        address: "zs1m".to_string(),
    };
    directory.add_pending(&pending).await.expect("add");
    assert_eq!(directory.pending().await.len(), 1);
    assert!(directory.pending_by_address("zs1m").await.is_some());
    directory
        .delete_pending(&Token::new("p1"))
        .await
        .expect("delete");
    assert!(directory.pending().await.is_empty());
}

#[tokio::test]
async fn outgoing_request_crud() {
    let directory = directory();
    let request = OutgoingRequest {
        my_token: Token::mint(),
        peer_address: "zs1peer".to_string(),
    };
    directory.add_request(&request).await.expect("add");
    let found = directory
        .request_by_address("zs1peer")
        .await
        .expect("lookup");
    assert_eq!(found.my_token, request.my_token);
    directory.delete_request("zs1peer").await.expect("delete");
    assert!(directory.request_by_address("zs1peer").await.is_none());
    assert!(directory.requests().await.is_empty());
}

#[tokio::test]
async fn ban_list_is_a_set() {
    let directory = directory();
    directory.ban("zs1spam").await.expect("ban");
    directory.ban("zs1spam").await.expect("ban again");
    assert!(directory.is_banned("zs1spam").await);
    assert!(!directory.is_banned("zs1ok").await);
    assert_eq!(directory.banned().await, vec!["zs1spam".to_string()]);
}
