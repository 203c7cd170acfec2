use memochat_core::config::EngineConfig;
use memochat_core::rpc::InMemoryWallet;
use memochat_core::store::{shared, MemoryStore};
use memochat_core::MessagingEngine;
use std::sync::Arc;

fn demo_config() -> EngineConfig {
    EngineConfig {
        result_poll_interval_ms: 10,
        ..EngineConfig::default()
    }
}

fn engine(wallet: &InMemoryWallet) -> MessagingEngine {
    MessagingEngine::new(
        demo_config(),
        shared(MemoryStore::new()),
        Arc::new(wallet.clone()),
    )
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("demo");
    match command {
        "init" => {
            let username = args.get(2).map(|s| s.as_str()).unwrap_or("demo-user");
            let wallet = InMemoryWallet::new();
            let core = engine(&wallet);
            match core.create_identity(username).await {
                Ok(identity) => {
                    println!("initialized {} at {}", identity.username, identity.address)
                }
                Err(err) => eprintln!("error: {err}"),
            }
        }
        "demo" => run_demo().await,
        _ => {
            eprintln!("usage: memochat-cli [init <username> | demo]");
        }
    }
}

/// Walk two wallets through the whole protocol on one shared in-memory
/// node: handshake, chat both ways, a gift, and the unread flow.
async fn run_demo() {
    let wallet = InMemoryWallet::new();
    let alice = engine(&wallet);
    let bob = engine(&wallet);
    let alice_id = alice.create_identity("alice").await.expect("alice identity");
    let bob_id = bob.create_identity("bob").await.expect("bob identity");
    println!("alice is {}", alice_id.address);
    println!("bob is {}", bob_id.address);

    let requested = alice
        .send_contact_request(&bob_id.address)
        .await
        .expect("request");
    println!("alice requested bob under token {requested}");

    bob.poll_once().await.expect("bob poll");
    let pending = bob.pending_contacts().await;
    println!("bob sees pending request from {}", pending[0].username);
    bob.confirm_contact(&pending[0].their_token)
        .await
        .expect("confirm");
    alice.poll_once().await.expect("alice poll");

    let alice_contact = alice.contacts().await.remove(0);
    let bob_contact = bob.contacts().await.remove(0);
    println!("handshake complete: alice<->{}", alice_contact.username);

    alice
        .send_message(&alice_contact.their_token, "hey bob!")
        .await
        .expect("send");
    alice
        .send_message_with_gift(&alice_contact.their_token, "get yourself a coffee", 50_000)
        .await
        .expect("send gift");
    bob.poll_once().await.expect("bob poll");

    let conversation = bob
        .open_conversation(&bob_contact.their_token)
        .await
        .expect("open");
    for message in &conversation.unread {
        match message.gift_amount(bob.config().dust) {
            Some(gift) => println!("[unread] {}: {} (+{gift} gift)", message.author, message.text),
            None => println!("[unread] {}: {}", message.author, message.text),
        }
    }

    bob.send_message(&bob_contact.their_token, "thanks alice")
        .await
        .expect("reply");
    alice.poll_once().await.expect("alice poll");
    let conversation = alice
        .open_conversation(&alice_contact.their_token)
        .await
        .expect("open");
    for message in conversation.read.iter().rev() {
        println!("[alice view] {}: {}", message.author, message.text);
    }
    for message in &conversation.unread {
        println!("[alice view, unread] {}: {}", message.author, message.text);
    }
}
