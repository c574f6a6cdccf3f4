//! TAGMSG is delivered only to channel members who negotiated
//! `message-tags`; a recipient without it receives nothing at all, not a
//! degraded form (spec.md §4.7, §8).

mod common;

use std::time::Duration;

use common::TestClient;

#[tokio::test]
async fn tagmsg_is_withheld_from_clients_without_message_tags() {
    let addr = common::spawn_server().await;
    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::connect(addr).await;

    // bob negotiates message-tags before registering.
    bob.send_raw("CAP LS 302").await;
    bob.recv_until("CAP").await;
    bob.send_raw("CAP REQ :message-tags").await;
    let ack = bob.recv_until("CAP").await;
    assert_eq!(ack.args[1], "ACK");
    bob.send_raw("CAP END").await;
    bob.send_raw("NICK bob").await;
    bob.send_raw("USER bob 0 * :Bob Example").await;
    bob.recv_until("376").await;

    let mut carol = TestClient::connect(addr).await;
    // carol never requests message-tags.
    carol.send_raw("NICK carol").await;
    carol.send_raw("USER carol 0 * :Carol Example").await;
    carol.recv_until("376").await;

    alice.send_raw("JOIN #chat").await;
    alice.recv_until("366").await;
    bob.send_raw("JOIN #chat").await;
    bob.recv_until("366").await;
    alice.recv_until("JOIN").await; // alice sees bob's join
    carol.send_raw("JOIN #chat").await;
    carol.recv_until("366").await;
    alice.recv_until("JOIN").await; // alice sees carol's join
    bob.recv_until("JOIN").await; // bob sees carol's join

    alice.send_raw("@+example.com/foo=bar TAGMSG #chat").await;

    let seen_by_bob = bob.recv_until("TAGMSG").await;
    assert_eq!(seen_by_bob.tag_value("+example.com/foo"), Some("bar"));

    // carol negotiated no capabilities at all: nothing arrives for her.
    assert!(
        carol.try_recv(Duration::from_millis(200)).await.is_none(),
        "TAGMSG must not be delivered to a client without message-tags"
    );
}
