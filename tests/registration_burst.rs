//! End-to-end registration: NICK/USER produces the full welcome burst
//! in order, ending in RPL_ENDOFMOTD (spec.md §4.1, §8).

mod common;

use common::TestClient;

#[tokio::test]
async fn nick_user_produces_welcome_burst() {
    let addr = common::spawn_server().await;
    let mut client = TestClient::connect(addr).await;

    client.send_raw("NICK alice").await;
    client.send_raw("USER alice 0 * :Alice Example").await;

    let expected = ["001", "002", "003", "004", "005", "251", "252", "254", "255", "375", "372", "376"];
    for code in expected {
        let msg = client.recv().await;
        assert_eq!(msg.command, code, "expected {code}, got {:?}", msg);
    }
}

#[tokio::test]
async fn registration_is_deferred_until_cap_negotiation_ends() {
    let addr = common::spawn_server().await;
    let mut client = TestClient::connect(addr).await;

    client.send_raw("CAP LS 302").await;
    let msg = client.recv().await;
    assert_eq!(msg.command, "CAP");

    client.send_raw("NICK bob").await;
    client.send_raw("USER bob 0 * :Bob Example").await;
    // NICK+USER are both set, but CAP negotiation is still open: the
    // welcome burst must not start yet.
    client.send_raw("CAP REQ :message-tags").await;
    let msg = client.recv().await;
    assert_eq!(msg.command, "CAP");

    client.send_raw("CAP END").await;
    let msg = client.recv().await;
    assert_eq!(msg.command, "001");
}
