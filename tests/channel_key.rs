//! Channel key protection (`+k`): the wrong key is rejected with
//! ERR_BADCHANNELKEY and the connection stays open; the right key joins
//! normally (spec.md §4.4, §8).

mod common;

use common::TestClient;

#[tokio::test]
async fn wrong_key_is_rejected_right_key_joins() {
    let addr = common::spawn_server().await;
    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;

    alice.send_raw("JOIN #secret").await;
    alice.recv_until("366").await;
    alice.send_raw("MODE #secret +k hunter2").await;
    // alice, as the channel operator, sees the mode change echoed.
    let mode_echo = alice.recv_until("MODE").await;
    assert_eq!(mode_echo.args[1], "+k");

    bob.send_raw("JOIN #secret wrongkey").await;
    let err = bob.recv().await;
    assert_eq!(err.command, "475");

    bob.send_raw("JOIN #secret hunter2").await;
    let join = bob.recv().await;
    assert_eq!(join.command, "JOIN");
    assert_eq!(join.args[0], "#secret");
}
