//! Property-based tests for the channel/nickname membership invariants
//! (spec.md §8): membership symmetry, the owner always remaining an
//! operator, ban/exception precedence, and join/set_mode idempotence.
//!
//! These exercise `ircd::state::{Channel, Nickname}` directly, paired the
//! same way `ircd::core::Irc::join_channel`/`part_channel`/`kick` pair
//! them (each channel-side mutation is followed by the matching
//! `Nickname::joined_channel`/`parted_channel` call) — no network or
//! processor task is needed for these invariants.

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use ircd::state::channel::Channel;
use ircd::state::nickname::Nickname;

const CHANNEL: &str = "#test";

#[derive(Debug, Clone)]
enum Action {
    Join(String),
    Part(String),
    Kick(String),
}

fn nick_pool() -> Vec<&'static str> {
    vec!["alice", "bob", "carol", "dave"]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    let nick = prop::sample::select(nick_pool()).prop_map(str::to_owned);
    prop_oneof![
        nick.clone().prop_map(Action::Join),
        nick.clone().prop_map(Action::Part),
        nick.prop_map(Action::Kick),
    ]
}

/// Apply `action` to `channel`/`nicknames` exactly the way
/// `Irc::join_channel`/`part_channel`/`kick` do: a channel-side mutation
/// paired with the matching `Nickname` membership update.
fn apply(channel: &mut Channel, nicknames: &mut HashMap<String, Nickname>, action: &Action) {
    match action {
        Action::Join(nick) => {
            channel.join(nick, None);
            nicknames.entry(nick.clone()).or_insert_with(|| Nickname::new(nick.clone())).joined_channel(CHANNEL);
        }
        Action::Part(nick) => {
            channel.part(nick);
            if let Some(n) = nicknames.get_mut(nick) {
                n.parted_channel(CHANNEL);
            }
        }
        Action::Kick(nick) => {
            channel.kick(nick);
            if let Some(n) = nicknames.get_mut(nick) {
                n.parted_channel(CHANNEL);
            }
        }
    }
}

fn assert_membership_symmetric(channel: &Channel, nicknames: &HashMap<String, Nickname>) {
    for (nick, record) in nicknames {
        let in_members = channel.is_member(nick);
        let in_channels = record.channels.contains(CHANNEL);
        assert_eq!(
            in_members, in_channels,
            "membership symmetry broken for {nick}: members={in_members} channels={in_channels}"
        );
    }
}

proptest! {
    /// For any interleaving of JOIN/PART/KICK, `N ∈ C.members ⇔ C ∈
    /// N.channels` holds after every step, not just at the end.
    #[test]
    fn membership_stays_symmetric(actions in prop::collection::vec(action_strategy(), 0..30)) {
        let mut channel = Channel::new(CHANNEL, "owner");
        let mut nicknames = HashMap::new();
        nicknames.insert("owner".to_owned(), {
            let mut n = Nickname::new("owner");
            n.joined_channel(CHANNEL);
            n
        });

        assert_membership_symmetric(&channel, &nicknames);
        for action in &actions {
            apply(&mut channel, &mut nicknames, action);
            assert_membership_symmetric(&channel, &nicknames);
        }
    }

    /// The owner is always a member and an operator, for any sequence of
    /// JOIN/PART/KICK targeting other nicknames (the owner itself is
    /// never removed in this generator, mirroring that nothing in the
    /// handler layer parts or kicks the owner without also tearing down
    /// the channel).
    #[test]
    fn owner_always_member_and_operator(
        actions in prop::collection::vec(action_strategy(), 0..30)
    ) {
        let mut channel = Channel::new(CHANNEL, "owner");
        let mut nicknames = HashMap::new();
        for action in &actions {
            // Never target the owner: this invariant is about everyone
            // else churning around a stable owner.
            let targets_owner = matches!(action, Action::Join(n) | Action::Part(n) | Action::Kick(n) if n == "owner");
            if targets_owner {
                continue;
            }
            apply(&mut channel, &mut nicknames, action);
            prop_assert!(channel.is_member("owner"));
            prop_assert!(channel.is_operator("owner"));
        }
    }

    /// `is_banned(identity) ⇔ some ban mask matches ∧ no exception
    /// matches`, for any sequence of `+b`/`+e` grants against a fixed
    /// identity.
    #[test]
    fn ban_exception_precedence(
        ban_hosts in prop::collection::vec("[a-z]{3,8}", 0..4),
        exception_hosts in prop::collection::vec("[a-z]{3,8}", 0..4),
        target_host in "[a-z]{3,8}"
    ) {
        let mut channel = Channel::new(CHANNEL, "owner");
        for host in &ban_hosts {
            channel.set_mode("b", Some(&format!("*!*@{host}"))).unwrap();
        }
        for host in &exception_hosts {
            channel.set_mode("e", Some(&format!("*!*@{host}"))).unwrap();
        }

        let identity = format!("victim!victim@{target_host}");
        let banned_by_mask = ban_hosts.iter().any(|h| h == &target_host);
        let excepted_by_mask = exception_hosts.iter().any(|h| h == &target_host);

        prop_assert_eq!(channel.is_banned(&identity), banned_by_mask && !excepted_by_mask);
    }

    /// Joining the same nickname twice leaves `members` unchanged after
    /// the first join (spec.md §8); same for repeated `set_mode`.
    #[test]
    fn join_and_set_mode_are_idempotent(nick in prop::sample::select(nick_pool())) {
        let mut channel = Channel::new(CHANNEL, "owner");
        channel.join(nick, None);
        let after_first: BTreeSet<String> = channel.members.iter().cloned().collect();
        channel.join(nick, None);
        let after_second: BTreeSet<String> = channel.members.iter().cloned().collect();
        prop_assert_eq!(after_first, after_second);

        let first_change = channel.set_mode("m", None).unwrap();
        let second_change = channel.set_mode("m", None).unwrap();
        prop_assert_eq!(first_change, "m".to_owned());
        prop_assert_eq!(second_change, String::new());
        prop_assert_eq!(channel.mode_string(), "m");
    }
}
