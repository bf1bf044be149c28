//! Membership gate: decides whether an inbound action from a user may
//! proceed, based on live membership in every required channel.

use std::time::Duration;

use teloxide::{prelude::*, types::ChatMemberKind};

use db::{
    models::{Channel, User},
    DB,
};

const MEMBER_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one gate run. Never an error: every failure mode below
/// resolves to a verdict.
#[derive(Debug)]
pub(crate) enum Verdict {
    /// The original action may run, exactly once, after this decision
    Proceed,
    /// Blocked; holds the channels the user still has to join
    Intercepted(Vec<Channel>),
}

/// Run the gate for one inbound action.
///
/// Admins bypass the check unconditionally. For everyone else the current
/// channel list is snapshotted and each channel is queried for the user's
/// membership status; anything but member/administrator/owner, including a
/// failed or timed-out query, counts against the user (fail-closed).
///
/// Failing to load the channel list itself instead resolves to
/// [`Verdict::Proceed`]: with no channel names there is no actionable
/// prompt to block with, only a local db error to log.
pub(crate) async fn check(bot: &Bot, db: &DB, user: &User) -> Verdict {
    if user.is_admin() {
        return Verdict::Proceed;
    }

    let channels = match db.list_channels().await {
        Ok(channels) => channels,
        Err(e) => {
            // can't even name the channels to join, so there is nothing
            // actionable to block with
            log::error!("failed to load channel list for gate: {e}");
            return Verdict::Proceed;
        }
    };

    let mut unsatisfied = vec![];
    for channel in channels {
        if !is_member(bot, &channel, user.tg_user_id()).await {
            unsatisfied.push(channel);
        }
    }

    if unsatisfied.is_empty() {
        Verdict::Proceed
    } else {
        Verdict::Intercepted(unsatisfied)
    }
}

async fn is_member(bot: &Bot, channel: &Channel, user_id: UserId) -> bool {
    let query = bot.get_chat_member(channel.recipient(), user_id);
    match tokio::time::timeout(MEMBER_QUERY_TIMEOUT, query).await {
        Ok(Ok(member)) => satisfies(&member.kind),
        // lost admin rights, channel deleted, network trouble: all treated
        // as not-a-member, reported to the log chat rather than the user
        Ok(Err(e)) => {
            log::error!(
                "membership check failed for channel {} ({}): {e}",
                channel.name(),
                channel.chat_id(),
            );
            false
        }
        Err(_) => {
            log::error!("membership check timed out for channel {}", channel.name());
            false
        }
    }
}

/// Restricted counts as unsatisfied even when the platform still lists the
/// user as present in the channel.
fn satisfies(kind: &ChatMemberKind) -> bool {
    matches!(
        kind,
        ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_) | ChatMemberKind::Member
    )
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatMemberKind, Owner, UntilDate};

    use db::models::{NewChannel, NewUser, Role};

    use super::*;

    async fn prepare() -> DB {
        common::init_logger();

        const DIR: &str = "../../target/test-db";
        std::fs::create_dir_all(DIR).unwrap();
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        DB::init(&format!("{DIR}/gate-{id}.db")).await.unwrap()
    }

    // the two tests below never reach the network: admins short-circuit
    // before the channel list is read, and an empty list leaves nothing
    // to query
    #[tokio::test]
    async fn test_admin_bypasses_gate() {
        let db = prepare().await;
        db.add_channel(
            NewChannel::builder()
                .name("news")
                .chat_id("-1001234")
                .invite_link("https://t.me/some_news")
                .build(),
        )
        .await
        .unwrap();
        let (admin, _) = db
            .get_or_create_user(NewUser::builder().id(1).role(Role::Admin).build())
            .await
            .unwrap();

        let bot = Bot::new("0:unused");
        assert!(matches!(check(&bot, &db, &admin).await, Verdict::Proceed));
    }

    #[tokio::test]
    async fn test_empty_channel_list_passes_everyone() {
        let db = prepare().await;
        let (user, _) = db
            .get_or_create_user(NewUser::builder().id(2).build())
            .await
            .unwrap();
        assert!(!user.is_admin());

        let bot = Bot::new("0:unused");
        assert!(matches!(check(&bot, &db, &user).await, Verdict::Proceed));
    }

    #[tokio::test]
    async fn test_failed_membership_query_blocks() {
        let db = prepare().await;
        let channel = db
            .add_channel(
                NewChannel::builder()
                    .name("news")
                    .chat_id("-1001234")
                    .invite_link("https://t.me/some_news")
                    .build(),
            )
            .await
            .unwrap();
        let (user, _) = db
            .get_or_create_user(NewUser::builder().id(3).build())
            .await
            .unwrap();

        // nothing listens on port 1, so every membership query errors out
        let bot = Bot::new("0:unused").set_api_url("http://127.0.0.1:1".parse().unwrap());
        match check(&bot, &db, &user).await {
            Verdict::Intercepted(channels) => assert_eq!(channels, [channel]),
            Verdict::Proceed => panic!("a failed membership query must not pass the gate"),
        }
    }

    #[test]
    fn test_membership_statuses() {
        let owner = ChatMemberKind::Owner(Owner {
            custom_title: None,
            is_anonymous: false,
        });
        let banned = ChatMemberKind::Banned(teloxide::types::Banned {
            until_date: UntilDate::Forever,
        });

        assert!(satisfies(&ChatMemberKind::Member));
        assert!(satisfies(&owner));
        assert!(!satisfies(&ChatMemberKind::Left));
        assert!(!satisfies(&banned));
    }
}
