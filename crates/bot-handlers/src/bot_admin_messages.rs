use teloxide::{
    prelude::*,
    types::{ChatMemberKind, Recipient},
};

use common::types::Id;
use db::{
    models::{NewChannel, Stats},
    DB,
};

use crate::{commands::AdminCommand, SOMETHING_WRONG_MSG};

const NOT_ALLOWED_MSG: &str = "This command is for administrators only";

pub async fn admin_command_handler(bot: Bot, msg: Message, cmd: AdminCommand, db: DB) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }

    let is_admin = common::is_admin_chat_id(msg.chat.id.0)
        || matches!(db.user(msg.chat.id.0).await, Ok(Some(u)) if u.is_admin());
    if !is_admin {
        bot.send_message(msg.chat.id, NOT_ALLOWED_MSG).await?;
        return Ok(());
    }

    let reply = match cmd {
        AdminCommand::AddChannel(args) => add_channel(&bot, &db, args.trim()).await?,
        AdminCommand::DelChannel(args) => del_channel(&db, args.trim()).await,
        AdminCommand::Channels => list_channels(&db).await,
        AdminCommand::AddRegion(args) => add_region(&db, args.trim()).await,
        AdminCommand::AddDistrict(args) => add_district(&db, args.trim()).await,
        AdminCommand::Stats => match db.load_stats().await {
            Ok(stats) => format_stats(&stats),
            Err(e) => {
                log::error!("failed to get stats: {e}");
                SOMETHING_WRONG_MSG.to_string()
            }
        },
    };
    bot.send_message(msg.chat.id, reply).await?;

    Ok(())
}

/// Resolve the target chat, refuse anything that is not a channel the bot
/// administers, then persist it. Nothing is written on any refusal path.
async fn add_channel(bot: &Bot, db: &DB, args: &str) -> ResponseResult<String> {
    let mut parts = args.split_whitespace();
    let Some(target) = parts.next() else {
        return Ok("usage: /addchannel <@username or chat id> [invite link]".to_string());
    };
    let link_override = parts.next();

    let chat = match bot.get_chat(parse_chat_target(target)).await {
        Ok(chat) => chat,
        Err(e) => {
            log::error!("failed to resolve chat {target}: {e}");
            return Ok(format!("Couldn't resolve {target}. Was the bot added to it?"));
        }
    };
    if !chat.is_channel() {
        return Ok(format!("{target} is not a channel"));
    }

    // the gate can only query member status where the bot itself is admin
    let me = bot.get_me().await?;
    match bot.get_chat_member(chat.id, me.user.id).await {
        Ok(member)
            if matches!(
                member.kind,
                ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_)
            ) => {}
        Ok(_) => return Ok("Make the bot an administrator of the channel first".to_string()),
        Err(e) => {
            log::error!("failed to check own membership in {target}: {e}");
            return Ok("Make the bot an administrator of the channel first".to_string());
        }
    }

    let invite_link = link_override
        .map(str::to_string)
        .or_else(|| chat.username().map(|u| format!("https://t.me/{u}")))
        .or_else(|| chat.invite_link().map(str::to_string));
    let Some(invite_link) = invite_link else {
        return Ok("The channel has no public username, pass an invite link: /addchannel <chat id> <invite link>"
            .to_string());
    };

    let new = NewChannel::builder()
        .name(chat.title().unwrap_or(target))
        .chat_id(chat.id.0.to_string())
        .invite_link(invite_link)
        .build();
    let reply = match db.add_channel(new).await {
        Ok(channel) => {
            log::info!(tg = true; "required channel {} added", channel.name());
            format!("Channel {} added with id {}", channel.name(), channel.id())
        }
        Err(e) if e.is_constraint() => "This channel is already in the list".to_string(),
        Err(e) => {
            log::error!("failed to save channel {target}: {e}");
            SOMETHING_WRONG_MSG.to_string()
        }
    };
    Ok(reply)
}

async fn del_channel(db: &DB, args: &str) -> String {
    let Ok(id) = args.parse::<Id>() else {
        return "usage: /delchannel <id>, see /channels for ids".to_string();
    };
    match db.remove_channel(id).await {
        Ok(Some(channel)) => {
            log::info!(tg = true; "required channel {} removed", channel.name());
            format!("Channel {} removed", channel.name())
        }
        Ok(None) => format!("No channel with id {id}"),
        Err(e) => {
            log::error!("failed to remove channel {id}: {e}");
            SOMETHING_WRONG_MSG.to_string()
        }
    }
}

async fn list_channels(db: &DB) -> String {
    match db.list_channels().await {
        Ok(channels) if channels.is_empty() => "No required channels".to_string(),
        Ok(channels) => channels
            .iter()
            .map(|c| format!("{} — {} — {}", c.id(), c.name(), c.invite_link()))
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => {
            log::error!("failed to list channels: {e}");
            SOMETHING_WRONG_MSG.to_string()
        }
    }
}

async fn add_region(db: &DB, name: &str) -> String {
    if name.is_empty() {
        return "usage: /addregion <name>".to_string();
    }
    match db.add_region(name).await {
        Ok(region) => format!("Region {} added with id {}", region.name(), region.id()),
        Err(e) => {
            log::error!("failed to save region {name}: {e}");
            SOMETHING_WRONG_MSG.to_string()
        }
    }
}

async fn add_district(db: &DB, args: &str) -> String {
    let usage = || "usage: /adddistrict <region id> <name>".to_string();
    let Some((region_id, name)) = args.split_once(' ') else {
        return usage();
    };
    let (Ok(region_id), name) = (region_id.parse::<Id>(), name.trim()) else {
        return usage();
    };
    if name.is_empty() {
        return usage();
    }

    match db.region(region_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return format!("No region with id {region_id}"),
        Err(e) => {
            log::error!("failed to load region {region_id}: {e}");
            return SOMETHING_WRONG_MSG.to_string();
        }
    }
    match db.add_district(region_id, name).await {
        Ok(district) => format!("District {} added with id {}", district.name(), district.id()),
        Err(e) => {
            log::error!("failed to save district {name}: {e}");
            SOMETHING_WRONG_MSG.to_string()
        }
    }
}

fn format_stats(stats: &Stats) -> String {
    [
        ("users", stats.users),
        ("admins", stats.admins),
        ("regions", stats.regions),
        ("districts", stats.districts),
        ("channels", stats.channels),
    ]
    .into_iter()
    .map(|(name, value)| format!("{name}: {value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

fn parse_chat_target(target: &str) -> Recipient {
    match target.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(format!("@{}", target.trim_start_matches('@'))),
    }
}
