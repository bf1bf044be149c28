use teloxide::{prelude::*, types::ChatKind, utils::command::BotCommands};

use common::types;
use db::{
    models::{NewUser, Role, User},
    DB,
};

use crate::{
    commands::Command,
    gate::{self, Verdict},
    keyboards::Keyboards,
    SOMETHING_WRONG_MSG,
};

const NOT_IN_PRIVATE_MSG: &str = "This bot works only in private chat";
pub(crate) const CHOOSE_REGION_MSG: &str = "Choose your region:";
pub(crate) const NO_REGIONS_MSG: &str = "No regions are configured yet, come back later";
pub(crate) const JOIN_CHANNELS_MSG: &str =
    "To use this bot, join the channels below, then press the check button:";

pub async fn command_handler(bot: Bot, msg: Message, cmd: Command, db: DB) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        bot.send_message(msg.chat.id, NOT_IN_PRIVATE_MSG).await?;
        return Ok(());
    }

    let user = match register_user(&msg, &db).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("failed to register user {}: {e}", msg.chat.id.0);
            bot.send_message(msg.chat.id, SOMETHING_WRONG_MSG).await?;
            return Ok(());
        }
    };

    if let Verdict::Intercepted(channels) = gate::check(&bot, &db, &user).await {
        bot.send_message(msg.chat.id, JOIN_CHANNELS_MSG)
            .reply_markup(Keyboards::join_prompt(&channels))
            .await?;
        return Ok(());
    }

    match cmd {
        Command::Start => send_region_menu(&bot, msg.chat.id, &db).await?,
        Command::Help => {
            bot.send_message(msg.chat.id, make_help()).await?;
        }
    };

    Ok(())
}

/// Fallback for plain text: still gated, then points at /start
pub async fn message_handler(bot: Bot, msg: Message, db: DB) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }

    let user = match register_user(&msg, &db).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("failed to register user {}: {e}", msg.chat.id.0);
            bot.send_message(msg.chat.id, SOMETHING_WRONG_MSG).await?;
            return Ok(());
        }
    };

    if let Verdict::Intercepted(channels) = gate::check(&bot, &db, &user).await {
        bot.send_message(msg.chat.id, JOIN_CHANNELS_MSG)
            .reply_markup(Keyboards::join_prompt(&channels))
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "I didn't get that, press /start to register")
        .await?;
    Ok(())
}

/// Upsert the acting user from message metadata. A repeated call for a
/// known id returns the stored row untouched.
async fn register_user(msg: &Message, db: &DB) -> Result<User, db::Error> {
    let id: types::ChatId = msg.chat.id.into();
    let role = if common::is_admin_chat_id(msg.chat.id.0) {
        Role::Admin
    } else {
        Role::User
    };

    let builder = NewUser::builder().id(id.into()).role(role);
    let new = if let ChatKind::Private(chat) = &msg.chat.kind {
        builder
            .maybe_first_name(chat.first_name.clone())
            .maybe_last_name(chat.last_name.clone())
            .maybe_username(chat.username.clone())
            .build()
    } else {
        builder.build()
    };

    let (user, created) = db.get_or_create_user(new).await?;
    if created {
        log::info!(tg = true; "new user {}", user.display());
    }
    Ok(user)
}

pub(crate) async fn send_region_menu(bot: &Bot, chat_id: ChatId, db: &DB) -> ResponseResult<()> {
    match db.list_regions().await {
        Ok(regions) if regions.is_empty() => {
            bot.send_message(chat_id, NO_REGIONS_MSG).await?;
        }
        Ok(regions) => {
            bot.send_message(chat_id, CHOOSE_REGION_MSG)
                .reply_markup(Keyboards::regions(&regions))
                .await?;
        }
        Err(e) => {
            log::error!("failed to load regions: {e}");
            bot.send_message(chat_id, SOMETHING_WRONG_MSG).await?;
        }
    };
    Ok(())
}

fn make_help() -> String {
    format!(
        "This bot registers you in a region and district.\n\n{}",
        Command::descriptions(),
    )
}
