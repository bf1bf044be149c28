use teloxide::types::{ChatId as TgChatId, UserId as TgUserId};

pub type Id = i64;

#[derive(Debug, Default, Clone, Copy)]
pub struct UserId(pub u64);

#[derive(Debug, Default, Clone, Copy)]
pub struct ChatId(pub i64);

macro_rules! cast {
    ($($from:ty => $to:ty : $value:ident => $convert:expr),* $(,)?) => {
        $(impl From<$from> for $to {
            fn from($value: $from) -> Self {
                $convert
            }
        })*
    };
}

// private chats only, so a chat id and a user id are the same number
cast!(
    TgChatId => ChatId: v => Self(v.0),

    TgUserId => UserId: v => Self(v.0),
    UserId => TgUserId: v => Self(v.0),

    ChatId => Id: v => v.0,
    Id => UserId: v => Self(v as _),
    UserId => Id: v => v.0 as _,
);
