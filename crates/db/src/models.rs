use sqlx::{
    query::QueryAs,
    sqlite::{SqliteArguments, SqliteRow},
    Sqlite,
};
use teloxide::types::{ChatId as TgChatId, Recipient, UserId as TgUserId};

use common::{
    types::{Id, UserId},
    DateTime, UnixDateTime,
};

use crate::repo::{Arg, Column, Entity, InsertRow};

// Region

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Region {
    id: Id,
    name: String,
}

impl Region {
    /// Construct a row directly, bypassing the store. Mainly for tests.
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
    pub fn id(&self) -> Id {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Region {
    const TABLE: &'static str = "region";
    type Column = RegionColumn;
}

#[derive(Debug, Clone, Copy)]
pub enum RegionColumn {
    Name,
}

impl Column for RegionColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
        }
    }
}

#[derive(Debug)]
pub struct NewRegion {
    name: String,
}

impl NewRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl InsertRow for NewRegion {
    type Entity = Region;

    const COLUMNS: &'static [&'static str] = &["name"];

    fn bind<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, Region, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, Region, SqliteArguments<'q>> {
        query.bind(self.name.as_str())
    }
}

// District

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct District {
    id: Id,
    name: String,
    region_id: Id,
}

impl District {
    /// Construct a row directly, bypassing the store. Mainly for tests.
    pub fn new(id: Id, name: impl Into<String>, region_id: Id) -> Self {
        Self {
            id,
            name: name.into(),
            region_id,
        }
    }
    pub fn id(&self) -> Id {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn region_id(&self) -> Id {
        self.region_id
    }
}

impl Entity for District {
    const TABLE: &'static str = "district";
    type Column = DistrictColumn;
}

#[derive(Debug, Clone, Copy)]
pub enum DistrictColumn {
    Name,
    RegionId,
}

impl Column for DistrictColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::RegionId => "region_id",
        }
    }
}

#[derive(Debug)]
pub struct NewDistrict {
    name: String,
    region_id: Id,
}

impl NewDistrict {
    pub fn new(region_id: Id, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region_id,
        }
    }
}

impl InsertRow for NewDistrict {
    type Entity = District;

    const COLUMNS: &'static [&'static str] = &["name", "region_id"];

    fn bind<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, District, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, District, SqliteArguments<'q>> {
        query.bind(self.name.as_str()).bind(self.region_id)
    }
}

// User

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl From<Role> for Arg {
    fn from(role: Role) -> Self {
        Self::Text(role.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Telegram user id, assigned by the platform. The durable identity key,
    /// never reused or regenerated.
    id: Id,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    role: Role,
    created_at: UnixDateTime,
}

impl User {
    pub fn id(&self) -> Id {
        self.id
    }
    pub fn tg_user_id(&self) -> TgUserId {
        UserId::from(self.id).into()
    }
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
    pub fn created_at(&self) -> UnixDateTime {
        self.created_at
    }
    /// Display user name for logs and admin-facing messages
    pub fn display(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(username), _) => format!("@{username}"),
            (None, Some(name)) => format!("{name} ({})", self.id),
            (None, None) => self.id.to_string(),
        }
    }
}

impl Entity for User {
    const TABLE: &'static str = "user";
    type Column = UserColumn;
}

#[derive(Debug, Clone, Copy)]
pub enum UserColumn {
    FirstName,
    LastName,
    Username,
    Role,
    CreatedAt,
}

impl Column for UserColumn {
    fn name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Username => "username",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, bon::Builder)]
pub struct NewUser {
    id: Id,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    #[builder(default)]
    role: Role,
    #[builder(default = DateTime::now())]
    created_at: UnixDateTime,
}

impl NewUser {
    pub fn id(&self) -> Id {
        self.id
    }
}

impl InsertRow for NewUser {
    type Entity = User;

    const COLUMNS: &'static [&'static str] =
        &["id", "first_name", "last_name", "username", "role", "created_at"];

    fn bind<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, User, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, User, SqliteArguments<'q>> {
        query
            .bind(self.id)
            .bind(self.first_name.as_deref())
            .bind(self.last_name.as_deref())
            .bind(self.username.as_deref())
            .bind(self.role)
            .bind(self.created_at)
    }
}

// Channel

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Channel {
    id: Id,
    name: String,
    chat_id: String,
    invite_link: String,
}

impl Channel {
    /// Construct a row directly, bypassing the store. Mainly for tests.
    pub fn new(id: Id, name: impl Into<String>, chat_id: impl Into<String>, invite_link: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            chat_id: chat_id.into(),
            invite_link: invite_link.into(),
        }
    }
    pub fn id(&self) -> Id {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
    pub fn invite_link(&self) -> &str {
        &self.invite_link
    }
    /// Target for membership queries. `chat_id` normally holds the numeric
    /// id captured when the channel was added; a non-numeric value is
    /// treated as a public channel username.
    pub fn recipient(&self) -> Recipient {
        match self.chat_id.parse::<i64>() {
            Ok(id) => Recipient::Id(TgChatId(id)),
            Err(_) => Recipient::ChannelUsername(format!("@{}", self.chat_id.trim_start_matches('@'))),
        }
    }
}

impl Entity for Channel {
    const TABLE: &'static str = "channel";
    type Column = ChannelColumn;
}

#[derive(Debug, Clone, Copy)]
pub enum ChannelColumn {
    Name,
    ChatId,
    InviteLink,
}

impl Column for ChannelColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ChatId => "chat_id",
            Self::InviteLink => "invite_link",
        }
    }
}

#[derive(Debug, bon::Builder)]
pub struct NewChannel {
    #[builder(into)]
    name: String,
    #[builder(into)]
    chat_id: String,
    #[builder(into)]
    invite_link: String,
}

impl InsertRow for NewChannel {
    type Entity = Channel;

    const COLUMNS: &'static [&'static str] = &["name", "chat_id", "invite_link"];

    fn bind<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, Channel, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, Channel, SqliteArguments<'q>> {
        query
            .bind(self.name.as_str())
            .bind(self.chat_id.as_str())
            .bind(self.invite_link.as_str())
    }
}

#[derive(Debug)]
pub struct Stats {
    pub users: u32,
    pub admins: u32,
    pub regions: u32,
    pub districts: u32,
    pub channels: u32,
}

/// Struct helpers for extracting partial rows
pub mod fetch {
    #[derive(sqlx::FromRow)]
    pub(crate) struct Count {
        pub count: u32,
    }
}
