use sqlx::{error::ErrorKind, migrate::Migrator, sqlite::SqliteConnectOptions, SqlitePool};

mod catalog;
mod channel;
pub mod models;
mod repo;
mod user;

#[cfg(test)]
mod tests;

pub use repo::{Arg, Column, Entity, Filter, InsertRow, Op, Patch, Repo};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unique/foreign-key/check violation. Surfaced as its own variant so
    /// callers can react to it instead of treating it as an opaque failure.
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("failed to run query: {0}")]
    Sqlx(sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => return Self::Constraint(db.message().to_string()),
                _ => {}
            }
        }
        Self::Sqlx(e)
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct DB {
    pool: SqlitePool,
}

impl DB {
    pub async fn init(path: &str) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                // district rows must follow their region on delete
                .foreign_keys(true),
        )
        .await
        .map_err(Error::from)?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    /// Generic store handle for one entity type. Domain helpers on [`DB`]
    /// go through this as well.
    pub fn repo<T: Entity>(&self) -> Repo<'_, T> {
        Repo::new(&self.pool)
    }
}

// Stats
impl DB {
    pub async fn load_stats(&self) -> Result<models::Stats> {
        Ok(models::Stats {
            users: self.load_count(&format!("from {}", models::User::TABLE)).await?,
            admins: self
                .load_count(&format!("from {} where role = 'admin'", models::User::TABLE))
                .await?,
            regions: self.load_count(&format!("from {}", models::Region::TABLE)).await?,
            districts: self
                .load_count(&format!("from {}", models::District::TABLE))
                .await?,
            channels: self
                .load_count(&format!("from {}", models::Channel::TABLE))
                .await?,
        })
    }
    async fn load_count(&self, sql_predicate: &str) -> Result<u32> {
        Ok(
            sqlx::query_as::<_, models::fetch::Count>(&format!("select count(*) as count {sql_predicate}"))
                .fetch_one(&self.pool)
                .await
                .map_err(Error::from)?
                .count,
        )
    }
}
