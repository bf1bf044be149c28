//! Generic repository over one SQLite table.
//!
//! One implementation, instantiated per entity via [`DB::repo`]. Reads always
//! round-trip to the backing store, nothing is served from a write-behind
//! cache, and concurrency safety is delegated to SQLite's own transaction
//! isolation plus the uniqueness constraints in the schema.
//!
//! [`DB::repo`]: crate::DB::repo

use std::{fmt::Debug, marker::PhantomData};

use sqlx::{
    query::QueryAs,
    sqlite::{SqliteArguments, SqliteRow},
    Sqlite, SqlitePool,
};

use common::types::Id;

use super::Result;

/// A persisted row type, bound to its table and its typed column set.
pub trait Entity: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
    /// Columns usable in [`Filter`] predicates and [`Patch`] assignments.
    /// A per-entity enum, so a filter on a column the entity does not have
    /// is a compile error, not a runtime surprise.
    type Column: Column;
}

pub trait Column: Debug + Copy + Send + Sync + 'static {
    fn name(self) -> &'static str;
}

/// A new-row type for one entity, naming its insert columns and binding
/// their values.
pub trait InsertRow: Send + Sync {
    type Entity: Entity;

    const COLUMNS: &'static [&'static str];

    fn bind<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, Self::Entity, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, Self::Entity, SqliteArguments<'q>>;
}

/// A bound predicate/assignment value.
#[derive(Debug, Clone)]
pub enum Arg {
    Int(i64),
    Text(String),
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl Arg {
    fn bind_to<'q, T>(
        &'q self,
        query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
        match self {
            Self::Int(v) => query.bind(*v),
            Self::Text(s) => query.bind(s.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// AND-conjunction of typed predicates.
#[derive(Debug)]
pub struct Filter<T: Entity> {
    preds: Vec<(T::Column, Op, Arg)>,
}

impl<T: Entity> Default for Filter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Filter<T> {
    pub fn new() -> Self {
        Self { preds: vec![] }
    }
    pub fn eq(self, column: T::Column, value: impl Into<Arg>) -> Self {
        self.cmp(column, Op::Eq, value)
    }
    pub fn cmp(mut self, column: T::Column, op: Op, value: impl Into<Arg>) -> Self {
        self.preds.push((column, op, value.into()));
        self
    }
}

/// Typed column assignments for [`Repo::update`].
#[derive(Debug)]
pub struct Patch<T: Entity> {
    sets: Vec<(T::Column, Arg)>,
}

impl<T: Entity> Default for Patch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Patch<T> {
    pub fn new() -> Self {
        Self { sets: vec![] }
    }
    pub fn set(mut self, column: T::Column, value: impl Into<Arg>) -> Self {
        self.sets.push((column, value.into()));
        self
    }
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[derive(Debug)]
pub struct Repo<'a, T: Entity> {
    pool: &'a SqlitePool,
    _entity: PhantomData<T>,
}

impl<'a, T: Entity> Repo<'a, T> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// Insert a row and return it as stored. A unique or foreign-key
    /// violation surfaces as [`crate::Error::Constraint`], never silently dropped.
    pub async fn create<N>(&self, row: &N) -> Result<T>
    where
        N: InsertRow<Entity = T>,
    {
        let placeholders = vec!["?"; N::COLUMNS.len()].join(", ");
        let sql = format!(
            "insert into {} ({}) values ({}) returning *",
            T::TABLE,
            N::COLUMNS.join(", "),
            placeholders,
        );
        let query = sqlx::query_as::<_, T>(&sql);
        Ok(row.bind(query).fetch_one(self.pool).await?)
    }

    pub async fn get(&self, id: Id) -> Result<Option<T>> {
        let sql = format!("select * from {} where id = ?", T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// All rows, newest first (descending primary key).
    pub async fn all(&self) -> Result<Vec<T>> {
        self.filter(Filter::new()).await
    }

    pub async fn filter(&self, filter: Filter<T>) -> Result<Vec<T>> {
        let mut sql = format!("select * from {}", T::TABLE);
        if !filter.preds.is_empty() {
            let conds: Vec<_> = filter
                .preds
                .iter()
                .map(|(column, op, _)| format!("{} {} ?", column.name(), op.sql()))
                .collect();
            sql += &format!(" where {}", conds.join(" and "));
        }
        sql += " order by id desc";

        let mut query = sqlx::query_as::<_, T>(&sql);
        for (_, _, arg) in &filter.preds {
            query = arg.bind_to(query);
        }
        Ok(query.fetch_all(self.pool).await?)
    }

    /// Atomic read-modify-write. `None` when no row matched.
    pub async fn update(&self, id: Id, patch: Patch<T>) -> Result<Option<T>> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        let sets: Vec<_> = patch
            .sets
            .iter()
            .map(|(column, _)| format!("{} = ?", column.name()))
            .collect();
        let sql = format!(
            "update {} set {} where id = ? returning *",
            T::TABLE,
            sets.join(", "),
        );

        let mut query = sqlx::query_as::<_, T>(&sql);
        for (_, arg) in &patch.sets {
            query = arg.bind_to(query);
        }
        Ok(query.bind(id).fetch_optional(self.pool).await?)
    }

    /// Delete one row, returning its prior state.
    pub async fn delete(&self, id: Id) -> Result<Option<T>> {
        let sql = format!("delete from {} where id = ? returning *", T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Delete every row of the type, returning the deleted snapshot.
    pub async fn truncate(&self) -> Result<Vec<T>> {
        let sql = format!("delete from {} returning *", T::TABLE);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(self.pool).await?)
    }
}
