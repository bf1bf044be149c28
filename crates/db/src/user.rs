use common::types::Id;

use crate::{
    models::{NewUser, Role, User, UserColumn},
    Error, Filter, Result, DB,
};

impl DB {
    /// Look up a user by telegram id, creating the row on first contact.
    /// Returns the row plus whether it was created by this call.
    ///
    /// Concurrent calls for the same id may both miss the fast-path read;
    /// the primary key is the final arbiter, and the loser of the insert
    /// race reads back the winning row instead of surfacing the conflict.
    pub async fn get_or_create_user(&self, new: NewUser) -> Result<(User, bool)> {
        let repo = self.repo::<User>();
        if let Some(user) = repo.get(new.id()).await? {
            return Ok((user, false));
        }

        match repo.create(&new).await {
            Ok(user) => {
                log::debug!("user {} saved", user.id());
                Ok((user, true))
            }
            Err(e @ Error::Constraint(_)) => match repo.get(new.id()).await? {
                Some(user) => Ok((user, false)),
                // not an id race: some other uniqueness (e.g. username) failed
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
    pub async fn user(&self, id: Id) -> Result<Option<User>> {
        self.repo::<User>().get(id).await
    }
    pub async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
        self.repo::<User>()
            .filter(Filter::new().eq(UserColumn::Role, role))
            .await
    }
}
