use common::types::Id;

use crate::{
    models::{Channel, NewChannel},
    Result, DB,
};

impl DB {
    /// Channel list snapshot used by the membership gate, newest first.
    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        self.repo::<Channel>().all().await
    }
    /// The caller must have verified the bot can query member status of the
    /// target channel; `invite_link` is unique, re-adding surfaces
    /// [`crate::Error::Constraint`].
    pub async fn add_channel(&self, new: NewChannel) -> Result<Channel> {
        log::debug!("saving channel {new:?}");
        self.repo::<Channel>().create(&new).await
    }
    pub async fn remove_channel(&self, id: Id) -> Result<Option<Channel>> {
        self.repo::<Channel>().delete(id).await
    }
}
