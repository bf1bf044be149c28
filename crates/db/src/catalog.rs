//! Two-level geographic catalog: regions own districts.

use common::types::Id;

use crate::{
    models::{District, DistrictColumn, NewDistrict, NewRegion, Region},
    Filter, Result, DB,
};

impl DB {
    pub async fn add_region(&self, name: &str) -> Result<Region> {
        log::debug!("saving region {name}");
        self.repo::<Region>().create(&NewRegion::new(name)).await
    }
    /// All regions, newest first. Menu code relies on this order staying
    /// insertion-reverse rather than alphabetical.
    pub async fn list_regions(&self) -> Result<Vec<Region>> {
        self.repo::<Region>().all().await
    }
    pub async fn region(&self, id: Id) -> Result<Option<Region>> {
        self.repo::<Region>().get(id).await
    }
    pub async fn add_district(&self, region_id: Id, name: &str) -> Result<District> {
        log::debug!("saving district {name} in region {region_id}");
        self.repo::<District>()
            .create(&NewDistrict::new(region_id, name))
            .await
    }
    /// Districts of one region. An unknown region yields an empty list,
    /// not an error.
    pub async fn list_districts(&self, region_id: Id) -> Result<Vec<District>> {
        self.repo::<District>()
            .filter(Filter::new().eq(DistrictColumn::RegionId, region_id))
            .await
    }
    pub async fn district(&self, id: Id) -> Result<Option<District>> {
        self.repo::<District>().get(id).await
    }
}
