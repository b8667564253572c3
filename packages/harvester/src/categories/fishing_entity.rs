//! Fishing entities (flag states and fleets) with their catch time series.

use serde::Deserialize;

use super::catch::{catch_documents, CatchParent};
use super::profile_links;
use crate::config::HarvesterConfig;
use crate::document::{CatalogDocument, DocumentBuilder, DocumentTransformer};
use crate::enrichment::{fetch_catches, CatchData, CatchDimension};
use crate::error::Result;
use crate::extract::{EntitySource, HarvestContext, IndexListing, RawEntity};
use crate::grouping::EntityGroup;
use crate::provider::Envelope;

const PATH: &str = "fishing-entity";

const DIMENSIONS: &[CatchDimension] = &[
    CatchDimension::Taxon,
    CatchDimension::CommercialGroup,
    CatchDimension::FunctionalGroup,
    CatchDimension::Sector,
    CatchDimension::CatchType,
];

#[derive(Debug, Clone, Deserialize)]
pub struct FishingEntityRow {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FishingEntityDetail {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub long_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FishingEntity {
    pub detail: FishingEntityDetail,
    pub catches: Vec<CatchData>,
}

pub struct FishingEntityCategory<'a> {
    config: &'a HarvesterConfig,
}

impl<'a> FishingEntityCategory<'a> {
    pub fn new(config: &'a HarvesterConfig) -> Self {
        Self { config }
    }
}

impl EntitySource for FishingEntityCategory<'_> {
    type Row = FishingEntityRow;
    type Key = i64;
    type Tables = ();
    type Entity = FishingEntity;

    fn category(&self) -> &str {
        PATH
    }

    fn discover(&self, ctx: &HarvestContext<'_>) -> Result<IndexListing<FishingEntityRow, ()>> {
        let (rows, version) = ctx.fetch_index(&ctx.urls().index(PATH, false))?;
        Ok(IndexListing {
            rows,
            version,
            tables: (),
        })
    }

    fn natural_key(&self, row: &FishingEntityRow) -> i64 {
        row.id
    }

    fn fetch_entity(
        &self,
        ctx: &HarvestContext<'_>,
        group: EntityGroup<i64, FishingEntityRow>,
        _tables: &(),
    ) -> Result<FishingEntity> {
        let id = *group.key();
        let detail: Envelope<FishingEntityDetail> = ctx.fetch(&ctx.urls().detail(PATH, id))?;
        let catches = fetch_catches(ctx, PATH, id, DIMENSIONS)?;
        Ok(FishingEntity {
            detail: detail.data,
            catches,
        })
    }
}

impl DocumentTransformer for FishingEntityCategory<'_> {
    type Entity = FishingEntity;

    fn transform(&self, entity: &RawEntity<FishingEntity>) -> Vec<CatalogDocument> {
        let fishing_entity = &entity.payload;
        let detail = &fishing_entity.detail;
        let urls = self.config.urls();

        let builder = DocumentBuilder::new(&entity.identity, &entity.version)
            .names(detail.long_title.as_deref(), Some(detail.title.as_str()))
            .subject(Some("Fishing entity"));
        let profile = profile_links(builder, urls, PATH, PATH, detail.id).build();

        let title = Some(detail.title.trim()).filter(|t| !t.is_empty());
        let parent = CatchParent {
            identity: &entity.identity,
            title,
            path: PATH,
            id: detail.id,
        };

        let mut documents = vec![profile];
        documents.extend(catch_documents(
            urls,
            &parent,
            &entity.version,
            &fishing_entity.catches,
        ));
        documents
    }
}
