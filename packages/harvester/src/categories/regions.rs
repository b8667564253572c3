//! Marine regions: EEZs, large marine ecosystems, RFMOs and high seas areas.

use serde::Deserialize;
use serde_json::Value;

use super::catch::{catch_documents, CatchParent};
use super::profile_links;
use crate::config::HarvesterConfig;
use crate::document::{
    metric_subjects, CatalogDocument, DescriptionType, DocumentBuilder, DocumentTransformer,
    GeoLocation,
};
use crate::enrichment::{fetch_catches, CatchData, CatchDimension};
use crate::error::Result;
use crate::extract::{EntitySource, HarvestContext, IndexListing, RawEntity};
use crate::grouping::EntityGroup;
use crate::provider::{Envelope, Feature, FeatureCollection, Metric};

/// Kind of marine region; each kind is its own category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Eez,
    Lme,
    Rfmo,
    HighSeas,
}

const FULL_DIMENSIONS: &[CatchDimension] = &[
    CatchDimension::Taxon,
    CatchDimension::CommercialGroup,
    CatchDimension::FunctionalGroup,
    CatchDimension::FishingCountry,
    CatchDimension::Sector,
    CatchDimension::CatchType,
    CatchDimension::ReportingStatus,
];

const RFMO_DIMENSIONS: &[CatchDimension] = &[
    CatchDimension::Taxon,
    CatchDimension::CommercialGroup,
    CatchDimension::FunctionalGroup,
    CatchDimension::FishingCountry,
    CatchDimension::Sector,
    CatchDimension::CatchType,
];

impl RegionKind {
    pub const ALL: [RegionKind; 4] = [Self::Eez, Self::Lme, Self::Rfmo, Self::HighSeas];

    /// Category name and provider path segment.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Eez => "eez",
            Self::Lme => "lme",
            Self::Rfmo => "rfmo",
            Self::HighSeas => "highseas",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Eez => "Exclusive Economic Zone",
            Self::Lme => "Large Marine Ecosystem",
            Self::Rfmo => "Regional Fisheries Management Organisation",
            Self::HighSeas => "High Seas",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Eez => "Exclusive economic zones with catch time series",
            Self::Lme => "Large marine ecosystems with catch time series",
            Self::Rfmo => "Regional fisheries management organisations with catch time series",
            Self::HighSeas => "High seas areas with catch time series",
        }
    }

    /// Catch dimensions the provider publishes for this kind.
    #[must_use]
    pub fn dimensions(&self) -> &'static [CatchDimension] {
        match self {
            Self::Rfmo => RFMO_DIMENSIONS,
            Self::Eez | Self::Lme | Self::HighSeas => FULL_DIMENSIONS,
        }
    }
}

/// Properties of a region feature in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionProperties {
    pub region_id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Region detail payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionDetail {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub long_title: Option<String>,
    #[serde(default)]
    pub metrics: Option<Vec<Metric>>,
}

/// One index feature of a region. A region may be drawn as several
/// features sharing its id.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPart {
    pub title: Option<String>,
    pub geometry: Option<Value>,
}

impl From<Feature<RegionProperties>> for RegionPart {
    fn from(feature: Feature<RegionProperties>) -> Self {
        Self {
            title: feature.properties.title,
            geometry: feature.geometry,
        }
    }
}

/// An extracted region with its index features in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: i64,
    pub parts: Vec<RegionPart>,
    pub detail: RegionDetail,
    pub catches: Vec<CatchData>,
}

impl Region {
    /// Short title, preferring the detail payload over the first feature.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.detail
            .title
            .as_deref()
            .or_else(|| self.parts.first().and_then(|part| part.title.as_deref()))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

pub struct RegionCategory<'a> {
    kind: RegionKind,
    config: &'a HarvesterConfig,
}

impl<'a> RegionCategory<'a> {
    pub fn new(kind: RegionKind, config: &'a HarvesterConfig) -> Self {
        Self { kind, config }
    }
}

impl EntitySource for RegionCategory<'_> {
    type Row = Feature<RegionProperties>;
    type Key = i64;
    type Tables = ();
    type Entity = Region;

    fn category(&self) -> &str {
        self.kind.path()
    }

    fn discover(&self, ctx: &HarvestContext<'_>) -> Result<IndexListing<Self::Row, ()>> {
        let url = ctx.urls().index(self.kind.path(), true);
        let (collection, version) = ctx.fetch_index::<FeatureCollection<RegionProperties>>(&url)?;
        Ok(IndexListing {
            rows: collection.features,
            version,
            tables: (),
        })
    }

    fn natural_key(&self, row: &Self::Row) -> i64 {
        row.properties.region_id
    }

    fn fetch_entity(
        &self,
        ctx: &HarvestContext<'_>,
        group: EntityGroup<i64, Self::Row>,
        _tables: &(),
    ) -> Result<Region> {
        let id = *group.key();
        let path = self.kind.path();

        let detail: Envelope<RegionDetail> = ctx.fetch(&ctx.urls().detail(path, id))?;
        let catches = fetch_catches(ctx, path, id, self.kind.dimensions())?;

        Ok(Region {
            id,
            parts: group
                .into_members()
                .into_iter()
                .map(RegionPart::from)
                .collect(),
            detail: detail.data,
            catches,
        })
    }
}

impl DocumentTransformer for RegionCategory<'_> {
    type Entity = Region;

    fn transform(&self, entity: &RawEntity<Region>) -> Vec<CatalogDocument> {
        let region = &entity.payload;
        let path = self.kind.path();
        let urls = self.config.urls();
        let title = region.title();

        let abstract_text = title.map(|t| format!("{} profile of {t}.", self.kind.label()));
        let metrics = region.detail.metrics.as_deref().unwrap_or_default();

        let mut builder = DocumentBuilder::new(&entity.identity, &entity.version)
            .names(region.detail.long_title.as_deref(), title)
            .description(abstract_text.as_deref(), DescriptionType::Abstract)
            .subject(Some(self.kind.label()))
            .subjects(metric_subjects(metrics));
        for part in &region.parts {
            if let Some(part_title) = part.title.as_deref() {
                builder = builder.alternative_title(part_title);
            }
        }
        for part in &region.parts {
            let place = part.title.as_deref().or(title);
            builder =
                builder.geolocation(GeoLocation::from_geometry(place, part.geometry.as_ref()));
        }
        let profile = profile_links(builder, urls, path, path, region.id).build();

        let parent = CatchParent {
            identity: &entity.identity,
            title,
            path,
            id: region.id,
        };

        let mut documents = vec![profile];
        documents.extend(catch_documents(
            urls,
            &parent,
            &entity.version,
            &region.catches,
        ));
        documents
    }
}
