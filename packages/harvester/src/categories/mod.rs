//! Concrete harvest categories and their registry.
//!
//! Each category is a single strategy value implementing both
//! [`EntitySource`] and [`DocumentTransformer`]. Differences between
//! categories are data (URL path, label, catch dimensions, key function).

mod catch;
pub mod country;
pub mod fishing_entity;
pub mod regions;
pub mod taxon;

pub use country::CountryCategory;
pub use fishing_entity::FishingEntityCategory;
pub use regions::{RegionCategory, RegionKind};
pub use taxon::TaxonCategory;

use crate::config::{validate_category_name, HarvesterConfig, UrlBuilder};
use crate::document::{DocumentBuilder, DocumentTransformer, WebLinkType};
use crate::error::{HarvesterError, Result};
use crate::extract::{EntityExtractor, EntitySource, HarvestContext, VersionToken};
use crate::runner::{PipelineRunner, RunOutcome};
use crate::sink::DocumentSink;

/// Object-safe view of a category, used by the CLI to drive any category
/// by name.
pub trait Harvest {
    fn name(&self) -> &str;

    /// Run `init()` only and report `(size, version)`.
    fn inspect(&self, ctx: HarvestContext<'_>) -> Result<(usize, VersionToken)>;

    /// Run the full pipeline for this category.
    fn harvest(
        &self,
        runner: &mut PipelineRunner<'_>,
        sink: &mut dyn DocumentSink,
    ) -> Result<RunOutcome>;
}

impl<C> Harvest for C
where
    C: EntitySource + DocumentTransformer<Entity = <C as EntitySource>::Entity>,
{
    fn name(&self) -> &str {
        self.category()
    }

    fn inspect(&self, ctx: HarvestContext<'_>) -> Result<(usize, VersionToken)> {
        let mut extractor = EntityExtractor::new(self, ctx);
        extractor.init()?;
        Ok((extractor.size()?, extractor.version()?.clone()))
    }

    fn harvest(
        &self,
        runner: &mut PipelineRunner<'_>,
        sink: &mut dyn DocumentSink,
    ) -> Result<RunOutcome> {
        runner.run(self, sink)
    }
}

/// A registered category with its one-line description.
pub struct CategoryEntry<'a> {
    description: &'static str,
    category: Box<dyn Harvest + 'a>,
}

impl<'a> CategoryEntry<'a> {
    fn new(description: &'static str, category: impl Harvest + 'a) -> Self {
        Self {
            description,
            category: Box::new(category),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.category.name()
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    #[must_use]
    pub fn category(&self) -> &(dyn Harvest + 'a) {
        self.category.as_ref()
    }
}

/// All categories known to the harvester, in harvest order.
pub struct CategoryRegistry<'a> {
    entries: Vec<CategoryEntry<'a>>,
}

impl<'a> CategoryRegistry<'a> {
    pub fn new(config: &'a HarvesterConfig) -> Self {
        let mut entries: Vec<CategoryEntry<'a>> = RegionKind::ALL
            .into_iter()
            .map(|kind| CategoryEntry::new(kind.description(), RegionCategory::new(kind, config)))
            .collect();

        entries.push(CategoryEntry::new(
            "Countries with their sub-territories",
            CountryCategory::new(config),
        ));
        entries.push(CategoryEntry::new(
            "Fished taxa with level and group",
            TaxonCategory::new(config),
        ));
        entries.push(CategoryEntry::new(
            "Fishing entities and their catches",
            FishingEntityCategory::new(config),
        ));

        Self { entries }
    }

    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Result<&(dyn Harvest + 'a)> {
        validate_category_name(name)?;
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .map(CategoryEntry::category)
            .ok_or_else(|| HarvesterError::UnknownCategory(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(CategoryEntry::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryEntry<'a>> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Web page, API source and JSON download of an entity's profile.
fn profile_links(
    builder: DocumentBuilder,
    urls: UrlBuilder<'_>,
    site_path: &str,
    api_path: &str,
    id: i64,
) -> DocumentBuilder {
    let detail = urls.detail(api_path, id);
    builder
        .weblink(
            "Sea Around Us web page",
            Some(urls.site(site_path, id).as_str()),
            WebLinkType::ViewUrl,
        )
        .weblink(
            "Sea Around Us API",
            Some(detail.as_str()),
            WebLinkType::SourceUrl,
        )
        .downloadable("Profile (JSON)", detail, "application/json")
}
