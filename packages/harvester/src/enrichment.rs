//! Secondary fetches that complete an entity before transformation.
//!
//! Two kinds exist: run-scoped lookup tables fetched once at `init()`, and
//! per-entity catch time series fetched for a fixed measure × dimension
//! cross-product.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::extract::HarvestContext;
use crate::provider::{CatchResponse, CatchSeries, Envelope, LookupRow};

/// Run-scoped, read-only id → name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentTable {
    entries: BTreeMap<i64, String>,
}

impl EnrichmentTable {
    /// Build a table from lookup rows; later duplicates of an id are ignored.
    pub fn from_rows(rows: impl IntoIterator<Item = LookupRow>) -> Self {
        let mut entries = BTreeMap::new();
        for row in rows {
            entries.entry(row.id).or_insert(row.name);
        }
        Self { entries }
    }

    /// Fetch a lookup endpoint into a table.
    pub fn fetch(ctx: &HarvestContext<'_>, name: &str, url: &str) -> Result<Self> {
        let envelope: Envelope<Vec<LookupRow>> = ctx.fetch(url)?;
        let table = Self::from_rows(envelope.data);
        tracing::debug!(
            table = name,
            entries = table.len(),
            "Enrichment table fetched"
        );
        Ok(table)
    }

    /// Display name for `id`, if the provider knows it.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Resolve an optional id, trimming blank names to `None`.
    #[must_use]
    pub fn resolve(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.get(id))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
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

/// What a catch series measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatchMeasure {
    Tonnage,
    Value,
}

impl CatchMeasure {
    pub const ALL: [CatchMeasure; 2] = [Self::Tonnage, Self::Value];

    /// Path segment used by the provider.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tonnage => "tonnage",
            Self::Value => "value",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tonnage => "Catch tonnage",
            Self::Value => "Landed value",
        }
    }
}

/// How a catch series is broken down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatchDimension {
    Taxon,
    CommercialGroup,
    FunctionalGroup,
    FishingCountry,
    Sector,
    CatchType,
    ReportingStatus,
}

impl CatchDimension {
    /// Path segment used by the provider.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taxon => "taxon",
            Self::CommercialGroup => "commercialgroup",
            Self::FunctionalGroup => "functionalgroup",
            Self::FishingCountry => "country",
            Self::Sector => "sector",
            Self::CatchType => "catchtype",
            Self::ReportingStatus => "reporting-status",
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Taxon => "taxon",
            Self::CommercialGroup => "commercial group",
            Self::FunctionalGroup => "functional group",
            Self::FishingCountry => "fishing country",
            Self::Sector => "fishing sector",
            Self::CatchType => "catch type",
            Self::ReportingStatus => "reporting status",
        }
    }
}

/// Catch series of one entity for one measure and dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchData {
    pub measure: CatchMeasure,
    pub dimension: CatchDimension,
    pub series: Vec<CatchSeries>,
}

impl CatchData {
    /// First and last year covered by any series.
    #[must_use]
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let years = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().map(|(year, _)| *year));
        years.fold(None, |range, year| match range {
            None => Some((year, year)),
            Some((first, last)) => Some((first.min(year), last.max(year))),
        })
    }

    /// Series labels in provider order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.key.as_str())
    }
}

/// Fetch catch series for every measure × dimension pair.
///
/// Pairs answered with the provider's no-data signal contribute nothing;
/// transport and shape failures abort the entity.
pub fn fetch_catches(
    ctx: &HarvestContext<'_>,
    path: &str,
    id: i64,
    dimensions: &[CatchDimension],
) -> Result<Vec<CatchData>> {
    let mut catches = Vec::new();

    for measure in CatchMeasure::ALL {
        for &dimension in dimensions {
            let url = ctx
                .urls()
                .catch(path, measure.as_str(), dimension.as_str(), id, "json");
            let response: CatchResponse = ctx.fetch(&url)?;

            match response.into_series() {
                Some(series) => catches.push(CatchData {
                    measure,
                    dimension,
                    series,
                }),
                None => tracing::debug!(
                    path,
                    id,
                    measure = measure.as_str(),
                    dimension = dimension.as_str(),
                    "No catch data"
                ),
            }
        }
    }

    Ok(catches)
}
