//! Generic entity extraction.
//!
//! A category describes *what* to fetch through [`EntitySource`];
//! [`EntityExtractor`] owns *how*: one index fetch at `init()`, grouping of
//! the index rows by natural key, and a lazy [`Extraction`] sequence that
//! performs one detail fetch (plus enrichment) per step.

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{HarvesterConfig, UrlBuilder};
use crate::error::{HarvesterError, Result};
use crate::grouping::{group_rows, EntityGroup};
use crate::provider::Envelope;
use crate::transport::{fetch, Transport};

/// Opaque token identifying the provider's dataset generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a category needs to talk to the provider during one run.
#[derive(Clone, Copy)]
pub struct HarvestContext<'a> {
    pub transport: &'a dyn Transport,
    pub config: &'a HarvesterConfig,
}

impl<'a> HarvestContext<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a HarvesterConfig) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub fn urls(&self) -> UrlBuilder<'a> {
        self.config.urls()
    }

    /// Fetch and deserialize `url`.
    pub fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        fetch(self.transport, url)
    }

    /// Fetch an index endpoint and read the dataset version from its metadata.
    ///
    /// An index without a version is a schema error: the version gate
    /// cannot work without it.
    pub fn fetch_index<T: DeserializeOwned>(&self, url: &str) -> Result<(T, VersionToken)> {
        let envelope: Envelope<T> = self.fetch(url)?;
        let version = envelope
            .version()
            .map(VersionToken::new)
            .ok_or_else(|| HarvesterError::schema(url, "index response has no metadata.version"))?;
        Ok((envelope.data, version))
    }
}

/// Result of a category's index discovery.
#[derive(Debug, Clone)]
pub struct IndexListing<R, T> {
    /// Index rows in provider order.
    pub rows: Vec<R>,
    /// Dataset version read once from the index metadata.
    pub version: VersionToken,
    /// Run-scoped enrichment tables, `()` for categories without any.
    pub tables: T,
}

/// Extraction capability of one category.
pub trait EntitySource {
    /// One row of the index listing.
    type Row;
    /// Natural key grouping index rows into one entity.
    type Key: Eq + Hash + Clone + fmt::Display;
    /// Enrichment tables fetched once at `init()`.
    type Tables;
    /// Detail payload, enriched and ready for transformation.
    type Entity;

    /// Category name, also the identity prefix.
    fn category(&self) -> &str;

    /// Fetch the index and any enrichment tables.
    fn discover(&self, ctx: &HarvestContext<'_>) -> Result<IndexListing<Self::Row, Self::Tables>>;

    /// Natural key of an index row.
    fn natural_key(&self, row: &Self::Row) -> Self::Key;

    /// Identity of the entity behind `key`.
    fn identity(&self, key: &Self::Key) -> String {
        format!("{}-{key}", self.category())
    }

    /// Detail fetch plus enrichment for one group of index rows.
    fn fetch_entity(
        &self,
        ctx: &HarvestContext<'_>,
        group: EntityGroup<Self::Key, Self::Row>,
        tables: &Self::Tables,
    ) -> Result<Self::Entity>;
}

/// One extracted entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity<E> {
    pub identity: String,
    pub version: VersionToken,
    pub payload: E,
}

enum ExtractorState<S: EntitySource> {
    Uninitialized,
    Ready {
        groups: Vec<EntityGroup<S::Key, S::Row>>,
        tables: S::Tables,
        version: VersionToken,
    },
    Consumed {
        size: usize,
        version: VersionToken,
    },
}

/// Drives one category's extraction: `init()`, then `extract_all()` once.
pub struct EntityExtractor<'a, S: EntitySource> {
    source: &'a S,
    ctx: HarvestContext<'a>,
    state: ExtractorState<S>,
}

impl<'a, S: EntitySource> EntityExtractor<'a, S> {
    pub fn new(source: &'a S, ctx: HarvestContext<'a>) -> Self {
        Self {
            source,
            ctx,
            state: ExtractorState::Uninitialized,
        }
    }

    /// Fetch the index and enrichment tables, group the rows and record the
    /// version. On failure the extractor is left uninitialized.
    pub fn init(&mut self) -> Result<()> {
        self.state = ExtractorState::Uninitialized;
        let category = self.source.category();

        let listing = self.source.discover(&self.ctx)?;
        let row_count = listing.rows.len();
        let groups = group_rows(listing.rows, |row| self.source.natural_key(row));

        tracing::info!(
            category,
            rows = row_count,
            entities = groups.len(),
            version = %listing.version,
            "Index fetched"
        );

        self.state = ExtractorState::Ready {
            groups,
            tables: listing.tables,
            version: listing.version,
        };
        Ok(())
    }

    /// Number of entities the sequence yields; distinct natural keys, not
    /// raw index rows.
    pub fn size(&self) -> Result<usize> {
        match &self.state {
            ExtractorState::Uninitialized => Err(self.not_initialized()),
            ExtractorState::Ready { groups, .. } => Ok(groups.len()),
            ExtractorState::Consumed { size, .. } => Ok(*size),
        }
    }

    /// Dataset version recorded at `init()`.
    pub fn version(&self) -> Result<&VersionToken> {
        match &self.state {
            ExtractorState::Uninitialized => Err(self.not_initialized()),
            ExtractorState::Ready { version, .. } | ExtractorState::Consumed { version, .. } => {
                Ok(version)
            }
        }
    }

    /// Hand out the lazy extraction sequence. Single-pass: a second call
    /// fails until `init()` runs again.
    pub fn extract_all(&mut self) -> Result<Extraction<'a, S>> {
        let state = std::mem::replace(&mut self.state, ExtractorState::Uninitialized);
        match state {
            ExtractorState::Ready {
                groups,
                tables,
                version,
            } => {
                self.state = ExtractorState::Consumed {
                    size: groups.len(),
                    version: version.clone(),
                };
                Ok(Extraction {
                    source: self.source,
                    ctx: self.ctx,
                    groups: groups.into_iter(),
                    tables,
                    version,
                    failed: false,
                })
            }
            ExtractorState::Consumed { size, version } => {
                self.state = ExtractorState::Consumed { size, version };
                Err(HarvesterError::SequenceConsumed(
                    self.source.category().to_string(),
                ))
            }
            ExtractorState::Uninitialized => Err(self.not_initialized()),
        }
    }

    fn not_initialized(&self) -> HarvesterError {
        HarvesterError::NotInitialized(self.source.category().to_string())
    }
}

/// Lazy, finite, single-pass sequence of extracted entities.
///
/// Each step performs the fetches for exactly one entity. The first failure
/// is yielded as an [`HarvesterError::Extraction`] carrying the entity's
/// identity; the sequence ends after it.
pub struct Extraction<'a, S: EntitySource> {
    source: &'a S,
    ctx: HarvestContext<'a>,
    groups: std::vec::IntoIter<EntityGroup<S::Key, S::Row>>,
    tables: S::Tables,
    version: VersionToken,
    failed: bool,
}

impl<S: EntitySource> Iterator for Extraction<'_, S> {
    type Item = Result<RawEntity<S::Entity>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let group = self.groups.next()?;
        let identity = self.source.identity(group.key());
        tracing::debug!(identity = %identity, members = group.len(), "Extracting entity");

        match self.source.fetch_entity(&self.ctx, group, &self.tables) {
            Ok(payload) => Some(Ok(RawEntity {
                identity,
                version: self.version.clone(),
                payload,
            })),
            Err(source) => {
                self.failed = true;
                tracing::warn!(identity = %identity, error = %source, "Extraction step failed");
                Some(Err(HarvesterError::Extraction {
                    category: self.source.category().to_string(),
                    identity,
                    source: Box::new(source),
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.groups.len()))
        }
    }
}
