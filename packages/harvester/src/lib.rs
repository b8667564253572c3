//! Sea Around Us Harvester - Harvest fisheries datasets into catalog documents.
//!
//! This crate extracts entities (marine regions, countries, taxa, fishing
//! entities) from a read-only fisheries statistics API and transforms each
//! of them into normalized catalog documents. Runs are gated by the
//! provider's dataset version, so an unchanged dataset costs one index
//! request per category.
//!
//! # Example
//!
//! ```
//! use seaaroundus_harvester::categories::CategoryRegistry;
//! use seaaroundus_harvester::config::HarvesterConfig;
//!
//! let config = HarvesterConfig::new();
//! let registry = CategoryRegistry::new(&config);
//! assert!(registry.get("eez").is_ok());
//! assert!(registry.get("unknown").is_err());
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Run configuration, validation and URL templates
//! - [`error`]: Error types and Result alias
//! - [`transport`]: HTTP transport with retries, and an in-memory replay transport
//! - [`provider`]: Wire shapes of the provider's responses
//! - [`grouping`]: Ordered grouping of index rows by natural key
//! - [`extract`]: Generic entity extractor and its lazy extraction sequence
//! - [`enrichment`]: Lookup tables and catch time-series fetches
//! - [`document`]: Catalog documents and the omission rules
//! - [`categories`]: Concrete categories and the category registry
//! - [`store`]: Committed-version persistence
//! - [`sink`]: Document consumers
//! - [`runner`]: Version-gated pipeline runner
//! - [`cli`]: Command-line interface

pub mod categories;
pub mod cli;
pub mod config;
pub mod document;
pub mod enrichment;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod provider;
pub mod runner;
pub mod sink;
pub mod store;
pub mod transport;

// Re-export commonly used items
pub use categories::{CategoryRegistry, Harvest};
pub use config::HarvesterConfig;
pub use document::{CatalogDocument, DocumentTransformer};
pub use error::{HarvesterError, Result, TransportError, TransportErrorKind};
pub use extract::{EntityExtractor, EntitySource, HarvestContext, RawEntity, VersionToken};
pub use runner::{PipelineRunner, RunOptions, RunOutcome, RunState};
pub use sink::{DocumentSink, JsonLinesSink};
pub use store::{FileVersionStore, MemoryVersionStore, VersionStore};
pub use transport::{HttpTransport, MemoryTransport, Transport};
