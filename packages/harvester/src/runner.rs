//! Pipeline runner: extractor → transformer → sink, gated by version.
//!
//! Per category and run the runner moves through
//! `Idle → Initializing → VersionUnchanged → Idle` when the provider's
//! dataset has not changed, or
//! `Idle → Initializing → Extracting ⇄ Transforming → Committed → Idle`
//! otherwise. Any failure ends the run in `Failed` without committing the
//! version, so the next run starts over.

use std::fmt;

use crate::document::DocumentTransformer;
use crate::error::Result;
use crate::extract::{EntityExtractor, EntitySource, HarvestContext, VersionToken};
use crate::sink::DocumentSink;
use crate::store::VersionStore;

/// Run state of the category currently being harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Initializing,
    VersionUnchanged,
    Extracting,
    Transforming,
    Committed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::VersionUnchanged => "version-unchanged",
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Knobs for one runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Harvest even when the provider version matches the committed one.
    pub force: bool,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub category: String,
    pub version: VersionToken,
    /// `Committed` or `VersionUnchanged`.
    pub state: RunState,
    /// Entities announced by the extractor.
    pub size: usize,
    pub entities: usize,
    pub documents: usize,
}

impl RunOutcome {
    #[must_use]
    pub fn skipped(&self) -> bool {
        self.state == RunState::VersionUnchanged
    }
}

/// Progress callback: `(category, entities done, entities total)`.
pub type ProgressFn<'a> = dyn FnMut(&str, usize, usize) + 'a;

/// Drives categories one at a time against a shared transport and store.
pub struct PipelineRunner<'a> {
    ctx: HarvestContext<'a>,
    store: &'a mut dyn VersionStore,
    options: RunOptions,
    state: RunState,
    progress: Option<Box<ProgressFn<'a>>>,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(ctx: HarvestContext<'a>, store: &'a mut dyn VersionStore) -> Self {
        Self {
            ctx,
            store,
            options: RunOptions::default(),
            state: RunState::Idle,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: impl FnMut(&str, usize, usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// State reached by the most recent run; `Failed` after an error.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, category: &str, next: RunState) {
        tracing::trace!(category, from = %self.state, to = %next, "State transition");
        self.state = next;
    }

    /// Harvest one category into `sink`.
    ///
    /// The category's version is committed only after its whole sequence
    /// has been transformed and accepted by the sink.
    pub fn run<C>(&mut self, category: &C, sink: &mut dyn DocumentSink) -> Result<RunOutcome>
    where
        C: EntitySource + DocumentTransformer<Entity = <C as EntitySource>::Entity>,
    {
        let name = category.category().to_string();
        match self.run_inner(&name, category, sink) {
            Ok(outcome) => {
                self.transition(&name, RunState::Idle);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(&name, RunState::Failed);
                tracing::error!(
                    category = %name,
                    identity = e.identity().unwrap_or("-"),
                    url = e.url().unwrap_or("-"),
                    error = %e,
                    "Harvest failed"
                );
                Err(e)
            }
        }
    }

    fn run_inner<C>(
        &mut self,
        name: &str,
        category: &C,
        sink: &mut dyn DocumentSink,
    ) -> Result<RunOutcome>
    where
        C: EntitySource + DocumentTransformer<Entity = <C as EntitySource>::Entity>,
    {
        self.transition(name, RunState::Initializing);

        let mut extractor = EntityExtractor::new(category, self.ctx);
        extractor.init()?;
        let version = extractor.version()?.clone();
        let size = extractor.size()?;

        let last = self.store.last_version(name)?;
        if !self.options.force && last.as_deref() == Some(version.as_str()) {
            self.transition(name, RunState::VersionUnchanged);
            tracing::info!(category = name, version = %version, "Version unchanged, skipping");
            return Ok(RunOutcome {
                category: name.to_string(),
                version,
                state: RunState::VersionUnchanged,
                size,
                entities: 0,
                documents: 0,
            });
        }

        tracing::info!(
            category = name,
            version = %version,
            previous = last.as_deref().unwrap_or("-"),
            entities = size,
            "Harvesting"
        );

        self.transition(name, RunState::Extracting);
        let mut entities = 0;
        let mut documents = 0;

        for item in extractor.extract_all()? {
            let entity = item?;
            self.transition(name, RunState::Transforming);

            for document in category.transform(&entity) {
                sink.accept(document)?;
                documents += 1;
            }
            entities += 1;

            if let Some(progress) = self.progress.as_mut() {
                progress(name, entities, size);
            }
            self.transition(name, RunState::Extracting);
        }

        sink.finish()?;
        self.store.commit(name, &version, documents)?;
        self.transition(name, RunState::Committed);

        tracing::info!(category = name, entities, documents, "Harvest committed");

        Ok(RunOutcome {
            category: name.to_string(),
            version,
            state: RunState::Committed,
            size,
            entities,
            documents,
        })
    }
}
