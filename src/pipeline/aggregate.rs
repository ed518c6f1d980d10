//! Fan-out of author queries across sources.
//!
//! Every (author, source) pair is one task on a [`JoinSet`]. A shared
//! semaphore bounds the number of pairs in flight and each source has its
//! own semaphore on top, so PubMed can be limited to one author at a time
//! while other sources run in parallel. Results are merged by (author index,
//! source index) once every task has finished, never by completion order.
//!
//! Dropping the future returned by [`Aggregator::aggregate`] drops the
//! `JoinSet`, which aborts every fetch still in flight.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::paginate::collect_publications;
use crate::config::{Config, RateLimitConfig};
use crate::models::{AggregateResult, AuthorQuery, Publication, SourceType};
use crate::sources::{Source, SourceError, SourceRegistry};

/// Errors that stop an aggregation before any request is made
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Clone)]
struct SourceSlot {
    source: Arc<dyn Source>,
    permits: Arc<Semaphore>,
}

/// Runs author queries against a set of sources
#[derive(Debug, Clone)]
pub struct Aggregator {
    slots: Vec<SourceSlot>,
    workers: Arc<Semaphore>,
}

impl Aggregator {
    /// An aggregator with no sources and `max_concurrent_requests` workers
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self {
            slots: Vec::new(),
            workers: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Build the registry and limits from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let registry = SourceRegistry::from_config(config)?;
        Ok(Self::with_registry(&registry, &config.rate_limits))
    }

    /// Use every source in `registry` with the limits configured for it
    pub fn with_registry(registry: &SourceRegistry, limits: &RateLimitConfig) -> Self {
        registry.all().fold(
            Self::new(limits.max_concurrent_requests),
            |aggregator, source| {
                let max_concurrent = limits.limits_for(source.source_type()).max_concurrent;
                aggregator.with_source(Arc::clone(source), max_concurrent)
            },
        )
    }

    /// Add a source that serves at most `max_concurrent` authors at once
    pub fn with_source(mut self, source: Arc<dyn Source>, max_concurrent: usize) -> Self {
        let slot = SourceSlot {
            source,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        };
        let source_type = slot.source.source_type();
        match self
            .slots
            .iter_mut()
            .find(|existing| existing.source.source_type() == source_type)
        {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
        self
    }

    /// Sources this aggregator can query, in registration order
    pub fn source_types(&self) -> Vec<SourceType> {
        self.slots
            .iter()
            .map(|slot| slot.source.source_type())
            .collect()
    }

    fn slot(&self, source_type: SourceType) -> Result<&SourceSlot, AggregateError> {
        self.slots
            .iter()
            .find(|slot| slot.source.source_type() == source_type)
            .ok_or_else(|| {
                AggregateError::InvalidArgument(format!(
                    "source '{}' is not available",
                    source_type.id()
                ))
            })
    }

    /// Collect up to `rows` publications per source for every author
    ///
    /// Blank names are skipped and a repeated name is queried once. A failing
    /// (author, source) pair contributes nothing; it never fails the run.
    pub async fn aggregate(
        &self,
        author_names: &[String],
        rows: i64,
        sources: &[SourceType],
    ) -> Result<AggregateResult, AggregateError> {
        let rows = usize::try_from(rows).map_err(|_| {
            AggregateError::InvalidArgument(format!(
                "row count must be non-negative (received {})",
                rows
            ))
        })?;

        let mut seen = HashSet::new();
        let queries: Vec<AuthorQuery> = author_names
            .iter()
            .filter_map(|name| AuthorQuery::new(name, rows, sources))
            .filter(|query| seen.insert(query.name.clone()))
            .collect();

        let skipped = author_names.len() - queries.len();
        if skipped > 0 {
            tracing::debug!("Skipped {} blank or repeated author names", skipped);
        }

        self.run(queries).await
    }

    /// Run prepared queries
    pub async fn run(&self, queries: Vec<AuthorQuery>) -> Result<AggregateResult, AggregateError> {
        // Resolve every source up front so an unavailable one fails before any request
        let mut plan: Vec<Vec<SourceSlot>> = Vec::with_capacity(queries.len());
        for query in &queries {
            let slots = query
                .sources
                .iter()
                .map(|source_type| self.slot(*source_type).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            plan.push(slots);
        }

        tracing::info!(
            "Aggregating {} authors across {} (author, source) pairs",
            queries.len(),
            plan.iter().map(Vec::len).sum::<usize>()
        );

        let mut tasks = JoinSet::new();
        for (author_index, (query, slots)) in queries.iter().zip(plan).enumerate() {
            if query.rows == 0 {
                continue;
            }
            for (source_index, slot) in slots.into_iter().enumerate() {
                let workers = Arc::clone(&self.workers);
                let author = query.name.clone();
                let rows = query.rows;
                tasks.spawn(async move {
                    let publications = fetch_pair(slot, workers, &author, rows).await;
                    (author_index, source_index, publications)
                });
            }
        }

        let mut buckets: HashMap<(usize, usize), Vec<Publication>> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((author_index, source_index, publications)) => {
                    buckets.insert((author_index, source_index), publications);
                }
                Err(e) => tracing::error!("Aggregation task failed: {}", e),
            }
        }

        let mut result = AggregateResult::new();
        for (author_index, query) in queries.into_iter().enumerate() {
            let publications: Vec<Publication> = (0..query.sources.len())
                .filter_map(|source_index| buckets.remove(&(author_index, source_index)))
                .flatten()
                .collect();
            result.insert(query.name, publications);
        }

        tracing::info!(
            "Collected {} publications for {} authors",
            result.publication_count(),
            result.len()
        );

        Ok(result)
    }
}

/// One (author, source) pair; any error is logged and yields no records
async fn fetch_pair(
    slot: SourceSlot,
    workers: Arc<Semaphore>,
    author: &str,
    rows: usize,
) -> Vec<Publication> {
    let source = slot.source.as_ref();

    // The source permit is taken first so a queued PubMed task does not hold a worker
    let (Ok(_source_permit), Ok(_worker)) = (
        slot.permits.acquire().await,
        workers.acquire().await,
    ) else {
        return Vec::new();
    };

    tracing::info!("{}: searching for '{}'", source.name(), author);

    let rows = i64::try_from(rows).unwrap_or(i64::MAX);
    match collect_publications(source, author, rows).await {
        Ok(publications) => {
            tracing::info!(
                "{}: {} publications for '{}'",
                source.name(),
                publications.len(),
                author
            );
            publications
        }
        Err(e) => {
            tracing::warn!("{}: no data for '{}': {}", source.name(), author, e);
            Vec::new()
        }
    }
}
