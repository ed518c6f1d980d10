//! Registry of the bibliographic sources compiled into this build.

use std::sync::Arc;

use super::{Source, SourceError};
use crate::config::Config;
use crate::models::SourceType;
use crate::utils::HttpClient;

/// Registry for all available sources
///
/// Sources are kept in registration order, which is the default query
/// order. Registering a second source of the same type replaces the first.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every enabled source from configuration
    ///
    /// All sources share one connection pool; each gets its own pacer from
    /// `[rate_limits]`.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let mut registry = Self::new();
        let http = HttpClient::from_config(&config.http, &config.retry)?;
        let endpoints = &config.endpoints;
        let paced = |source: SourceType| http.paced(config.rate_limits.limits_for(source).pacing);

        #[cfg(feature = "source-pubmed")]
        registry.register(Arc::new(
            super::PubMedSource::new(
                paced(SourceType::PubMed),
                &endpoints.pubmed_search,
                &endpoints.pubmed_summary,
            )
            .with_database(&config.pubmed.database)
            .with_affiliation(config.pubmed.affiliation_filter.clone()),
        ));

        #[cfg(feature = "source-arxiv")]
        registry.register(Arc::new(super::ArxivSource::new(
            paced(SourceType::Arxiv),
            &endpoints.arxiv,
        )));

        #[cfg(feature = "source-crossref")]
        registry.register(Arc::new(
            super::CrossRefSource::new(paced(SourceType::CrossRef), &endpoints.crossref)
                .with_mailto(config.http.mailto.clone()),
        ));

        #[cfg(feature = "source-elsevier")]
        registry.register(Arc::new(super::ElsevierSource::new(
            paced(SourceType::Elsevier),
            &endpoints.elsevier,
            config.api_keys.elsevier_key(),
        )));

        #[cfg(feature = "source-springer")]
        registry.register(Arc::new(super::SpringerSource::new(
            paced(SourceType::Springer),
            &endpoints.springer,
            config.api_keys.springer_key(),
        )));

        #[cfg(feature = "source-wiley")]
        registry.register(Arc::new(super::WileySource::new(
            paced(SourceType::Wiley),
            &endpoints.wiley,
        )));

        #[cfg(feature = "source-plos")]
        registry.register(Arc::new(super::PlosSource::new(
            paced(SourceType::Plos),
            &endpoints.plos,
        )));

        #[cfg(feature = "source-mdpi")]
        registry.register(Arc::new(
            super::MdpiSource::new(paced(SourceType::Mdpi), &endpoints.mdpi)
                .with_mailto(config.http.mailto.clone()),
        ));

        Ok(registry)
    }

    /// Register a new source
    pub fn register(&mut self, source: Arc<dyn Source>) {
        let source_type = source.source_type();
        match self
            .sources
            .iter_mut()
            .find(|existing| existing.source_type() == source_type)
        {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by type
    pub fn get(&self, source_type: SourceType) -> Option<&Arc<dyn Source>> {
        self.sources
            .iter()
            .find(|source| source.source_type() == source_type)
    }

    /// Get a source by type, returning an error if it is not compiled in
    pub fn get_required(&self, source_type: SourceType) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(source_type).ok_or_else(|| {
            SourceError::InvalidArgument(format!(
                "source '{}' is not available in this build",
                source_type.id()
            ))
        })
    }

    /// The requested sources, in the requested order
    pub fn select(&self, wanted: &[SourceType]) -> Result<Vec<Arc<dyn Source>>, SourceError> {
        wanted
            .iter()
            .map(|source_type| self.get_required(*source_type).map(Arc::clone))
            .collect()
    }

    /// Get all registered sources
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().map(|source| source.id())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
