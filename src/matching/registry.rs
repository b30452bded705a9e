//! Configuration-name lookup of matcher implementations.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::{MatcherSettings, Settings};

use super::remote::{Node2VecMatcher, PrismaMatcher};
use super::service::{HttpMatchService, MatchService};
use super::two_opt::TwoOptMatcher;
use super::{Matcher, MatcherError, MatcherResult};

/// What matchers need beyond their own parameters.
#[derive(Debug, Clone)]
pub struct MatcherEnvironment {
    /// Root of the exported metadata graphs.
    pub graphs_dir: PathBuf,

    /// Root of the exported database features.
    pub features_dir: PathBuf,

    pub service: Arc<dyn MatchService>,
}

impl MatcherEnvironment {
    /// Environment talking HTTP to the configured service URL.
    pub fn from_settings(settings: &Settings) -> MatcherResult<Self> {
        let url = settings.service.resolved_url()?;
        let service = HttpMatchService::new(url)?;
        Ok(Self::with_service(settings, Arc::new(service)))
    }

    pub fn with_service(settings: &Settings, service: Arc<dyn MatchService>) -> Self {
        Self {
            graphs_dir: settings.paths.graphs_dir.clone(),
            features_dir: settings.paths.features_dir.clone(),
            service,
        }
    }
}

/// Builds a matcher from its `params` table.
pub type MatcherFactory = Box<
    dyn Fn(&toml::Table, &MatcherEnvironment) -> MatcherResult<Arc<dyn Matcher>> + Send + Sync,
>;

/// Maps configuration names to matcher factories.
pub struct MatcherRegistry {
    environment: MatcherEnvironment,
    factories: BTreeMap<String, MatcherFactory>,
}

impl MatcherRegistry {
    /// An empty registry.
    pub fn new(environment: MatcherEnvironment) -> Self {
        Self {
            environment,
            factories: BTreeMap::new(),
        }
    }

    /// A registry with `two_opt`, `prisma` and `node2vec`.
    pub fn with_builtin(environment: MatcherEnvironment) -> Self {
        let mut registry = Self::new(environment);
        registry.register("two_opt", |params, _| {
            let matcher: Arc<dyn Matcher> =
                Arc::new(TwoOptMatcher::new(parse_params("two_opt", params)?));
            Ok(matcher)
        });
        registry.register("prisma", |params, environment| {
            let matcher: Arc<dyn Matcher> = Arc::new(PrismaMatcher::new(
                parse_params("prisma", params)?,
                environment.clone(),
            ));
            Ok(matcher)
        });
        registry.register("node2vec", |params, environment| {
            let matcher: Arc<dyn Matcher> = Arc::new(Node2VecMatcher::new(
                parse_params("node2vec", params)?,
                environment.clone(),
            ));
            Ok(matcher)
        });
        registry
    }

    /// Register or replace the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&toml::Table, &MatcherEnvironment) -> MatcherResult<Arc<dyn Matcher>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn environment(&self) -> &MatcherEnvironment {
        &self.environment
    }

    /// Instantiate the matcher a settings entry names.
    pub fn create(&self, settings: &MatcherSettings) -> MatcherResult<Arc<dyn Matcher>> {
        let factory = self
            .factories
            .get(&settings.matcher)
            .ok_or_else(|| MatcherError::UnknownMatcher(settings.matcher.clone()))?;
        factory(&settings.params, &self.environment)
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("environment", &self.environment)
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Deserialize a matcher's `params` table into its typed parameters.
fn parse_params<T: DeserializeOwned>(matcher: &str, params: &toml::Table) -> MatcherResult<T> {
    toml::Value::Table(params.clone())
        .try_into()
        .map_err(|source| MatcherError::InvalidParams {
            matcher: matcher.to_string(),
            source,
        })
}
