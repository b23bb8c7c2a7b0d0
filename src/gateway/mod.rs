//! Boundary to whichever search/recommendation provider is configured.
//!
//! Two strategies implement [`Provider`]: [`remote::RemoteProvider`] talks to
//! an HTTP recommender, [`local::LocalProvider`] queries a SQLite catalog and
//! runs a local recommendation program. [`Gateway`] applies the rules that hold
//! for both: blank searches and empty selections never reach a provider.

pub mod catalog;
pub mod local;
pub mod process;
pub mod remote;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::models::SongTitle;

use self::local::LocalProvider;
use self::remote::RemoteProvider;

/// A search/recommendation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Titles matching `query`, in provider order.
    async fn search(&self, query: &str) -> Result<Vec<SongTitle>, GatewayError>;

    /// Raw recommendation payload for the whole selection.
    async fn recommend(&self, songs: &[SongTitle]) -> Result<Value, GatewayError>;
}

/// Cheap-to-clone handle on the configured provider
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn Provider>,
}

impl Gateway {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Gateway { provider }
    }

    /// Build the provider strategy named by the configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let provider: Arc<dyn Provider> = match config {
            ProviderConfig::Remote(remote) => {
                info!(base_url = %remote.base_url, "Using remote recommender");
                Arc::new(RemoteProvider::new(remote))
            }
            ProviderConfig::Local(local) => {
                info!(
                    catalog = %local.catalog_path.display(),
                    program = %local.program,
                    "Using local catalog and recommendation process"
                );
                Arc::new(LocalProvider::open(local)?)
            }
        };
        Ok(Gateway::new(provider))
    }

    /// Search the catalog. Blank queries short-circuit to an empty list.
    pub async fn search(&self, query: &str) -> Result<Vec<SongTitle>, GatewayError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        debug!(query, "Dispatching search");
        self.provider.search(query).await
    }

    /// Ask for recommendations based on the whole selection.
    pub async fn recommend(&self, selection: &[SongTitle]) -> Result<Value, GatewayError> {
        if selection.is_empty() {
            return Err(GatewayError::Validation(
                "at least one song is required".to_string(),
            ));
        }
        debug!(songs = selection.len(), "Dispatching recommendation request");
        self.provider.recommend(selection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_blank_queries_never_reach_the_provider() {
        let mut provider = MockProvider::new();
        provider.expect_search().never();
        let gateway = Gateway::new(Arc::new(provider));

        for query in ["", "   ", "\t\n"] {
            assert!(gateway.search(query).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_queries_are_forwarded_verbatim() {
        let mut provider = MockProvider::new();
        provider
            .expect_search()
            .withf(|query: &str| query == "  Bohemian ")
            .times(1)
            .returning(|_| Ok(vec!["Bohemian Rhapsody".to_string()]));
        let gateway = Gateway::new(Arc::new(provider));

        let songs = gateway.search("  Bohemian ").await.unwrap();
        assert_eq!(songs, vec!["Bohemian Rhapsody".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_selection_is_a_validation_error() {
        let mut provider = MockProvider::new();
        provider.expect_recommend().never();
        let gateway = Gateway::new(Arc::new(provider));

        let err = gateway.recommend(&[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_whole_selection_is_sent_in_one_call() {
        let mut provider = MockProvider::new();
        provider
            .expect_recommend()
            .withf(|songs: &[SongTitle]| songs == ["Song A", "Song B"])
            .times(1)
            .returning(|_| Ok(json!({ "recommendations": ["Song C"] })));
        let gateway = Gateway::new(Arc::new(provider));

        let payload = gateway
            .recommend(&["Song A".to_string(), "Song B".to_string()])
            .await
            .unwrap();
        assert_eq!(payload, json!({ "recommendations": ["Song C"] }));
    }
}
