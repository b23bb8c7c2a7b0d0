use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::Provider;
use super::catalog::CatalogStore;
use super::process::RecommendProcess;
use crate::config::LocalConfig;
use crate::error::GatewayError;
use crate::models::SongTitle;

/// Search against the local catalog, recommend through a local program
pub struct LocalProvider {
    catalog: Arc<CatalogStore>,
    process: RecommendProcess,
    search_limit: usize,
}

impl LocalProvider {
    pub fn open(config: &LocalConfig) -> Result<Self> {
        let catalog = CatalogStore::open(&config.catalog_path)?;
        Ok(Self::new(
            catalog,
            RecommendProcess {
                program: config.program.clone(),
                args: config.args.clone(),
                workdir: config.workdir.clone(),
                timeout: config.timeout,
            },
            config.search_limit,
        ))
    }

    pub fn new(catalog: CatalogStore, process: RecommendProcess, search_limit: usize) -> Self {
        LocalProvider {
            catalog: Arc::new(catalog),
            process,
            search_limit,
        }
    }
}

#[async_trait]
impl Provider for LocalProvider {
    async fn search(&self, query: &str) -> Result<Vec<SongTitle>, GatewayError> {
        let catalog = Arc::clone(&self.catalog);
        let query = query.to_string();
        let limit = self.search_limit;

        tokio::task::spawn_blocking(move || catalog.search(&query, limit))
            .await
            .map_err(|e| GatewayError::upstream(format!("catalog task failed: {e}")))?
            .map_err(GatewayError::from)
    }

    async fn recommend(&self, songs: &[SongTitle]) -> Result<Value, GatewayError> {
        self.process.run(songs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Gateway;
    use crate::normalize::normalize;
    use std::time::Duration;

    fn provider(script: &str) -> LocalProvider {
        let catalog = CatalogStore::open_in_memory().unwrap();
        catalog
            .insert_titles(["Bohemian Rhapsody", "Bohemian Like You", "Song C"])
            .unwrap();
        LocalProvider::new(
            catalog,
            RecommendProcess {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "recommend".to_string()],
                workdir: None,
                timeout: Duration::from_secs(10),
            },
            10,
        )
    }

    #[tokio::test]
    async fn test_search_goes_to_the_catalog() {
        let gateway = Gateway::new(Arc::new(provider("exit 1")));

        let songs = gateway.search("BOHEMIAN").await.unwrap();
        assert_eq!(songs, vec!["Bohemian Rhapsody", "Bohemian Like You"]);
    }

    #[tokio::test]
    async fn test_recommend_goes_to_the_process() {
        let gateway = Gateway::new(Arc::new(provider(
            r#"echo '{"recommendations": ["Song C"]}'"#,
        )));

        let payload = gateway.recommend(&["Song A".to_string()]).await.unwrap();
        assert_eq!(normalize(&payload), vec!["Song C"]);
    }

    #[tokio::test]
    async fn test_process_failure_surfaces_as_server_error() {
        let gateway = Gateway::new(Arc::new(provider("exit 1")));

        let err = gateway.recommend(&["Song A".to_string()]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Process(_)));
        assert_eq!(err.http_status(), 500);
    }
}
