use std::time::Duration;

use crate::gateway::Gateway;
use crate::models::SongTitle;
use crate::recommend::{RecommendationController, RequestOutcome};
use crate::selection::{SelectionStore, SharedSelection};
use crate::suggest::SuggestionController;
use crate::util::lock;

/// One browsing session: a search box, "My Jams" and the recommendations for it
pub struct Session {
    selection: SharedSelection,
    search: SuggestionController,
    recommender: RecommendationController,
}

impl Session {
    pub fn new(gateway: Gateway, debounce: Duration) -> Self {
        let selection = SelectionStore::shared();
        Session {
            search: SuggestionController::new(gateway.clone(), selection.clone(), debounce),
            recommender: RecommendationController::new(gateway, selection.clone()),
            selection,
        }
    }

    pub fn type_text(&self, text: impl Into<String>) {
        self.search.set_text(text);
    }

    pub async fn settle(&self) {
        self.search.settle().await;
    }

    pub fn search_text(&self) -> String {
        self.search.text()
    }

    pub fn suggestions(&self) -> Vec<SongTitle> {
        self.search.suggestions()
    }

    pub fn select(&self, song: impl Into<SongTitle>) -> bool {
        self.search.select(song)
    }

    pub fn remove(&self, song: &str) -> bool {
        self.recommender.remove(song)
    }

    pub fn selection(&self) -> Vec<SongTitle> {
        lock(&self.selection).list().to_vec()
    }

    pub fn selection_len(&self) -> usize {
        lock(&self.selection).len()
    }

    pub fn has_selection(&self) -> bool {
        !lock(&self.selection).is_empty()
    }

    pub async fn request_recommendations(&self) -> RequestOutcome {
        self.recommender.request_recommendations().await
    }

    pub fn recommendations(&self) -> Vec<SongTitle> {
        self.recommender.recommendations()
    }

    pub fn is_loading(&self) -> bool {
        self.recommender.is_in_flight()
    }

    pub fn clear(&self) {
        self.recommender.clear_selection(&self.search);
    }
}
