use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::gateway::Gateway;
use crate::models::SongTitle;
use crate::normalize::normalize;
use crate::selection::SharedSelection;
use crate::suggest::SuggestionController;
use crate::util::lock;

/// What a call to [`RecommendationController::request_recommendations`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Nothing selected, no request issued
    Skipped,
    /// Another request is still running
    AlreadyInFlight,
    /// The list was replaced with this many recommendations
    Completed(usize),
    /// The request failed and the list was cleared
    Failed,
    /// The selection was cleared before the response arrived
    Discarded,
}

/// Holds the in-flight flag for as long as it lives
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RecommendationController {
    gateway: Gateway,
    selection: SharedSelection,
    recommendations: Mutex<Vec<SongTitle>>,
    in_flight: AtomicBool,
    // Bumped by clear_selection so late results are dropped
    epoch: AtomicU64,
}

impl RecommendationController {
    pub fn new(gateway: Gateway, selection: SharedSelection) -> Self {
        RecommendationController {
            gateway,
            selection,
            recommendations: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Request recommendations for the current selection and replace the list.
    pub async fn request_recommendations(&self) -> RequestOutcome {
        let songs = lock(&self.selection).list().to_vec();
        if songs.is_empty() {
            debug!("No songs selected, skipping recommendation request");
            return RequestOutcome::Skipped;
        }

        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            warn!("Recommendation request already in flight, ignoring trigger");
            return RequestOutcome::AlreadyInFlight;
        };
        let epoch = self.epoch.load(Ordering::Acquire);

        let result = self.gateway.recommend(&songs).await;

        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!("Selection cleared while request was in flight, discarding result");
            return RequestOutcome::Discarded;
        }

        match result {
            Ok(payload) => {
                let recommendations = normalize(&payload);
                let count = recommendations.len();
                info!(selected = songs.len(), count, "Received recommendations");
                *lock(&self.recommendations) = recommendations;
                RequestOutcome::Completed(count)
            }
            Err(e) => {
                e.log("Error getting recommendations");
                lock(&self.recommendations).clear();
                RequestOutcome::Failed
            }
        }
    }

    /// Empty the selection, the recommendations and the search box together.
    pub fn clear_selection(&self, search: &SuggestionController) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        lock(&self.selection).clear();
        lock(&self.recommendations).clear();
        search.reset();
    }

    pub fn remove(&self, song: &str) -> bool {
        lock(&self.selection).remove(song)
    }

    pub fn recommendations(&self) -> Vec<SongTitle> {
        lock(&self.recommendations).clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}
