//! Search-as-you-type.
//!
//! Every text change re-arms a trailing-edge debounce timer; only when the
//! text has been quiet for the whole window is a search issued. Each issued
//! search gets an id and only the latest id may write the suggestion list, so
//! a slow older response can never overwrite a newer one. Selecting a song,
//! resetting, or firing on blank text also bumps the id, discarding whatever
//! is still in flight.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::models::SongTitle;
use crate::selection::SharedSelection;
use crate::util::lock;

#[derive(Debug, Default)]
struct SearchState {
    text: String,
    suggestions: Vec<SongTitle>,
    latest_request: u64,
}

pub struct SuggestionController {
    gateway: Gateway,
    selection: SharedSelection,
    debounce: Duration,
    state: Arc<Mutex<SearchState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    search: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SuggestionController {
    pub fn new(gateway: Gateway, selection: SharedSelection, debounce: Duration) -> Self {
        SuggestionController {
            gateway,
            selection,
            debounce,
            state: Arc::new(Mutex::new(SearchState::default())),
            timer: Mutex::new(None),
            search: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the search text and restart the debounce window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_text(&self, text: impl Into<String>) {
        lock(&self.state).text = text.into();

        let mut timer = lock(&self.timer);
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        let gateway = self.gateway.clone();
        let state = Arc::clone(&self.state);
        let search = Arc::clone(&self.search);
        let delay = self.debounce;

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The search runs detached so later keystrokes cannot cancel it
            if let Some(handle) = fire(gateway, state) {
                *lock(&search) = Some(handle);
            }
        }));
    }

    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    pub fn suggestions(&self) -> Vec<SongTitle> {
        lock(&self.state).suggestions.clone()
    }

    /// Add a suggestion to the selection and clear the search box.
    pub fn select(&self, song: impl Into<SongTitle>) -> bool {
        let added = lock(&self.selection).add(song);
        self.reset();
        added
    }

    /// Clear text and suggestions, cancel the pending timer and drop in-flight results.
    pub fn reset(&self) {
        if let Some(pending) = lock(&self.timer).take() {
            pending.abort();
        }
        let mut state = lock(&self.state);
        state.text.clear();
        state.suggestions.clear();
        state.latest_request += 1;
    }

    /// Wait for the pending timer and the latest search to finish.
    pub async fn settle(&self) {
        let timer = lock(&self.timer).take();
        if let Some(timer) = timer {
            // An aborted timer is fine: nothing was issued
            let _ = timer.await;
        }
        let search = lock(&self.search).take();
        if let Some(search) = search {
            let _ = search.await;
        }
    }
}

impl Drop for SuggestionController {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.timer).take() {
            pending.abort();
        }
    }
}

/// Debounce window elapsed: clear locally on blank text, otherwise issue the search.
fn fire(gateway: Gateway, state: Arc<Mutex<SearchState>>) -> Option<JoinHandle<()>> {
    let (request_id, query) = {
        let mut current = lock(&state);
        current.latest_request += 1;
        if current.text.trim().is_empty() {
            current.suggestions.clear();
            return None;
        }
        (current.latest_request, current.text.clone())
    };

    Some(tokio::spawn(async move {
        let result = gateway.search(&query).await;

        let mut current = lock(&state);
        if current.latest_request != request_id {
            debug!(query = query.as_str(), "Discarding stale suggestions");
            return;
        }
        match result {
            Ok(songs) => current.suggestions = songs,
            Err(e) => {
                warn!(query = query.as_str(), "Error fetching suggestions: {e}");
                current.suggestions.clear();
            }
        }
    }))
}
