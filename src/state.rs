//! Application State
//!
//! Owns the single current [`Dataset`] and its [`AnalysisResult`]. Views
//! subscribe to a `watch` channel and re-derive their display state whenever a
//! new snapshot is published.
//!
//! Invariants:
//! - an analysis result is never present without a dataset
//! - replacing or clearing the dataset always drops the previous result
//! - only the most recently started analysis may publish (last request wins)

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::{AnalysisResult, Dataset};
use crate::types::AppError;

#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    /// Bumped on every dataset replacement or clear.
    pub revision: u64,
    pub source_name: Option<String>,
    pub dataset: Option<Arc<Dataset>>,
    pub analysis: Option<Arc<AnalysisResult>>,
    pub processing: bool,
    pub ingestion_error: Option<String>,
    pub analysis_error: Option<String>,
    latest_request: u64,
}

/// Identifies one analysis run against one dataset revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub revision: u64,
    pub sequence: u64,
}

#[derive(Clone)]
pub struct DashboardState {
    sender: Arc<watch::Sender<DashboardSnapshot>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(DashboardSnapshot::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.sender.subscribe()
    }

    /// Replace dataset and result together. `(None, None)` clears both; a
    /// result without a dataset is discarded. Any in-flight analysis is
    /// orphaned. Returns the new revision.
    pub fn set_data(&self, dataset: Option<Dataset>, result: Option<AnalysisResult>) -> u64 {
        self.publish(None, dataset, result)
    }

    /// Same as [`set_data`](Self::set_data), also recording where the data came from.
    pub fn set_named_data(
        &self,
        source_name: &str,
        dataset: Dataset,
        result: Option<AnalysisResult>,
    ) -> u64 {
        self.publish(Some(source_name.to_string()), Some(dataset), result)
    }

    pub fn clear(&self) -> u64 {
        self.set_data(None, None)
    }

    fn publish(
        &self,
        source_name: Option<String>,
        dataset: Option<Dataset>,
        result: Option<AnalysisResult>,
    ) -> u64 {
        if dataset.is_none() && result.is_some() {
            warn!("Discarding analysis result published without a dataset");
        }
        let result = dataset.as_ref().and(result);

        let mut revision = 0;
        self.sender.send_modify(|state| {
            state.revision += 1;
            state.source_name = dataset.as_ref().and(source_name);
            state.dataset = dataset.map(Arc::new);
            state.analysis = result.map(Arc::new);
            state.processing = false;
            state.ingestion_error = None;
            state.analysis_error = None;
            revision = state.revision;
        });

        info!(revision, "Dashboard data replaced");
        revision
    }

    /// Surface a failed ingestion. The current dataset stays untouched.
    pub fn record_ingestion_error(&self, error: &AppError) {
        let message = error.to_string();
        self.sender.send_modify(|state| state.ingestion_error = Some(message));
    }

    /// Mark an analysis as started on the current dataset, clearing any stale
    /// ingestion or analysis error. Returns `None` when no dataset is loaded.
    pub fn begin_analysis(&self) -> Option<(AnalysisTicket, Arc<Dataset>)> {
        let mut started = None;
        self.sender.send_if_modified(|state| {
            let Some(dataset) = state.dataset.clone() else {
                return false;
            };
            state.latest_request += 1;
            state.processing = true;
            state.ingestion_error = None;
            state.analysis_error = None;
            started = Some((
                AnalysisTicket {
                    revision: state.revision,
                    sequence: state.latest_request,
                },
                dataset,
            ));
            true
        });
        started
    }

    /// Publish a result. Returns `false` (and changes nothing) when the ticket
    /// is stale: the dataset changed or a newer analysis was started.
    pub fn complete_analysis(&self, ticket: AnalysisTicket, result: AnalysisResult) -> bool {
        self.finish(ticket, |state| {
            state.analysis = Some(Arc::new(result));
            state.analysis_error = None;
        })
    }

    /// Record a failed analysis. The previous result, if any, is kept.
    pub fn fail_analysis(&self, ticket: AnalysisTicket, error: &AppError) -> bool {
        let message = error.to_string();
        self.finish(ticket, |state| state.analysis_error = Some(message))
    }

    fn finish<F>(&self, ticket: AnalysisTicket, apply: F) -> bool
    where
        F: FnOnce(&mut DashboardSnapshot),
    {
        let applied = self.sender.send_if_modified(|state| {
            if !is_current(state, ticket) {
                return false;
            }
            state.processing = false;
            apply(state);
            true
        });

        if !applied {
            debug!(?ticket, "Ignoring stale analysis outcome");
        }
        applied
    }
}

fn is_current(state: &DashboardSnapshot, ticket: AnalysisTicket) -> bool {
    state.dataset.is_some()
        && state.revision == ticket.revision
        && state.latest_request == ticket.sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::demo_dataset;

    fn result(score: u8) -> AnalysisResult {
        AnalysisResult {
            score,
            findings: vec![],
            alerts: vec![],
            recommendations: vec![],
        }
    }

    #[test]
    fn test_set_data_replaces_both() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), Some(result(72)));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.dataset.unwrap().len(), 10);
        assert_eq!(snapshot.analysis.unwrap().score, 72);
        assert_eq!(snapshot.revision, 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), Some(result(72)));
        for _ in 0..3 {
            state.set_data(None, None);
            let snapshot = state.snapshot();
            assert!(snapshot.dataset.is_none());
            assert!(snapshot.analysis.is_none());
        }
    }

    #[test]
    fn test_result_without_dataset_is_dropped() {
        let state = DashboardState::new();
        state.set_data(None, Some(result(10)));
        assert!(state.snapshot().analysis.is_none());
    }

    #[test]
    fn test_new_dataset_invalidates_result() {
        let state = DashboardState::new();
        state.set_named_data("first.csv", demo_dataset(), Some(result(80)));
        state.set_named_data("second.csv", demo_dataset(), None);

        let snapshot = state.snapshot();
        assert!(snapshot.analysis.is_none());
        assert_eq!(snapshot.source_name.as_deref(), Some("second.csv"));
    }

    #[test]
    fn test_ingestion_error_keeps_dataset() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), Some(result(55)));
        state.record_ingestion_error(&AppError::Schema("bad json".into()));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.dataset.unwrap().len(), 10);
        assert_eq!(snapshot.analysis.unwrap().score, 55);
        assert!(snapshot.ingestion_error.unwrap().contains("bad json"));
    }

    #[test]
    fn test_new_analysis_clears_ingestion_error() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), Some(result(55)));
        state.record_ingestion_error(&AppError::Schema("bad json".into()));

        let (ticket, _) = state.begin_analysis().unwrap();
        assert!(state.snapshot().ingestion_error.is_none());
        assert!(state.complete_analysis(ticket, result(60)));
        assert!(state.snapshot().ingestion_error.is_none());
    }

    #[test]
    fn test_begin_requires_dataset() {
        let state = DashboardState::new();
        assert!(state.begin_analysis().is_none());
        assert!(!state.snapshot().processing);
    }

    #[test]
    fn test_latest_request_wins() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), None);

        let (first, _) = state.begin_analysis().unwrap();
        let (second, _) = state.begin_analysis().unwrap();

        assert!(state.complete_analysis(second, result(90)));
        assert!(!state.complete_analysis(first, result(10)));
        assert_eq!(state.snapshot().analysis.unwrap().score, 90);
    }

    #[test]
    fn test_result_for_replaced_dataset_is_discarded() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), None);
        let (ticket, _) = state.begin_analysis().unwrap();

        state.set_data(Some(Dataset::default()), None);
        assert!(!state.complete_analysis(ticket, result(40)));
        assert!(state.snapshot().analysis.is_none());

        state.clear();
        assert!(!state.fail_analysis(ticket, &AppError::Analysis("late".into())));
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let state = DashboardState::new();
        state.set_data(Some(demo_dataset()), Some(result(61)));
        let (ticket, _) = state.begin_analysis().unwrap();
        assert!(state.snapshot().processing);

        assert!(state.fail_analysis(ticket, &AppError::Analysis("timeout".into())));
        let snapshot = state.snapshot();
        assert!(!snapshot.processing);
        assert_eq!(snapshot.analysis.unwrap().score, 61);
        assert!(snapshot.analysis_error.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let state = DashboardState::new();
        let mut rx = state.subscribe();

        state.set_data(Some(demo_dataset()), None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().revision, 1);

        state.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().dataset.is_none());
    }
}
