//! Data Gateway
//!
//! Entry points the presentation layer calls: ingest a file (or the demo
//! dataset), refresh the analysis, clear everything. Ingestion always finishes
//! before the analysis request is built, and a new dataset is published with
//! no result so stale intelligence is never shown against fresh data.

use std::sync::Arc;

use tracing::{info, warn};

use crate::analysis::{AnalysisMode, ReasoningService};
use crate::ingest::{self, demo_dataset, DEMO_SOURCE_NAME};
use crate::models::{AnalysisResult, Dataset};
use crate::settings::CredentialStore;
use crate::state::DashboardState;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The result is now the published one.
    Applied(AnalysisResult),
    /// A newer dataset or analysis took over while this one was in flight.
    Superseded,
}

#[derive(Clone)]
pub struct DataGateway {
    state: DashboardState,
    reasoning: Arc<dyn ReasoningService>,
    credentials: CredentialStore,
}

impl DataGateway {
    pub fn new(
        state: DashboardState,
        reasoning: Arc<dyn ReasoningService>,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            state,
            reasoning,
            credentials,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn reasoning(&self) -> &dyn ReasoningService {
        self.reasoning.as_ref()
    }

    /// Normalize an uploaded file, publish it, then run the analysis.
    /// A file that fails to parse leaves the current dataset in place.
    pub async fn ingest(
        &self,
        file_name: &str,
        content: &[u8],
        mode: AnalysisMode,
    ) -> AppResult<AnalysisOutcome> {
        let dataset = match ingest::normalize(file_name, content) {
            Ok(dataset) => dataset,
            Err(e) => {
                self.state.record_ingestion_error(&e);
                return Err(e);
            }
        };
        self.publish_and_analyze(file_name, dataset, mode).await
    }

    pub async fn load_demo(&self, mode: AnalysisMode) -> AppResult<AnalysisOutcome> {
        self.publish_and_analyze(DEMO_SOURCE_NAME, demo_dataset(), mode)
            .await
    }

    /// Fresh remote call on the current dataset; nothing is cached.
    pub async fn refresh(&self, mode: AnalysisMode) -> AppResult<AnalysisOutcome> {
        self.analyze_current(mode).await
    }

    pub fn clear(&self) -> u64 {
        info!("Clearing dataset");
        self.state.clear()
    }

    async fn publish_and_analyze(
        &self,
        source_name: &str,
        dataset: Dataset,
        mode: AnalysisMode,
    ) -> AppResult<AnalysisOutcome> {
        info!(source = %source_name, records = dataset.len(), "Publishing dataset");
        self.state.set_named_data(source_name, dataset, None);
        self.analyze_current(mode).await
    }

    async fn analyze_current(&self, mode: AnalysisMode) -> AppResult<AnalysisOutcome> {
        let (ticket, dataset) = self
            .state
            .begin_analysis()
            .ok_or_else(|| AppError::NotFound("no dataset loaded".to_string()))?;
        let credential = self.credentials.current().await;

        match self
            .reasoning
            .analyze(dataset.records(), mode, credential.as_ref())
            .await
        {
            Ok(result) => {
                if self.state.complete_analysis(ticket, result.clone()) {
                    Ok(AnalysisOutcome::Applied(result))
                } else {
                    warn!(?ticket, "Analysis finished after a newer request, result dropped");
                    Ok(AnalysisOutcome::Superseded)
                }
            }
            Err(e) => {
                self.state.fail_analysis(ticket, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ChatMessage, Credential, Record};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Reasoning double: replays queued analysis outcomes and counts calls.
    #[derive(Default)]
    pub(crate) struct StubReasoning {
        outcomes: Mutex<Vec<AppResult<AnalysisResult>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) last_record_count: AtomicUsize,
        pub(crate) last_chat_record_count: AtomicUsize,
    }

    impl StubReasoning {
        pub(crate) fn with(outcomes: Vec<AppResult<AnalysisResult>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                ..Self::default()
            })
        }
    }

    #[async_trait]
    impl ReasoningService for StubReasoning {
        async fn analyze(
            &self,
            records: &[Record],
            _mode: AnalysisMode,
            credential: Option<&Credential>,
        ) -> AppResult<AnalysisResult> {
            credential.ok_or_else(|| AppError::Auth("missing".into()))?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_record_count.store(records.len(), Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AppError::Analysis("no scripted outcome".into())))
        }

        async fn chat(
            &self,
            _history: &[ChatMessage],
            records: Option<&[Record]>,
            _credential: &Credential,
        ) -> String {
            self.last_chat_record_count
                .store(records.map_or(0, <[Record]>::len), Ordering::SeqCst);
            "Revenue is concentrated in Mega Mall.".to_string()
        }
    }

    pub(crate) fn result(score: u8) -> AnalysisResult {
        AnalysisResult {
            score,
            findings: vec!["...".to_string()],
            alerts: vec![],
            recommendations: vec![],
        }
    }

    fn gateway(stub: Arc<StubReasoning>, key: Option<&str>) -> DataGateway {
        DataGateway::new(
            DashboardState::new(),
            stub,
            CredentialStore::in_memory(key.and_then(Credential::new)),
        )
    }

    #[tokio::test]
    async fn test_demo_end_to_end() {
        let stub = StubReasoning::with(vec![Ok(result(72))]);
        let gateway = gateway(stub.clone(), Some("gsk_key"));

        let outcome = gateway.load_demo(AnalysisMode::FullAudit).await.unwrap();

        assert_eq!(outcome, AnalysisOutcome::Applied(result(72)));
        assert_eq!(stub.last_record_count.load(Ordering::SeqCst), 10);
        let snapshot = gateway.state().snapshot();
        assert_eq!(snapshot.dataset.unwrap().len(), 10);
        assert_eq!(snapshot.analysis.unwrap().score, 72);
        assert!(!snapshot.processing);
        assert_eq!(snapshot.source_name.as_deref(), Some(DEMO_SOURCE_NAME));
    }

    #[tokio::test]
    async fn test_csv_upload_end_to_end() {
        let stub = StubReasoning::with(vec![Ok(result(58))]);
        let gateway = gateway(stub.clone(), Some("gsk_key"));
        let csv = "Date,Client,Revenue_Stream,Amount_INR\n2025-01-05,ABC Retail,Product Sales,120000\n2025-01-10,XYZ Traders,Wholesale,85000\n";

        gateway
            .ingest("q1.csv", csv.as_bytes(), AnalysisMode::RiskModeling)
            .await
            .unwrap();

        let snapshot = gateway.state().snapshot();
        assert_eq!(snapshot.dataset.unwrap().len(), 2);
        assert_eq!(snapshot.analysis.unwrap().score, 58);
    }

    #[tokio::test]
    async fn test_bad_file_leaves_previous_state() {
        let stub = StubReasoning::with(vec![Ok(result(72))]);
        let gateway = gateway(stub.clone(), Some("gsk_key"));
        gateway.load_demo(AnalysisMode::FullAudit).await.unwrap();

        let err = gateway
            .ingest("broken.json", b"[{\"Client\":", AnalysisMode::FullAudit)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Schema(_)));
        let snapshot = gateway.state().snapshot();
        assert_eq!(snapshot.dataset.unwrap().len(), 10);
        assert_eq!(snapshot.analysis.unwrap().score, 72);
        assert!(snapshot.ingestion_error.is_some());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_after_bad_upload_clears_ingestion_error() {
        let stub = StubReasoning::with(vec![Ok(result(72)), Ok(result(75))]);
        let gateway = gateway(stub.clone(), Some("gsk_key"));
        gateway.load_demo(AnalysisMode::FullAudit).await.unwrap();
        gateway
            .ingest("broken.json", b"{", AnalysisMode::FullAudit)
            .await
            .unwrap_err();
        assert!(gateway.state().snapshot().ingestion_error.is_some());

        gateway.refresh(AnalysisMode::FullAudit).await.unwrap();

        let snapshot = gateway.state().snapshot();
        assert!(snapshot.ingestion_error.is_none());
        assert_eq!(snapshot.analysis.unwrap().score, 75);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_dataset_and_result() {
        let stub = StubReasoning::with(vec![
            Ok(result(72)),
            Err(AppError::Analysis("not json".into())),
        ]);
        let gateway = gateway(stub.clone(), Some("gsk_key"));
        gateway.load_demo(AnalysisMode::FullAudit).await.unwrap();

        let err = gateway.refresh(AnalysisMode::FullAudit).await.unwrap_err();

        assert!(matches!(err, AppError::Analysis(_)));
        let snapshot = gateway.state().snapshot();
        assert_eq!(snapshot.dataset.unwrap().len(), 10);
        assert_eq!(snapshot.analysis.unwrap().score, 72);
        assert!(snapshot.analysis_error.is_some());
        assert!(!snapshot.processing);
    }

    #[tokio::test]
    async fn test_refresh_always_calls_remote() {
        let stub = StubReasoning::with(vec![Ok(result(70)), Ok(result(71)), Ok(result(73))]);
        let gateway = gateway(stub.clone(), Some("gsk_key"));
        gateway.load_demo(AnalysisMode::FullAudit).await.unwrap();
        gateway.refresh(AnalysisMode::FullAudit).await.unwrap();
        gateway.refresh(AnalysisMode::FullAudit).await.unwrap();

        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
        assert_eq!(gateway.state().snapshot().analysis.unwrap().score, 73);
    }

    #[tokio::test]
    async fn test_missing_credential_surfaces_auth_error() {
        let stub = StubReasoning::with(vec![]);
        let gateway = gateway(stub.clone(), None);

        let err = gateway.load_demo(AnalysisMode::FullAudit).await.unwrap_err();

        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        let snapshot = gateway.state().snapshot();
        assert!(snapshot.analysis.is_none());
        assert!(snapshot.analysis_error.unwrap().contains("Authentication"));
    }

    #[tokio::test]
    async fn test_refresh_without_dataset() {
        let gateway = gateway(StubReasoning::with(vec![]), Some("gsk_key"));
        assert!(matches!(
            gateway.refresh(AnalysisMode::FullAudit).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let gateway = gateway(StubReasoning::with(vec![Ok(result(72))]), Some("gsk_key"));
        gateway.load_demo(AnalysisMode::FullAudit).await.unwrap();

        gateway.clear();
        gateway.clear();

        let snapshot = gateway.state().snapshot();
        assert!(snapshot.dataset.is_none());
        assert!(snapshot.analysis.is_none());
    }
}
