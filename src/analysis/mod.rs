//! Remote Analysis
//!
//! Everything between a normalized [`Dataset`](crate::models::Dataset) and a
//! validated [`AnalysisResult`](crate::models::AnalysisResult):
//!
//! ```text
//! records ──▶ build_request ──▶ LLM adapter ──▶ parse_analysis_result ──▶ AnalysisResult
//!                 │                                   │
//!            AuthError if no                  AnalysisError on transport
//!            credential                       failure or shape mismatch
//! ```
//!
//! The conversational sibling ([`RemoteReasoning::chat`]) shares transport and
//! credential handling but never fails: faults become [`CHAT_FALLBACK_REPLY`].

pub mod client;
pub mod prompts;
pub mod request;
pub mod result;

pub use client::{ReasoningService, RemoteReasoning, CHAT_FALLBACK_REPLY};
pub use request::{build_chat_request, build_request, ReasoningOptions, ReasoningRequest};
pub use result::parse_analysis_result;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::AppError;

/// Records submitted per analysis; the rest are dropped as a sampling policy.
pub const MAX_ANALYSIS_RECORDS: usize = 100;
/// Upper bound on records serialized into the analysis prompt.
pub const MAX_PROMPT_RECORDS: usize = 150;
/// Records shown to the conversational advisor.
pub const CHAT_EXCERPT_RECORDS: usize = 30;

/// Fixed analysis tasks the reasoning service can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    FullAudit,
    RiskModeling,
    GrowthEngine,
    TaxBrain,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 4] = [
        AnalysisMode::FullAudit,
        AnalysisMode::RiskModeling,
        AnalysisMode::GrowthEngine,
        AnalysisMode::TaxBrain,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AnalysisMode::FullAudit => "full_audit",
            AnalysisMode::RiskModeling => "risk_modeling",
            AnalysisMode::GrowthEngine => "growth_engine",
            AnalysisMode::TaxBrain => "tax_brain",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AnalysisMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        AnalysisMode::ALL
            .into_iter()
            .find(|mode| mode.id() == normalized)
            .ok_or_else(|| AppError::InvalidRequest(format!("unknown analysis mode: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_ids_round_trip() {
        for mode in AnalysisMode::ALL {
            assert_eq!(mode.id().parse::<AnalysisMode>().unwrap(), mode);
        }
        assert_eq!("Risk-Modeling".parse::<AnalysisMode>().unwrap(), AnalysisMode::RiskModeling);
        assert_eq!(AnalysisMode::default(), AnalysisMode::FullAudit);
    }

    #[test]
    fn test_unknown_mode() {
        assert!(matches!(
            "crystal_ball".parse::<AnalysisMode>(),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
