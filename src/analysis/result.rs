use serde::Deserialize;
use serde_json::Value;

use crate::models::{AnalysisResult, Impact, Recommendation};
use crate::types::{AppError, AppResult};

#[derive(Deserialize)]
struct RawAnalysis {
    score: f64,
    findings: Vec<String>,
    alerts: Vec<String>,
    recommendations: Vec<RawRecommendation>,
}

#[derive(Deserialize)]
struct RawRecommendation {
    title: String,
    description: String,
    impact: String,
    action: String,
}

/// Parse the completion text into an [`AnalysisResult`], rejecting anything
/// that is not JSON or does not match the expected shape.
pub fn parse_analysis_result(content: &str) -> AppResult<AnalysisResult> {
    let body = strip_code_fence(content);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Analysis(format!("reply is not valid JSON: {e}")))?;
    let raw: RawAnalysis = serde_json::from_value(value)
        .map_err(|e| AppError::Analysis(format!("reply does not match the result schema: {e}")))?;

    if !raw.score.is_finite() || !(0.0..=100.0).contains(&raw.score) {
        return Err(AppError::Analysis(format!(
            "score {} is outside 0-100",
            raw.score
        )));
    }

    let recommendations = raw
        .recommendations
        .into_iter()
        .map(|r| {
            Ok(Recommendation {
                impact: r.impact.parse::<Impact>()?,
                title: r.title,
                description: r.description,
                action: r.action,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(AnalysisResult {
        score: raw.score.round() as u8,
        findings: raw.findings,
        alerts: raw.alerts,
        recommendations,
    })
}

// Some models wrap JSON mode output in a Markdown fence anyway
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
