// Prompt text for the reasoning service

use super::AnalysisMode;

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are FinAura Ultra-Core, a financial intelligence and strategy engine. \
Analyze the provided raw dataset with forensic precision: look for deep correlations, seasonal anomalies and margin drift. \
Avoid generic advice. If the data is sparse, give the most probable range instead of refusing. \
Your output MUST be a single strict JSON object with no narrative outside the JSON.";

pub const REQUIRED_STRUCTURE: &str = r#"{ "score": number (0-100), "findings": string[], "alerts": string[], "recommendations": [{"title": string, "description": string, "impact": "LOW"|"MEDIUM"|"HIGH"|"CRITICAL", "action": string}] }"#;

const CHAT_DIRECTIVE: &str = "Give ONLY short, precise and professional answers. No preamble, no filler. \
Keep every reply under 100 words and ground it in the data.";

pub fn task_instruction(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::FullAudit => "Execute an SME financial forensic audit. Analyze the interplay between revenue velocity, \
expense burn patterns and liquidity ratios, and identify non-obvious operational inefficiencies. \
Provide a precise health score (0-100), key multi-dimensional findings, critical risk vectors and high-impact strategic moves.",
        AnalysisMode::RiskModeling => "Construct a stress-test scenario model. Map the current financial metrics against high market \
volatility and supply chain disruption, quantify liquidity decay and identify catastrophic failure points. \
Output detailed mitigation blueprints.",
        AnalysisMode::GrowthEngine => "Compare the business metrics with industry growth benchmarks. Detect revenue expansion \
opportunities and capital allocation optimizations, and recommend specific financial instruments (MSME loans, G-Secs and similar) \
for treasury management.",
        AnalysisMode::TaxBrain => "Scan for multi-layered tax leakage and structural compliance anomalies. Evaluate GST \
input-output parity and regulatory risk, and forecast tax-adjusted cash flow.",
    }
}

pub fn analysis_user_prompt(mode: AnalysisMode, dataset_json: &str) -> String {
    format!(
        "TASK: {}\nINPUT DATASET: {}\nREQUIRED STRUCTURE: {}",
        task_instruction(mode),
        dataset_json,
        REQUIRED_STRUCTURE
    )
}

/// `excerpt_json` is `None` when no dataset is loaded.
pub fn chat_system_prompt(excerpt_json: Option<&str>) -> String {
    format!(
        "You are the FinAura Neural Advisor. Business data excerpt: {}\n{}",
        excerpt_json.unwrap_or("None"),
        CHAT_DIRECTIVE
    )
}
