// FinAura - financial forensic intelligence over tabular business data

pub mod analysis;
pub mod chat;
pub mod config;
pub mod gateway;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod routes;
pub mod settings;  // Credential storage and the settings API
pub mod state;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
