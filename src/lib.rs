//! Moy Risk - stroke-risk self-assessment client
//!
//! This library drives the risk questionnaire, talks to the remote scoring
//! service (anonymous sessions, risk calculation, educational content) and
//! keeps the last result and cached content in local storage.

pub mod commands;
pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use self::core::{validate_risk_data, Questionnaire, RiskScorer};
pub use models::{ApiResponse, EducationalContent, RiskData, RiskResult, StoredResult};
pub use services::{ApiClient, ApiError, LocalStorage, ResponseCache};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let data = commands::sample_risk_data();
        assert!(validate_risk_data(&data).is_empty());
    }
}
