// Core logic exports
pub mod fallback;
pub mod questionnaire;
pub mod validation;

pub use fallback::{emergency_contacts, fallback_content, filter_by_category};
pub use questionnaire::{
    Field, Questionnaire, QuestionnaireError, RiskDraft, RiskScorer, Step, Transition,
};
pub use validation::{format_errors, validate_risk_data, ValidationIssue};
