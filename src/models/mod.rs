// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ActionItem, AnonymousSession, ContentCategory, ContentSource, EducationalContent,
    EmergencyContact, Gender, Lifestyle, Recommendations, RiskCategory, RiskData, RiskResult,
    SmokingStatus, StoredResult, SymptomFrequency, SymptomItem,
};
pub use requests::SessionRequest;
pub use responses::{ApiResponse, ErrorBody};
