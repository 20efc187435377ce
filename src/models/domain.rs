use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Physical activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifestyle {
    Active,
    Sedentary,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    Current,
    Former,
    Never,
}

/// How often a symptom is experienced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomFrequency {
    Often,
    Rarely,
    Never,
}

/// Questionnaire answers submitted to the scoring service
///
/// Range checks mirror the ones the backend enforces, so an invalid record
/// is rejected before it ever leaves the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RiskData {
    #[validate(range(min = 35, max = 65, message = "Age must be between 35 and 65 years"))]
    pub age: u8,
    pub gender: Gender,
    #[validate(range(min = 100.0, max = 250.0, message = "Height must be between 100 and 250 cm"))]
    pub height_cm: f64,
    #[validate(range(min = 30.0, max = 300.0, message = "Weight must be between 30 and 300 kg"))]
    pub weight_kg: f64,
    pub family_history: bool,
    pub lifestyle: Lifestyle,
    pub smoking: SmokingStatus,
    pub high_bp: bool,
    pub diabetes: bool,
    pub palpitations: SymptomFrequency,
    pub shortness_of_breath: SymptomFrequency,
    pub dizziness: SymptomFrequency,
    pub atrial_fibrillation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 10.0, message = "LDL cholesterol must be between 0 and 10 mmol/L"))]
    pub ldl_cholesterol: Option<f64>,
}

impl RiskData {
    /// Body mass index rounded to one decimal, as the backend reports it
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        let bmi = self.weight_kg / (height_m * height_m);
        (bmi * 10.0).round() / 10.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low risk",
            Self::Moderate => "Moderate risk",
            Self::High => "High risk",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A single prioritized recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: u32,
    pub title: String,
    pub description: String,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub general: String,
    #[serde(default)]
    pub actions: Vec<ActionItem>,
    #[serde(default)]
    pub emergency_advice: String,
}

/// Scoring outcome produced by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub risk_category: RiskCategory,
    pub risk_percentage: f64,
    pub risk_description: String,
    #[serde(default = "default_timeframe_months")]
    pub timeframe_months: u32,
    #[serde(default)]
    pub bmi: Option<f64>,
    pub recommendations: Recommendations,
    #[serde(default)]
    pub disclaimer: String,
    pub calculation_id: String,
    pub timestamp: String,
}

fn default_timeframe_months() -> u32 { 6 }

impl RiskResult {
    /// Whether the percentage lies in the closed range [0, 100]
    pub fn has_valid_percentage(&self) -> bool {
        self.risk_percentage.is_finite() && (0.0..=100.0).contains(&self.risk_percentage)
    }

    /// Actions sorted by ascending priority
    pub fn prioritized_actions(&self) -> Vec<&ActionItem> {
        let mut actions: Vec<&ActionItem> = self.recommendations.actions.iter().collect();
        actions.sort_by_key(|a| a.priority);
        actions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomItem {
    pub code: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub emergency_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub number: String,
    pub description: String,
}

/// Symptom listings and emergency numbers
///
/// The server omits the arrays that a category filter excludes, so every
/// list defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationalContent {
    #[serde(default)]
    pub typical_symptoms: Vec<SymptomItem>,
    #[serde(default)]
    pub atypical_symptoms: Vec<SymptomItem>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// Symptom category filter for educational content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Typical,
    Atypical,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typical => "typical",
            Self::Atypical => "atypical",
        }
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "typical" => Ok(Self::Typical),
            "atypical" => Ok(Self::Atypical),
            other => Err(format!("unknown category '{}': expected typical or atypical", other)),
        }
    }
}

/// Where a piece of educational content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Network,
    Cache,
    Fallback,
}

/// Anonymous session issued by the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousSession {
    pub session_id: String,
    #[serde(default)]
    pub expires_at: f64,
    #[serde(default)]
    pub data_retention_hours: u32,
    #[serde(default)]
    pub message: String,
}

/// Last submission persisted on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    #[serde(rename = "riskData")]
    pub risk_data: RiskData,
    pub result: RiskResult,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}
