use std::future::Future;

use thiserror::Error;

use crate::core::validation::{
    format_errors, validate_risk_data, ValidationIssue, AGE_RANGE_MESSAGE,
};
use crate::models::{
    Gender, Lifestyle, RiskData, RiskResult, SmokingStatus, SymptomFrequency,
};
use crate::services::ApiError;

/// Anything that can turn answers into a risk result
///
/// Implemented by the HTTP client; tests substitute their own scorer.
pub trait RiskScorer {
    fn calculate_risk(
        &self,
        data: &RiskData,
    ) -> impl Future<Output = Result<RiskResult, ApiError>> + Send;
}

/// Errors that stop a questionnaire submission
#[derive(Debug, Error)]
pub enum QuestionnaireError {
    #[error("Please fill in all required fields: {}", field_names(.0))]
    MissingFields(Vec<Field>),

    #[error("{}", issue_messages(.0))]
    Invalid(Vec<ValidationIssue>),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn field_names(fields: &[Field]) -> String {
    fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
}

fn issue_messages(issues: &[ValidationIssue]) -> String {
    let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
    format_errors(&messages)
}

/// The four pages of the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Basics,
    Lifestyle,
    Conditions,
    Symptoms,
}

pub const TOTAL_STEPS: u8 = 4;

pub const ALL_STEPS: [Step; 4] = [Step::Basics, Step::Lifestyle, Step::Conditions, Step::Symptoms];

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Self::Basics => 1,
            Self::Lifestyle => 2,
            Self::Conditions => 3,
            Self::Symptoms => 4,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Basics => "Basic information",
            Self::Lifestyle => "Lifestyle and habits",
            Self::Conditions => "Health conditions",
            Self::Symptoms => "Symptoms",
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self {
            Self::Basics => &[Field::Age, Field::Gender, Field::HeightCm, Field::WeightKg],
            Self::Lifestyle => &[Field::Lifestyle, Field::Smoking, Field::LdlCholesterol],
            Self::Conditions => &[
                Field::HighBp,
                Field::Diabetes,
                Field::FamilyHistory,
                Field::AtrialFibrillation,
            ],
            Self::Symptoms => &[Field::Palpitations, Field::ShortnessOfBreath, Field::Dizziness],
        }
    }

    fn next(&self) -> Option<Step> {
        match self {
            Self::Basics => Some(Self::Lifestyle),
            Self::Lifestyle => Some(Self::Conditions),
            Self::Conditions => Some(Self::Symptoms),
            Self::Symptoms => None,
        }
    }

    fn previous(&self) -> Option<Step> {
        match self {
            Self::Basics => None,
            Self::Lifestyle => Some(Self::Basics),
            Self::Conditions => Some(Self::Lifestyle),
            Self::Symptoms => Some(Self::Conditions),
        }
    }
}

/// A single questionnaire answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Age,
    Gender,
    HeightCm,
    WeightKg,
    Lifestyle,
    Smoking,
    LdlCholesterol,
    HighBp,
    Diabetes,
    FamilyHistory,
    AtrialFibrillation,
    Palpitations,
    ShortnessOfBreath,
    Dizziness,
}

/// Fields that must be answered before submission
pub const REQUIRED_FIELDS: [Field; 9] = [
    Field::Age,
    Field::Gender,
    Field::HeightCm,
    Field::WeightKg,
    Field::Lifestyle,
    Field::Smoking,
    Field::Palpitations,
    Field::ShortnessOfBreath,
    Field::Dizziness,
];

impl Field {
    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::HeightCm => "height_cm",
            Self::WeightKg => "weight_kg",
            Self::Lifestyle => "lifestyle",
            Self::Smoking => "smoking",
            Self::LdlCholesterol => "ldl_cholesterol",
            Self::HighBp => "high_bp",
            Self::Diabetes => "diabetes",
            Self::FamilyHistory => "family_history",
            Self::AtrialFibrillation => "atrial_fibrillation",
            Self::Palpitations => "palpitations",
            Self::ShortnessOfBreath => "shortness_of_breath",
            Self::Dizziness => "dizziness",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Age => "Age (35-65)",
            Self::Gender => "Gender [male/female]",
            Self::HeightCm => "Height, cm",
            Self::WeightKg => "Weight, kg",
            Self::Lifestyle => "Physical activity [active/sedentary/inactive]",
            Self::Smoking => "Smoking [current/former/never]",
            Self::LdlCholesterol => "LDL cholesterol, mmol/L (optional, Enter to skip)",
            Self::HighBp => "Blood pressure above 130 mmHg? [yes/no]",
            Self::Diabetes => "Diabetes? [yes/no]",
            Self::FamilyHistory => "Stroke in close relatives? [yes/no]",
            Self::AtrialFibrillation => "Diagnosed atrial fibrillation? [yes/no]",
            Self::Palpitations => "Palpitations [often/rarely/never]",
            Self::ShortnessOfBreath => "Shortness of breath [often/rarely/never]",
            Self::Dizziness => "Dizziness [often/rarely/never]",
        }
    }

    pub fn is_required(&self) -> bool {
        REQUIRED_FIELDS.contains(self)
    }

    /// Look a field up by its wire name
    pub fn from_name(name: &str) -> Option<Field> {
        ALL_STEPS
            .iter()
            .flat_map(|s| s.fields().iter().copied())
            .find(|f| f.name() == name)
    }

    /// The step on which this field is asked
    pub fn step(&self) -> Step {
        ALL_STEPS
            .iter()
            .copied()
            .find(|s| s.fields().contains(self))
            .unwrap_or(Step::Basics)
    }

    /// Parse raw text input and store it in the draft
    ///
    /// Empty input clears optional fields, resets yes/no fields to "no" and
    /// is rejected for required fields. Range checks happen at submission.
    pub fn apply(&self, draft: &mut RiskDraft, raw: &str) -> Result<(), String> {
        let value = raw.trim().to_lowercase();

        if value.is_empty() {
            return match self {
                Self::LdlCholesterol => {
                    draft.ldl_cholesterol = None;
                    Ok(())
                }
                Self::HighBp | Self::Diabetes | Self::FamilyHistory | Self::AtrialFibrillation => {
                    self.set_flag(draft, false);
                    Ok(())
                }
                _ => Err(format!("{} is required", self.name())),
            };
        }

        match self {
            Self::Age => draft.age = Some(parse_age(&value)?),
            Self::HeightCm => draft.height_cm = Some(parse_number::<f64>(&value)?),
            Self::WeightKg => draft.weight_kg = Some(parse_number::<f64>(&value)?),
            Self::LdlCholesterol => {
                draft.ldl_cholesterol = Some(parse_number::<f64>(&value.replace(',', "."))?)
            }
            Self::Gender => {
                draft.gender = Some(match value.as_str() {
                    "male" | "m" => Gender::Male,
                    "female" | "f" => Gender::Female,
                    _ => return Err(format!("'{}' is not one of: male, female", raw.trim())),
                })
            }
            Self::Lifestyle => {
                draft.lifestyle = Some(match value.as_str() {
                    "active" => Lifestyle::Active,
                    "sedentary" => Lifestyle::Sedentary,
                    "inactive" => Lifestyle::Inactive,
                    _ => {
                        return Err(format!(
                            "'{}' is not one of: active, sedentary, inactive",
                            raw.trim()
                        ))
                    }
                })
            }
            Self::Smoking => {
                draft.smoking = Some(match value.as_str() {
                    "current" => SmokingStatus::Current,
                    "former" => SmokingStatus::Former,
                    "never" => SmokingStatus::Never,
                    _ => {
                        return Err(format!(
                            "'{}' is not one of: current, former, never",
                            raw.trim()
                        ))
                    }
                })
            }
            Self::HighBp | Self::Diabetes | Self::FamilyHistory | Self::AtrialFibrillation => {
                let flag = match value.as_str() {
                    "yes" | "y" | "true" => true,
                    "no" | "n" | "false" => false,
                    _ => return Err(format!("'{}' is not yes or no", raw.trim())),
                };
                self.set_flag(draft, flag);
            }
            Self::Palpitations => draft.palpitations = Some(parse_frequency(&value, raw)?),
            Self::ShortnessOfBreath => {
                draft.shortness_of_breath = Some(parse_frequency(&value, raw)?)
            }
            Self::Dizziness => draft.dizziness = Some(parse_frequency(&value, raw)?),
        }

        Ok(())
    }

    fn set_flag(&self, draft: &mut RiskDraft, flag: bool) {
        match self {
            Self::HighBp => draft.high_bp = flag,
            Self::Diabetes => draft.diabetes = flag,
            Self::FamilyHistory => draft.family_history = flag,
            Self::AtrialFibrillation => draft.atrial_fibrillation = flag,
            _ => {}
        }
    }

    pub fn is_answered(&self, draft: &RiskDraft) -> bool {
        match self {
            Self::Age => draft.age.is_some(),
            Self::Gender => draft.gender.is_some(),
            Self::HeightCm => draft.height_cm.is_some(),
            Self::WeightKg => draft.weight_kg.is_some(),
            Self::Lifestyle => draft.lifestyle.is_some(),
            Self::Smoking => draft.smoking.is_some(),
            Self::LdlCholesterol => draft.ldl_cholesterol.is_some(),
            Self::Palpitations => draft.palpitations.is_some(),
            Self::ShortnessOfBreath => draft.shortness_of_breath.is_some(),
            Self::Dizziness => draft.dizziness.is_some(),
            Self::HighBp | Self::Diabetes | Self::FamilyHistory | Self::AtrialFibrillation => true,
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("'{}' is not a valid number", value))
}

/// Whole years; anything outside `u8` gets the age range message
fn parse_age(value: &str) -> Result<u8, String> {
    match value.parse::<i64>() {
        Ok(age) => u8::try_from(age).map_err(|_| AGE_RANGE_MESSAGE.to_string()),
        Err(_) if value.parse::<f64>().is_ok_and(f64::is_finite) => {
            Err("Age must be a whole number of years".to_string())
        }
        Err(_) => Err(format!("'{}' is not a valid number", value)),
    }
}

fn parse_frequency(value: &str, raw: &str) -> Result<SymptomFrequency, String> {
    match value {
        "often" => Ok(SymptomFrequency::Often),
        "rarely" => Ok(SymptomFrequency::Rarely),
        "never" => Ok(SymptomFrequency::Never),
        _ => Err(format!("'{}' is not one of: often, rarely, never", raw.trim())),
    }
}

/// Partially filled answers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskDraft {
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub family_history: bool,
    pub lifestyle: Option<Lifestyle>,
    pub smoking: Option<SmokingStatus>,
    pub high_bp: bool,
    pub diabetes: bool,
    pub palpitations: Option<SymptomFrequency>,
    pub shortness_of_breath: Option<SymptomFrequency>,
    pub dizziness: Option<SymptomFrequency>,
    pub atrial_fibrillation: bool,
    pub ldl_cholesterol: Option<f64>,
}

impl RiskDraft {
    /// Required fields that have no answer yet, in questionnaire order
    pub fn missing_fields(&self) -> Vec<Field> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !f.is_answered(self))
            .collect()
    }

    /// Build a complete record, or report which required fields are missing
    pub fn to_risk_data(&self) -> Result<RiskData, Vec<Field>> {
        match (
            self.age,
            self.gender,
            self.height_cm,
            self.weight_kg,
            self.lifestyle,
            self.smoking,
            self.palpitations,
            self.shortness_of_breath,
            self.dizziness,
        ) {
            (
                Some(age),
                Some(gender),
                Some(height_cm),
                Some(weight_kg),
                Some(lifestyle),
                Some(smoking),
                Some(palpitations),
                Some(shortness_of_breath),
                Some(dizziness),
            ) => Ok(RiskData {
                age,
                gender,
                height_cm,
                weight_kg,
                family_history: self.family_history,
                lifestyle,
                smoking,
                high_bp: self.high_bp,
                diabetes: self.diabetes,
                palpitations,
                shortness_of_breath,
                dizziness,
                atrial_fibrillation: self.atrial_fibrillation,
                ldl_cholesterol: self.ldl_cholesterol,
            }),
            _ => Err(self.missing_fields()),
        }
    }
}

impl From<&RiskData> for RiskDraft {
    fn from(data: &RiskData) -> Self {
        Self {
            age: Some(data.age),
            gender: Some(data.gender),
            height_cm: Some(data.height_cm),
            weight_kg: Some(data.weight_kg),
            family_history: data.family_history,
            lifestyle: Some(data.lifestyle),
            smoking: Some(data.smoking),
            high_bp: data.high_bp,
            diabetes: data.diabetes,
            palpitations: Some(data.palpitations),
            shortness_of_breath: Some(data.shortness_of_breath),
            dizziness: Some(data.dizziness),
            atrial_fibrillation: data.atrial_fibrillation,
            ldl_cholesterol: data.ldl_cholesterol,
        }
    }
}

/// Outcome of moving through the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved(Step),
    ReadyToSubmit,
    Exit,
}

/// Linear four-step questionnaire
///
/// Navigation never touches the answers; a failed submission leaves the
/// draft as it was so the user can fix it and resubmit.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    step: Step,
    draft: RiskDraft,
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::new()
    }
}

impl Questionnaire {
    pub fn new() -> Self {
        Self {
            step: Step::Basics,
            draft: RiskDraft::default(),
        }
    }

    pub fn with_draft(draft: RiskDraft) -> Self {
        Self {
            step: Step::Basics,
            draft,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &RiskDraft {
        &self.draft
    }

    pub fn answer(&mut self, field: Field, raw: &str) -> Result<(), String> {
        field.apply(&mut self.draft, raw)
    }

    pub fn next(&mut self) -> Transition {
        match self.step.next() {
            Some(step) => {
                self.step = step;
                Transition::Moved(step)
            }
            None => Transition::ReadyToSubmit,
        }
    }

    pub fn back(&mut self) -> Transition {
        match self.step.previous() {
            Some(step) => {
                self.step = step;
                Transition::Moved(step)
            }
            None => Transition::Exit,
        }
    }

    /// Presence check followed by range validation
    pub fn prepare(&self) -> Result<RiskData, QuestionnaireError> {
        let data = self
            .draft
            .to_risk_data()
            .map_err(QuestionnaireError::MissingFields)?;

        let issues = validate_risk_data(&data);
        if !issues.is_empty() {
            return Err(QuestionnaireError::Invalid(issues));
        }

        Ok(data)
    }

    /// Validate and send the answers to the scorer
    ///
    /// Returns the submitted record together with the result.
    pub async fn submit<S: RiskScorer>(
        &self,
        scorer: &S,
    ) -> Result<(RiskData, RiskResult), QuestionnaireError> {
        let data = self.prepare()?;
        tracing::debug!("Submitting questionnaire (age {}, BMI {})", data.age, data.bmi());
        let result = scorer.calculate_risk(&data).await?;
        Ok((data, result))
    }
}
