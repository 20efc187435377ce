use crate::models::RiskData;
use validator::Validate;

/// Order in which field problems are reported, matching the questionnaire
const FIELD_ORDER: [&str; 4] = ["age", "height_cm", "weight_kg", "ldl_cholesterol"];

pub(crate) const AGE_RANGE_MESSAGE: &str = "Age must be between 35 and 65 years";
const HEIGHT_RANGE_MESSAGE: &str = "Height must be between 100 and 250 cm";
const WEIGHT_RANGE_MESSAGE: &str = "Weight must be between 30 and 300 kg";
const LDL_RANGE_MESSAGE: &str = "LDL cholesterol must be between 0 and 10 mmol/L";

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Run the client-side range checks on a complete record
///
/// Returns an empty vector when the record is acceptable.
pub fn validate_risk_data(data: &RiskData) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> = match data.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| ValidationIssue {
                    field: field.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect(),
    };

    // NaN compares false against both bounds, so range checks let it through
    let measurements = [
        ("height_cm", Some(data.height_cm), HEIGHT_RANGE_MESSAGE),
        ("weight_kg", Some(data.weight_kg), WEIGHT_RANGE_MESSAGE),
        ("ldl_cholesterol", data.ldl_cholesterol, LDL_RANGE_MESSAGE),
    ];
    for (field, value, message) in measurements {
        let non_finite = value.is_some_and(|v| !v.is_finite());
        if non_finite && !issues.iter().any(|i| i.field == field) {
            issues.push(ValidationIssue {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }

    if issues.is_empty() {
        return issues;
    }

    issues.sort_by_key(|issue| {
        FIELD_ORDER
            .iter()
            .position(|f| *f == issue.field)
            .unwrap_or(FIELD_ORDER.len())
    });

    tracing::debug!("Validation rejected {} field(s)", issues.len());
    issues
}

/// Render messages for display: one message verbatim, several as a list
pub fn format_errors<S: AsRef<str>>(messages: &[S]) -> String {
    match messages {
        [] => String::new(),
        [single] => single.as_ref().to_string(),
        many => {
            let lines: Vec<&str> = many.iter().map(|m| m.as_ref()).collect();
            format!("Found errors:\n• {}", lines.join("\n• "))
        }
    }
}
