use crate::models::{
    ContentSource, EducationalContent, EmergencyContact, RiskCategory, RiskData, RiskResult,
    StoredResult, SymptomItem,
};

pub const DISCLAIMER: &str = "This tool does not make a diagnosis and does not replace a consultation \
with a doctor. If you notice any suspicious symptoms, call 103 or 112 immediately!";

fn category_marker(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::Low => "✔",
        RiskCategory::Moderate => "⚠",
        RiskCategory::High => "‼",
    }
}

/// Full result report
pub fn format_result(result: &RiskResult, data: Option<&RiskData>) -> String {
    let mut lines = vec![
        format!(
            "{} {} ({})",
            category_marker(result.risk_category),
            result.risk_category.label(),
            result.risk_category
        ),
        format!(
            "Probability over {} months: {}%",
            result.timeframe_months, result.risk_percentage
        ),
        result.risk_description.clone(),
    ];

    if let Some(bmi) = result.bmi.or_else(|| data.map(|d| d.bmi())) {
        lines.push(format!("BMI: {:.1}", bmi));
    }

    if !result.recommendations.general.is_empty() {
        lines.push(String::new());
        lines.push(result.recommendations.general.clone());
    }

    let actions = result.prioritized_actions();
    if !actions.is_empty() {
        lines.push(String::new());
        lines.push("Recommended actions:".to_string());
        for action in actions {
            lines.push(format!("  {}. {} ({})", action.priority, action.title, action.frequency));
            lines.push(format!("     {}", action.description));
        }
    }

    if result.risk_category == RiskCategory::High {
        lines.push(String::new());
        lines.push("‼ Please see a doctor soon. For urgent symptoms call 103.".to_string());
    }

    if !result.recommendations.emergency_advice.is_empty() {
        lines.push(String::new());
        lines.push(result.recommendations.emergency_advice.clone());
    }

    lines.push(String::new());
    lines.push(if result.disclaimer.is_empty() {
        DISCLAIMER.to_string()
    } else {
        result.disclaimer.clone()
    });
    lines.push(format!("Calculation: {} at {}", result.calculation_id, result.timestamp));

    lines.join("\n")
}

/// Short text suitable for sharing
pub fn share_message(result: &RiskResult) -> String {
    format!(
        "My stroke risk: {}% ({})\n\n{}",
        result.risk_percentage, result.risk_description, result.recommendations.general
    )
}

/// One-line summary of a stored result
pub fn format_stored_summary(stored: &StoredResult) -> String {
    let when = chrono::DateTime::from_timestamp_millis(stored.timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    format!(
        "Last result: {} {}% ({})",
        stored.result.risk_category.label(),
        stored.result.risk_percentage,
        when
    )
}

fn format_symptoms(title: &str, symptoms: &[SymptomItem], lines: &mut Vec<String>) {
    if symptoms.is_empty() {
        return;
    }
    lines.push(title.to_string());
    for symptom in symptoms {
        lines.push(format!(
            "  {} {} [{}]",
            symptom.icon, symptom.title, symptom.emergency_level
        ));
        lines.push(format!("     {}", symptom.description));
    }
    lines.push(String::new());
}

pub fn format_contacts(contacts: &[EmergencyContact]) -> String {
    contacts
        .iter()
        .map(|c| format!("  ☎ {} ({}): {}", c.number, c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_education(content: &EducationalContent, source: ContentSource) -> String {
    let mut lines = Vec::new();
    format_symptoms("Typical symptoms (FAST):", &content.typical_symptoms, &mut lines);
    format_symptoms("Atypical symptoms:", &content.atypical_symptoms, &mut lines);
    lines.push("If any of these symptoms appear, call 103 or 112 immediately.".to_string());

    if !content.emergency_contacts.is_empty() {
        lines.push(String::new());
        lines.push("Emergency contacts:".to_string());
        lines.push(format_contacts(&content.emergency_contacts));
    }

    if source == ContentSource::Fallback {
        lines.push(String::new());
        lines.push("(offline: showing built-in information)".to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback::fallback_content;
    use crate::models::{ActionItem, Recommendations};

    fn result(category: RiskCategory) -> RiskResult {
        RiskResult {
            risk_category: category,
            risk_percentage: 12.5,
            risk_description: "Elevated".to_string(),
            timeframe_months: 6,
            bmi: Some(24.5),
            recommendations: Recommendations {
                general: "Keep active".to_string(),
                actions: vec![ActionItem {
                    priority: 1,
                    title: "Measure blood pressure".to_string(),
                    description: "Twice a day".to_string(),
                    frequency: "daily".to_string(),
                }],
                emergency_advice: String::new(),
            },
            disclaimer: String::new(),
            calculation_id: "calc_1".to_string(),
            timestamp: "2024-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_high_risk_report_includes_warning() {
        let text = format_result(&result(RiskCategory::High), None);
        assert!(text.contains("High risk (HIGH)"));
        assert!(text.contains("12.5%"));
        assert!(text.contains("1. Measure blood pressure (daily)"));
        assert!(text.contains("call 103"));
        assert!(text.contains(DISCLAIMER));
    }

    #[test]
    fn test_low_risk_report_has_no_warning() {
        let text = format_result(&result(RiskCategory::Low), None);
        assert!(!text.contains("‼"));
    }

    #[test]
    fn test_share_message() {
        assert_eq!(
            share_message(&result(RiskCategory::Moderate)),
            "My stroke risk: 12.5% (Elevated)\n\nKeep active"
        );
    }

    #[test]
    fn test_fallback_marker() {
        let text = format_education(&fallback_content(), ContentSource::Fallback);
        assert!(text.contains("Face"));
        assert!(text.contains("☎ 112"));
        assert!(text.contains("offline"));
    }
}
