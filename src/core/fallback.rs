use crate::models::{ContentCategory, EducationalContent, EmergencyContact, SymptomItem};

fn symptom(code: &str, title: &str, description: &str, icon: &str, level: &str) -> SymptomItem {
    SymptomItem {
        code: code.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        emergency_level: level.to_string(),
    }
}

fn contact(name: &str, number: &str, description: &str) -> EmergencyContact {
    EmergencyContact {
        name: name.to_string(),
        number: number.to_string(),
        description: description.to_string(),
    }
}

/// Built-in educational dataset used when the service cannot be reached
pub fn fallback_content() -> EducationalContent {
    EducationalContent {
        typical_symptoms: vec![
            symptom(
                "FAST_F",
                "Face",
                "Facial asymmetry, a drooping corner of the mouth, unable to smile evenly",
                "😐",
                "high",
            ),
            symptom(
                "FAST_A",
                "Arms",
                "Weakness or numbness in one arm, unable to raise both arms at once",
                "💪",
                "high",
            ),
            symptom(
                "FAST_S",
                "Speech",
                "Slurred or confused speech, unable to repeat a simple phrase",
                "🗣️",
                "high",
            ),
        ],
        atypical_symptoms: vec![
            symptom(
                "ATYP_1",
                "Hiccups with nausea",
                "Persistent hiccups with nausea, especially in women",
                "🤢",
                "medium",
            ),
            symptom(
                "ATYP_2",
                "Sudden aggression or apathy",
                "An abrupt change in behaviour with no apparent cause",
                "😠",
                "medium",
            ),
        ],
        emergency_contacts: emergency_contacts(),
    }
}

/// Emergency numbers shown on every content screen
pub fn emergency_contacts() -> Vec<EmergencyContact> {
    vec![
        contact("Ambulance", "103", "Single ambulance number across Russia"),
        contact("Emergency services", "112", "Single number for all emergency services"),
    ]
}

/// Keep only the symptom list a category asks for; contacts always stay
pub fn filter_by_category(
    content: EducationalContent,
    category: Option<ContentCategory>,
) -> EducationalContent {
    match category {
        None => content,
        Some(ContentCategory::Typical) => EducationalContent {
            atypical_symptoms: Vec::new(),
            ..content
        },
        Some(ContentCategory::Atypical) => EducationalContent {
            typical_symptoms: Vec::new(),
            ..content
        },
    }
}
