use std::io::{BufRead, Write};

use super::display::{format_result, share_message, DISCLAIMER};
use super::{AppContext, CommandError};
use crate::core::questionnaire::{
    Field, Questionnaire, QuestionnaireError, RiskDraft, Transition, TOTAL_STEPS,
};
use crate::models::{
    Gender, Lifestyle, RiskData, RiskResult, SmokingStatus, SymptomFrequency,
};

/// Typical answers used by the quick check
pub fn sample_risk_data() -> RiskData {
    RiskData {
        age: 45,
        gender: Gender::Male,
        height_cm: 175.0,
        weight_kg: 75.0,
        family_history: false,
        lifestyle: Lifestyle::Sedentary,
        smoking: SmokingStatus::Never,
        high_bp: false,
        diabetes: false,
        palpitations: SymptomFrequency::Rarely,
        shortness_of_breath: SymptomFrequency::Never,
        dizziness: SymptomFrequency::Rarely,
        atrial_fibrillation: false,
        ldl_cholesterol: Some(2.5),
    }
}

enum Answer {
    Stored,
    Back,
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String, CommandError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(CommandError::Aborted);
    }
    Ok(line.trim().to_string())
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool, CommandError> {
    loop {
        write!(out, "{} [yes/no]: ", question)?;
        out.flush()?;
        match read_line(input)?.to_lowercase().as_str() {
            "yes" | "y" => return Ok(true),
            "no" | "n" => return Ok(false),
            _ => writeln!(out, "Please answer yes or no.")?,
        }
    }
}

/// Prompt for one field until it parses
///
/// Typing `back` returns to the previous step. Enter keeps an existing
/// answer to a required field.
fn ask_field<R: BufRead, W: Write>(
    questionnaire: &mut Questionnaire,
    field: Field,
    input: &mut R,
    out: &mut W,
) -> Result<Answer, CommandError> {
    loop {
        let marker = if field.is_required() { "*" } else { " " };
        write!(out, "  {}{}: ", marker, field.prompt())?;
        out.flush()?;

        let raw = read_line(input)?;
        if raw.eq_ignore_ascii_case("back") {
            return Ok(Answer::Back);
        }
        if raw.is_empty() && field.is_required() && field.is_answered(questionnaire.draft()) {
            return Ok(Answer::Stored);
        }

        match questionnaire.answer(field, &raw) {
            Ok(()) => return Ok(Answer::Stored),
            Err(message) => writeln!(out, "    {}", message)?,
        }
    }
}

/// Step back until the step holding `field` is current
fn rewind_to(questionnaire: &mut Questionnaire, field: Field) {
    let target = field.step();
    while questionnaire.step() != target {
        if questionnaire.back() == Transition::Exit {
            break;
        }
    }
}

/// Interactive questionnaire: disclaimer, four steps, submission
///
/// Returns `None` when the user cancels.
pub async fn assess<R: BufRead, W: Write>(
    ctx: &AppContext,
    input: &mut R,
    out: &mut W,
) -> Result<Option<RiskResult>, CommandError> {
    writeln!(out, "{}\n", DISCLAIMER)?;
    if !confirm(input, out, "I understand and want to continue")? {
        writeln!(out, "Assessment cancelled.")?;
        return Ok(None);
    }
    writeln!(out, "Fields marked * are required. Type 'back' to return to the previous step.")?;

    let mut questionnaire = Questionnaire::new();

    'form: loop {
        let step = questionnaire.step();
        writeln!(out, "\nStep {}/{}: {}", step.number(), TOTAL_STEPS, step.title())?;

        for field in step.fields() {
            if let Answer::Back = ask_field(&mut questionnaire, *field, input, out)? {
                if questionnaire.back() == Transition::Exit {
                    writeln!(out, "Assessment cancelled.")?;
                    return Ok(None);
                }
                continue 'form;
            }
        }

        if let Transition::Moved(_) = questionnaire.next() {
            continue;
        }

        loop {
            writeln!(out, "\nCalculating...")?;
            match questionnaire.submit(ctx.client.as_ref()).await {
                Ok((data, result)) => {
                    writeln!(out, "\n{}", format_result(&result, Some(&data)))?;
                    return Ok(Some(result));
                }
                Err(QuestionnaireError::MissingFields(fields)) => {
                    writeln!(out, "{}", QuestionnaireError::MissingFields(fields.clone()))?;
                    if let Some(first) = fields.first() {
                        rewind_to(&mut questionnaire, *first);
                    }
                    continue 'form;
                }
                Err(QuestionnaireError::Invalid(issues)) => {
                    writeln!(out, "Validation error:\n{}", QuestionnaireError::Invalid(issues.clone()))?;
                    if let Some(field) = issues.first().and_then(|i| Field::from_name(&i.field)) {
                        rewind_to(&mut questionnaire, field);
                    }
                    continue 'form;
                }
                Err(QuestionnaireError::Api(e)) => {
                    tracing::error!("Error calculating risk: {}", e);
                    writeln!(out, "{}: {}", e.title(), e)?;
                    if !confirm(input, out, "Try again with the same answers?")? {
                        return Err(CommandError::Api(e));
                    }
                }
            }
        }
    }
}

/// Submit the sample answers without prompting
pub async fn quick_check<W: Write>(ctx: &AppContext, out: &mut W) -> Result<RiskResult, CommandError> {
    let data = sample_risk_data();
    let questionnaire = Questionnaire::with_draft(RiskDraft::from(&data));

    let (data, result) = questionnaire.submit(ctx.client.as_ref()).await.map_err(|e| match e {
        QuestionnaireError::Api(api) => CommandError::Api(api),
        other => CommandError::Rejected(other.to_string()),
    })?;

    ctx.emit(out, &result, |r| {
        format!("{}\n\n{}", format_result(r, Some(&data)), share_message(r))
    })?;
    Ok(result)
}
