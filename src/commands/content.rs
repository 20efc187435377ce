use std::io::Write;

use super::display::{format_contacts, format_education, format_result, format_stored_summary};
use super::{AppContext, CommandError};
use crate::core::fallback::emergency_contacts;
use crate::models::{ContentCategory, EmergencyContact};

/// Overview shown when no subcommand is given
pub async fn home<W: Write>(ctx: &AppContext, out: &mut W) -> Result<(), CommandError> {
    writeln!(out, "Moy Risk: six-month stroke risk assessment\n")?;

    if let Some(stored) = ctx.client.get_last_result().await {
        writeln!(out, "{}\n", format_stored_summary(&stored))?;
    }

    writeln!(out, "  assess        answer the questionnaire and get your risk")?;
    writeln!(out, "  quick         run a quick check with sample answers")?;
    writeln!(out, "  education     learn the symptoms of a stroke")?;
    writeln!(out, "  emergency     show emergency phone numbers")?;
    writeln!(out, "  last          show the last result saved on this device")?;
    Ok(())
}

pub async fn education<W: Write>(
    ctx: &AppContext,
    category: Option<ContentCategory>,
    out: &mut W,
) -> Result<(), CommandError> {
    let response = ctx.client.get_educational_content(category).await;
    tracing::debug!("Educational content served from {:?}", response.source);
    ctx.emit(out, &response.content, |content| format_education(content, response.source))
}

/// Emergency numbers, preferring the service's list over the built-in one
pub async fn emergency<W: Write>(ctx: &AppContext, out: &mut W) -> Result<(), CommandError> {
    let response = ctx.client.get_educational_content(None).await;
    let contacts: Vec<EmergencyContact> = if response.content.emergency_contacts.is_empty() {
        emergency_contacts()
    } else {
        response.content.emergency_contacts
    };

    ctx.emit(out, &contacts, |contacts| {
        format!("Emergency contacts:\n{}", format_contacts(contacts))
    })
}

pub async fn last_result<W: Write>(ctx: &AppContext, out: &mut W) -> Result<(), CommandError> {
    match ctx.client.get_last_result().await {
        Some(stored) => ctx.emit(out, &stored, |stored| {
            format!(
                "{}\n\n{}",
                format_stored_summary(stored),
                format_result(&stored.result, Some(&stored.risk_data))
            )
        }),
        None => ctx.emit(out, &Option::<()>::None, |_| {
            "No saved result yet. Run `moy-risk assess` to get one.".to_string()
        }),
    }
}

pub async fn clear_history<W: Write>(ctx: &AppContext, out: &mut W) -> Result<(), CommandError> {
    ctx.client.clear_history().await;
    ctx.emit(out, &true, |_| "History cleared.".to_string())
}

pub async fn health<W: Write>(ctx: &AppContext, out: &mut W) -> Result<bool, CommandError> {
    let healthy = ctx.client.check_server_health().await;
    ctx.emit(out, &healthy, |healthy| {
        if *healthy {
            format!("Service at {} is available.", ctx.client.base_url())
        } else {
            format!("Service at {} is not reachable.", ctx.client.base_url())
        }
    })?;
    Ok(healthy)
}

pub async fn risk_factors<W: Write>(ctx: &AppContext, out: &mut W) -> Result<(), CommandError> {
    let factors = ctx.client.get_risk_factors().await?;
    ctx.emit(out, &factors, |factors| {
        serde_json::to_string_pretty(factors).unwrap_or_else(|_| factors.to_string())
    })
}
