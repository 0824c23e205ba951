use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
#[cfg(not(feature = "with-csv"))]
use anyhow::bail;
use mailprobe_lib::{Status, Summary, ValidationResult};

fn tri(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "unknown",
    }
}

pub fn write_human(out: &mut impl Write, result: &ValidationResult) -> Result<()> {
    writeln!(out, "Email:           {}", result.email)?;
    if let Some(normalized) = &result.normalized_email {
        writeln!(out, "Normalized:      {normalized}")?;
    }
    match &result.reason {
        Some(reason) => writeln!(out, "Status:          {} ({reason})", result.status)?,
        None => writeln!(out, "Status:          {}", result.status)?,
    }
    if !result.mx_hosts.is_empty() {
        writeln!(out, "MX hosts:        {}", result.mx_hosts.join(", "))?;
    }
    writeln!(out, "Has MX:          {}", result.domain_has_mx)?;
    writeln!(out, "SMTP connect:    {}", result.smtp_connectable)?;
    writeln!(out, "Deliverable:     {}", tri(result.is_deliverable))?;
    writeln!(out, "Catch-all:       {}", tri(result.is_catch_all))?;
    writeln!(out, "Disposable:      {}", result.is_disposable)?;
    match &result.bounce_reason {
        Some(why) => writeln!(out, "Bounce likely:   {} ({why})", tri(result.bounce_likely))?,
        None => writeln!(out, "Bounce likely:   {}", tri(result.bounce_likely))?,
    }
    Ok(())
}

pub fn write_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_ndjson_line(out: &mut impl Write, result: &ValidationResult) -> Result<()> {
    serde_json::to_writer(&mut *out, result)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(feature = "with-csv")]
pub fn write_csv(out: impl Write, results: &[ValidationResult]) -> Result<()> {
    fn cell(value: Option<bool>) -> &'static str {
        match value {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        }
    }

    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "email",
        "normalized_email",
        "domain",
        "is_valid_syntax",
        "domain_has_mx",
        "smtp_connectable",
        "is_deliverable",
        "is_catch_all",
        "is_disposable",
        "status",
        "reason",
        "mx_hosts",
        "bounce_likely",
        "bounce_reason",
    ])?;
    for r in results {
        let mx_hosts = r.mx_hosts.join("|");
        wtr.write_record([
            r.email.as_str(),
            r.normalized_email.as_deref().unwrap_or(""),
            r.domain.as_deref().unwrap_or(""),
            if r.is_valid_syntax { "true" } else { "false" },
            if r.domain_has_mx { "true" } else { "false" },
            if r.smtp_connectable { "true" } else { "false" },
            cell(r.is_deliverable),
            cell(r.is_catch_all),
            if r.is_disposable { "true" } else { "false" },
            r.status.as_str(),
            r.reason.as_deref().unwrap_or(""),
            mx_hosts.as_str(),
            cell(r.bounce_likely),
            r.bounce_reason.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(not(feature = "with-csv"))]
pub fn write_csv(_out: impl Write, _results: &[ValidationResult]) -> Result<()> {
    bail!("--out csv nécessite la feature 'with-csv'")
}

pub fn summary_line(summary: &Summary) -> String {
    format!(
        "deliverable={} undeliverable={} unknown={} invalid={} total={}",
        summary.deliverable,
        summary.undeliverable,
        summary.unknown,
        summary.invalid,
        summary.total()
    )
}

/// 0 deliverable, 1 invalid or undeliverable, 2 anything else.
pub fn exit_code(status: Status) -> ExitCode {
    match status {
        Status::Deliverable => ExitCode::SUCCESS,
        Status::Undeliverable | Status::InvalidSyntax | Status::InvalidDomain => ExitCode::from(1),
        Status::Unknown => ExitCode::from(2),
    }
}
