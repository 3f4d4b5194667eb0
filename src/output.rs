//! Terminal and JSON rendering of reports.

use std::fmt::{self, Write};

use crate::report::{format_timestamp, MechanismResult, SecurityReport, Status};

const RULE_WIDTH: usize = 60;
const INDENT: &str = "          ";

/// Status label with emoji.
pub fn format_status(status: Status) -> &'static str {
    match status {
        Status::Pass => "✅ PASS",
        Status::Fail => "❌ FAIL",
        Status::Warning => "⚠️  WARNING",
        Status::Unknown => "❔ UNKNOWN",
    }
}

/// Human-readable layout of a report.
pub struct TextReport<'a>(pub &'a SecurityReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.0)
    }
}

/// Renders the human-readable report.
pub fn render_text(report: &SecurityReport) -> String {
    TextReport(report).to_string()
}

/// Pretty-printed JSON report.
pub fn render_json(report: &SecurityReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

fn write_report<W: Write>(out: &mut W, report: &SecurityReport) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "\n{rule}")?;
    writeln!(out, "  EMAIL SECURITY REPORT: {}", report.domain)?;
    writeln!(out, "{rule}\n")?;
    writeln!(out, "Overall Score: {}/100", report.overall_score)?;
    writeln!(
        out,
        "Compliance: {}\n",
        report.compliance_level.to_string().to_uppercase()
    )?;

    section(out, "SPF:", &report.spf, &[("Record", report.spf.record.as_deref())])?;
    section(out, "DKIM:", &report.dkim, &[("Selector", report.dkim.selector.as_deref())])?;
    section(out, "DMARC:", &report.dmarc, &[("Policy", report.dmarc.policy.as_deref())])?;

    header(out, "MX:", &report.mx)?;
    for mx in report.mx.records.iter().flatten() {
        writeln!(out, "{INDENT}[{}] {}", mx.priority, mx.exchange)?;
    }
    notes(out, &report.mx)?;
    writeln!(out)?;

    if let Some(bimi) = &report.bimi {
        section(out, "BIMI:", bimi, &[("Logo", bimi.logo_url.as_deref())])?;
    }
    if let Some(mtasts) = &report.mtasts {
        section(out, "MTA-STS:", mtasts, &[("Mode", mtasts.mode.as_deref())])?;
    }

    writeln!(out, "{rule}")?;
    writeln!(out, "Tested at: {}", format_timestamp(&report.timestamp))?;
    writeln!(out, "{rule}")
}

fn header<W: Write>(out: &mut W, label: &str, result: &MechanismResult) -> fmt::Result {
    writeln!(out, "{label:<10}{}", format_status(result.status))?;
    writeln!(out, "{INDENT}{}", result.message)
}

fn notes<W: Write>(out: &mut W, result: &MechanismResult) -> fmt::Result {
    for warning in &result.warnings {
        writeln!(out, "{INDENT}Note: {warning}")?;
    }
    Ok(())
}

fn section<W: Write>(
    out: &mut W,
    label: &str,
    result: &MechanismResult,
    details: &[(&str, Option<&str>)],
) -> fmt::Result {
    header(out, label, result)?;
    for (name, value) in details {
        if let Some(value) = value {
            writeln!(out, "{INDENT}{name}: {value}")?;
        }
    }
    notes(out, result)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::report::{build_report, MechanismKind, MxEntry, Outcomes};
    use chrono::{TimeZone, Utc};

    fn sample() -> SecurityReport {
        let mut outcomes = Outcomes::new();
        outcomes.post(
            MechanismKind::Spf,
            Some(MechanismResult::pass("SPF record found").with_record("v=spf1 -all")),
        );
        outcomes.post(
            MechanismKind::Mx,
            Some(MechanismResult::pass("2 MX records found").with_records(vec![
                MxEntry { priority: 10, exchange: "mx1.example.com".into() },
                MxEntry { priority: 20, exchange: "mx2.example.com".into() },
            ])),
        );
        outcomes.post(
            MechanismKind::MtaSts,
            Some(MechanismResult::warning("MTA-STS is in testing mode").with_mode("testing")),
        );
        build_report(
            &Domain::parse("example.com").unwrap(),
            outcomes,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        )
    }

    #[test]
    fn test_render_text_layout() {
        let text = render_text(&sample());
        assert!(text.contains("EMAIL SECURITY REPORT: example.com"));
        assert!(text.contains("SPF:      ✅ PASS"));
        assert!(text.contains("Record: v=spf1 -all"));
        assert!(text.contains("[10] mx1.example.com"));
        assert!(text.contains("DKIM:     ❔ UNKNOWN"));
        assert!(text.contains("MTA-STS:  ⚠️  WARNING"));
        assert!(text.contains("Mode: testing"));
        assert!(!text.contains("BIMI:"));
        assert!(text.contains("Tested at: 2024-01-02T03:04:05.000Z"));
    }

    /// Accepts `capacity` bytes, then fails every write.
    struct Limited {
        written: String,
        capacity: usize,
    }

    impl Write for Limited {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.written.len() + s.len() > self.capacity {
                return Err(fmt::Error);
            }
            self.written.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_stop_rendering() {
        let mut out = Limited {
            written: String::new(),
            capacity: 120,
        };
        assert!(write_report(&mut out, &sample()).is_err());
        assert!(out.written.contains("EMAIL SECURITY REPORT"));
        assert!(!out.written.contains("Tested at"));
    }

    #[test]
    fn test_text_report_display_matches_render_text() {
        let report = sample();
        assert_eq!(format!("{}", TextReport(&report)), render_text(&report));
    }

    #[test]
    fn test_render_json_is_pretty_and_parses() {
        let json = render_json(&sample()).unwrap();
        assert!(json.contains("\n  \"domain\": \"example.com\""));
        let back: SecurityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
