//! Bulk checking: evaluate a list of domains and export a CSV report.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use futures::stream::{self, StreamExt};
use log::{info, warn};

use crate::dns::DnsResolver;
use crate::error_handling::EvaluationError;
use crate::evaluate::PolicyFetcher;
use crate::pipeline::Evaluator;
use crate::report::{format_timestamp, SecurityReport};
use crate::scoring;

/// CSV header, one row per domain.
pub const CSV_COLUMNS: [&str; 10] = [
    "Domain",
    "Overall Score",
    "Compliance",
    "SPF",
    "DKIM",
    "DMARC",
    "MX Records",
    "BIMI",
    "MTA-STS",
    "Tested At",
];

/// Result of evaluating one listed domain.
#[derive(Debug, Clone)]
pub struct BulkEntry {
    pub domain: String,
    pub outcome: Result<SecurityReport, EvaluationError>,
}

impl BulkEntry {
    pub fn score(&self) -> u32 {
        self.outcome.as_ref().map_or(0, |r| r.overall_score)
    }

    fn csv_row(&self) -> Vec<String> {
        match &self.outcome {
            Ok(report) => vec![
                report.domain.clone(),
                report.overall_score.to_string(),
                report.compliance_level.to_string(),
                report.spf.status.to_string(),
                report.dkim.status.to_string(),
                report.dmarc.status.to_string(),
                report.mx.records.as_ref().map_or(0, Vec::len).to_string(),
                optional_status(report.bimi.as_ref().map(|b| b.status.to_string())),
                optional_status(report.mtasts.as_ref().map(|m| m.status.to_string())),
                format_timestamp(&report.timestamp),
            ],
            Err(e) => {
                let mut row = vec![
                    self.domain.clone(),
                    "0".to_string(),
                    "ERROR".to_string(),
                    e.to_string(),
                ];
                row.resize(CSV_COLUMNS.len(), String::new());
                row
            }
        }
    }
}

fn optional_status(status: Option<String>) -> String {
    status.unwrap_or_else(|| "N/A".to_string())
}

/// Reads one domain per line, skipping blank lines and `#` comments.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_domains(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read domain list: {}", path.display()))?;
    Ok(parse_domain_list(&text))
}

fn parse_domain_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Evaluates `domains` with at most `concurrency` in flight. Output order matches input.
pub async fn run_bulk<R: DnsResolver, F: PolicyFetcher>(
    evaluator: &Evaluator<R, F>,
    domains: Vec<String>,
    concurrency: usize,
) -> Vec<BulkEntry> {
    let total = domains.len();
    stream::iter(domains.into_iter().enumerate())
        .map(|(index, domain)| async move {
            let outcome = evaluator.evaluate(&domain).await;
            match &outcome {
                Ok(report) => info!(
                    "[{}/{total}] {domain}: score {}/100",
                    index + 1,
                    report.overall_score
                ),
                Err(e) => warn!("[{}/{total}] {domain}: {e}", index + 1),
            }
            BulkEntry { domain, outcome }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Writes the CSV report.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(writer: W, entries: &[BulkEntry]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer
        .write_record(CSV_COLUMNS)
        .context("Failed to write CSV header")?;
    for entry in entries {
        writer
            .write_record(entry.csv_row())
            .with_context(|| format!("Failed to write CSV row for {}", entry.domain))?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Writes the CSV report to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv_file(path: &Path, entries: &[BulkEntry]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv(file, entries)
}

/// Totals over a bulk run. Failed domains count as score 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkSummary {
    pub total: usize,
    pub failed: usize,
    pub average_score: f64,
    pub insurance_ready: usize,
}

impl BulkSummary {
    pub fn from_entries(entries: &[BulkEntry]) -> Self {
        let total = entries.len();
        let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
        let sum: u32 = entries.iter().map(BulkEntry::score).sum();
        let average_score = if total == 0 {
            0.0
        } else {
            f64::from(sum) / total as f64
        };
        let insurance_ready = entries
            .iter()
            .filter(|e| e.outcome.is_ok() && scoring::is_insurance_ready(e.score()))
            .count();
        BulkSummary {
            total,
            failed,
            average_score,
            insurance_ready,
        }
    }
}

impl fmt::Display for BulkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total domains checked: {}", self.total)?;
        writeln!(f, "Errors: {}", self.failed)?;
        writeln!(f, "Average score: {:.1}/100", self.average_score)?;
        writeln!(f, "Insurance ready: {}/{}", self.insurance_ready, self.total)?;
        write!(f, "{rule}")
    }
}
