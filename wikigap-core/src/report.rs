// Report rendering for completeness analyses

use crate::analysis::CompletenessReport;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Render `report` in the requested format.
pub fn render(report: &CompletenessReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => generate_json_report(report),
        ReportFormat::Csv => Ok(generate_csv_report(report)),
        ReportFormat::Markdown => Ok(generate_markdown_report(report)),
    }
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

pub fn generate_text_report(report: &CompletenessReport) -> String {
    let mut out = String::new();

    // Header
    out.push_str(RULE);
    out.push_str("                     WIKIGAP LANGUAGE COMPLETENESS REPORT\n");
    out.push_str(RULE);
    out.push('\n');

    out.push_str(&format!("Reference:    {}\n", report.reference_language));
    out.push_str(&format!("Lengths:      {}\n", report.mode.as_str()));
    out.push_str(&format!("Articles:     {}\n", report.articles.len()));
    out.push_str(&format!("Languages:    {}\n", report.table.languages().len()));
    out.push('\n');

    out.push_str(RULE);
    out.push_str("ARTICLES\n");
    out.push_str(RULE);
    out.push('\n');

    for (idx, article) in report.articles.iter().enumerate() {
        out.push_str(&format!("[{}] {}\n", idx + 1, article.url));
        out.push_str(&format!("In-degree:    {}\n", article.in_degree));
        out.push_str(&format!("Missing:      {}\n", join_or_none(&article.missing)));
        out.push_str(&format!("Short:        {}\n", join_or_none(&article.short)));

        if let Some(reference) = report.table.get(&article.url, &report.reference_language) {
            for language in &article.short {
                if let Some(length) = report.table.get(&article.url, language) {
                    out.push_str(&format!(
                        "  {:<6} {:>8} / {} ({:.0}%)\n",
                        language,
                        length,
                        reference,
                        percent(length, reference)
                    ));
                }
            }
        }
        out.push('\n');
    }

    if !report.unreferenced.is_empty() {
        out.push_str(RULE);
        out.push_str("WITHOUT A REFERENCE EDITION\n");
        out.push_str(RULE);
        out.push('\n');
        for url in &report.unreferenced {
            out.push_str(&format!("  {}\n", url));
        }
        out.push('\n');
    }

    // Footer
    out.push_str(RULE);
    out.push_str("                          End of Report\n");
    out.push_str(RULE);
    out.push_str("\nGenerated by wikigap\n\n");

    out
}

pub fn generate_json_report(report: &CompletenessReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "id": uuid::Uuid::new_v4().to_string(),
                "generator": "wikigap",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "reference_language": report.reference_language,
                "mode": report.mode,
                "total_articles": report.articles.len(),
                "languages": report.table.languages(),
                "missing_total": report.articles.iter().map(|a| a.missing.len()).sum::<usize>(),
                "short_total": report.articles.iter().map(|a| a.short.len()).sum::<usize>()
            },
            "articles": report.articles,
            "unreferenced": report.unreferenced,
            "lengths": report.table
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// One line per article and language; absent lengths are empty cells.
pub fn generate_csv_report(report: &CompletenessReport) -> String {
    let mut out = String::from("url,in_degree,language,length,status\n");

    for article in &report.articles {
        for language in report.table.languages() {
            let length = report.table.get(&article.url, language);
            let status = if article.missing.contains(language) {
                "missing"
            } else if article.short.contains(language) {
                "short"
            } else if *language == report.reference_language {
                "reference"
            } else {
                "ok"
            };
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(&article.url),
                article.in_degree,
                csv_field(language),
                length.map(|l| l.to_string()).unwrap_or_default(),
                status
            ));
        }
    }

    out
}

pub fn generate_markdown_report(report: &CompletenessReport) -> String {
    let mut out = String::new();
    out.push_str("# Language completeness report\n\n");
    out.push_str(&format!(
        "Reference language `{}`, {} lengths, generated {}.\n\n",
        report.reference_language,
        report.mode.as_str(),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("| # | Article | In-degree | Missing | Short |\n");
    out.push_str("|---|---------|-----------|---------|-------|\n");
    for (idx, article) in report.articles.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            idx + 1,
            article.url,
            article.in_degree,
            join_or_none(&article.missing),
            join_or_none(&article.short)
        ));
    }

    if !report.table.is_empty() {
        out.push_str("\n## Lengths\n\n| Article |");
        for language in report.table.languages() {
            out.push_str(&format!(" {} |", language));
        }
        out.push_str("\n|---|");
        for _ in report.table.languages() {
            out.push_str("---|");
        }
        out.push('\n');
        for row in report.table.rows() {
            out.push_str(&format!("| {} |", row.url));
            for language in report.table.languages() {
                match row.lengths.get(language) {
                    Some(length) => out.push_str(&format!(" {} |", length)),
                    None => out.push_str(" - |"),
                }
            }
            out.push('\n');
        }
    }

    if !report.unreferenced.is_empty() {
        out.push_str("\n## Without a reference edition\n\n");
        for url in &report.unreferenced {
            out.push_str(&format!("- {}\n", url));
        }
    }

    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn join_or_none(languages: &[String]) -> String {
    if languages.is_empty() {
        "none".to_string()
    } else {
        languages.join(", ")
    }
}

fn percent(length: u64, reference: u64) -> f64 {
    if reference == 0 {
        return 0.0;
    }
    length as f64 / reference as f64 * 100.0
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
