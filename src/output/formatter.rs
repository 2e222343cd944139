//! Output formatters for ranking reports

use crate::config::OutputFormat;
use crate::error::{Result, ResumeRankerError};
use crate::output::report::*;
use askama::Template;
use base64::Engine;
use colored::{Color, Colorize};
use std::path::{Path, PathBuf};

/// Header row of the CSV export
pub const CSV_HEADERS: [&str; 2] = ["Resume", "Similarity Score"];

/// Trait for formatting ranking reports
pub trait OutputFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String>;
}

/// Console table with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct CsvFormatter;

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Standalone HTML page; embeds the previewed PDF when one is selected
pub struct HtmlFormatter {
    include_styles: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    csv_formatter: CsvFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

/// Scores are always shown with four decimals
pub fn format_score(score: f32) -> String {
    format!("{:.4}", score)
}

/// Askama template for HTML output
#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Resume Ranking Report</title>
    {% if include_styles %}
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1000px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .header {
            text-align: center;
            margin-bottom: 30px;
            border-bottom: 3px solid #007acc;
            padding-bottom: 20px;
        }
        table {
            width: 100%;
            border-collapse: collapse;
        }
        th, td {
            text-align: left;
            padding: 8px 12px;
            border-bottom: 1px solid #e9ecef;
        }
        th { color: #007acc; }
        td.score { font-family: monospace; }
        .section h2 {
            color: #007acc;
            border-bottom: 2px solid #e9ecef;
            padding-bottom: 10px;
        }
        .failure {
            border-left: 4px solid #dc3545;
            padding: 8px 12px;
            margin: 8px 0;
            background: #f8f9fa;
        }
        .preview-text {
            white-space: pre-wrap;
            background: #f8f9fa;
            padding: 15px;
            border-radius: 6px;
        }
        iframe {
            width: 100%;
            height: 800px;
            border: 1px solid #e9ecef;
        }
        .metadata {
            margin-top: 30px;
            font-size: 0.9em;
            color: #6c757d;
        }
    </style>
    {% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>📊 Resume Ranking Report</h1>
            <p>Generated {{ generated_at }} in {{ processing_time }}ms</p>
        </div>

        <div class="section">
            <h2>🏆 Rankings</h2>
            {% if has_rankings %}
            <table>
                <thead>
                    <tr><th>Rank</th><th>Resume</th><th>Similarity Score</th></tr>
                </thead>
                <tbody>
                    {% for row in rows %}
                    <tr><td>{{ row.rank }}</td><td>{{ row.name }}</td><td class="score">{{ row.score }}</td></tr>
                    {% endfor %}
                </tbody>
            </table>
            {% else %}
            <p>No resumes could be ranked.</p>
            {% endif %}
        </div>

        {% if has_failures %}
        <div class="section">
            <h2>⚠️ Skipped Resumes</h2>
            {% for failure in failures %}
            <div class="failure"><strong>{{ failure.name }}</strong>: {{ failure.reason }}</div>
            {% endfor %}
        </div>
        {% endif %}

        {% if has_preview %}
        <div class="section">
            <h2>🔍 Preview: {{ preview_name }}</h2>
            {% if has_preview_score %}<p>Similarity Score: {{ preview_score }}</p>{% endif %}
            <div class="preview-text">{{ preview_text }}{% if preview_truncated %}…{% endif %}</div>
            {% if has_pdf %}
            <iframe src="{{ pdf_data_uri|safe }}" title="{{ preview_name }}"></iframe>
            {% endif %}
        </div>
        {% endif %}

        <div class="metadata">
            <p><strong>ℹ️ Generated by Resume Ranker v{{ version }}</strong></p>
            <p><strong>Model:</strong> {{ embedding_model }} ({{ embedding_dimension }} dimensions)</p>
            <p><strong>Resumes:</strong> {{ document_count }} ranked of {{ upload_count }} uploaded</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    generated_at: String,
    processing_time: u64,
    has_rankings: bool,
    rows: Vec<HtmlRow>,
    has_failures: bool,
    failures: Vec<HtmlFailure>,
    has_preview: bool,
    preview_name: String,
    has_preview_score: bool,
    preview_score: String,
    preview_text: String,
    preview_truncated: bool,
    has_pdf: bool,
    pdf_data_uri: String,
    version: String,
    embedding_model: String,
    embedding_dimension: usize,
    document_count: usize,
    upload_count: usize,
}

struct HtmlRow {
    rank: usize,
    name: String,
    score: String,
}

struct HtmlFailure {
    name: String,
    reason: String,
}

fn format_timestamp(report: &RankingReport) -> String {
    chrono::DateTime::<chrono::Utc>::from(report.metadata.generated_at)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "█".color(Color::Blue).bold(), title.color(Color::Blue).bold())
        } else {
            format!("\n█ {}\n", title)
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 RESUME RANKINGS"));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms | Model: {}\n\n",
            format_timestamp(report),
            report.metadata.processing_time_ms,
            report.metadata.embedding_model
        ));

        if report.rankings.is_empty() {
            output.push_str(&self.colorize("No resumes could be ranked.\n", Color::Yellow));
        } else {
            let name_width = report
                .rankings
                .iter()
                .map(|r| r.name.chars().count())
                .max()
                .unwrap_or(0)
                .max(CSV_HEADERS[0].len());

            output.push_str(&format!(
                "{:<6} {:<width$}  {}\n",
                "Rank",
                CSV_HEADERS[0],
                CSV_HEADERS[1],
                width = name_width
            ));
            output.push_str(&format!("{}\n", "─".repeat(6 + 1 + name_width + 2 + CSV_HEADERS[1].len())));

            for row in &report.rankings {
                let score = format_score(row.score);
                let score = if row.rank == 1 {
                    self.colorize(&score, Color::Green)
                } else {
                    score
                };
                output.push_str(&format!(
                    "{:<6} {:<width$}  {}\n",
                    row.rank,
                    row.name,
                    score,
                    width = name_width
                ));
            }
        }

        if !report.failures.is_empty() {
            output.push_str(&self.format_header("⚠️  Skipped Resumes"));
            for failure in &report.failures {
                output.push_str(&format!(
                    "  {} {}\n",
                    self.colorize(&failure.name, Color::Red),
                    failure.reason
                ));
            }
        }

        if let Some(preview) = &report.preview {
            output.push_str(&self.format_header(&format!("🔍 Preview: {}", preview.name)));
            if let Some(score) = preview.score {
                output.push_str(&format!("Similarity Score: {}\n\n", format_score(score)));
            }
            output.push_str(&preview.text_prefix);
            if preview.truncated {
                output.push_str(&self.colorize("\n[... truncated]", Color::BrightBlack));
            }
            output.push('\n');
        }

        Ok(output)
    }
}

impl OutputFormatter for CsvFormatter {
    /// One row per ranked resume, in ranking order.
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;
        for row in &report.rankings {
            writer.write_record([row.name.as_str(), row.score.to_string().as_str()])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ResumeRankerError::OutputFormatting(format!("Failed to flush CSV: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ResumeRankerError::OutputFormatting(format!("CSV output is not UTF-8: {}", e)))
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📊 Resume Ranking Report\n\n");

        if self.include_metadata {
            output.push_str(&format!("**Generated:** {}  \n", format_timestamp(report)));
            output.push_str(&format!(
                "**Model:** {} ({} dimensions)  \n",
                report.metadata.embedding_model, report.metadata.embedding_dimension
            ));
            output.push_str(&format!(
                "**Resumes:** {} ranked of {} uploaded  \n",
                report.metadata.document_count, report.metadata.upload_count
            ));
            output.push_str(&format!("**Processing time:** {}ms\n\n", report.metadata.processing_time_ms));
        }

        output.push_str("## 🏆 Rankings\n\n");
        if report.rankings.is_empty() {
            output.push_str("_No resumes could be ranked._\n");
        } else {
            output.push_str("| Rank | Resume | Similarity Score |\n");
            output.push_str("|-----:|--------|-----------------:|\n");
            for row in &report.rankings {
                output.push_str(&format!(
                    "| {} | {} | {} |\n",
                    row.rank,
                    Self::escape_cell(&row.name),
                    format_score(row.score)
                ));
            }
        }

        if !report.failures.is_empty() {
            output.push_str("\n## ⚠️ Skipped Resumes\n\n");
            for failure in &report.failures {
                output.push_str(&format!("- **{}**: {}\n", failure.name, failure.reason));
            }
        }

        if let Some(preview) = &report.preview {
            output.push_str(&format!("\n## 🔍 Preview: {}\n\n", preview.name));
            if let Some(score) = preview.score {
                output.push_str(&format!("**Similarity Score:** {}\n\n", format_score(score)));
            }
            output.push_str("```text\n");
            output.push_str(&preview.text_prefix);
            if preview.truncated {
                output.push_str("\n[... truncated]");
            }
            output.push_str("\n```\n");
        }

        output.push_str(&format!(
            "\n---\n*Generated by Resume Ranker v{}*\n",
            report.metadata.ranker_version
        ));

        Ok(output)
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &RankingReport) -> HtmlTemplate {
        let rows = report
            .rankings
            .iter()
            .map(|r| HtmlRow {
                rank: r.rank,
                name: r.name.clone(),
                score: format_score(r.score),
            })
            .collect::<Vec<_>>();

        let failures = report
            .failures
            .iter()
            .map(|f| HtmlFailure {
                name: f.name.clone(),
                reason: f.reason.clone(),
            })
            .collect::<Vec<_>>();

        let preview = report.preview.as_ref();
        let pdf_bytes = preview.map(|p| p.pdf_bytes.as_slice()).unwrap_or_default();

        HtmlTemplate {
            include_styles: self.include_styles,
            generated_at: format_timestamp(report),
            processing_time: report.metadata.processing_time_ms,
            has_rankings: !rows.is_empty(),
            rows,
            has_failures: !failures.is_empty(),
            failures,
            has_preview: preview.is_some(),
            preview_name: preview.map(|p| p.name.clone()).unwrap_or_default(),
            has_preview_score: preview.and_then(|p| p.score).is_some(),
            preview_score: preview.and_then(|p| p.score).map(format_score).unwrap_or_default(),
            preview_text: preview.map(|p| p.text_prefix.clone()).unwrap_or_default(),
            preview_truncated: preview.map(|p| p.truncated).unwrap_or(false),
            has_pdf: !pdf_bytes.is_empty(),
            pdf_data_uri: pdf_data_uri(pdf_bytes),
            version: report.metadata.ranker_version.clone(),
            embedding_model: report.metadata.embedding_model.clone(),
            embedding_dimension: report.metadata.embedding_dimension,
            document_count: report.metadata.document_count,
            upload_count: report.metadata.upload_count,
        }
    }
}

/// `data:` URI carrying the PDF inline, for an iframe `src`.
pub fn pdf_data_uri(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    format!(
        "data:application/pdf;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| ResumeRankerError::OutputFormatting(e.to_string()))
    }
}

impl ReportGenerator {
    pub fn with_options(use_colors: bool, pretty_json: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            csv_formatter: CsvFormatter,
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(true),
            html_formatter: HtmlFormatter::new(true),
        }
    }

    pub fn generate_report(&self, report: &RankingReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Csv => self.csv_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
            OutputFormat::Html => self.html_formatter.format_report(report),
        }
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(file_path, content)?;
    Ok(())
}

/// A directory given as the save target gets a generated file name inside it.
pub fn resolve_save_path(path: &Path, format: &OutputFormat) -> PathBuf {
    if path.is_dir() {
        path.join(suggest_filename(format, true))
    } else {
        path.to_path_buf()
    }
}

pub fn suggest_filename(format: &OutputFormat, timestamp: bool) -> String {
    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("resume_rankings{}.txt", timestamp_suffix),
        OutputFormat::Csv => format!("resume_rankings{}.csv", timestamp_suffix),
        OutputFormat::Json => format!("resume_rankings{}.json", timestamp_suffix),
        OutputFormat::Markdown => format!("resume_rankings{}.md", timestamp_suffix),
        OutputFormat::Html => format!("resume_rankings{}.html", timestamp_suffix),
    }
}
