//! Markdown report generation.
//!
//! [`MarkdownGenerator`] renders a [`Report`] as a document with a summary
//! table followed by one section per question. Scored sessions also list the
//! candidate's answer, score and feedback, and call out the weakest answers.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use prepmaster_orchestrator::QuestionType;

use crate::{Report, ReportEntry};

/// Generates Markdown reports from session results.
pub struct MarkdownGenerator<'a> {
    report: &'a Report,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report, ending with a timestamped footer.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = self.generate_body();
        Self::write_footer(&mut output);
        output
    }

    /// Everything except the footer.
    fn generate_body(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_focus_areas(&mut output);
        self.write_entries(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# PrepMaster Session Report: {}\n",
            escape_markdown(&self.report.summary.job_role)
        );
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;
        let topic = if summary.topic.trim().is_empty() {
            "Core competencies".to_string()
        } else {
            escape_markdown(&summary.topic)
        };

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Role | {} |", escape_markdown(&summary.job_role));
        let _ = writeln!(output, "| Topic | {topic} |");
        let _ = writeln!(output, "| Level | {} |", summary.difficulty);
        let _ = writeln!(output, "| Mode | {} |", summary.mode);
        let _ = writeln!(
            output,
            "| Questions | {} of {} |",
            summary.answered, summary.question_count
        );
        let _ = writeln!(
            output,
            "| Duration | {} |",
            format_duration(summary.duration_seconds)
        );
        if let Some(average) = summary.average_score {
            let band = summary.band.map(|b| b.to_string()).unwrap_or_default();
            let _ = writeln!(output, "| Average Score | {average:.1}/10 ({band}) |");
        }
        let _ = writeln!(output);

        if let Some(line) = &summary.share_line {
            let _ = writeln!(output, "> {line}\n");
        }
    }

    /// Lists weak answers so they can be revisited first.
    fn write_focus_areas(&self, output: &mut String) {
        if !self.report.is_scored() {
            return;
        }
        let weak = self.report.weakest_entries();

        let _ = writeln!(output, "## Focus Areas\n");
        if weak.is_empty() {
            let _ = writeln!(output, "No answers scored below 5.\n");
            return;
        }
        for entry in weak {
            let score = entry.evaluation.as_ref().map_or(0, |ev| ev.score);
            let _ = writeln!(
                output,
                "- **Q{}** ({}): {} - {score}/10",
                entry.number,
                escape_markdown(&entry.topic),
                escape_markdown(&entry.text)
            );
        }
        let _ = writeln!(output);
    }

    fn write_entries(&self, output: &mut String) {
        let _ = writeln!(output, "## Questions\n");
        if self.report.entries.is_empty() {
            let _ = writeln!(output, "No questions recorded.\n");
            return;
        }
        for entry in &self.report.entries {
            Self::write_entry(output, entry);
        }
    }

    fn write_entry(output: &mut String, entry: &ReportEntry) {
        let _ = writeln!(
            output,
            "### {}. {}\n",
            entry.number,
            escape_markdown(&entry.text)
        );
        let _ = writeln!(
            output,
            "**Topic**: {} | **Type**: {}\n",
            escape_markdown(&entry.topic),
            entry.question_type
        );
        if !entry.hint.trim().is_empty() {
            let _ = writeln!(output, "**Hint**: {}\n", escape_markdown(&entry.hint));
        }

        match &entry.evaluation {
            Some(evaluation) => {
                let _ = writeln!(output, "**Score**: {}/10\n", evaluation.score);
                let _ = writeln!(output, "**Your answer**:\n");
                write_block(output, &evaluation.user_answer, entry.question_type);
                let _ = writeln!(output, "**Feedback**: {}\n", evaluation.feedback.trim());
                let _ = writeln!(output, "**Ideal answer**:\n");
                write_block(output, &evaluation.ideal_answer, entry.question_type);
            }
            None => {
                let _ = writeln!(output, "**Answer**:\n");
                write_block(output, &entry.reference_answer, entry.question_type);
                if let Some(example) = &entry.example {
                    let _ = writeln!(output, "**Example**:\n");
                    write_block(output, example, QuestionType::Code);
                }
            }
        }
    }

    fn write_footer(output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&Utc::now());
        let _ = writeln!(output, "*Generated by PrepMaster at {timestamp}*");
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Writes code as a fenced block and prose as a quote.
fn write_block(output: &mut String, text: &str, question_type: QuestionType) {
    match question_type {
        QuestionType::Code => {
            let fence = code_fence_for(text);
            let _ = writeln!(output, "{fence}\n{}\n{fence}\n", text.trim_end());
        }
        QuestionType::Text => {
            for line in text.trim().lines() {
                let _ = writeln!(output, "> {line}");
            }
            let _ = writeln!(output);
        }
    }
}

/// Picks a fence longer than any backtick run inside `text`.
fn code_fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Formats a duration in seconds, e.g. 65 becomes "1m 5s".
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();

    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}

/// Format: "YYYY-MM-DD HH:MM:SS UTC"
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes Markdown control characters in inline text.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}
