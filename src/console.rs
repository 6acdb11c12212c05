use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;

use crate::daily_command::DailyReport;
use crate::monthly_command::MonthlyReport;
use crate::report::{grand_total, summarize_by_project, EntryReport, ProjectTotals};
use crate::timeline::HourBucket;

/// Consoleに集計結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// 1日のタイムエントリーを表示する。
    fn show_daily(&mut self, report: &DailyReport) -> Result<()>;

    /// 1ヶ月のprojectごとの集計結果を表示する。
    fn show_monthly(&mut self, report: &MonthlyReport) -> Result<()>;
}

/// 集計結果をMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn show_entry(&mut self, report: &EntryReport) -> Result<()> {
        let entry = &report.entry;
        let start_str = entry
            .span
            .start
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
        let end_str = entry
            .span
            .end
            .map(|end| end.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_else(|| "now".to_string());
        let project_str = entry
            .project
            .as_ref()
            .map(|project| format!(" [{}]", project))
            .unwrap_or_default();
        let totals_str = if entry.span.is_running() {
            "running".to_string()
        } else {
            let rate_str = report
                .rate
                .map(|rate| format!(" ({} {:.2}/h)", rate.source.label(), rate.rate))
                .unwrap_or_default();
            format!(
                "{} {}{}",
                format_minutes(report.totals.duration_minutes),
                format_amount(report.totals.amount),
                rate_str
            )
        };

        writeln!(
            self.writer,
            "- {} ~ {}: {}{} {}",
            start_str, end_str, entry.description, project_str, totals_str
        )
        .with_context(|| format!("Failed to write time entry: {:?}", entry))
    }

    fn show_totals(&mut self, label: &str, totals: &ProjectTotals) -> Result<()> {
        let unbilled_str = if totals.unbilled_minutes > 0 {
            format!(" (unbilled {})", format_minutes(totals.unbilled_minutes))
        } else {
            String::new()
        };

        writeln!(
            self.writer,
            "- {}: {} {:.2}{}",
            label,
            format_minutes(totals.duration_minutes),
            totals.amount,
            unbilled_str
        )
        .with_context(|| format!("Failed to write totals: {}", label))
    }

    fn show_timeline(&mut self, timeline: &[HourBucket]) -> Result<()> {
        writeln!(self.writer, "\n## Timeline").context("Failed to write timeline header")?;
        for bucket in timeline {
            writeln!(
                self.writer,
                "- {:02}:00 {:>2}m {:>3}% {}",
                bucket.hour,
                bucket.minutes,
                bucket.percent,
                "#".repeat((bucket.percent / 10) as usize)
            )
            .with_context(|| format!("Failed to write hour bucket: {:?}", bucket))?;
        }

        Ok(())
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    fn show_daily(&mut self, report: &DailyReport) -> Result<()> {
        writeln!(self.writer, "# {}", report.date).context("Failed to write date")?;
        for entry in &report.entries {
            self.show_entry(entry)?;
        }

        let summary = summarize_by_project(&report.entries);
        self.show_totals("Total", &grand_total(summary.values()))?;

        if let Some(timeline) = &report.timeline {
            self.show_timeline(timeline)?;
        }

        Ok(())
    }

    fn show_monthly(&mut self, report: &MonthlyReport) -> Result<()> {
        writeln!(self.writer, "# {}", report.month.format("%Y-%m"))
            .context("Failed to write month")?;
        for section in &report.sections {
            if let Some(date) = section.date {
                writeln!(self.writer, "## {}", date).context("Failed to write date")?;
            }
            for (project, totals) in &section.projects {
                self.show_totals(project, totals)?;
            }
        }

        let total = grand_total(
            report
                .sections
                .iter()
                .flat_map(|section| section.projects.values()),
        );
        self.show_totals("Total", &total)
    }
}

/// 分を`H:MM`形式にする。
fn format_minutes(minutes: i64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// 請求額を表示用にする。時給が無い場合は`-`とする。
fn format_amount(amount: Option<f64>) -> String {
    amount
        .map(|amount| format!("{:.2}", amount))
        .unwrap_or_else(|| "-".to_string())
}
