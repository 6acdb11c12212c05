use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone, Utc};
use log::info;

use crate::config::Config;
use crate::datetime::{month_bounds, now, start_of_day};
use crate::report::{summarize_by_project, EntryReport, ProjectTotals};
use crate::store::EntryRepository;

/// `monthly`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct MonthlyArgs {
    #[clap(
        short = 'm',
        long = "month",
        help = "Sets a custom month in the format YYYY-MM",
        parse(try_from_str = parse_month),
    )]
    pub month: Option<NaiveDate>,

    #[clap(long = "daily", help = "Show summary by day")]
    pub daily: bool,
}

/// 集計結果のまとまり。`--daily`の場合は1日ごと、それ以外は月全体で1つ。
#[derive(Debug, PartialEq)]
pub struct SummarySection {
    pub date: Option<NaiveDate>,
    pub projects: BTreeMap<String, ProjectTotals>,
}

/// `monthly`サブコマンドの結果。
#[derive(Debug, PartialEq)]
pub struct MonthlyReport {
    /// 集計した月の初日
    pub month: NaiveDate,
    pub sections: Vec<SummarySection>,
}

pub struct MonthlyCommand<'a, T: EntryRepository> {
    repository: &'a T,
    config: &'a Config,
}

impl<'a, T: EntryRepository> MonthlyCommand<'a, T> {
    /// 新しい`MonthlyCommand`を返す。
    pub fn new(repository: &'a T, config: &'a Config) -> Self {
        Self { repository, config }
    }

    /// `monthly`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された月のtime entryをprojectごとに集計する。
    /// 月が指定されていない場合は、Localタイムゾーンで現在の月を利用する。
    pub async fn run(&self, monthly: MonthlyArgs) -> Result<MonthlyReport> {
        self.run_in(&Local, monthly).await
    }

    /// 指定したタイムゾーンで`monthly`サブコマンドの処理を行う。
    pub async fn run_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
        monthly: MonthlyArgs,
    ) -> Result<MonthlyReport> {
        let date = monthly
            .month
            .unwrap_or_else(|| now().with_timezone(tz).date_naive());
        let (first_day, next_month) = month_bounds(date)?;
        let start_at = start_of_day(tz, first_day)?.with_timezone(&Utc);
        let end_at = start_of_day(tz, next_month)?.with_timezone(&Utc);
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .repository
            .read_time_entries(&start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        let reports: Vec<EntryReport> = time_entries
            .into_iter()
            .map(|entry| EntryReport::new(entry, self.config.default_rate))
            .collect();

        let sections = if monthly.daily {
            let daily_reports: BTreeMap<NaiveDate, Vec<EntryReport>> =
                reports.into_iter().fold(BTreeMap::new(), |mut acc, report| {
                    let date = report.entry.span.start.with_timezone(tz).date_naive();
                    acc.entry(date).or_default().push(report);
                    acc
                });
            daily_reports
                .into_iter()
                .map(|(date, reports)| SummarySection {
                    date: Some(date),
                    projects: summarize_by_project(&reports),
                })
                .collect()
        } else {
            vec![SummarySection {
                date: None,
                projects: summarize_by_project(&reports),
            }]
        };

        Ok(MonthlyReport {
            month: first_day,
            sections,
        })
    }
}

/// 月をパースする。
fn parse_month(s: &str) -> Result<NaiveDate> {
    let target_date = s.to_string() + "-01";
    NaiveDate::parse_from_str(&target_date, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse month: {}", s))
}
