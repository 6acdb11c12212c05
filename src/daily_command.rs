use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone, Utc};
use log::info;

use crate::config::Config;
use crate::datetime::{now, start_of_day};
use crate::duration::work_intervals;
use crate::report::EntryReport;
use crate::store::EntryRepository;
use crate::time_entry::Interval;
use crate::timeline::{hour_distribution, HourBucket};

/// 日毎の情報を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    pub date: Option<NaiveDate>,

    #[clap(long = "timeline", help = "Show worked minutes per hour")]
    pub timeline: bool,
}

/// `daily`サブコマンドの結果。
#[derive(Debug, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    /// 開始時刻順に並べたtime entry
    pub entries: Vec<EntryReport>,
    pub timeline: Option<Vec<HourBucket>>,
}

pub struct DailyCommand<'a, T: EntryRepository> {
    repository: &'a T,
    config: &'a Config,
}

impl<'a, T: EntryRepository> DailyCommand<'a, T> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `repository` - time entryを取得するためのリポジトリ
    /// * `config` - 実行時の設定
    pub fn new(repository: &'a T, config: &'a Config) -> Self {
        Self { repository, config }
    }

    /// `daily`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日付の00:00:00から始まる1日のタイムエントリーを集計する。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    pub async fn run(&self, daily: DailyArgs) -> Result<DailyReport> {
        self.run_in(&Local, daily).await
    }

    /// 指定したタイムゾーンで`daily`サブコマンドの処理を行う。
    pub async fn run_in<Tz: TimeZone>(&self, tz: &Tz, daily: DailyArgs) -> Result<DailyReport> {
        let date = daily
            .date
            .unwrap_or_else(|| now().with_timezone(tz).date_naive());
        let start_at = start_of_day(tz, date)?;
        let next_date = date
            .succ_opt()
            .with_context(|| format!("Failed to get the day after {}", date))?;
        let end_at = start_of_day(tz, next_date)?;
        let (start_utc, end_utc) = (start_at.with_timezone(&Utc), end_at.with_timezone(&Utc));
        info!("Start at: {}, End at: {}", start_utc, end_utc);

        let mut time_entries = self
            .repository
            .read_time_entries(&start_utc, &end_utc)
            .await
            .context("Failed to retrieve time entries")?;
        time_entries.sort_by_key(|entry| entry.span.start);
        info!("Time entries retrieved successfully.");

        let entries: Vec<EntryReport> = time_entries
            .into_iter()
            .map(|entry| EntryReport::new(entry, self.config.default_rate))
            .collect();

        let timeline = if daily.timeline {
            // 前日から続いているtime entryも含めるため、開始日ではなく重なりで取得する
            let overlapping_entries = self
                .repository
                .read_overlapping_entries(&start_utc, &end_utc)
                .await
                .context("Failed to retrieve overlapping time entries")?;
            // 計測中のtime entryは現在時刻までを作業時間として表示する
            let now = now();
            let intervals: Vec<Interval> = overlapping_entries
                .iter()
                .flat_map(|entry| work_intervals(&entry.span.closed_at(now), &entry.breaks))
                .collect();
            Some(hour_distribution(&intervals, tz, date))
        } else {
            None
        };

        Ok(DailyReport {
            date,
            entries,
            timeline,
        })
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}
