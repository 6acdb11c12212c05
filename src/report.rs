use std::collections::BTreeMap;

use log::warn;

use crate::duration::{compute_totals, EntryTotals};
use crate::rate::{resolve_rate_with_source, ResolvedRate};
use crate::time_entry::TimeEntry;

/// projectが設定されていないtime entryの集計キー。
pub const NO_PROJECT: &str = "(no project)";

/// time entryと集計結果の組。
#[derive(Clone, Debug, PartialEq)]
pub struct EntryReport {
    pub entry: TimeEntry,
    pub rate: Option<ResolvedRate>,
    pub totals: EntryTotals,
}

impl EntryReport {
    /// time entryの時給を解決し、作業時間と請求額を計算する。
    ///
    /// # Arguments
    ///
    /// * `entry` - 集計するtime entry
    /// * `fallback_rate` - 設定されたデフォルト時給
    pub fn new(entry: TimeEntry, fallback_rate: Option<f64>) -> Self {
        if entry.span.is_inverted() {
            warn!(
                "time entry {} ends before it starts (start: {}, end: {:?}), counted as 0 minutes",
                entry.id, entry.span.start, entry.span.end
            );
        }

        let rate = resolve_rate_with_source(&entry.rates.with_fallback(fallback_rate));
        let totals = compute_totals(&entry.span, &entry.breaks, rate.map(|rate| rate.rate));

        Self {
            entry,
            rate,
            totals,
        }
    }
}

/// projectごとの集計結果。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectTotals {
    /// 休憩を除いた作業時間(分)
    pub duration_minutes: i64,
    /// 時給が解決できたtime entryの請求額の合計
    pub amount: f64,
    /// 時給が解決できなかったtime entryの作業時間(分)
    pub unbilled_minutes: i64,
}

impl ProjectTotals {
    fn add(&mut self, totals: &EntryTotals) {
        self.duration_minutes += totals.duration_minutes;
        match totals.amount {
            Some(amount) => self.amount += amount,
            None => self.unbilled_minutes += totals.duration_minutes,
        }
    }
}

/// projectごとに作業時間と請求額を集計する。
///
/// 終了していないtime entryは集計対象外とする。
pub fn summarize_by_project(reports: &[EntryReport]) -> BTreeMap<String, ProjectTotals> {
    reports
        .iter()
        .filter(|report| !report.entry.span.is_running())
        .fold(BTreeMap::new(), |mut accumulate, report| {
            let key = report
                .entry
                .project
                .clone()
                .unwrap_or_else(|| NO_PROJECT.to_string());
            accumulate
                .entry(key)
                .or_insert_with(ProjectTotals::default)
                .add(&report.totals);
            accumulate
        })
}

/// 全体の合計を返す。
pub fn grand_total<'a>(totals: impl IntoIterator<Item = &'a ProjectTotals>) -> ProjectTotals {
    totals
        .into_iter()
        .fold(ProjectTotals::default(), |mut accumulate, totals| {
            accumulate.duration_minutes += totals.duration_minutes;
            accumulate.amount += totals.amount;
            accumulate.unbilled_minutes += totals.unbilled_minutes;
            accumulate
        })
}
