use chrono::{DateTime, Utc};

use crate::time_entry::{BreakInterval, Interval, TimeSpan};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// time entryの集計結果。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntryTotals {
    /// 休憩を除いた作業時間(分)
    pub duration_minutes: i64,
    /// 請求額。時給が無い場合は`None`
    pub amount: Option<f64>,
}

/// `[start, end]`から休憩を除いた実作業区間を返す。
///
/// 各休憩は`[start, end]`に切り詰めてから重なりを結合する。
/// 終了していない休憩は`end`で閉じたものとして扱う。
/// `end`が`start`より前の場合は空を返す。
pub fn work_intervals_between(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    breaks: &[BreakInterval],
) -> Vec<Interval> {
    if end <= start {
        return vec![];
    }

    let mut intervals = Vec::new();
    let mut cursor = start;
    for pause in coalesced_breaks(start, end, breaks) {
        if pause.start > cursor {
            intervals.push(Interval::new(cursor, pause.start));
        }
        cursor = cursor.max(pause.end);
    }
    if end > cursor {
        intervals.push(Interval::new(cursor, end));
    }

    intervals
}

/// `span`から休憩を除いた実作業区間を返す。計測中の場合は空を返す。
pub fn work_intervals(span: &TimeSpan, breaks: &[BreakInterval]) -> Vec<Interval> {
    match span.end {
        Some(end) => work_intervals_between(span.start, end, breaks),
        None => vec![],
    }
}

/// 休憩を除いた作業時間を分単位で返す。
///
/// 計測中(`end`が`None`)の場合は0を返す。
/// 1分未満はミリ秒単位で四捨五入する。
pub fn compute_net_duration(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    breaks: &[BreakInterval],
) -> i64 {
    let Some(end) = end else {
        return 0;
    };

    let net_millis: i64 = work_intervals_between(start, end, breaks)
        .iter()
        .map(Interval::num_milliseconds)
        .sum();

    round_minutes(net_millis)
}

/// 作業時間と時給から請求額を返す。小数点以下2桁に丸める。
///
/// 時給が無い場合は`None`を返す。時給0の場合は`Some(0.0)`となる。
pub fn compute_amount(net_minutes: i64, rate: Option<f64>) -> Option<f64> {
    rate.map(|rate| round_cents(net_minutes as f64 / 60.0 * rate))
}

/// 作業時間と請求額をまとめて計算する。
///
/// 計測中のtime entryは時給があっても請求額を`None`とする。
pub fn compute_totals(span: &TimeSpan, breaks: &[BreakInterval], rate: Option<f64>) -> EntryTotals {
    let duration_minutes = compute_net_duration(span.start, span.end, breaks);
    let amount = if span.is_running() {
        None
    } else {
        compute_amount(duration_minutes, rate)
    };

    EntryTotals {
        duration_minutes,
        amount,
    }
}

/// ミリ秒を分に四捨五入する。
pub(crate) fn round_minutes(millis: i64) -> i64 {
    (millis.max(0) + MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `[start, end]`に切り詰めた休憩を開始順に並べ、重なりを結合して返す。
fn coalesced_breaks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    breaks: &[BreakInterval],
) -> Vec<Interval> {
    let mut clipped: Vec<Interval> = breaks
        .iter()
        .filter_map(|pause| {
            let pause_start = pause.start.max(start);
            let pause_end = pause.end.unwrap_or(end).min(end);
            (pause_end > pause_start).then(|| Interval::new(pause_start, pause_end))
        })
        .collect();
    clipped.sort_by_key(|pause| pause.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(clipped.len());
    for pause in clipped {
        if let Some(last) = merged.last_mut() {
            if pause.start <= last.end {
                last.end = last.end.max(pause.end);
                continue;
            }
        }
        merged.push(pause);
    }

    merged
}
