use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::duration::round_minutes;
use crate::time_entry::Interval;

pub const HOURS_PER_DAY: usize = 24;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// 1時間ごとの作業時間の集計結果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HourBucket {
    pub hour: u32,
    pub minutes: i64,
    /// その1時間のうち作業していた割合。100を上限とする。
    pub percent: u32,
}

/// 1日の実作業区間を24個の1時間枠に振り分ける。
///
/// `h`番目の枠は`tz`での`date`の`h:00`から`h+1:00`(23時は翌日の00:00)までとする。
/// 夏時間で存在しない時刻の枠は空になり、2回ある時刻はどちらも同じ枠に入る。
/// 枠からはみ出た部分は無視する。
///
/// # Arguments
///
/// * `intervals` - 休憩を除いた実作業区間
/// * `tz` - 集計する日のタイムゾーン
/// * `date` - 集計する日
pub fn hour_distribution<Tz: TimeZone>(
    intervals: &[Interval],
    tz: &Tz,
    date: NaiveDate,
) -> Vec<HourBucket> {
    let midnight = date.and_time(NaiveTime::MIN);
    let boundaries: Vec<DateTime<Utc>> = (0..=HOURS_PER_DAY)
        .map(|hour| resolve_local(tz, midnight + Duration::hours(hour as i64)))
        .collect();

    boundaries
        .windows(2)
        .enumerate()
        .map(|(hour, bounds)| {
            let (hour_start, hour_end) = (bounds[0], bounds[1]);
            let millis: i64 = intervals
                .iter()
                .map(|interval| overlap_millis(interval, hour_start, hour_end))
                .sum();
            let percent = (millis as f64 / MILLIS_PER_HOUR * 100.0).round().min(100.0) as u32;

            HourBucket {
                hour: hour as u32,
                minutes: round_minutes(millis),
                percent,
            }
        })
        .collect()
}

/// ローカル時刻をUTCにする。
///
/// 2回ある時刻は早い方を使い、存在しない時刻は次に存在する時刻まで1分ずつ進める。
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    (0..=24 * 60)
        .find_map(|minutes| {
            tz.from_local_datetime(&(naive + Duration::minutes(minutes)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| tz.from_utc_datetime(&naive).with_timezone(&Utc))
}

fn overlap_millis(interval: &Interval, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let overlap_start = interval.start.max(start);
    let overlap_end = interval.end.min(end);
    (overlap_end - overlap_start).num_milliseconds().max(0)
}
