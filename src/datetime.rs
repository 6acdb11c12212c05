use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 指定したタイムゾーンでの`date`の00:00を返す。
///
/// 夏時間の切り替えで00:00が存在しない場合はエラーを返す。
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<DateTime<Tz>> {
    let naive_datetime = date
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?;

    tz.from_local_datetime(&naive_datetime)
        .earliest()
        .with_context(|| format!("Failed to convert {} to local datetime", naive_datetime))
}

/// `date`を含む月の初日と翌月の初日を返す。
pub fn month_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let first = date.with_day(1).context("Failed to set day")?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .with_context(|| format!("Failed to compute the month after {}", first))?;

    Ok((first, next))
}
