use chrono::{DateTime, Utc};

use crate::rate::RateContext;

/// 記録された作業期間。
///
/// `end`が`None`の場合は計測中を表す。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeSpan {
    /// 新しい`TimeSpan`を返す。
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// 計測中かどうかを返す。
    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }

    /// 終了時刻が`start`より前になっている不整合なデータかどうかを返す。
    pub fn is_inverted(&self) -> bool {
        self.end.map_or(false, |end| end < self.start)
    }

    /// 計測中であれば`now`で閉じた`TimeSpan`を返す。
    ///
    /// 保存されているデータは変更しない。`now`が`start`より前の場合は`start`で閉じる。
    pub fn closed_at(&self, now: DateTime<Utc>) -> Self {
        match self.end {
            Some(_) => *self,
            None => Self::new(self.start, Some(now.max(self.start))),
        }
    }
}

/// 作業期間中の休憩。`end`が`None`の場合は休憩中を表す。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakInterval {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl BreakInterval {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }
}

/// 両端が確定している区間。休憩を除いた実作業区間を表す。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 区間の長さをミリ秒で返す。
    pub fn num_milliseconds(&self) -> i64 {
        (self.end - self.start).num_milliseconds().max(0)
    }
}

/// データ層から読み込んだtime entry。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub description: String,
    pub project: Option<String>,
    pub task: Option<String>,
    pub span: TimeSpan,
    pub breaks: Vec<BreakInterval>,
    pub rates: RateContext,
}
