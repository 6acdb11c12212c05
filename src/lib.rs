//! 記録した作業時間から休憩を除いた作業時間、時給、請求額を計算する。

pub mod config;
pub mod console;
pub mod daily_command;
pub mod datetime;
pub mod duration;
pub mod logger;
pub mod monthly_command;
pub mod rate;
pub mod report;
pub mod store;
pub mod time_entry;
pub mod timeline;
