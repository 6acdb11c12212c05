use std::{env, path::PathBuf};

use anyhow::{Context, Result};

const ENTRIES_ENV: &str = "TIMEBILL_ENTRIES";
const DEFAULT_RATE_ENV: &str = "TIMEBILL_DEFAULT_RATE";

/// 実行時の設定。
///
/// コマンドには引数として渡し、グローバルには参照しない。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// time entryを保存しているJSONファイルのパス
    pub entries_path: PathBuf,
    /// task, project, clientのいずれにも時給が無い場合に使う時給
    pub default_rate: Option<f64>,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// `TIMEBILL_ENTRIES`が無い場合はユーザーのデータディレクトリ配下の`timebill/entries.json`を使う。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `lookup`で取得した値から設定を作る。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let entries_path = match lookup(ENTRIES_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .with_context(|| format!("{} is not set and no data directory found", ENTRIES_ENV))?
                .join("timebill")
                .join("entries.json"),
        };
        let default_rate = lookup(DEFAULT_RATE_ENV)
            .map(|rate| parse_rate(&rate))
            .transpose()
            .with_context(|| format!("Invalid {}", DEFAULT_RATE_ENV))?;

        Ok(Self {
            entries_path,
            default_rate,
        })
    }

    /// コマンドライン引数で指定された値で上書きする。
    pub fn with_overrides(self, entries_path: Option<PathBuf>, default_rate: Option<f64>) -> Self {
        Self {
            entries_path: entries_path.unwrap_or(self.entries_path),
            default_rate: default_rate.or(self.default_rate),
        }
    }
}

/// 時給をパースする。負の値や数値でないものはエラーとする。
pub fn parse_rate(s: &str) -> Result<f64> {
    let rate: f64 = s
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse rate: {}", s))?;
    anyhow::ensure!(
        rate.is_finite() && rate >= 0.0,
        "Rate must be a non-negative number: {}",
        s
    );

    Ok(rate)
}
