use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use timebill::config::{parse_rate, Config};
use timebill::console::{ConsoleMarkdownList, ConsolePresenter};
use timebill::daily_command::{DailyArgs, DailyCommand};
use timebill::logger;
use timebill::monthly_command::{MonthlyArgs, MonthlyCommand};
use timebill::store::JsonEntryStore;

/// 記録したtime entryの作業時間と請求額を集計するCLIアプリケーション。
///
/// # Examples
/// ```text
/// $ cargo run -- daily --timeline
/// $ cargo run -- monthly --month 2024-01 --daily
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        long = "entries",
        global = true,
        help = "Path to the JSON file with clients, projects, tasks and time entries",
        parse(from_os_str)
    )]
    entries: Option<PathBuf>,

    #[clap(
        long = "default-rate",
        global = true,
        help = "Hourly rate used when no task, project or client rate is set",
        parse(try_from_str = parse_rate)
    )]
    default_rate: Option<f64>,

    #[clap(short = 'v', long = "verbose", global = true, help = "Show debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Daily(DailyArgs),
    Monthly(MonthlyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::init(args.verbose)?;

    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_overrides(args.entries, args.default_rate);
    let store = JsonEntryStore::new(config.entries_path.clone());

    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);
    match args.subcommand {
        SubCommands::Daily(daily) => {
            let report = DailyCommand::new(&store, &config).run(daily).await?;
            presenter.show_daily(&report)?;
        }
        SubCommands::Monthly(monthly) => {
            let report = MonthlyCommand::new(&store, &config).run(monthly).await?;
            presenter.show_monthly(&report)?;
        }
    }

    Ok(())
}
