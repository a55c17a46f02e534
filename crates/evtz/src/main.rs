mod config;
mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use event_normalizer::{Always, Normalizer, PromptConfirm, RunOptions, run};
use tracing::info;

use crate::{
    config::{DEFAULT_CONFIG_PATH, load_config, write_default_config},
    version::{long_version, short_version},
};

/// イベント JSON の現地時刻を UTC に変換する。
#[derive(Parser)]
#[command(version = short_version(), long_version = long_version())]
struct Args {
    /// 設定ファイル（省略時は evtz.toml があれば読み込む）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 既定の設定ファイルを書き出して終了する
    #[arg(long)]
    init: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.init {
        let path = args
            .config
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        write_default_config(&path)?;
        info!(path = ?path, "Created default configuration");
        return Ok(());
    }

    info!(version = short_version(), "evtz version");

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    info!(
        events_file = ?config.events_file,
        timezone = %config.conversion.source_timezone,
        "Configuration loaded"
    );

    let options = RunOptions {
        events_file: config.events_file,
        backup_dir: config.backup_dir,
        normalizer: Normalizer::new(config.conversion.source_timezone),
        started_at: chrono::Local::now().naive_local(),
    };

    let summary = if config.conversion.assume_yes {
        run(&options, &mut Always(true))
    } else {
        run(&options, &mut PromptConfirm::stdin())
    }
    .context("Failed to convert events")?;

    info!(written = summary.written, "{}", summary.report);
    Ok(())
}
