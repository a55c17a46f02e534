use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// `--config` を省略したときに読み込む設定ファイル。
pub const DEFAULT_CONFIG_PATH: &str = "evtz.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_events_file")]
    pub events_file: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            events_file: default_events_file(),
            backup_dir: default_backup_dir(),
            conversion: ConversionConfig::default(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// 入力された現地時刻の IANA タイムゾーン名
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_source_timezone")]
    pub source_timezone: Tz,
    /// バックアップに失敗しても確認せずに続行する
    #[serde(default)]
    pub assume_yes: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            source_timezone: default_source_timezone(),
            assume_yes: false,
        }
    }
}

fn default_events_file() -> PathBuf {
    PathBuf::from("events.json")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_source_timezone() -> Tz {
    chrono_tz::Europe::Berlin
}

pub fn open_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
    let config: Config = toml::from_str(&content).context("Failed to parse configuration file")?;
    Ok(config)
}

/// 設定を読み込む。
///
/// `path` が指定されていればそのファイルを必須とし、省略時は [`DEFAULT_CONFIG_PATH`] が
/// 存在する場合のみ読み込む。どちらも無ければ既定値を使う。
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => open_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => open_config(DEFAULT_CONFIG_PATH),
        None => Ok(Config::default()),
    }
}

pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let content =
        toml::to_string_pretty(&Config::default()).context("Failed to serialize configuration")?;
    fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
    Ok(())
}
