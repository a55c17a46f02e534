//! イベント JSON ファイルの読み書き。

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use serde::Serialize as _;
use serde_json::ser::{PrettyFormatter, Serializer};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::record::EventDocument;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, StoreError>;

const INDENT: &[u8] = b"    ";

/// イベント JSON ファイルと、その読み込み済みの内容。
pub struct EventStore {
    /// 永続化ファイルのパス
    path: PathBuf,
    /// 読み込んだドキュメント
    document: EventDocument,
}

impl EventStore {
    /// ファイルを読み込む。
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let document = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, document })
    }

    /// ドキュメント全体をファイルに書き込む。
    ///
    /// 同じディレクトリの一時ファイルに書き出してから置き換えるため、
    /// 途中で失敗しても元のファイルは書きかけの状態にならない。
    pub fn save(&self) -> Result<()> {
        let content = to_json(&self.document)?;
        let write_error = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
        temp.write_all(&content).map_err(write_error)?;
        if let Ok(metadata) = fs::metadata(&self.path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(write_error)?;
        }
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(&self.path).map_err(|e| write_error(e.error))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &EventDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut EventDocument {
        &mut self.document
    }
}

/// 4 スペースでインデントした JSON を返す。非 ASCII 文字はエスケープしない。
fn to_json(document: &EventDocument) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
