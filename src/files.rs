use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}_[A-Za-z0-9._-]+$").unwrap());

#[derive(Debug)]
pub enum FileError {
    NotFound(String),
    InvalidName(String),
    Io(std::io::Error),
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::NotFound(reference) => write!(f, "File not found: {reference}"),
            FileError::InvalidName(name) => write!(f, "Invalid file name: {name}"),
            FileError::Io(err) => write!(f, "File I/O error: {err}"),
        }
    }
}

impl std::error::Error for FileError {}

impl From<std::io::Error> for FileError {
    fn from(err: std::io::Error) -> Self {
        FileError::Io(err)
    }
}

/// An uploaded file opened for reading. The handle is closed when this is dropped.
pub struct OpenedFile {
    pub file: tokio::fs::File,
    pub file_name: String,
    pub len: u64,
}

/// Flat directory of uploaded résumés. References are `<uuid>_<sanitized name>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an upload and return its reference.
    pub async fn save(&self, original_name: &str, contents: &[u8]) -> Result<String, FileError> {
        let name = sanitize_file_name(original_name)
            .ok_or_else(|| FileError::InvalidName(original_name.to_string()))?;
        let reference = format!("{}_{name}", Uuid::now_v7().simple());

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&reference), contents).await?;

        tracing::debug!("Stored upload {reference} ({} bytes)", contents.len());
        Ok(reference)
    }

    /// Best-effort removal of an upload whose record was never created.
    pub async fn remove(&self, reference: &str) {
        if !REFERENCE_RE.is_match(reference) {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.root.join(reference)).await {
            tracing::warn!("Failed to remove orphaned upload {reference}: {e}");
        }
    }

    /// Open a stored file. Missing files map to `FileError::NotFound`.
    pub async fn open(&self, reference: &str) -> Result<OpenedFile, FileError> {
        if !REFERENCE_RE.is_match(reference) {
            return Err(FileError::InvalidName(reference.to_string()));
        }

        let path = self.root.join(reference);
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileError::NotFound(reference.to_string()));
            }
            Err(e) => return Err(FileError::Io(e)),
        };
        let len = file.metadata().await?.len();

        Ok(OpenedFile {
            file,
            file_name: display_name(reference).to_string(),
            len,
        })
    }
}

/// Reduce an uploaded file name to a safe basename, or `None` if nothing usable remains.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = UNSAFE_CHARS_RE.replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c == '_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// The original (sanitized) name, without the uniqueness prefix.
pub fn display_name(reference: &str) -> &str {
    reference
        .split_once('_')
        .map(|(_, name)| name)
        .unwrap_or(reference)
}
