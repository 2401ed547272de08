//! Uploaded media: the binary goes into the uploads directory, the metadata
//! into the `media` collection.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::models::{MediaItem, MediaType, MEDIA};
use crate::store::{FlatFileStore, StoreError};

/// Public path prefix the uploads directory is served under.
pub const UPLOADS_ROUTE: &str = "uploads";

/// Longest client name kept, in bytes. Leaves room for the
/// `<millis>-<uuid>_` prefix inside a 255-byte file name.
const MAX_BASE_NAME_BYTES: usize = 200;

/// Extensions longer than this are treated as part of the stem when truncating.
const MAX_EXTENSION_BYTES: usize = 16;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File is required")]
    MissingFile,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid media URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A file pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub content_type: Option<String>,
}

#[derive(Debug)]
pub struct MediaLibrary {
    uploads_dir: PathBuf,
    public_url: String,
    store: Arc<FlatFileStore>,
}

impl MediaLibrary {
    pub fn new(uploads_dir: impl Into<PathBuf>, public_url: impl Into<String>, store: Arc<FlatFileStore>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            public_url: public_url.into(),
            store,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Store the file, record its metadata and return the new item.
    pub async fn receive(
        &self,
        file: Option<IncomingFile>,
        description: Option<String>,
    ) -> Result<MediaItem, UploadError> {
        let file = match file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => return Err(UploadError::MissingFile),
        };

        let original_name = file.original_name.clone();
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let (filename, path) = self.write_file(&original_name, &file.bytes).await?;

        let item = MediaItem {
            url: self.url_for(&filename)?,
            filename,
            original_name,
            media_type: MediaType::from_content_type(&content_type),
            description: description.unwrap_or_default(),
            date: Utc::now(),
        };

        match self.store.append(MEDIA, item).await {
            Ok(item) => {
                tracing::info!(
                    filename = %item.filename,
                    content_type = %content_type,
                    bytes = file.bytes.len(),
                    "stored upload"
                );
                Ok(item)
            }
            Err(e) => {
                // Metadata is the source of truth; drop the orphaned binary.
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove orphaned upload");
                }
                Err(e.into())
            }
        }
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.uploads_dir.clone(),
                source,
            })
    }

    /// Absolute link to a stored file.
    pub fn url_for(&self, filename: &str) -> Result<String, UploadError> {
        let mut url = Url::parse(&self.public_url)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(UPLOADS_ROUTE)
            .push(filename);
        Ok(url.into())
    }

    /// Write `bytes` under a fresh name, never overwriting an existing upload.
    async fn write_file(&self, original_name: &str, bytes: &[u8]) -> Result<(String, PathBuf), UploadError> {
        self.ensure_dir().await?;

        let base = storage_base_name(original_name);
        let millis = Utc::now().timestamp_millis();

        let mut filename = format!("{millis}_{base}");
        let mut file = None;
        for _ in 0..4 {
            let path = self.uploads_dir.join(&filename);
            match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(f) => {
                    file = Some((f, path));
                    break;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    filename = format!("{millis}-{}_{base}", uuid::Uuid::new_v4().simple());
                }
                Err(source) => return Err(UploadError::Io { path, source }),
            }
        }

        let (mut f, path) = file.ok_or_else(|| UploadError::Io {
            path: self.uploads_dir.join(&filename),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "could not find a free upload name"),
        })?;

        let written = async {
            f.write_all(bytes).await?;
            f.flush().await
        }
        .await;

        if let Err(source) = written {
            drop(f);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(UploadError::Io { path, source });
        }

        Ok((filename, path))
    }
}

/// Final path component of a client-supplied name, so uploads cannot escape
/// the uploads directory.
fn storage_base_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "" | "." | ".." => "upload".to_string(),
        name => truncate_name(name, MAX_BASE_NAME_BYTES),
    }
}

/// Cut `name` down to `max` bytes on a char boundary, keeping a short extension.
fn truncate_name(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    };

    let mut cut = max - extension.len();
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{extension}", &stem[..cut])
}
