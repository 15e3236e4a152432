use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::AppError;

const MEDIA_DIR: &str = "trip_media";
const LOCAL_ORIGIN: &str = "http://localhost/";

/// Uploaded trip media on the local filesystem. Files are addressed by a path
/// relative to the storage root, which is what the database keeps.
#[derive(Clone)]
pub struct MediaStorage {
    root: Arc<PathBuf>,
    base_url: Arc<String>,
}

impl MediaStorage {
    pub fn new(root: PathBuf, base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: Arc::new(root),
            base_url: Arc::new(base_url),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root().join(MEDIA_DIR)).await?;
        Ok(())
    }

    /// Stores `bytes` under a fresh name, keeping the original extension.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        let relative = match extension_of(original_name) {
            Some(ext) => format!("{MEDIA_DIR}/{}.{ext}", Uuid::new_v4().simple()),
            None => format!("{MEDIA_DIR}/{}", Uuid::new_v4().simple()),
        };
        let path = self.root().join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!(file = %relative, size = bytes.len(), "stored media file");
        Ok(relative)
    }

    /// Removes a stored file; a file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<(), AppError> {
        match fs::remove_file(self.root().join(relative)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn exists(&self, relative: &str) -> Result<bool, AppError> {
        Ok(fs::try_exists(self.root().join(relative)).await?)
    }

    /// Public URL of a stored file. A relative `MEDIA_URL` yields a path,
    /// an absolute one a full URL.
    pub fn file_url(&self, relative: &str) -> String {
        let absolute = Url::parse(&self.base_url).is_ok();
        let joined = Url::parse(LOCAL_ORIGIN)
            .and_then(|origin| origin.join(&self.base_url))
            .and_then(|base| base.join(relative));
        match joined {
            Ok(url) if absolute => url.to_string(),
            Ok(url) => url.path().to_string(),
            Err(_) => format!("{}{relative}", self.base_url),
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}
