//! Fetch-if-absent cache of face-restoration weights.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::consts::DOWNLOAD_SUFFIX;
use crate::error::ProvisioningError;
use crate::models::RestoreModel;

/// Downloads a remote file to a local path.
pub trait ModelFetcher: Send + Sync {
    /// Write the body at `url` to `dest`, returning the number of bytes written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, ProvisioningError>;
}

/// Blocking HTTP(S) download.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, ProvisioningError> {
        let http_err = |source| ProvisioningError::Http {
            url: url.to_string(),
            source,
        };
        let mut response = self.client.get(url).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProvisioningError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let mut file = File::create(dest)?;
        let written = response.copy_to(&mut file).map_err(http_err)?;
        file.flush()?;
        Ok(written)
    }
}

/// Local directory of model weights, filled on demand.
pub struct ModelStore {
    dir: PathBuf,
    fetcher: Box<dyn ModelFetcher>,
    /// Held for the whole check-download-rename sequence.
    provisioning: Mutex<()>,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>, fetcher: Box<dyn ModelFetcher>) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            provisioning: Mutex::new(()),
        }
    }

    /// Store backed by [`HttpFetcher`].
    pub fn with_http(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, Box::new(HttpFetcher::new()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the weights of `model` live once provisioned.
    pub fn path_for(&self, model: RestoreModel) -> PathBuf {
        self.dir.join(model.file_name())
    }

    pub fn is_present(&self, model: RestoreModel) -> bool {
        self.path_for(model).is_file()
    }

    /// Return the local weights path, downloading first if the file is absent.
    ///
    /// Concurrent calls are serialized, so a model is fetched at most once.
    /// The body goes to a uniquely named side file that is renamed into place
    /// only after a complete, non-empty download; a failed download never
    /// leaves a file that would later count as present.
    pub fn ensure_model(&self, model: RestoreModel) -> Result<PathBuf, ProvisioningError> {
        let _guard = self
            .provisioning
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let path = self.path_for(model);
        if path.is_file() {
            debug!(model = %model, path = %path.display(), "Model weights already present");
            return Ok(path);
        }

        std::fs::create_dir_all(&self.dir)?;
        let partial = tempfile::Builder::new()
            .prefix(&format!("{}.", model.file_name()))
            .suffix(&format!(".{DOWNLOAD_SUFFIX}"))
            .tempfile_in(&self.dir)?;
        info!(model = %model, url = model.url(), "Downloading model weights");

        let written = self.fetcher.fetch(model.url(), partial.path())?;
        if written == 0 {
            return Err(ProvisioningError::EmptyDownload {
                url: model.url().to_string(),
            });
        }

        partial.persist(&path).map_err(|e| ProvisioningError::Io(e.error))?;
        info!(model = %model, bytes = written, path = %path.display(), "Model weights saved");
        Ok(path)
    }
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore").field("dir", &self.dir).finish()
    }
}
