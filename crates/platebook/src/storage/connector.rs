//! Shared handle to the record store.
//!
//! A [`Connector`] is opened once at process start and cloned into every
//! request handler. `rusqlite` is blocking, so every call runs on tokio's
//! blocking pool behind a mutex.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

use super::Storage;

/// Cloneable handle to the process-wide [`Storage`].
#[derive(Debug, Clone)]
pub struct Connector {
    storage: Arc<Mutex<Storage>>,
}

impl Connector {
    /// Open the database named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(config: &Config) -> Result<Self> {
        let path = config.database_path();
        let busy_timeout = config.busy_timeout();

        let storage = tokio::task::spawn_blocking(move || {
            let storage = Storage::open(&path)?;
            storage.set_busy_timeout(busy_timeout)?;
            Ok::<_, Error>(storage)
        })
        .await
        .map_err(|e| Error::internal(format!("storage open task failed: {e}")))??;

        Ok(Self::new(storage))
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?))
    }

    /// Wrap an already opened storage.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Run a storage operation on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or [`Error::Internal`] if the
    /// blocking task panics. A lock poisoned by an earlier panic is
    /// recovered, so one failed call does not fail every later one.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage.lock().unwrap_or_else(|poisoned| {
                warn!("Storage lock poisoned by a panicked operation; recovering");
                poisoned.into_inner()
            });
            op(&*guard)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }

    /// Checkpoint and close the database.
    ///
    /// If other clones of this handle are still alive the connection stays
    /// open for them and only the checkpoint runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint or close fails.
    pub async fn shutdown(self) -> Result<()> {
        self.run(|storage| storage.checkpoint()).await?;

        match Arc::try_unwrap(self.storage) {
            Ok(mutex) => {
                let storage = mutex.into_inner().unwrap_or_else(|poisoned| {
                    warn!("Storage lock poisoned at shutdown; closing anyway");
                    poisoned.into_inner()
                });
                let path = storage.path().display().to_string();
                tokio::task::spawn_blocking(move || storage.close())
                    .await
                    .map_err(|e| Error::internal(format!("storage close task failed: {e}")))??;
                info!("Storage at {} closed", path);
            }
            Err(shared) => {
                warn!(
                    "Storage still referenced by {} handle(s) at shutdown; leaving it open",
                    Arc::strong_count(&shared) - 1
                );
            }
        }
        debug!("Connector shut down");
        Ok(())
    }
}
