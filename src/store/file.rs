use crate::store::error::CacheError;
use crate::store::{ObservationStore, StoreState, VerdictKey, VerdictRecord};
use crate::types::observation::Observation;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;

pub const STORE_FILE_NAME: &str = "metar_store.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Store backed by a single bincode file in the cache directory.
///
/// Writes are held in memory until [`commit`](ObservationStore::commit), which
/// encodes and replaces the file atomically on the blocking thread pool. A
/// crash before commit loses only the uncommitted writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Arc<Mutex<StoreState>>,
    dirty: Arc<AtomicBool>,
}

impl FileStore {
    /// Opens the store in `cache_dir`, starting empty when no store file exists
    /// yet. Blocking; call from `spawn_blocking` in async code.
    pub fn open(cache_dir: &Path) -> Result<Self, CacheError> {
        let path = cache_dir.join(STORE_FILE_NAME);
        let state = if path.exists() {
            let bytes =
                std::fs::read(&path).map_err(|e| CacheError::CacheRead(path.clone(), e))?;
            let (state, _) = bincode::serde::decode_from_slice::<StoreState, _>(
                &bytes,
                BINCODE_CONFIG,
            )
            .map_err(|e| CacheError::CacheDecode(path.clone(), Box::new(e)))?;
            info!(
                "Loaded {} cached observations from {}",
                state.len(),
                path.display()
            );
            state
        } else {
            debug!("No store file at {}, starting empty", path.display());
            StoreState::default()
        };

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(state)),
            dirty: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, CacheError> {
        self.state.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

/// Encodes the current state and swaps it into `path`. Blocking.
fn write_store(
    state: &Mutex<StoreState>,
    dirty: &AtomicBool,
    path: &Path,
) -> Result<(), CacheError> {
    let (bytes, observations) = {
        let state = state.lock().map_err(|_| CacheError::LockPoisoned)?;
        if !dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let encoded = bincode::serde::encode_to_vec(&*state, BINCODE_CONFIG);
        match encoded {
            Ok(bytes) => (bytes, state.len()),
            Err(e) => {
                dirty.store(true, Ordering::Release);
                return Err(CacheError::CacheEncode(Box::new(e)));
            }
        }
    };

    persist_bytes(&bytes, path).inspect_err(|_| dirty.store(true, Ordering::Release))?;
    debug!(
        "Committed {} observations ({} bytes) to {}",
        observations,
        bytes.len(),
        path.display()
    );
    Ok(())
}

fn persist_bytes(bytes: &[u8], path: &Path) -> Result<(), CacheError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file =
        NamedTempFile::new_in(dir).map_err(|e| CacheError::CacheWrite(path.to_path_buf(), e))?;
    file.write_all(bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| CacheError::CacheWrite(path.to_path_buf(), e))?;
    file.persist(path)
        .map_err(|e| CacheError::CachePersist(path.to_path_buf(), e))?;
    Ok(())
}

impl ObservationStore for FileStore {
    fn insert_if_absent(&self, observation: &Observation) -> Result<bool, CacheError> {
        let written = self.lock()?.insert_if_absent(observation)?;
        if written {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(written)
    }

    fn range(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, CacheError> {
        self.lock()?.range(station, begin, end)
    }

    fn contains_any(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, CacheError> {
        Ok(self.lock()?.contains_any(station, begin, end))
    }

    fn upsert_verdict(&self, key: VerdictKey, verdict: VerdictRecord) -> Result<(), CacheError> {
        self.lock()?.upsert_verdict(key, verdict);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    fn verdict(&self, key: &VerdictKey) -> Result<Option<VerdictRecord>, CacheError> {
        Ok(self.lock()?.verdict(key))
    }

    async fn commit(&self) -> Result<(), CacheError> {
        let state = Arc::clone(&self.state);
        let dirty = Arc::clone(&self.dirty);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_store(&state, &dirty, &path)).await?
    }
}
