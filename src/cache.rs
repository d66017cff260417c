//! Short-lived cache of loaded datasets keyed by (source path, crop).
//!
//! Purely an optimization: a miss just re-parses the file.

use crate::config::DataConfig;
use crate::loader::{self, LoadOutcome};
use crate::types::CropDataset;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct DatasetCache {
    ttl: Duration,
    entries: HashMap<(PathBuf, String), (Instant, CropDataset)>,
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        DatasetCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    fn key(path: &Path, crop: &str) -> (PathBuf, String) {
        (path.to_path_buf(), crop.to_lowercase())
    }

    pub fn get_at(&self, path: &Path, crop: &str, now: Instant) -> Option<&CropDataset> {
        let (stored_at, dataset) = self.entries.get(&Self::key(path, crop))?;
        (now.duration_since(*stored_at) < self.ttl).then_some(dataset)
    }

    pub fn insert_at(&mut self, path: &Path, crop: &str, dataset: CropDataset, now: Instant) {
        self.entries.insert(Self::key(path, crop), (now, dataset));
    }

    /// Serve from cache or load from disk. Fallback datasets are never cached
    /// so a fixed source file is picked up on the next request.
    pub fn load(&mut self, path: &Path, crop: &str, config: &DataConfig) -> LoadOutcome {
        let now = Instant::now();
        if let Some(dataset) = self.get_at(path, crop, now) {
            debug!("cache hit for {} ({})", path.display(), crop);
            return LoadOutcome {
                dataset: dataset.clone(),
                report: None,
                error: None,
                from_cache: true,
            };
        }
        self.entries.retain(|_, (stored_at, _)| now.duration_since(*stored_at) < self.ttl);
        let outcome = loader::load_or_fallback(path, crop, config);
        if outcome.error.is_none() {
            self.insert_at(path, crop, outcome.dataset.clone(), now);
        }
        outcome
    }
}
