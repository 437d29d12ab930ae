//! Keyed, lazily-populated filterbank cache
//!
//! Each distinct `(sample_rate, fft_size, mel_bands)` triple is built at most
//! once. Built filterbanks are frozen behind an `Arc` and shared read-only.
//! Inserts are the only writes, so a poisoned lock still guards a consistent
//! map and is recovered rather than propagated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::filterbank::MelFilterbank;
use crate::error::SpectrogramError;

/// Cache key: `(sample_rate, fft_size, mel_bands)`
pub type FilterbankKey = (u32, usize, usize);

/// Filterbank cache owned by a [`SpectralEngine`](super::SpectralEngine)
#[derive(Debug, Default)]
pub struct FilterbankCache {
    entries: RwLock<HashMap<FilterbankKey, Arc<MelFilterbank>>>,
}

impl FilterbankCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the filterbank for a key, building it on first use
    ///
    /// # Errors
    ///
    /// Propagates construction errors from [`MelFilterbank::new`]. A failed
    /// build leaves nothing in the cache.
    pub fn get_or_build(
        &self,
        sample_rate: u32,
        fft_size: usize,
        mel_bands: usize,
    ) -> Result<Arc<MelFilterbank>, SpectrogramError> {
        let key = (sample_rate, fft_size, mel_bands);

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(fb) = entries.get(&key) {
                return Ok(Arc::clone(fb));
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have built it between the two locks
        if let Some(fb) = entries.get(&key) {
            return Ok(Arc::clone(fb));
        }

        let fb = Arc::new(MelFilterbank::new(sample_rate, fft_size, mel_bands)?);
        entries.insert(key, Arc::clone(&fb));
        log::debug!("Cached mel filterbank for {:?} ({} entries)", key, entries.len());
        Ok(fb)
    }

    /// Number of cached filterbanks
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// True when nothing has been built yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_returns_same_instance() {
        let cache = FilterbankCache::new();
        let a = cache.get_or_build(16000, 512, 40).unwrap();
        let b = cache.get_or_build(16000, 512, 40).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_are_distinct_entries() {
        let cache = FilterbankCache::new();
        cache.get_or_build(16000, 512, 40).unwrap();
        cache.get_or_build(16000, 1024, 40).unwrap();
        cache.get_or_build(44100, 512, 40).unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = FilterbankCache::new();
        assert!(cache.get_or_build(16000, 512, 0).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_share_one_build() {
        let cache = Arc::new(FilterbankCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_build(22050, 2048, 128).unwrap())
            })
            .collect();

        let built: Vec<Arc<MelFilterbank>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(built.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
