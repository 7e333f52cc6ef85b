//! SQLite cache for mix analysis results
//!
//! Stores extracted feature records keyed by file path, size, and
//! modification time, so unchanged files skip re-analysis. Records from
//! different extractors are cached separately since their feature shapes
//! and dynamic-range units differ.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use mixwise_analysis::{ExtractorKind, FeatureRecord};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Balance serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Feature cache backed by SQLite
pub struct FeatureCache {
    conn: Connection,
}

impl FeatureCache {
    /// SQL schema for the mixes table
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS mixes (
            id INTEGER PRIMARY KEY,
            path TEXT NOT NULL,
            extractor TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            modified_time INTEGER NOT NULL,
            spectral_centroid_hz REAL NOT NULL,
            spectral_rolloff_hz REAL NOT NULL,
            rms_energy REAL NOT NULL,
            dynamic_range REAL NOT NULL,
            stereo_width REAL NOT NULL,
            peak_frequency_hz REAL NOT NULL,
            frequency_balance TEXT NOT NULL,
            analyzed_at INTEGER NOT NULL,
            UNIQUE(path, extractor)
        );
        CREATE INDEX IF NOT EXISTS idx_mix_path ON mixes(path);
    "#;

    /// Open or create a cache database at the given path
    pub fn open(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Get a cached record if the file hasn't changed
    ///
    /// Returns None when the file is not cached for this extractor, or when
    /// its size or modification time differs from the cached values.
    pub fn get(
        &self,
        path: &Path,
        file_size: u64,
        modified_time: u64,
        extractor: ExtractorKind,
    ) -> Result<Option<FeatureRecord>, CacheError> {
        let row = self
            .conn
            .query_row(
                "SELECT file_size, modified_time, spectral_centroid_hz, spectral_rolloff_hz,
                        rms_energy, dynamic_range, stereo_width, peak_frequency_hz,
                        frequency_balance
                 FROM mixes WHERE path = ?1 AND extractor = ?2",
                params![path.to_string_lossy(), extractor.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, f64>(5)?,
                        row.get::<_, f64>(6)?,
                        row.get::<_, f64>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((size, mtime, centroid, rolloff, rms, dr, width, peak, balance_json)) = row
        else {
            return Ok(None);
        };

        if size as u64 != file_size || mtime as u64 != modified_time {
            debug!(path = %path.display(), "cache entry stale");
            return Ok(None);
        }

        let frequency_balance: BTreeMap<String, f32> = serde_json::from_str(&balance_json)?;

        Ok(Some(FeatureRecord {
            spectral_centroid_hz: centroid as f32,
            spectral_rolloff_hz: rolloff as f32,
            rms_energy: rms as f32,
            dynamic_range: dr as f32,
            frequency_balance,
            stereo_width: width as f32,
            peak_frequency_hz: peak as f32,
            extractor,
        }))
    }

    /// Insert or replace the cached record for a file
    pub fn insert(
        &self,
        path: &Path,
        file_size: u64,
        modified_time: u64,
        record: &FeatureRecord,
    ) -> Result<(), CacheError> {
        let balance_json = serde_json::to_string(&record.frequency_balance)?;
        let analyzed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.conn.execute(
            "INSERT OR REPLACE INTO mixes
                (path, extractor, file_size, modified_time, spectral_centroid_hz,
                 spectral_rolloff_hz, rms_energy, dynamic_range, stereo_width,
                 peak_frequency_hz, frequency_balance, analyzed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                path.to_string_lossy(),
                record.extractor.as_str(),
                file_size as i64,
                modified_time as i64,
                record.spectral_centroid_hz as f64,
                record.spectral_rolloff_hz as f64,
                record.rms_energy as f64,
                record.dynamic_range as f64,
                record.stereo_width as f64,
                record.peak_frequency_hz as f64,
                balance_json,
                analyzed_at as i64,
            ],
        )?;
        Ok(())
    }

    /// Number of cached records
    pub fn len(&self) -> Result<usize, CacheError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mixes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Drop every cached record
    pub fn clear(&self) -> Result<(), CacheError> {
        self.conn.execute("DELETE FROM mixes", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FeatureRecord {
        let mut record = FeatureRecord::safe_default(ExtractorKind::FullFidelity);
        record.rms_energy = 0.25;
        record.peak_frequency_hz = 523.25;
        record
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = FeatureCache::in_memory().unwrap();
        let path = Path::new("/music/mix.wav");

        assert!(cache
            .get(path, 1000, 42, ExtractorKind::FullFidelity)
            .unwrap()
            .is_none());

        cache.insert(path, 1000, 42, &sample_record()).unwrap();
        let hit = cache
            .get(path, 1000, 42, ExtractorKind::FullFidelity)
            .unwrap()
            .expect("expected cache hit");
        assert!((hit.rms_energy - 0.25).abs() < 1e-6);
        assert!((hit.peak_frequency_hz - 523.25).abs() < 1e-3);
        assert!((hit.band_ratio("mids") - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_changed_file_invalidates() {
        let cache = FeatureCache::in_memory().unwrap();
        let path = Path::new("/music/mix.wav");
        cache.insert(path, 1000, 42, &sample_record()).unwrap();

        // Different size
        assert!(cache
            .get(path, 2000, 42, ExtractorKind::FullFidelity)
            .unwrap()
            .is_none());
        // Different mtime
        assert!(cache
            .get(path, 1000, 43, ExtractorKind::FullFidelity)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_extractors_cache_separately() {
        let cache = FeatureCache::in_memory().unwrap();
        let path = Path::new("/music/mix.wav");
        cache.insert(path, 1000, 42, &sample_record()).unwrap();

        assert!(cache
            .get(path, 1000, 42, ExtractorKind::Lightweight)
            .unwrap()
            .is_none());

        let light = FeatureRecord::safe_default(ExtractorKind::Lightweight);
        cache.insert(path, 1000, 42, &light).unwrap();
        assert_eq!(cache.len().unwrap(), 2);
    }

    #[test]
    fn test_clear() {
        let cache = FeatureCache::in_memory().unwrap();
        cache
            .insert(Path::new("/a.wav"), 1, 1, &sample_record())
            .unwrap();
        assert!(!cache.is_empty().unwrap());
        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }
}
