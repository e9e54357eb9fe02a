//! CSV file store
//!
//! One CSV file per key in a flat directory. The file name is the FNV-1a
//! hash of the key, so any string can be used as a key. Entries older than
//! `max_age` (by modification time) are misses.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::error::{CacheError, CacheResult};
use crate::hash::fnv64a;

const CSV_EXT: &str = "csv";

/// Directory of cached reports
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
    max_age: Duration,
}

impl CsvStore {
    /// Open a store, creating its directory when missing
    pub fn open(dir: impl Into<PathBuf>, max_age: Duration) -> CacheResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_age })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value of a key
    pub fn path(&self, key: &str) -> CacheResult<PathBuf> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        Ok(self
            .dir
            .join(format!("{:016x}.{}", fnv64a(key.as_bytes()), CSV_EXT)))
    }

    fn is_expired(&self, path: &Path) -> bool {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return true,
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age > self.max_age,
            // modified in the future
            Err(_) => false,
        }
    }

    /// Read the rows stored for a key; every failure is a miss
    pub fn get(&self, key: &str) -> CacheResult<Vec<Vec<String>>> {
        let path = self.path(key).map_err(|_| CacheError::Miss)?;
        if self.is_expired(&path) {
            return Err(CacheError::Miss);
        }
        read_rows(&path).map_err(|_| CacheError::Miss)
    }

    /// Write the rows of a key unconditionally
    pub fn set(&self, key: &str, rows: &[Vec<String>]) -> CacheResult<()> {
        let path = self.path(key)?;
        // readers never see a partial file
        let tmp = path.with_extension("tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&tmp)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Write the rows of a key only when nothing is stored for it yet
    pub fn add(&self, key: &str, rows: &[Vec<String>]) -> CacheResult<()> {
        if self.path(key)?.exists() {
            return Err(CacheError::NotStored(key.to_string()));
        }
        self.set(key, rows)
    }

    /// Write the rows of a key only when a value is already stored
    pub fn replace(&self, key: &str, rows: &[Vec<String>]) -> CacheResult<()> {
        if !self.path(key)?.exists() {
            return Err(CacheError::NotStored(key.to_string()));
        }
        self.set(key, rows)
    }

    pub fn delete(&self, key: &str) -> CacheResult<()> {
        let path = self.path(key)?;
        if !path.exists() {
            return Err(CacheError::Miss);
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Remove expired entries, returning how many were removed
    pub fn flush_expired(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for path in self.entries()? {
            if self.is_expired(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove every entry, returning how many were removed
    pub fn clear(&self) -> CacheResult<usize> {
        let entries = self.entries()?;
        for path in &entries {
            fs::remove_file(path)?;
        }
        Ok(entries.len())
    }

    fn entries(&self) -> CacheResult<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == CSV_EXT) {
                entries.push(path);
            }
        }
        Ok(entries)
    }
}

fn read_rows(path: &Path) -> CacheResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rows() -> Vec<Vec<String>> {
        vec![
            vec!["123".into(), "Brand, exact".into(), " --".into()],
            vec!["456".into(), "Say \"hi\"".into(), "12.5%".into()],
        ]
    }

    #[test]
    fn test_set_and_get() {
        let dir = tempdir().unwrap();
        let store = CsvStore::open(dir.path(), Duration::from_secs(60)).unwrap();

        store.set("SELECT A FROM B-123", &rows()).unwrap();
        assert_eq!(store.get("SELECT A FROM B-123").unwrap(), rows());
        assert!(matches!(store.get("other"), Err(CacheError::Miss)));
    }

    #[test]
    fn test_file_name_is_key_hash() {
        let dir = tempdir().unwrap();
        let store = CsvStore::open(dir.path(), Duration::from_secs(60)).unwrap();
        let path = store.path("foobar").unwrap();
        assert_eq!(path.file_name().unwrap(), "85944171f73967e8.csv");
        assert!(matches!(store.path(""), Err(CacheError::InvalidKey)));
    }

    #[test]
    fn test_expired_entries_miss() {
        let dir = tempdir().unwrap();
        let store = CsvStore::open(dir.path(), Duration::ZERO).unwrap();
        store.set("key", &rows()).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(matches!(store.get("key"), Err(CacheError::Miss)));
        assert_eq!(store.flush_expired().unwrap(), 1);
        assert!(!store.path("key").unwrap().exists());
    }

    #[test]
    fn test_add_replace_delete_clear() {
        let dir = tempdir().unwrap();
        let store = CsvStore::open(dir.path(), Duration::from_secs(60)).unwrap();

        assert!(matches!(
            store.replace("a", &rows()),
            Err(CacheError::NotStored(_))
        ));
        store.add("a", &rows()).unwrap();
        assert!(matches!(store.add("a", &rows()), Err(CacheError::NotStored(_))));
        store.replace("a", &rows()[..1]).unwrap();
        assert_eq!(store.get("a").unwrap().len(), 1);

        store.delete("a").unwrap();
        assert!(matches!(store.delete("a"), Err(CacheError::Miss)));

        store.set("b", &rows()).unwrap();
        store.set("c", &rows()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        assert_eq!(store.clear().unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = tempdir().unwrap();
        let store = CsvStore::open(dir.path(), Duration::from_secs(60)).unwrap();
        std::fs::write(store.path("bad").unwrap(), [0xff, 0xfe, b'"', b'\n']).unwrap();
        assert!(matches!(store.get("bad"), Err(CacheError::Miss)));
    }
}
