// src/map/tile_cache.rs v3
//! Basemap raster tile downloading and caching with resource management

use crate::error::{MapError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Tile address in the XYZ scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Tile containing world pixel `(px, py)` at this key's zoom, if inside the world
    pub fn containing(zoom: u8, px: f64, py: f64) -> Option<Self> {
        let n = 2_f64.powi(zoom as i32);
        let (x, y) = ((px / crate::geo::TILE_SIZE).floor(), (py / crate::geo::TILE_SIZE).floor());
        if x < 0.0 || y < 0.0 || x >= n || y >= n {
            return None;
        }
        Some(Self::new(zoom, x as u32, y as u32))
    }
}

/// Builds the download URL for a tile
pub type TileUrlFn = Arc<dyn Fn(TileKey) -> String + Send + Sync>;

#[derive(Default)]
struct MemoryCache {
    tiles: HashMap<TileKey, Arc<Vec<u8>>>,
    // Insertion order, oldest first
    order: VecDeque<TileKey>,
}

impl MemoryCache {
    fn insert(&mut self, key: TileKey, tile: Arc<Vec<u8>>, capacity: usize) {
        if self.tiles.insert(key, tile).is_none() {
            self.order.push_back(key);
        }
        while self.tiles.len() > capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.tiles.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.order.clear();
    }
}

#[derive(Clone)]
pub struct TileCache {
    cache_dir: PathBuf,
    url_for: TileUrlFn,
    client: reqwest::blocking::Client,
    memory_cache: Arc<Mutex<MemoryCache>>,
    downloading: Arc<Mutex<HashSet<TileKey>>>,
    max_memory_tiles: usize,
    max_concurrent_downloads: usize,
}

/// Lock a mutex, recovering the data if a download thread panicked while holding it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TileCache {
    pub fn new(cache_dir: PathBuf, url_for: TileUrlFn) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| MapError::Other(format!("Failed to create cache directory: {}", e)))?;

        let client = reqwest::blocking::Client::builder()
            .user_agent("BuildingFinder/0.1 (Rust map search application)")
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            cache_dir,
            url_for,
            client,
            memory_cache: Arc::new(Mutex::new(MemoryCache::default())),
            downloading: Arc::new(Mutex::new(HashSet::new())),
            max_memory_tiles: 256,
            max_concurrent_downloads: 6,
        })
    }

    /// Get a tile from memory or disk; `None` if it has not been downloaded yet
    pub fn get_tile(&self, key: TileKey) -> Result<Option<Arc<Vec<u8>>>> {
        // Check memory cache first
        if let Some(tile) = lock(&self.memory_cache).tiles.get(&key) {
            return Ok(Some(Arc::clone(tile)));
        }

        // Check disk cache
        let path = Self::tile_path(&self.cache_dir, key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| MapError::Other(format!("Failed to read cached tile: {}", e)))?;
        let tile = Arc::new(bytes);
        lock(&self.memory_cache).insert(key, Arc::clone(&tile), self.max_memory_tiles);
        Ok(Some(tile))
    }

    /// Download a tile in the background (non-blocking) with a concurrency limit.
    ///
    /// Returns whether a download was started.
    pub fn download_tile_async(&self, key: TileKey) -> bool {
        {
            let mut downloading = lock(&self.downloading);
            if downloading.len() >= self.max_concurrent_downloads || downloading.contains(&key) {
                return false;
            }
            downloading.insert(key);
        }

        let cache = self.clone();
        std::thread::spawn(move || {
            let url = (cache.url_for)(key);
            match Self::download_tile(&cache.client, &url) {
                Ok(bytes) => {
                    let path = Self::tile_path(&cache.cache_dir, key);
                    if let Err(e) = Self::write_tile(&path, &bytes) {
                        tracing::warn!(?key, error = %e, "failed to persist tile");
                    }
                    lock(&cache.memory_cache).insert(key, Arc::new(bytes), cache.max_memory_tiles);
                }
                Err(e) => tracing::warn!(?key, error = %e, "tile download failed"),
            }

            lock(&cache.downloading).remove(&key);
        });

        true
    }

    fn download_tile(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>> {
        let response = client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }

    fn write_tile(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn tile_path(cache_dir: &Path, key: TileKey) -> PathBuf {
        cache_dir.join(format!("{}/{}/{}.tile", key.zoom, key.x, key.y))
    }

    pub fn downloads_in_flight(&self) -> usize {
        lock(&self.downloading).len()
    }

    pub fn clear_memory_cache(&self) {
        lock(&self.memory_cache).clear();
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> CacheStats {
        fn walk_dir(path: &Path, count: &mut usize, size: &mut u64) {
            if let Ok(entries) = std::fs::read_dir(path) {
                for entry in entries.flatten() {
                    if let Ok(metadata) = entry.metadata() {
                        if metadata.is_file() {
                            *count += 1;
                            *size += metadata.len();
                        } else if metadata.is_dir() {
                            walk_dir(&entry.path(), count, size);
                        }
                    }
                }
            }
        }

        let memory_tiles = lock(&self.memory_cache).tiles.len();
        let (mut disk_tiles, mut disk_size) = (0, 0u64);
        walk_dir(&self.cache_dir, &mut disk_tiles, &mut disk_size);

        CacheStats {
            memory_tiles,
            disk_tiles,
            disk_size_mb: disk_size as f64 / 1_048_576.0,
        }
    }

    /// Clear entire disk cache
    pub fn clear_disk_cache(&self) -> Result<()> {
        std::fs::remove_dir_all(&self.cache_dir)
            .map_err(|e| MapError::Other(format!("Failed to clear cache: {}", e)))?;
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| MapError::Other(format!("Failed to recreate cache directory: {}", e)))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub memory_tiles: usize,
    pub disk_tiles: usize,
    pub disk_size_mb: f64,
}
