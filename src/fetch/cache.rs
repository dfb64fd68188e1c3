use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::Endpoint;

/// On-disk cache of raw API payloads, one JSON file per request.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
    /// Skip reads; responses are still written
    refresh: bool,
}

impl ResponseCache {
    pub fn new(custom_dir: Option<PathBuf>, refresh: bool) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "sumo-history-import")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

        Ok(Self { cache_dir, refresh })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get path to the cached payload for an endpoint
    pub fn entry_path(&self, endpoint: &Endpoint) -> PathBuf {
        self.cache_dir.join(format!("{}.json", endpoint.cache_key()))
    }

    /// Cached payload, if present and readable. A corrupt entry is a miss.
    pub fn get(&self, endpoint: &Endpoint) -> Option<Value> {
        if self.refresh {
            return None;
        }
        let text = fs::read_to_string(self.entry_path(endpoint)).ok()?;
        serde_json::from_str(&text).ok()
    }

    pub fn put(&self, endpoint: &Endpoint, payload: &Value) -> Result<()> {
        let path = self.entry_path(endpoint);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(payload)?)
            .with_context(|| format!("Failed to write cache entry: {:?}", tmp))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to finalize cache entry: {:?}", path))?;
        Ok(())
    }

    /// Remove every cached payload
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path).ok();
            }
        }
        Ok(())
    }
}
