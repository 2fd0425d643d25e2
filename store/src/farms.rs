use crate::utils::current_timestamp;
use anyhow::{Context, Result, anyhow};
use isoterma_core::farm::Farm;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

/// Farm records kept as one JSON array on disk.
pub struct FarmStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FarmStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store; malformed JSON is an error.
    pub async fn list_farms(&self) -> Result<Vec<Farm>> {
        let payload = match tokio::fs::read_to_string(&self.path).await {
            Ok(payload) => payload,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Farms data file not found");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        if payload.trim().is_empty() {
            return Ok(Vec::new());
        }

        let farms: Vec<Farm> = serde_json::from_str(&payload)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        info!(farms = farms.len(), "Loaded farms");
        Ok(farms)
    }

    pub async fn get_farm(&self, farm_id: &str) -> Result<Option<Farm>> {
        if farm_id.is_empty() {
            return Err(anyhow!("farm id is empty"));
        }
        let farm = self
            .list_farms()
            .await?
            .into_iter()
            .find(|farm| farm.id == farm_id);
        if farm.is_none() {
            warn!(farm_id, "Farm not found");
        }
        Ok(farm)
    }

    /// Inserts or replaces by id and returns the record as stored.
    /// A blank `created_at` keeps the stored one, or is stamped now for a new farm.
    pub async fn upsert_farm(&self, mut farm: Farm) -> Result<(UpsertOutcome, Farm)> {
        farm.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut farms = self.list_farms().await?;
        let blank_created_at = farm.created_at.trim().is_empty();
        let outcome = match farms.iter_mut().find(|existing| existing.id == farm.id) {
            Some(existing) => {
                if blank_created_at {
                    farm.created_at = existing.created_at.clone();
                }
                *existing = farm.clone();
                UpsertOutcome::Replaced
            }
            None => {
                if blank_created_at {
                    farm.created_at = current_timestamp();
                }
                farms.push(farm.clone());
                UpsertOutcome::Created
            }
        };
        self.write_farms(&farms).await?;
        Ok((outcome, farm))
    }

    pub async fn delete_farm(&self, farm_id: &str) -> Result<bool> {
        if farm_id.is_empty() {
            return Err(anyhow!("farm id is empty"));
        }

        let _guard = self.write_lock.lock().await;
        let mut farms = self.list_farms().await?;
        let before = farms.len();
        farms.retain(|farm| farm.id != farm_id);
        if farms.len() == before {
            return Ok(false);
        }
        self.write_farms(&farms).await?;
        Ok(true)
    }

    /// Readable without touching the file contents.
    pub async fn is_readable(&self) -> bool {
        self.list_farms().await.is_ok()
    }

    async fn write_farms(&self, farms: &[Farm]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let payload = serde_json::to_string_pretty(farms)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
