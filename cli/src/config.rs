use anyhow::{Context, Result};
use clap::ValueEnum;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use prep_core::service::Kitchen;

/// Where the catalogs are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Single SQLite file (`prep.db`) in the data directory
    Sqlite,
    /// One JSON file per catalog in the data directory
    Files,
    /// Nothing is persisted; defaults every run
    Memory,
}

pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub backend: Backend,
}

impl Config {
    pub fn load(data_dir: Option<&Path>, backend: Backend) -> Result<Self> {
        let data_dir = if let Some(dir) = data_dir {
            dir.to_path_buf()
        } else {
            let proj_dirs =
                ProjectDirs::from("", "", "prep").context("Could not determine home directory")?;
            proj_dirs.data_dir().to_path_buf()
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("prep.db");

        Ok(Config {
            data_dir,
            db_path,
            backend,
        })
    }

    pub fn open_kitchen(&self) -> Result<Kitchen> {
        tracing::debug!(backend = ?self.backend, dir = %self.data_dir.display(), "opening kitchen");
        match self.backend {
            Backend::Sqlite => Kitchen::open_sqlite(&self.db_path),
            Backend::Files => Kitchen::open_dir(&self.data_dir.join("catalogs")),
            Backend::Memory => Kitchen::in_memory(),
        }
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok((key, true))
    }
}
