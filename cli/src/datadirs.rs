// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

//! Data directory resolution
//!
//! Runway keeps per-project build state (dependency container work dirs)
//! under one data root: `RUNWAY_DATA_DIR` when set, otherwise the
//! platform-local data directory joined with `runway`.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub struct DataDirs {
    root: PathBuf,
}

impl DataDirs {
    /// Resolve the data root from the environment.
    pub fn from_env() -> Result<Self> {
        let root = match std::env::var_os("RUNWAY_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .ok_or_else(|| anyhow!("no local data directory on this platform"))?
                .join("runway"),
        };
        Self::at(root)
    }

    /// Use an explicit data root.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("could not create data directory '{}'", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build root for one project; created on first use.
    pub fn build_root(&self, project: &str) -> Result<PathBuf> {
        let dir = self.root.join("builds").join(project);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("could not create build root '{}'", dir.display()))?;
        Ok(dir)
    }
}
