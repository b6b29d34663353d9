// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration for tree subdivision and face-loop grouping

use crate::error::TopologyError;
use crate::geometry::SeamMatch;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default leaf capacity before occupancy-driven splitting kicks in
pub const DEFAULT_MAX_LEAF_ITEMS: usize = 4;

/// Recommended depth cap for predicate-driven splitting
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Config file picked up by [`CoreConfig::load`]
pub const CONFIG_FILE: &str = "csgtopo.toml";

/// Spatial tree subdivision settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Leaves holding more items than this are split
    pub max_leaf_items: usize,
    /// No leaf deeper than this is split
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_items: DEFAULT_MAX_LEAF_ITEMS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Face-loop grouping settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// How seam edges are matched between the two meshes
    pub seam_match: SeamMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub tree: TreeConfig,
    pub grouping: GroupingConfig,
}

impl CoreConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: CoreConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `csgtopo.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(max_items) = std::env::var("CSGTOPO_MAX_LEAF_ITEMS") {
            config.tree.max_leaf_items = max_items
                .parse()
                .with_context(|| format!("Invalid CSGTOPO_MAX_LEAF_ITEMS: {max_items}"))?;
        }

        if let Ok(max_depth) = std::env::var("CSGTOPO_MAX_DEPTH") {
            config.tree.max_depth = max_depth
                .parse()
                .with_context(|| format!("Invalid CSGTOPO_MAX_DEPTH: {max_depth}"))?;
        }

        if let Ok(seam_match) = std::env::var("CSGTOPO_SEAM_MATCH") {
            config.grouping.seam_match = seam_match
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid CSGTOPO_SEAM_MATCH")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), TopologyError> {
        if self.tree.max_leaf_items == 0 {
            return Err(TopologyError::InvalidConfig(
                "tree.max_leaf_items must be at least 1".to_string(),
            ));
        }
        if self.tree.max_depth == 0 {
            return Err(TopologyError::InvalidConfig(
                "tree.max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
