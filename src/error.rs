// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the spatial tree and face-loop grouping layers

use thiserror::Error;

/// Errors reported by validating helpers.
///
/// Most tree and grouping operations treat misuse as a programmer error and
/// degrade to a documented no-op instead of returning this type.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("split axis {axis} is out of range for a {dimension}-dimensional tree")]
    AxisOutOfRange { axis: usize, dimension: usize },

    #[error("split position {0} is not finite")]
    NonFiniteSplit(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize report")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
