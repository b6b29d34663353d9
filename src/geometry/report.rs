// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Serializable snapshot of a grouping, for debugging and tooling

use super::face_loop::{LoopId, SourceId};
use super::grouping::{GroupId, Grouping};
use crate::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub source: SourceId,
    pub members: Vec<LoopId>,
    /// Perimeter edges as `[low, high]` vertex index pairs
    pub perimeter: Vec<[usize; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingReport {
    pub loop_count: usize,
    pub group_count: usize,
    pub groups: Vec<GroupSummary>,
}

impl GroupingReport {
    pub fn from_grouping(grouping: &Grouping) -> Self {
        let groups = grouping
            .groups()
            .iter()
            .map(|group| GroupSummary {
                id: group.id,
                source: group.source,
                members: group.members.clone(),
                perimeter: group
                    .perimeter
                    .iter()
                    .map(|edge| {
                        let (a, b) = edge.vertices();
                        [a.0, b.0]
                    })
                    .collect(),
            })
            .collect();

        Self {
            loop_count: grouping.loop_count(),
            group_count: grouping.len(),
            groups,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
