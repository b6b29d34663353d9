// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! csgtopo CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use csgtopo::geometry::{GroupingReport, IndexedPoint, PointPolicy};
use csgtopo::{group_intersection_loops, CoreConfig, FaceLoopList, SeamMatch, SpatialTree};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "csgtopo")]
#[command(about = "Spatial indexing and face-loop grouping toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Group the face loops of two intersected meshes
    Group {
        /// JSON file holding `{ "a": [loops], "b": [loops] }`
        input: String,

        /// Seam matching mode (directed, either)
        #[arg(short, long)]
        seam_match: Option<SeamMatch>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check k-nearest queries on random points against brute force
    Knn {
        /// Number of random points
        #[arg(short, long, default_value = "10000")]
        points: usize,

        /// Number of neighbors to fetch
        #[arg(short, default_value = "10")]
        k: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Show version information
    Version,
}

#[derive(Deserialize)]
struct LoopInput {
    a: FaceLoopList,
    b: FaceLoopList,
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Group {
            input,
            seam_match,
            json,
        } => group_command(input, *seam_match, *json, CoreConfig::load()?, cli.verbose),
        Commands::Knn { points, k, seed } => {
            knn_command(*points, *k, *seed, &CoreConfig::load()?, cli.verbose)
        }
        Commands::Version => {
            println!("csgtopo v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn group_command(
    input: &str,
    seam_match: Option<SeamMatch>,
    json: bool,
    mut config: CoreConfig,
    verbose: bool,
) -> Result<()> {
    if !Path::new(input).exists() {
        bail!("Input file not found: {}", input);
    }
    let content =
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))?;
    let loops: LoopInput =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {input}"))?;

    if let Some(mode) = seam_match {
        config.grouping.seam_match = mode;
    }

    let start = Instant::now();
    let result = group_intersection_loops(&loops.a, &loops.b, &config.grouping);
    let elapsed = start.elapsed();

    if json {
        let seams: Vec<[usize; 2]> = result
            .seams
            .sorted()
            .iter()
            .map(|edge| {
                let (a, b) = edge.vertices();
                [a.0, b.0]
            })
            .collect();
        let report = serde_json::json!({
            "seams": seams,
            "a": GroupingReport::from_grouping(&result.a),
            "b": GroupingReport::from_grouping(&result.b),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Grouped".green().bold(), input);
    println!("  Seam edges: {}", result.seams.len());
    for (label, grouping) in [("A", &result.a), ("B", &result.b)] {
        println!(
            "  Mesh {}: {} loops in {} groups",
            label,
            grouping.loop_count(),
            grouping.len()
        );
        if verbose {
            for group in grouping.groups() {
                println!(
                    "    group {:>3}: {} loops, {} perimeter edges",
                    group.id.0,
                    group.len(),
                    group.perimeter.len()
                );
            }
        }
    }
    println!("  Time: {:.2?}", elapsed);
    Ok(())
}

fn knn_command(count: usize, k: usize, seed: u64, config: &CoreConfig, verbose: bool) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut random_point = || {
        Point3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        )
    };
    let points: Vec<Point3<f64>> = (0..count).map(|_| random_point()).collect();
    let query = random_point();

    let start = Instant::now();
    let tree: SpatialTree<PointPolicy, 3> = SpatialTree::from_items(
        PointPolicy,
        points
            .iter()
            .enumerate()
            .map(|(id, p)| IndexedPoint::new(id, *p)),
        &config.tree,
    );
    let built = start.elapsed();

    let start = Instant::now();
    let found: Vec<usize> = tree.k_nearest(query, k).into_iter().map(|(_, p)| p.id).collect();
    let queried = start.elapsed();

    let mut expected: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .map(|(id, p)| (nalgebra::distance(p, &query), id))
        .collect();
    expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let expected: Vec<usize> = expected.into_iter().take(k).map(|(_, id)| id).collect();

    println!(
        "Tree: {} points, {} leaves (built in {:.2?})",
        tree.len(),
        tree.leaf_count(),
        built
    );
    println!("Query: {} nearest in {:.2?}", found.len(), queried);
    if verbose {
        println!("  ids: {:?}", found);
    }

    if found == expected {
        println!("{}", "✓ matches brute force".green());
        Ok(())
    } else {
        println!("{}", "✗ differs from brute force".red().bold());
        println!("  expected: {:?}", expected);
        println!("  found:    {:?}", found);
        bail!("nearest-neighbor mismatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_only_loaded_by_commands_that_use_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(csgtopo::config::CONFIG_FILE), "[tree]\nmax_depth = 0\n")
            .unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        assert!(run(Cli::parse_from(["csgtopo", "version"])).is_ok());
        assert!(run(Cli::parse_from(["csgtopo", "knn", "--points", "10"])).is_err());
    }
}
