// CLI for running navigation queries against a scripted scene.
//
// Loads a JSON scenario (volume config, volume origin, box obstacles and a
// list of queries), builds the volume once, then runs every query in order
// and prints the result. Useful for inspecting paths without an engine.
//
// Usage:
//   nav_query <SCENARIO.json> [OPTIONS]
//     --json        Print results as JSON lines instead of text
//     --stats       Print octree and search statistics
//
// Logging goes through `tracing`; set `RUST_LOG` to override the default
// `octnav_volume=info` filter.
//
// Scenario format:
//   {
//     "volume":  { ...VolumeConfig... },
//     "origin":  [x, y, z],                       (optional, default origin)
//     "scene":   { "obstacles": [ ...Obstacle... ] },
//     "queries": [
//       { "kind": "path", "name": "a", "start": [..], "goal": [..], "request": {..} },
//       { "kind": "nearest", "name": "b", "seed": {"x":0,"y":0,"z":0} }
//     ]
//   }

use std::path::{Path, PathBuf};

use glam::Vec3;
use octnav_volume::{
    GridCoord, NavError, NavVolume, ObstacleScene, PathOutcome, PathRequest, VolumeConfig,
    VolumeTransform,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Scenario {
    volume: VolumeConfig,
    #[serde(default)]
    origin: Option<Vec3>,
    #[serde(default)]
    scene: ObstacleScene,
    #[serde(default)]
    queries: Vec<Query>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Query {
    Path {
        name: String,
        start: Vec3,
        goal: Vec3,
        #[serde(default)]
        request: PathRequest,
    },
    Nearest {
        name: String,
        seed: GridCoord,
        #[serde(default)]
        request: PathRequest,
    },
}

/// One printed result.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Report<'a> {
    Path {
        name: &'a str,
        outcome: PathOutcome,
    },
    Nearest {
        name: &'a str,
        cell: Option<GridCoord>,
    },
}

struct Options {
    scenario: PathBuf,
    json: bool,
    stats: bool,
}

impl Scenario {
    fn load(path: &Path) -> Result<Self, NavError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("octnav_volume=info")),
        )
        .init();

    let options = parse_args();
    if let Err(e) = run(&options) {
        eprintln!("nav_query: {e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), NavError> {
    let scenario = Scenario::load(&options.scenario)?;
    let transform = VolumeTransform::from_translation(scenario.origin.unwrap_or(Vec3::ZERO));
    let mut volume = NavVolume::new(scenario.volume, transform)?;
    volume.build(&scenario.scene)?;

    if options.stats {
        let stats = volume.octree_stats()?;
        println!(
            "volume: {} cells, octree {} nodes / {} leaves ({} blocked), depth {}",
            volume.cell_count(),
            stats.nodes,
            stats.leaves,
            stats.blocked_leaves,
            stats.depth
        );
    }

    for query in &scenario.queries {
        let report = match query {
            Query::Path {
                name,
                start,
                goal,
                request,
            } => Report::Path {
                name,
                outcome: volume.find_path(&scenario.scene, *start, *goal, request)?,
            },
            Query::Nearest {
                name,
                seed,
                request,
            } => Report::Nearest {
                name,
                cell: volume.find_nearest_free_cell(&scenario.scene, *seed, request)?,
            },
        };
        if options.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_report(&report, options.stats);
        }
    }
    Ok(())
}

fn print_report(report: &Report<'_>, stats: bool) {
    match report {
        Report::Path { name, outcome } => match outcome {
            PathOutcome::Found(path) => {
                println!(
                    "{name}: {} waypoints, cost {:.3}, length {:.1}{}",
                    path.waypoints.len(),
                    path.cost,
                    path.world_length(),
                    if path.goal_relocated {
                        " (goal relocated)"
                    } else {
                        ""
                    }
                );
                for (cell, p) in path.cells.iter().zip(&path.waypoints) {
                    println!("  {cell} -> ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z);
                }
                if stats {
                    println!(
                        "  expanded {}, static rejections {}, overlap queries {}",
                        path.stats.expanded,
                        path.stats.static_rejections,
                        path.stats.overlap_queries
                    );
                }
            }
            PathOutcome::Failed(reason) => println!("{name}: failed: {reason}"),
        },
        Report::Nearest { name, cell } => match cell {
            Some(c) => println!("{name}: nearest free cell {c}"),
            None => println!("{name}: no free cell"),
        },
    }
}

/// Parse command-line arguments. Simple `std::env::args()` matching.
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut scenario = None;
    let mut json = false;
    let mut stats = false;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--stats" => stats = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
            path => {
                if scenario.replace(PathBuf::from(path)).is_some() {
                    eprintln!("Only one scenario file may be given");
                    std::process::exit(1);
                }
            }
        }
    }

    let Some(scenario) = scenario else {
        print_usage();
        std::process::exit(1);
    };
    Options {
        scenario,
        json,
        stats,
    }
}

fn print_usage() {
    println!("Usage: nav_query <SCENARIO.json> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --json        Print results as JSON lines");
    println!("  --stats       Print octree and search statistics");
    println!("  --help, -h    Show this help");
}
