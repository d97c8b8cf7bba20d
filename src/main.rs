use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use herosmith::builder::BuildState;
use herosmith::catalog::{
    CatalogService, EmptySource, EntityKind, JsonBaseCatalog, SqliteCompendium,
};
use herosmith::rules::{evaluate, PowerLimitMatrix, PrereqContext};

fn main() {
    println!("herosmith catalog inspector");
    let options = parse_args(env::args().collect());

    let mut service = CatalogService::new(
        Box::new(JsonBaseCatalog::new(&options.data_dir)),
        Box::new(EmptySource),
    );
    if let Some(path) = &options.db_path {
        match SqliteCompendium::open(path) {
            Ok(compendium) => service.add_compendium(Box::new(compendium)),
            Err(err) => eprintln!("Skipping compendium {}: {}", path.display(), err),
        }
    }

    println!("Merged catalogs from {}:", options.data_dir.display());
    for kind in EntityKind::ALL {
        println!("  {:<12} {}", kind.as_str(), service.merged(kind).len());
    }

    let groups = service.power_groups();
    if groups.is_empty() {
        println!("No non-Basic power sets found.");
    } else {
        println!("Power sets: {}", groups.join(", "));
    }

    let matrix = PowerLimitMatrix::default();
    println!("Power limits (rank x distinct sets 1..6):");
    for rank in 1..=6u8 {
        let limits: Vec<String> = (1..=6usize)
            .map(|n| matrix.power_limit(rank, n).to_string())
            .collect();
        println!("  rank {}: {}", rank, limits.join(" "));
    }

    if let Some(text) = &options.prereq {
        let mut state = BuildState::new();
        state.set_rank(options.rank);
        let powers = service.merged(EntityKind::Power).to_vec();
        let granted = HashSet::new();
        let ctx = PrereqContext {
            power_catalog: &powers,
            granted_power_names: &granted,
        };
        let outcome = evaluate(text, &state, &ctx);
        if outcome.satisfied {
            println!("Prerequisite '{}' satisfied at rank {}.", text, options.rank);
        } else {
            println!(
                "Prerequisite '{}' unmet at rank {}. Missing: {}",
                text,
                options.rank,
                outcome.missing.join(", ")
            );
        }
    }
}

struct Options {
    data_dir: PathBuf,
    db_path: Option<PathBuf>,
    prereq: Option<String>,
    rank: u8,
}

fn parse_args(args: Vec<String>) -> Options {
    let mut options = Options {
        data_dir: PathBuf::from("./assets/data"),
        db_path: None,
        prereq: None,
        rank: 1,
    };
    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data" => {
                if let Some(value) = iter.next() {
                    options.data_dir = PathBuf::from(value);
                }
            }
            "--db" => {
                if let Some(value) = iter.next() {
                    options.db_path = Some(PathBuf::from(value));
                }
            }
            "--prereq" => {
                if let Some(value) = iter.next() {
                    options.prereq = Some(value);
                }
            }
            "--rank" => {
                if let Some(value) = iter.next() {
                    options.rank = value.parse().unwrap_or(1);
                }
            }
            other => eprintln!("Ignoring unknown argument '{}'", other),
        }
    }
    options
}
