//! etl-runner: headless pipeline runner for Ventas ETL.
//!
//! Usage:
//!   etl-runner --seed 42 --customers 500 --transactions 5000 --workdir .
//!   etl-runner --only clean --workdir ./out
//!   etl-runner --config run.json

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use ventas_core::{config::EtlConfig, engine::EtlEngine, rng::StageSlot, stage::StageReport};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match flag_value(&args, "--config") {
        Some(path) => EtlConfig::load(Path::new(path))?,
        None => EtlConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.customer_count = parse_arg(&args, "--customers", config.customer_count);
    config.transaction_count = parse_arg(&args, "--transactions", config.transaction_count);
    if let Some(dir) = flag_value(&args, "--workdir") {
        config.workdir = PathBuf::from(dir);
    }
    let only = flag_value(&args, "--only");

    println!("Ventas ETL — etl-runner");
    println!(
        "  started:      {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("  seed:         {}", config.seed);
    println!("  customers:    {}", config.customer_count);
    println!("  transactions: {}", config.transaction_count);
    println!("  workdir:      {}", config.workdir.display());
    println!();

    let engine = EtlEngine::build(config);

    match only {
        Some(name) => {
            let slot = StageSlot::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("unknown stage '{name}'"))?;
            let report = engine.run_stage(slot)?;
            println!("=== STAGE RE-RUN ===");
            print_report(slot.name(), &report);
        }
        None => {
            let reports = engine.run_all()?;
            println!("=== RUN SUMMARY ===");
            for (name, report) in &reports {
                print_report(name, report);
            }
        }
    }
    Ok(())
}

fn print_report(name: &str, report: &StageReport) {
    let artifacts: Vec<String> = report
        .artifacts
        .iter()
        .map(|p| {
            p.file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();
    println!(
        "  {name:<12} rows={:<6} -> {}",
        report.rows_out,
        artifacts.join(", ")
    );
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
