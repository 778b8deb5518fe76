//! make-externals: generate the two external collaborator files.
//!
//! The pipeline consumes customers_country_latam.xlsx and
//! customer_payment_method.html but never produces them — partners do.
//! This tool writes deterministic stand-ins for local runs: most
//! customers get a country and a payment method, a few are left out so
//! the cleaning sentinel path actually runs, and a slice of the
//! payment rows carries the known mis-decoded "CrÃ©dito" spelling so
//! the wrangle stage's canonicalization has something to fix.
//!
//! Usage:
//!   make-externals --seed 42 --customers 500 --workdir .

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use ventas_core::{
    config,
    generate_stage::CUSTOMER_ID_BASE,
    io::{html, xlsx},
    rng::StageRng,
    schema::{DataType, Field, Schema},
    table::{Table, Value},
};

const COUNTRIES: [&str; 7] = [
    "Argentina",
    "Brasil",
    "Chile",
    "Colombia",
    "México",
    "Perú",
    "Uruguay",
];
const PAYMENT_METHODS: [&str; 4] = ["Crédito", "Débito", "Efectivo", "Transferencia"];
/// Fraction of customers absent from each external source.
const GAP_RATE: f64 = 0.04;
/// Fraction of credit rows written with the mis-decoded spelling.
const MOJIBAKE_RATE: f64 = 0.40;
/// Side-stream index for this tool; far away from the pipeline's
/// stage slots so the streams never collide.
const EXTERNALS_STREAM: u64 = 0xE7;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let customers = parse_arg(&args, "--customers", 500usize);
    let workdir = args
        .windows(2)
        .find(|w| w[0] == "--workdir")
        .map(|w| PathBuf::from(&w[1]))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut rng = StageRng::new(seed, EXTERNALS_STREAM).with_name("externals");

    let mut countries = Table::new(
        "customer_country",
        Schema::new(vec![
            Field::new("customer_id", DataType::Int),
            Field::new("country", DataType::Str),
        ]),
    );
    let mut payments = Table::new(
        "customer_payment_method",
        Schema::new(vec![
            Field::new("customer_id", DataType::Int),
            Field::new("payment_method", DataType::Str),
        ]),
    );

    for i in 0..customers as i64 {
        let customer_id = CUSTOMER_ID_BASE + i;
        if !rng.chance(GAP_RATE) {
            let country = COUNTRIES[rng.next_u64_below(COUNTRIES.len() as u64) as usize];
            countries.push_row(vec![
                Value::Int(customer_id),
                Value::Str(country.to_string()),
            ]);
        }
        if !rng.chance(GAP_RATE) {
            let mut method =
                PAYMENT_METHODS[rng.next_u64_below(PAYMENT_METHODS.len() as u64) as usize];
            if method == "Crédito" && rng.chance(MOJIBAKE_RATE) {
                method = "CrÃ©dito";
            }
            payments.push_row(vec![
                Value::Int(customer_id),
                Value::Str(method.to_string()),
            ]);
        }
    }

    let xlsx_path = workdir.join(config::COUNTRY_XLSX);
    let html_path = workdir.join(config::PAYMENT_HTML);
    xlsx::write_table(&xlsx_path, &countries)?;
    html::write_table(&html_path, &payments)?;

    println!("make-externals (seed {seed})");
    println!("  {} -> {} rows", xlsx_path.display(), countries.len());
    println!("  {} -> {} rows", html_path.display(), payments.len());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
