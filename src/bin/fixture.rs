use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use build_mock_api::fixture::{self, FixtureOptions};

#[derive(Parser)]
#[command(name = "fixture", about = "Generate randomized seed data for the mock API")]
struct Args {
    #[arg(long, default_value_t = fixture::DEFAULT_COMPANIES, help = "Number of companies to generate")]
    companies: usize,

    #[arg(
        long = "persons-per-company",
        default_value_t = fixture::DEFAULT_PERSONS_PER_COMPANY,
        help = "Number of persons to generate per company"
    )]
    persons_per_company: usize,

    #[arg(long, help = "RNG seed for reproducible output (random when omitted)")]
    seed: Option<u64>,

    #[arg(long, default_value = "db.json", help = "Output path for the seed document")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let options = FixtureOptions {
        companies: args.companies,
        persons_per_company: args.persons_per_company,
        seed: args.seed.unwrap_or_else(rand::random),
    };

    let db = fixture::generate(&options);
    let raw = serde_json::to_string_pretty(&db)?;
    fs::write(&args.output, raw)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "wrote {} companies and {} persons to {} (seed {})",
        args.companies,
        args.companies * args.persons_per_company,
        args.output.display(),
        options.seed
    );

    Ok(())
}
