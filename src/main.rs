use anyhow::{bail, Context, Result};
use bizscope::{
    config::AppConfig,
    export,
    fetch::EnrichmentClient,
    process::{parse_bytes, FilterCriteria, NAME_MATCH_THRESHOLD},
};
use clap::Parser;
use std::{fs, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Company research tool: parse, filter and enrich a company list"
)]
struct Args {
    /// Company data file: one blank-line separated block per company
    input: PathBuf,

    /// Fuzzy company name filter
    #[arg(short, long)]
    name: Option<String>,

    /// Case-insensitive location substring filter
    #[arg(short, long)]
    location: Option<String>,

    /// Minimum (exclusive) fuzzy score for the name filter
    #[arg(long, default_value_t = NAME_MATCH_THRESHOLD)]
    name_threshold: f64,

    /// Look each filtered company up in the registry
    #[arg(long)]
    enrich: bool,

    /// Registry API key (required with --enrich)
    #[arg(long, env = "OPENCORPORATES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Seconds each lookup waits before firing (1-10)
    #[arg(long)]
    delay: Option<u64>,

    /// YAML file with enrichment settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the filtered (and enriched) companies to this CSV file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the company count per location
    #[arg(long)]
    chart: bool,

    /// Rows shown in the preview table
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // ─── 1) parse ─────────────────────────────────────────────────────
    let bytes =
        fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let companies = parse_bytes(&bytes);
    info!(count = companies.len(), input = %args.input.display(), "parsed companies");

    println!("Company Data Preview");
    print!("{}", export::render_table(&companies, Some(args.preview)));

    // ─── 2) filter ────────────────────────────────────────────────────
    let criteria = FilterCriteria::new(args.name.as_deref(), args.location.as_deref())
        .with_name_threshold(args.name_threshold);
    let mut filtered = criteria.apply(&companies);

    println!();
    println!("Filtered Results: {} companies found.", filtered.len());
    print!("{}", export::render_table(&filtered, None));

    // ─── 3) enrich ────────────────────────────────────────────────────
    if args.enrich {
        let api_key = args.api_key.as_deref().unwrap_or_default();
        if api_key.trim().is_empty() {
            bail!("please provide an API key for data enrichment (--api-key or OPENCORPORATES_API_KEY)");
        }

        let mut cfg = match &args.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(delay) = args.delay {
            cfg.rate_limit_delay_secs = delay;
        }
        let client = EnrichmentClient::new(cfg.enrichment_settings()?)?;
        let outcomes = client.enrich_blocking(&mut filtered, api_key)?;

        println!();
        println!("Enriched Data:");
        print!("{}", export::render_table(&filtered, None));
        for (rec, outcome) in filtered.iter().zip(&outcomes) {
            if outcome.is_failure() {
                println!("  ! {}: {}", rec.name, outcome);
            }
        }
    }

    // ─── 4) download ──────────────────────────────────────────────────
    if let Some(dest) = &args.output {
        if filtered.is_empty() {
            warn!("no companies left after filtering; skipping CSV export");
        } else {
            let path = export::export_csv(&filtered, dest)?;
            println!();
            println!("Wrote {} companies to {}", filtered.len(), path.display());
        }
    }

    // ─── 5) distribution ──────────────────────────────────────────────
    if args.chart {
        println!();
        println!("Company Distribution by Location");
        print!(
            "{}",
            export::render_bar_chart(&export::location_counts(&filtered), 40)
        );
    }

    Ok(())
}
