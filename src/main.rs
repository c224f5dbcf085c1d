use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use poem_harvester::config::{self, Config, DEFAULT_CONFIG_PATH};
use poem_harvester::constants::CORPUS_COLUMNS;
use poem_harvester::gateway::shortlist_file::{read_shortlist, write_shortlist};
use poem_harvester::gateway::{corpus, PageCache};
use poem_harvester::infra::{ReqwestHttp, ThreadSleeper};
use poem_harvester::pipeline::bands::load_bands;
use poem_harvester::pipeline::harvest::{self, HarvestOptions};
use poem_harvester::pipeline::shortlist::{self, ShortlistOptions};
use poem_harvester::pipeline::{FetchEngine, FetchPolicy};
use poem_harvester::tools::band_mods::{build_band_files, BandModsOptions};
use poem_harvester::tools::{compare, dedupe, forum_post};
use poem_harvester::{logging, metrics};

#[derive(Parser)]
#[command(name = "poem_harvester")]
#[command(about = "Public-domain poem catalog harvester and difficulty shortlister")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for this crate (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest catalog listing pages into the corpus CSV
    Harvest {
        #[arg(long)]
        start_page: Option<u32>,
        #[arg(long)]
        end_page: Option<u32>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Seconds between pages; also the backoff base
        #[arg(long)]
        delay: Option<f64>,
        #[arg(long)]
        timeout: Option<f64>,
        #[arg(long)]
        max_retries: Option<u32>,
        /// Listing URL with a `{page}` placeholder
        #[arg(long)]
        url_template: Option<String>,
        /// Ignore any saved checkpoint
        #[arg(long)]
        no_resume: bool,
    },
    /// Pick poems per difficulty band from the corpus
    Shortlist {
        #[arg(long)]
        poems_csv: Option<PathBuf>,
        /// Baseline paragraphs (`{"mod": [...]}`)
        #[arg(long)]
        baseline: Option<PathBuf>,
        #[arg(long)]
        per_band: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        timeout: Option<f64>,
        #[arg(long)]
        delay: Option<f64>,
        #[arg(long)]
        max_fetch: Option<usize>,
        #[arg(long)]
        max_retries: Option<u32>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Drop duplicate corpus rows, keeping the first of each key
    Dedupe {
        /// Defaults to the harvest output
        #[arg(long)]
        input: Option<PathBuf>,
        /// Rewrite the input in place when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, num_args = 1..)]
        key_columns: Vec<String>,
    },
    /// Write per-band paragraph files from the shortlist
    BuildBands {
        #[arg(long)]
        shortlist: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        target_per_band: Option<usize>,
        #[arg(long)]
        extract_attempts: Option<u32>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        #[arg(long)]
        timeout: Option<f64>,
    },
    /// Format the shortlist as a forum post
    ForumPost {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Print to stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare paragraph sets and write metrics CSV plus summary JSON
    Compare {
        /// NAME=PATH, repeatable; defaults to the baseline and the three band files
        #[arg(long = "dataset")]
        datasets: Vec<String>,
        #[arg(long, default_value = "analysis_graphs")]
        output_dir: PathBuf,
    },
}

type Engine = FetchEngine<ReqwestHttp, ThreadSleeper>;

fn fetch_engine(cfg: &Config, timeout_secs: f64, policy: FetchPolicy, seed: u64) -> anyhow::Result<Engine> {
    let http = ReqwestHttp::new(&cfg.http, config::secs(timeout_secs)).context("building HTTP client")?;
    Ok(FetchEngine::new(http, ThreadSleeper, policy, seed))
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (config_path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let mut cfg = Config::load(&config_path, required)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(level) = &cli.log_level {
        cfg.logging.level = level.clone();
    }

    let log_guard = logging::init_logging(&cfg.logging);
    metrics::init_metrics();

    let result = run(cli.command, cfg.clone());
    if let Some(path) = &cfg.metrics.snapshot {
        if let Err(e) = metrics::write_snapshot(path) {
            error!("Failed to write metrics snapshot {}: {}", path.display(), e);
        }
    }
    if let Err(e) = result {
        error!("{:#}", e);
        // exit skips destructors; flush the file appender first
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Commands, mut cfg: Config) -> anyhow::Result<()> {
    match command {
        Commands::Harvest {
            start_page,
            end_page,
            output,
            checkpoint,
            delay,
            timeout,
            max_retries,
            url_template,
            no_resume,
        } => {
            let h = &mut cfg.harvest;
            set(&mut h.start_page, start_page);
            set(&mut h.end_page, end_page);
            set(&mut h.output, output);
            set(&mut h.checkpoint, checkpoint);
            set(&mut h.delay_secs, delay);
            set(&mut h.timeout_secs, timeout);
            set(&mut h.max_retries, max_retries);
            set(&mut h.listing_url_template, url_template);
            if no_resume {
                h.resume = false;
            }
            cfg.validate()?;

            let policy = FetchPolicy { max_retries: cfg.harvest.max_retries, base_delay: cfg.harvest.delay_secs };
            let mut engine = fetch_engine(&cfg, cfg.harvest.timeout_secs, policy, cfg.shortlist.seed)?;
            let opts = HarvestOptions::from_config(&cfg.harvest);

            let summary = harvest::run(&mut engine, &ThreadSleeper, &opts)?;
            println!("✅ Harvest complete");
            println!("   Pages: {} (from page {})", summary.pages_completed, summary.first_page);
            println!("   Rows written: {}", summary.rows_written);
            println!("   Output file: {}", opts.output.display());
        }

        Commands::Shortlist {
            poems_csv,
            baseline,
            per_band,
            output,
            seed,
            timeout,
            delay,
            max_fetch,
            max_retries,
            cache_dir,
        } => {
            let s = &mut cfg.shortlist;
            set(&mut s.poems_csv, poems_csv);
            set(&mut s.baseline, baseline);
            set(&mut s.per_band, per_band);
            set(&mut s.output, output);
            set(&mut s.seed, seed);
            set(&mut s.timeout_secs, timeout);
            set(&mut s.delay_secs, delay);
            set(&mut s.max_fetch, max_fetch);
            set(&mut s.max_retries, max_retries);
            set(&mut s.cache_dir, cache_dir);
            cfg.validate()?;
            let s = &cfg.shortlist;

            let bands = load_bands(&s.baseline).with_context(|| format!("loading baseline {}", s.baseline.display()))?;
            let records = corpus::load_pool(&s.poems_csv).with_context(|| format!("reading corpus {}", s.poems_csv.display()))?;
            let pool = shortlist::candidate_pool(&records);
            info!("Candidate pool: {} of {} corpus rows", pool.len(), records.len());

            let policy = FetchPolicy { max_retries: s.max_retries, base_delay: s.delay_secs };
            let engine = fetch_engine(&cfg, s.timeout_secs, policy, s.seed)?;
            let mut cache = PageCache::new(&s.cache_dir, engine);

            let outcome = shortlist::classify(&bands, &pool, &mut cache, &ThreadSleeper, &ShortlistOptions::from_config(s));
            write_shortlist(&s.output, &outcome.selected)?;

            println!("📚 Shortlist written to {}", s.output.display());
            for band in &outcome.bands {
                println!(
                    "   {}: chars=[{}, {}], words=[{}, {}], selected={}",
                    band.name,
                    band.char_range.0,
                    band.char_range.1,
                    band.word_range.0,
                    band.word_range.1,
                    outcome.count(band.name)
                );
            }
            println!("   Attempted fetches: {}", outcome.attempted);
        }

        Commands::Dedupe { input, output, key_columns } => {
            let input = input.unwrap_or_else(|| cfg.harvest.output.clone());
            let keys = if key_columns.is_empty() {
                CORPUS_COLUMNS.iter().map(|c| c.to_string()).collect()
            } else {
                key_columns
            };
            let (report, target) = match output {
                Some(out) => (dedupe::dedupe_csv(&input, &out, &keys)?, out),
                None => (dedupe::dedupe_in_place(&input, &keys)?, input),
            };
            println!("Done. Kept {}/{} rows in {}", report.kept, report.total, target.display());
        }

        Commands::BuildBands { shortlist, out_dir, target_per_band, extract_attempts, cache_dir, timeout } => {
            let b = &mut cfg.bands;
            set(&mut b.shortlist, shortlist);
            set(&mut b.out_dir, out_dir);
            set(&mut b.target_per_band, target_per_band);
            set(&mut b.extract_attempts, extract_attempts);
            set(&mut cfg.shortlist.cache_dir, cache_dir);
            set(&mut cfg.shortlist.timeout_secs, timeout);
            cfg.validate()?;

            let by_band = read_shortlist(&cfg.bands.shortlist)
                .with_context(|| format!("reading shortlist {}", cfg.bands.shortlist.display()))?;
            let policy = FetchPolicy { max_retries: cfg.shortlist.max_retries, base_delay: cfg.shortlist.delay_secs };
            let engine = fetch_engine(&cfg, cfg.shortlist.timeout_secs, policy, cfg.shortlist.seed)?;
            let mut cache = PageCache::new(&cfg.shortlist.cache_dir, engine);

            let reports = build_band_files(&by_band, &mut cache, &ThreadSleeper, &BandModsOptions::from_config(&cfg.bands))?;
            for r in reports {
                println!(
                    "{}: wrote {} paragraphs -> {} ({} from sample text, {} skipped)",
                    r.band,
                    r.written,
                    r.path.display(),
                    r.fallbacks,
                    r.skipped
                );
            }
        }

        Commands::ForumPost { input, output } => {
            let input = input.unwrap_or_else(|| cfg.bands.shortlist.clone());
            let post = forum_post::format_post_from_file(&input)
                .with_context(|| format!("reading shortlist {}", input.display()))?;
            match output {
                Some(path) => {
                    write_text(&path, &post)?;
                    info!("Forum post written to {}", path.display());
                }
                None => print!("{}", post),
            }
        }

        Commands::Compare { datasets, output_dir } => {
            let specs = if datasets.is_empty() {
                compare::default_datasets(&cfg.shortlist.baseline, &cfg.bands.out_dir)
            } else {
                datasets
                    .iter()
                    .map(|d| compare::parse_dataset_spec(d))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let report = compare::compare_datasets(&specs, &output_dir)?;
            println!("Wrote analysis outputs to: {}", output_dir.display());
            for (name, s) in &report.summaries {
                println!(
                    "- {}: count={}, typed_chars_mean={:.1}, words_mean={:.1}",
                    name, s.count, s.typed_chars_mean, s.words_mean
                );
            }
        }
    }
    Ok(())
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    poem_harvester::gateway::ensure_parent(path)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
