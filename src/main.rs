mod browser;
mod config;
mod dedupe;
mod error;
mod extract;
mod merge;
mod normalize;
mod pace;
mod pipeline;
mod record;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::store::Store;

#[derive(Parser)]
#[command(name = "velora_scraper", about = "NYC luxury business directory scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search tasks and create new business records
    Acquire {
        /// Max search tasks to run (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// JSON file of {query, category} tasks (default: built-in list)
        #[arg(short, long)]
        tasks: Option<PathBuf>,
    },
    /// Re-visit stored records and merge in better field values
    Enrich {
        /// Max records to enrich (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Only enrich records in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Acquire + enrich in one pipeline
    Run {
        /// Max search tasks to run (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// JSON file of {query, category} tasks (default: built-in list)
        #[arg(short, long)]
        tasks: Option<PathBuf>,
    },
    /// Store field-coverage summary
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Acquire { limit, tasks } => {
            let store = Store::from_env()?;
            let cfg = run_config(tasks)?;
            let stats = pipeline::acquire(&store, &cfg, limit).await?;
            print_acquire(&stats);
            Ok(())
        }
        Commands::Enrich { limit, category } => {
            let store = Store::from_env()?;
            let cfg = config::RunConfig::default();
            let stats = pipeline::enrich(&store, &cfg, category.as_deref(), limit).await?;
            print_enrich(&stats);
            Ok(())
        }
        Commands::Run { limit, tasks } => {
            let store = Store::from_env()?;
            let cfg = run_config(tasks)?;

            println!("Phase 1: acquisition");
            let acquired = pipeline::acquire(&store, &cfg, limit).await?;
            print_acquire(&acquired);

            println!("\nPhase 2: enrichment");
            let enriched = pipeline::enrich(&store, &cfg, None, None).await?;
            print_enrich(&enriched);
            Ok(())
        }
        Commands::Stats => {
            let store = Store::from_env()?;
            let cov = store.coverage().await?;
            println!("Total:        {}", cov.total);
            println!("Website:      {}", cov.with_website);
            println!("Description:  {}", cov.with_description);
            println!("Hours:        {}", cov.with_hours);
            println!("Services:     {}", cov.with_services);
            println!("Photos:       {}", cov.with_photos);
            if !cov.by_category.is_empty() {
                println!("\n--- Categories ---");
                for (category, count) in &cov.by_category {
                    println!("  {:<24} {}", truncate(category, 24), count);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run_config(tasks_file: Option<PathBuf>) -> anyhow::Result<config::RunConfig> {
    let mut cfg = config::RunConfig::default();
    if let Some(path) = tasks_file {
        cfg.tasks = config::load_tasks(&path)?;
    }
    Ok(cfg)
}

fn print_acquire(s: &pipeline::AcquireStats) {
    println!(
        "Acquisition: {} tasks ({} skipped), {} found, {} new, {} created, {} failed.",
        s.tasks, s.skipped_tasks, s.found, s.fresh, s.created, s.failed,
    );
}

fn print_enrich(s: &pipeline::EnrichStats) {
    println!(
        "Enrichment: {} attempted, {} enriched, {} unchanged, {} failed writes.",
        s.attempted, s.enriched, s.unchanged, s.failed_writes,
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{cut}...")
}

fn format_duration(d: std::time::Duration) -> String {
    let total = d.as_secs();
    let (hours, mins, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Med Spas", 24), "Med Spas");
        assert_eq!(truncate("Café Río Interior Design Studio", 8), "Café Río...");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(95)), "1m 35s");
        assert_eq!(format_duration(Duration::from_secs(3700)), "1h 1m 40s");
    }
}
