use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sumo_history_import::{
    cli::{Cli, Commands},
    fetch::{Fetch, FetchConfig, RateLimitedFetcher, ResponseCache, RetryPolicy, Retrying},
    filter::resolve_units,
    pipeline::{Pipeline, PipelineConfig},
    ui::{LogUi, Ui, UiApp},
    units::{enumerate_tournaments, FetchUnit},
    writer::{apply_schema, SqliteWriter},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // The TUI owns the terminal; log lines would corrupt it
    if !matches!(cli.command, Commands::Import { tui: true, .. }) {
        init_tracing();
    }

    match cli.command {
        Commands::Import {
            db,
            from_year,
            workers,
            base_url,
            timeout_secs,
            retries,
            cache,
            cache_dir,
            force,
            only,
            no_roster,
            no_stats,
            tui,
        } => {
            let start = Instant::now();
            let units = resolve_units(only)?;

            let cache = if cache || cache_dir.is_some() {
                Some(ResponseCache::new(cache_dir, force)?)
            } else {
                None
            };
            let fetch_config = FetchConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                cache,
                ..FetchConfig::default()
            };
            let policy = RetryPolicy {
                max_attempts: retries.max(1),
                ..RetryPolicy::default()
            };
            let fetcher = Retrying::new(RateLimitedFetcher::new(fetch_config)?, policy);

            let writer = open_store(&db).await?;
            let pipeline = Pipeline::new(
                fetcher,
                writer,
                PipelineConfig {
                    from_year,
                    workers,
                    import_roster: !no_roster,
                    ..PipelineConfig::default()
                },
            );
            let today = Local::now().date_naive();

            let report = if tui {
                let mut ui = UiApp::new()?;
                match execute(&pipeline, units, today, no_stats, &mut ui).await {
                    Ok(report) => {
                        ui.finish(&report)?;
                        report
                    }
                    Err(e) => {
                        ui.restore()?;
                        return Err(e);
                    }
                }
            } else {
                let stop = Arc::new(AtomicBool::new(false));
                let flag = stop.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::warn!("Interrupt received; finishing units in progress");
                        flag.store(true, Ordering::Relaxed);
                    }
                });

                let mut ui = LogUi::default().with_stop_flag(stop);
                execute(&pipeline, units, today, no_stats, &mut ui).await?
            };

            println!("{}", report);
            println!("\nFinished in {:.1}s", start.elapsed().as_secs_f64());
        }

        Commands::Aggregate { db } => {
            let writer = open_store(&db).await?;
            let records = sumo_history_import::stats::recompute_wrestler_tournament_records(&writer).await?;
            println!("Computed {} wrestler tournament records", records);
        }

        Commands::ListTournaments { from_year } => {
            let tournaments = enumerate_tournaments(from_year, Local::now().date_naive());
            println!("{} tournaments:\n", tournaments.len());
            for t in tournaments {
                println!("  {} ({})", t, t.location());
            }
        }

        Commands::ClearCache { cache_dir } => {
            let cache = ResponseCache::new(cache_dir, false)?;
            cache.clear()?;
            println!("Cleared {:?}", cache.cache_dir());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open (or create) the database and make sure the schema exists
async fn open_store(db: &Path) -> Result<SqliteWriter> {
    let conn = tokio_rusqlite::Connection::open(db)
        .await
        .with_context(|| format!("Failed to open database: {:?}", db))?;
    conn.call(|conn| Ok(apply_schema(conn)?))
        .await
        .context("Failed to create schema")?;
    Ok(SqliteWriter::new(conn).await?)
}

/// Import, then aggregate; returns the report printed at the end
async fn execute<F: Fetch>(
    pipeline: &Pipeline<F>,
    units: Option<Vec<FetchUnit>>,
    today: NaiveDate,
    no_stats: bool,
    ui: &mut impl Ui,
) -> Result<String> {
    let summary = match units {
        Some(units) => pipeline.run_units(&units, today, ui).await?,
        None => pipeline.run(today, ui).await?,
    };

    let mut report = summary.to_string();

    if summary.interrupted {
        report.push_str("\nRecords not recomputed; rerun to resume");
    } else if !no_stats {
        let records = pipeline.aggregate(ui).await?;
        report.push_str(&format!("\nComputed {} wrestler tournament records", records));
    }

    let counts = pipeline.writer().row_counts().await?;
    report.push_str(&format!("\nStore: {}", counts));

    if !summary.skipped.is_empty() {
        let names: Vec<String> = summary.skipped_units().iter().map(|u| u.to_string()).collect();
        report.push_str(&format!("\nRetry skipped units with: --only {}", names.join(",")));
    }

    Ok(report)
}
