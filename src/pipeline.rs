//! Import orchestration.
//!
//! Tournaments are fetched by a bounded pool of concurrent workers; the
//! per-class rate limiters live in the fetcher and are shared by all of
//! them. Writes go through the single-threaded [`SqliteWriter`], one
//! transaction per unit. A failed unit is recorded in the summary and never
//! aborts its siblings; only store failures end the run.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::fetch::{Endpoint, Fetch, FetchError};
use crate::model::{Division, TournamentId};
use crate::normalize::{
    normalize_banzuke, normalize_bouts, normalize_roster, normalize_tournament, MalformedPayload,
};
use crate::stats::recompute_wrestler_tournament_records;
use crate::ui::{Level, Phase, Ui};
use crate::units::{enumerate_fetch_units, enumerate_tournaments, FetchUnit};
use crate::writer::{ImportError, SqliteWriter};

/// Stop paging a roster division after this many pages
const MAX_ROSTER_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// First year to import; clamped to 1958
    pub from_year: i32,
    /// Tournaments fetched concurrently
    pub workers: usize,
    pub roster_page_size: u32,
    pub import_roster: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            from_year: crate::model::EPOCH_YEAR,
            workers: 4,
            roster_page_size: 1000,
            import_roster: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUnit {
    pub unit: FetchUnit,
    pub reason: String,
}

#[derive(Debug)]
enum UnitOutcome {
    Imported { unit: FetchUnit, rows: usize },
    Skipped(SkippedUnit),
}

/// Why one unit could not be imported
#[derive(Debug)]
enum UnitError {
    Fetch(FetchError),
    Malformed(MalformedPayload),
    Write(ImportError),
}

impl From<FetchError> for UnitError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::MalformedPayload(msg) => UnitError::Malformed(MalformedPayload(msg)),
            other => UnitError::Fetch(other),
        }
    }
}

impl From<MalformedPayload> for UnitError {
    fn from(e: MalformedPayload) -> Self {
        UnitError::Malformed(e)
    }
}

impl From<ImportError> for UnitError {
    fn from(e: ImportError) -> Self {
        UnitError::Write(e)
    }
}

/// Result of a run: what was imported and what must be retried
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<FetchUnit>,
    pub skipped: Vec<SkippedUnit>,
    pub rows_written: usize,
    /// The run was stopped before every unit was attempted
    pub interrupted: bool,
}

impl ImportSummary {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Units to pass back to [`Pipeline::run_units`] for a targeted retry
    pub fn skipped_units(&self) -> Vec<FetchUnit> {
        self.skipped.iter().map(|s| s.unit).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && !self.interrupted
    }

    fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Imported { unit, rows } => {
                self.imported.push(unit);
                self.rows_written += rows;
            }
            UnitOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} units ({} rows), skipped {}",
            self.imported_count(),
            self.rows_written,
            self.skipped_count()
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        for s in &self.skipped {
            write!(f, "\n  {}: {}", s.unit, s.reason)?;
        }
        Ok(())
    }
}

pub struct Pipeline<F> {
    fetcher: F,
    writer: SqliteWriter,
    config: PipelineConfig,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(fetcher: F, writer: SqliteWriter, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            writer,
            config,
        }
    }

    pub fn writer(&self) -> &SqliteWriter {
        &self.writer
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Import the roster and every tournament held up to `today`.
    ///
    /// Returns once every started unit has committed or failed, so
    /// aggregation may run immediately afterwards.
    pub async fn run(&self, today: NaiveDate, ui: &mut impl Ui) -> Result<ImportSummary, ImportError> {
        let tournaments = enumerate_tournaments(self.config.from_year, today);
        tracing::info!(
            tournaments = tournaments.len(),
            from = ?tournaments.first().map(|t| t.to_string()),
            "Starting import"
        );

        let mut units = Vec::new();
        if self.config.import_roster {
            // Roster units are not tournament scoped; one fetch per division
            let roster: BTreeSet<FetchUnit> = tournaments
                .iter()
                .flat_map(|t| enumerate_fetch_units(*t))
                .filter(|u| matches!(u, FetchUnit::Roster(_)))
                .collect();
            units.extend(roster);
        }
        units.extend(tournaments.into_iter().map(FetchUnit::Tournament));

        self.run_units(&units, today, ui).await
    }

    /// Import exactly `units`, e.g. the skipped units of an earlier run.
    ///
    /// Roster units run first, one after another; the rest are spread over
    /// the worker pool. A tournament unit covers its metadata, banzuke and
    /// all days. Units of tournaments starting after `today` are skipped.
    pub async fn run_units(
        &self,
        units: &[FetchUnit],
        today: NaiveDate,
        ui: &mut impl Ui,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();

        let (future, current): (Vec<FetchUnit>, Vec<FetchUnit>) = units
            .iter()
            .copied()
            .partition(|u| u.tournament().is_some_and(|t| t.month_start() > today));
        if !future.is_empty() {
            let outcomes = future.into_iter().map(|unit| not_yet_held(unit, today)).collect();
            report(&mut summary, outcomes, ui);
        }

        let (roster, rest): (Vec<FetchUnit>, Vec<FetchUnit>) = current
            .into_iter()
            .partition(|u| matches!(u, FetchUnit::Roster(_)));

        if !roster.is_empty() {
            ui.set_phase(Phase::Roster);
            let total = roster.len() as u64;
            for (i, unit) in roster.into_iter().enumerate() {
                if ui.should_quit() {
                    summary.interrupted = true;
                    return Ok(summary);
                }
                ui.set_progress(i as u64, total, unit.to_string());
                let outcomes = self.import_unit(unit).await?;
                report(&mut summary, outcomes, ui);
            }
            ui.set_progress(total, total, "roster");
        }

        if rest.is_empty() {
            return Ok(summary);
        }

        ui.set_phase(Phase::Tournaments);
        let total = rest.len() as u64;
        let mut done = 0;
        let mut in_flight = stream::iter(rest)
            .map(|unit| async move { (unit, self.import_unit(unit).await) })
            .buffer_unordered(self.config.workers.max(1));

        while let Some((unit, result)) = in_flight.next().await {
            let outcomes = result?;
            done += 1;
            ui.set_progress(done, total, unit.to_string());
            report(&mut summary, outcomes, ui);

            if done < total && ui.should_quit() {
                tracing::warn!("Interrupted; units in flight are abandoned, rerun to resume");
                summary.interrupted = true;
                break;
            }
        }

        tracing::info!("{}", summary);
        Ok(summary)
    }

    /// Re-attempt the units a previous run skipped
    pub async fn retry_units(
        &self,
        skipped: &[SkippedUnit],
        today: NaiveDate,
        ui: &mut impl Ui,
    ) -> Result<ImportSummary, ImportError> {
        let units: Vec<FetchUnit> = skipped.iter().map(|s| s.unit).collect();
        self.run_units(&units, today, ui).await
    }

    /// Rebuild `wrestler_tournaments` from everything committed so far
    pub async fn aggregate(&self, ui: &mut impl Ui) -> Result<usize, ImportError> {
        ui.set_phase(Phase::Aggregating);
        let records = recompute_wrestler_tournament_records(&self.writer).await?;
        ui.log(Level::Info, format!("Computed {} wrestler tournament records", records));
        Ok(records)
    }

    async fn import_unit(&self, unit: FetchUnit) -> Result<Vec<UnitOutcome>, ImportError> {
        match unit {
            FetchUnit::Tournament(t) => self.import_tournament(t).await,
            single => Ok(vec![self.import_single(single).await?]),
        }
    }

    /// Metadata first; without a tournament row its banzuke and bouts
    /// cannot be stored, so a failed metadata unit skips the rest.
    async fn import_tournament(&self, tournament: TournamentId) -> Result<Vec<UnitOutcome>, ImportError> {
        let meta = self.import_single(FetchUnit::Tournament(tournament)).await?;
        if matches!(meta, UnitOutcome::Skipped(_)) {
            return Ok(vec![meta]);
        }

        let mut outcomes = vec![meta];
        for unit in enumerate_fetch_units(tournament) {
            if unit.tournament().is_some() {
                outcomes.push(self.import_single(unit).await?);
            }
        }
        Ok(outcomes)
    }

    async fn import_single(&self, unit: FetchUnit) -> Result<UnitOutcome, ImportError> {
        let result = match unit {
            FetchUnit::Tournament(t) => self.import_metadata(t).await,
            FetchUnit::Banzuke(t) => self.import_banzuke(t).await,
            FetchUnit::Day(t, day) => self.import_day(t, day).await,
            FetchUnit::Roster(division) => self.import_roster(division).await,
        };
        conclude(unit, result)
    }

    async fn import_metadata(&self, tournament: TournamentId) -> Result<usize, UnitError> {
        let payload = self.fetcher.fetch(&Endpoint::Basho(tournament)).await?;
        let record = normalize_tournament(tournament, &payload)?;
        self.writer.upsert_tournament(&record).await?;
        Ok(1)
    }

    async fn import_banzuke(&self, tournament: TournamentId) -> Result<usize, UnitError> {
        let payload = self.fetcher.fetch(&Endpoint::Banzuke(tournament)).await?;
        let entries = normalize_banzuke(tournament, &payload)?;
        Ok(self.writer.upsert_banzuke(tournament, entries).await?)
    }

    async fn import_day(&self, tournament: TournamentId, day: u8) -> Result<usize, UnitError> {
        let payload = self.fetcher.fetch(&Endpoint::Torikumi(tournament, day)).await?;
        let bouts = normalize_bouts(tournament, day, &payload)?;
        Ok(self.writer.import_bouts(tournament, bouts).await?)
    }

    async fn import_roster(&self, division: Division) -> Result<usize, UnitError> {
        let limit = self.config.roster_page_size.max(1);
        let mut wrestlers = Vec::new();

        for page in 0..MAX_ROSTER_PAGES {
            let endpoint = Endpoint::Rikishi {
                division,
                limit,
                skip: page * limit,
            };
            let payload = self.fetcher.fetch(&endpoint).await?;
            let page_len = payload
                .get("records")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            wrestlers.extend(normalize_roster(&payload)?);

            if (page_len as u32) < limit {
                break;
            }
            if page + 1 == MAX_ROSTER_PAGES {
                tracing::warn!(%division, "roster paging limit reached");
            }
        }

        tracing::info!(%division, wrestlers = wrestlers.len(), "Fetched roster");
        Ok(self.writer.upsert_wrestlers(wrestlers).await?)
    }
}

/// Map a unit's result to an outcome; only fatal store errors propagate.
fn conclude(unit: FetchUnit, result: Result<usize, UnitError>) -> Result<UnitOutcome, ImportError> {
    let reason = match result {
        Ok(rows) => {
            tracing::debug!(%unit, rows, "imported");
            return Ok(UnitOutcome::Imported { unit, rows });
        }
        Err(UnitError::Write(e)) if e.is_fatal() => return Err(e),
        Err(UnitError::Write(e)) => {
            tracing::error!(%unit, error = %e, "write rolled back; unit skipped");
            e.to_string()
        }
        Err(UnitError::Malformed(e)) => {
            tracing::error!(%unit, error = %e, "unit skipped");
            e.to_string()
        }
        Err(UnitError::Fetch(e)) => {
            tracing::warn!(%unit, error = %e, "fetch failed; unit skipped");
            e.to_string()
        }
    };

    Ok(UnitOutcome::Skipped(SkippedUnit { unit, reason }))
}

/// A tournament that has not started has nothing final to import
fn not_yet_held(unit: FetchUnit, today: NaiveDate) -> UnitOutcome {
    tracing::warn!(%unit, %today, "tournament has not started; unit skipped");
    UnitOutcome::Skipped(SkippedUnit {
        unit,
        reason: format!("tournament starts after {}", today),
    })
}

fn report(summary: &mut ImportSummary, outcomes: Vec<UnitOutcome>, ui: &mut impl Ui) {
    for outcome in outcomes {
        if let UnitOutcome::Skipped(s) = &outcome {
            ui.log(Level::Warn, format!("skipped {}: {}", s.unit, s.reason));
        }
        summary.record(outcome);
    }
    ui.set_tally(summary.imported_count() as u64, summary.skipped_count() as u64);
}
