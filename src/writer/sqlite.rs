use rusqlite::params;
use std::collections::{BTreeSet, HashSet};

use super::error::{ImportError, Result};
use super::schema_gen::missing_schema_objects;
use crate::model::{BanzukeEntry, Bout, Tournament, TournamentId, Wrestler};
use crate::schema::table_names;

const UPSERT_TOURNAMENT: &str = "
    INSERT INTO tournaments (id, year, month, location, start_date, end_date)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(id) DO UPDATE SET
        year = excluded.year,
        month = excluded.month,
        location = excluded.location,
        start_date = excluded.start_date,
        end_date = excluded.end_date";

const UPSERT_WRESTLER: &str = "
    INSERT INTO wrestlers
        (id, shikona, real_name, birth_date, debut_date, retirement_date,
         height_cm, weight_kg, shusshin, heya, foreign_born)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(id) DO UPDATE SET
        shikona = excluded.shikona,
        real_name = excluded.real_name,
        birth_date = excluded.birth_date,
        debut_date = excluded.debut_date,
        retirement_date = excluded.retirement_date,
        height_cm = excluded.height_cm,
        weight_kg = excluded.weight_kg,
        shusshin = excluded.shusshin,
        heya = excluded.heya,
        foreign_born = excluded.foreign_born";

const UPSERT_BANZUKE: &str = "
    INSERT INTO banzuke (tournament_id, wrestler_id, division, rank, rank_number, east_west)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(tournament_id, wrestler_id) DO UPDATE SET
        division = excluded.division,
        rank = excluded.rank,
        rank_number = excluded.rank_number,
        east_west = excluded.east_west";

/// Keyed on the natural key; an existing row keeps its surrogate id
const UPSERT_BOUT: &str = "
    INSERT INTO bouts
        (tournament_id, day, division, east_wrestler_id, west_wrestler_id,
         winner_id, kimarite, match_time_seconds)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(tournament_id, day, division, east_wrestler_id, west_wrestler_id) DO UPDATE SET
        winner_id = excluded.winner_id,
        kimarite = excluded.kimarite,
        match_time_seconds = excluded.match_time_seconds
    RETURNING id";

/// Row count per table, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCounts(pub Vec<(&'static str, u64)>);

impl RowCounts {
    pub fn get(&self, table: &str) -> u64 {
        self.0
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for RowCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(name, n)| format!("{} {}", n, name)).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Serialized writer over one SQLite connection.
///
/// Every call runs on the connection's single background thread, so writes
/// from concurrent workers never interleave; each call is one transaction.
#[derive(Clone)]
pub struct SqliteWriter {
    conn: tokio_rusqlite::Connection,
}

impl SqliteWriter {
    /// Wrap an open, schema-initialized connection.
    ///
    /// Fails with [`ImportError::MissingSchema`] when required tables or the
    /// bout natural-key index are absent.
    pub async fn new(conn: tokio_rusqlite::Connection) -> Result<Self> {
        let missing = conn
            .call(|conn| Ok(missing_schema_objects(conn)?))
            .await?;

        if !missing.is_empty() {
            return Err(ImportError::MissingSchema(missing));
        }

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Insert or overwrite one tournament row
    pub async fn upsert_tournament(&self, tournament: &Tournament) -> Result<()> {
        let t = tournament.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    UPSERT_TOURNAMENT,
                    params![
                        t.id.to_string(),
                        t.id.year(),
                        t.id.month(),
                        t.location,
                        t.start_date,
                        t.end_date
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Replace-by-id: a re-import overwrites every field
    pub async fn upsert_wrestlers(&self, wrestlers: Vec<Wrestler>) -> Result<usize> {
        let count = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(UPSERT_WRESTLER)?;
                    for w in &wrestlers {
                        stmt.execute(params![
                            w.id,
                            w.shikona,
                            w.real_name,
                            w.birth_date,
                            w.debut_date,
                            w.retirement_date,
                            w.height_cm,
                            w.weight_kg,
                            w.shusshin,
                            w.heya,
                            w.foreign_born
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(wrestlers.len())
            })
            .await?;
        Ok(count)
    }

    /// Supersede the tournament's whole banzuke with `entries`
    pub async fn upsert_banzuke(
        &self,
        tournament_id: TournamentId,
        entries: Vec<BanzukeEntry>,
    ) -> Result<usize> {
        let tid = tournament_id.to_string();
        let entries: Vec<BanzukeEntry> = entries
            .into_iter()
            .filter(|e| e.tournament_id == tournament_id)
            .collect();

        let count = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM banzuke WHERE tournament_id = ?1", [&tid])?;
                {
                    let mut stmt = tx.prepare_cached(UPSERT_BANZUKE)?;
                    for e in &entries {
                        stmt.execute(params![
                            tid,
                            e.wrestler_id,
                            e.division.as_str(),
                            e.rank,
                            e.rank_number,
                            e.side.as_str()
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await?;
        Ok(count)
    }

    /// Idempotent bout import keyed on the natural key.
    ///
    /// Each (tournament, day) present in `bouts` ends up holding exactly the
    /// given bouts: existing rows are updated in place, new ones inserted and
    /// rows no longer reported are removed. Days absent from `bouts` are left
    /// untouched. Returns the number of distinct bouts stored.
    pub async fn import_bouts(&self, tournament_id: TournamentId, bouts: Vec<Bout>) -> Result<usize> {
        let tid = tournament_id.to_string();
        let bouts: Vec<Bout> = bouts
            .into_iter()
            .filter(|b| {
                let matches = b.tournament_id == tournament_id;
                if !matches {
                    tracing::warn!(expected = %tournament_id, found = %b.tournament_id, "bout from another tournament ignored");
                }
                matches
            })
            .collect();

        if bouts.is_empty() {
            return Ok(0);
        }

        let count = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut kept = HashSet::new();
                {
                    let mut upsert = tx.prepare_cached(UPSERT_BOUT)?;
                    for b in &bouts {
                        let id: i64 = upsert.query_row(
                            params![
                                tid,
                                b.day,
                                b.division.as_str(),
                                b.east_id,
                                b.west_id,
                                b.winner_id,
                                b.kimarite,
                                b.match_time_seconds
                            ],
                            |row| row.get(0),
                        )?;
                        kept.insert(id);
                    }

                    let days: BTreeSet<u8> = bouts.iter().map(|b| b.day).collect();
                    let mut existing = tx.prepare_cached("SELECT id FROM bouts WHERE tournament_id = ?1 AND day = ?2")?;
                    let mut delete = tx.prepare_cached("DELETE FROM bouts WHERE id = ?1")?;
                    for day in days {
                        let ids: Vec<i64> = existing
                            .query_map(params![tid, day], |row| row.get(0))?
                            .collect::<rusqlite::Result<_>>()?;
                        for id in ids.into_iter().filter(|id| !kept.contains(id)) {
                            delete.execute([id])?;
                        }
                    }
                }
                tx.commit()?;
                Ok(kept.len())
            })
            .await?;
        Ok(count)
    }

    pub async fn row_counts(&self) -> Result<RowCounts> {
        let counts = self
            .conn
            .call(|conn| {
                let mut counts = Vec::new();
                for table in table_names() {
                    let n: i64 =
                        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
                    counts.push((table, n as u64));
                }
                Ok(counts)
            })
            .await?;
        Ok(RowCounts(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Division, Side};
    use crate::writer::schema_gen::apply_schema;

    async fn writer() -> SqliteWriter {
        let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
        conn.call(|conn| Ok(apply_schema(conn)?)).await.unwrap();
        SqliteWriter::new(conn).await.unwrap()
    }

    fn basho() -> TournamentId {
        "195801".parse().unwrap()
    }

    fn tournament() -> Tournament {
        Tournament {
            id: basho(),
            location: "Tokyo".into(),
            start_date: Some("1958-01-12".into()),
            end_date: None,
        }
    }

    fn bout(day: u8, east: i64, west: i64, winner: Option<i64>) -> Bout {
        Bout {
            tournament_id: basho(),
            day,
            division: Division::Makuuchi,
            east_id: east,
            west_id: west,
            winner_id: winner,
            kimarite: "yorikiri".into(),
            match_time_seconds: None,
        }
    }

    fn entry(wrestler_id: i64, rank: &str) -> BanzukeEntry {
        BanzukeEntry {
            tournament_id: basho(),
            wrestler_id,
            division: Division::Makuuchi,
            rank: rank.into(),
            rank_number: crate::normalize::rank_ordinal(rank),
            side: Side::East,
        }
    }

    fn wrestler(id: i64, retirement: Option<&str>) -> Wrestler {
        Wrestler {
            id,
            shikona: format!("Rikishi{}", id),
            real_name: String::new(),
            birth_date: None,
            debut_date: None,
            retirement_date: retirement.map(String::from),
            height_cm: Some(180.0),
            weight_kg: None,
            shusshin: "Tokyo".into(),
            heya: "Miyagino".into(),
            foreign_born: false,
        }
    }

    #[tokio::test]
    async fn test_rejects_store_without_schema() {
        let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
        let result = SqliteWriter::new(conn).await;
        assert!(matches!(result, Err(ImportError::MissingSchema(ref m)) if m.contains(&"bouts".to_string())));
    }

    #[tokio::test]
    async fn test_bout_import_is_idempotent() {
        let w = writer().await;
        w.upsert_tournament(&tournament()).await.unwrap();

        let bouts = vec![bout(1, 1, 2, Some(1)), bout(1, 3, 4, Some(4))];
        assert_eq!(w.import_bouts(basho(), bouts.clone()).await.unwrap(), 2);
        assert_eq!(w.import_bouts(basho(), bouts).await.unwrap(), 2);

        assert_eq!(w.row_counts().await.unwrap().get("bouts"), 2);
    }

    #[tokio::test]
    async fn test_duplicate_natural_key_stored_once() {
        let w = writer().await;
        w.upsert_tournament(&tournament()).await.unwrap();

        let stored = w
            .import_bouts(basho(), vec![bout(2, 1, 2, None), bout(2, 1, 2, None)])
            .await
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(w.row_counts().await.unwrap().get("bouts"), 1);
    }

    #[tokio::test]
    async fn test_corrected_bout_overwrites() {
        let w = writer().await;
        w.upsert_tournament(&tournament()).await.unwrap();

        w.import_bouts(basho(), vec![bout(3, 1, 2, None)]).await.unwrap();
        w.import_bouts(basho(), vec![bout(3, 1, 2, Some(2))]).await.unwrap();

        let winner: Option<i64> = w
            .connection()
            .call(|conn| Ok(conn.query_row("SELECT winner_id FROM bouts", [], |r| r.get(0))?))
            .await
            .unwrap();
        assert_eq!(winner, Some(2));
        assert_eq!(w.row_counts().await.unwrap().get("bouts"), 1);
    }

    #[tokio::test]
    async fn test_refetched_day_drops_stale_bouts_only_for_that_day() {
        let w = writer().await;
        w.upsert_tournament(&tournament()).await.unwrap();

        w.import_bouts(basho(), vec![bout(1, 1, 2, Some(1)), bout(1, 3, 4, Some(3))])
            .await
            .unwrap();
        w.import_bouts(basho(), vec![bout(2, 1, 3, Some(1))]).await.unwrap();
        w.import_bouts(basho(), vec![bout(1, 1, 2, Some(1))]).await.unwrap();

        assert_eq!(w.row_counts().await.unwrap().get("bouts"), 2);
    }

    #[tokio::test]
    async fn test_bout_without_tournament_is_write_conflict() {
        let w = writer().await;
        let result = w.import_bouts(basho(), vec![bout(1, 1, 2, None)]).await;
        assert!(matches!(result, Err(ImportError::WriteConflict(_))));
        assert_eq!(w.row_counts().await.unwrap().get("bouts"), 0);
    }

    #[tokio::test]
    async fn test_banzuke_shrinking_roster_supersedes() {
        let w = writer().await;
        w.upsert_tournament(&tournament()).await.unwrap();

        w.upsert_banzuke(basho(), vec![entry(1, "Y1e"), entry(2, "O1w"), entry(3, "M1e")])
            .await
            .unwrap();
        w.upsert_banzuke(basho(), vec![entry(1, "Y1e"), entry(2, "O1w")])
            .await
            .unwrap();

        assert_eq!(w.row_counts().await.unwrap().get("banzuke"), 2);
    }

    #[tokio::test]
    async fn test_wrestler_reimport_overwrites_fields() {
        let w = writer().await;
        w.upsert_wrestlers(vec![wrestler(1, None), wrestler(2, None)]).await.unwrap();
        w.upsert_wrestlers(vec![wrestler(1, Some("2021-09-30"))]).await.unwrap();

        let retired: Option<String> = w
            .connection()
            .call(|conn| {
                Ok(conn.query_row("SELECT retirement_date FROM wrestlers WHERE id = 1", [], |r| r.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(retired.as_deref(), Some("2021-09-30"));
        assert_eq!(w.row_counts().await.unwrap().get("wrestlers"), 2);
    }
}
