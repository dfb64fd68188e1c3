//! Per-wrestler, per-tournament win/loss/absence records derived from the
//! stored bouts.
//!
//! East-role and west-role tallies are merged by an explicit key union, so
//! the computation needs nothing from the store beyond plain selects.

use rusqlite::params;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{Division, WrestlerId, WrestlerTournamentRecord};
use crate::writer::{ImportError, SqliteWriter};

/// (wrestler_id, tournament_id, division)
pub type RecordKey = (WrestlerId, String, String);

/// One stored bout, as read back for aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct BoutRow {
    pub tournament_id: String,
    pub division: String,
    pub east_id: WrestlerId,
    pub west_id: WrestlerId,
    pub winner_id: Option<WrestlerId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    East,
    West,
}

/// Wins and losses of every wrestler appearing in `role`.
///
/// A bout without a recorded winner counts as neither.
pub fn tally_role(bouts: &[BoutRow], role: Role) -> HashMap<RecordKey, Tally> {
    let mut tallies: HashMap<RecordKey, Tally> = HashMap::new();

    for bout in bouts {
        let (me, opponent) = match role {
            Role::East => (bout.east_id, bout.west_id),
            Role::West => (bout.west_id, bout.east_id),
        };
        let tally = tallies
            .entry((me, bout.tournament_id.clone(), bout.division.clone()))
            .or_default();

        match bout.winner_id {
            Some(w) if w == me => tally.wins += 1,
            Some(w) if w == opponent => tally.losses += 1,
            _ => {}
        }
    }

    tallies
}

/// Full outer merge of two role tallies: the union of both key sets, with a
/// side missing for a key counting as zero.
pub fn merge_tallies(
    east: &HashMap<RecordKey, Tally>,
    west: &HashMap<RecordKey, Tally>,
) -> BTreeMap<RecordKey, Tally> {
    let keys: BTreeSet<&RecordKey> = east.keys().chain(west.keys()).collect();

    keys.into_iter()
        .map(|key| {
            let e = east.get(key).copied().unwrap_or_default();
            let w = west.get(key).copied().unwrap_or_default();
            (
                key.clone(),
                Tally {
                    wins: e.wins + w.wins,
                    losses: e.losses + w.losses,
                },
            )
        })
        .collect()
}

/// A wrestler's banzuke placement in one tournament
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub division: String,
    pub rank: String,
}

/// Build records from bouts; `placements` maps (wrestler, tournament) to the
/// banzuke division and rank.
///
/// Absences are counted once per tournament, against the banzuke division:
/// every bout the wrestler fought that tournament counts toward it, including
/// bouts against another division. Records in any other division get zero
/// absences. Without a banzuke row the bout's own division is used.
pub fn build_records(
    bouts: &[BoutRow],
    placements: &HashMap<(WrestlerId, String), Placement>,
) -> Vec<WrestlerTournamentRecord> {
    let east = tally_role(bouts, Role::East);
    let west = tally_role(bouts, Role::West);
    let merged = merge_tallies(&east, &west);

    let mut fought_in_tournament: HashMap<(WrestlerId, &str), u32> = HashMap::new();
    for ((wrestler_id, tournament_id, _), tally) in &merged {
        *fought_in_tournament
            .entry((*wrestler_id, tournament_id.as_str()))
            .or_default() += tally.wins + tally.losses;
    }

    merged
        .iter()
        .map(|((wrestler_id, tournament_id, division), tally)| {
            let fought = tally.wins + tally.losses;
            let placement = placements.get(&(*wrestler_id, tournament_id.clone()));

            let absences = match placement {
                Some(p) if p.division == *division => {
                    let total = fought_in_tournament
                        .get(&(*wrestler_id, tournament_id.as_str()))
                        .copied()
                        .unwrap_or(fought);
                    expected_bouts(division, total).saturating_sub(total)
                }
                Some(_) => 0,
                None => expected_bouts(division, fought).saturating_sub(fought),
            };

            WrestlerTournamentRecord {
                wrestler_id: *wrestler_id,
                tournament_id: tournament_id.clone(),
                division: division.clone(),
                rank: placement.map(|p| p.rank.clone()).unwrap_or_default(),
                wins: tally.wins,
                losses: tally.losses,
                absences,
            }
        })
        .collect()
}

/// Scheduled bouts for a division name; unknown names expect what was fought
fn expected_bouts(division: &str, fought: u32) -> u32 {
    division
        .parse::<Division>()
        .map(|d| d.expected_bouts())
        .unwrap_or(fought)
}

/// Rebuild the whole `wrestler_tournaments` table from `bouts` and `banzuke`.
///
/// Runs as one transaction on the writer's connection, so it observes only
/// committed units and replaces its output atomically. Safe to re-run.
pub async fn recompute_wrestler_tournament_records(writer: &SqliteWriter) -> Result<usize, ImportError> {
    let count = writer
        .connection()
        .call(|conn| {
            let tx = conn.transaction()?;

            let bouts: Vec<BoutRow> = {
                let mut stmt = tx.prepare(
                    "SELECT tournament_id, division, east_wrestler_id, west_wrestler_id, winner_id FROM bouts",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(BoutRow {
                        tournament_id: row.get(0)?,
                        division: row.get(1)?,
                        east_id: row.get(2)?,
                        west_id: row.get(3)?,
                        winner_id: row.get(4)?,
                    })
                })?;
                rows.collect::<rusqlite::Result<_>>()?
            };

            let placements: HashMap<(WrestlerId, String), Placement> = {
                let mut stmt =
                    tx.prepare("SELECT wrestler_id, tournament_id, division, rank FROM banzuke")?;
                let rows = stmt.query_map([], |row| {
                    let rank: Option<String> = row.get(3)?;
                    let placement = Placement {
                        division: row.get(2)?,
                        rank: rank.unwrap_or_default(),
                    };
                    Ok(((row.get(0)?, row.get(1)?), placement))
                })?;
                rows.collect::<rusqlite::Result<_>>()?
            };

            let records = build_records(&bouts, &placements);

            tx.execute("DELETE FROM wrestler_tournaments", [])?;
            {
                let mut insert = tx.prepare(
                    "INSERT INTO wrestler_tournaments
                        (wrestler_id, tournament_id, division, rank, wins, losses, absences)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for r in &records {
                    insert.execute(params![
                        r.wrestler_id,
                        r.tournament_id,
                        r.division,
                        r.rank,
                        r.wins,
                        r.losses,
                        r.absences
                    ])?;
                }
            }
            tx.commit()?;

            Ok(records.len())
        })
        .await?;

    tracing::info!(records = count, "Generated wrestler tournament statistics");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bout(east: i64, west: i64, winner: Option<i64>) -> BoutRow {
        BoutRow {
            tournament_id: "195801".into(),
            division: "makuuchi".into(),
            east_id: east,
            west_id: west,
            winner_id: winner,
        }
    }

    fn placement(division: &str, rank: &str) -> Placement {
        Placement {
            division: division.into(),
            rank: rank.into(),
        }
    }

    fn key(wrestler: i64) -> RecordKey {
        (wrestler, "195801".into(), "makuuchi".into())
    }

    #[test]
    fn test_win_and_loss_across_roles() {
        // A (1) beats B (2) as east on day 1, loses to C (3) as west on day 2
        let bouts = vec![bout(1, 2, Some(1)), bout(3, 1, Some(3))];
        let records = build_records(&bouts, &HashMap::new());

        let a = records.iter().find(|r| r.wrestler_id == 1).unwrap();
        assert_eq!((a.wins, a.losses), (1, 1));
        assert_eq!(a.absences, 13);

        let b = records.iter().find(|r| r.wrestler_id == 2).unwrap();
        assert_eq!((b.wins, b.losses), (0, 1));
    }

    #[test]
    fn test_merge_is_key_union() {
        let mut east = HashMap::new();
        east.insert(key(1), Tally { wins: 2, losses: 1 });
        let mut west = HashMap::new();
        west.insert(key(1), Tally { wins: 1, losses: 0 });
        west.insert(key(2), Tally { wins: 0, losses: 3 });

        let merged = merge_tallies(&east, &west);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&key(1)], Tally { wins: 3, losses: 1 });
        assert_eq!(merged[&key(2)], Tally { wins: 0, losses: 3 });

        let only_east = merge_tallies(&east, &HashMap::new());
        assert_eq!(only_east[&key(1)], Tally { wins: 2, losses: 1 });
    }

    #[test]
    fn test_unresolved_bout_counts_toward_absence() {
        let records = build_records(&[bout(1, 2, None)], &HashMap::new());
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.wins == 0 && r.losses == 0 && r.absences == 15));
    }

    #[test]
    fn test_lower_division_expects_seven_bouts() {
        let mut b = bout(1, 2, Some(1));
        b.division = "makushita".into();
        let records = build_records(&[b], &HashMap::new());
        assert!(records.iter().all(|r| r.absences == 6));
    }

    #[test]
    fn test_absences_floor_at_zero_and_rank_from_banzuke() {
        let mut b = bout(1, 2, Some(1));
        b.division = "jonokuchi".into();
        let bouts = vec![b; 9];
        let mut placements = HashMap::new();
        placements.insert((1, "195801".to_string()), placement("jonokuchi", "Jk3e"));

        let records = build_records(&bouts, &placements);
        let a = records.iter().find(|r| r.wrestler_id == 1).unwrap();
        assert_eq!(a.wins, 9);
        assert_eq!(a.absences, 0);
        assert_eq!(a.rank, "Jk3e");
        let b = records.iter().find(|r| r.wrestler_id == 2).unwrap();
        assert_eq!(b.rank, "");
    }

    #[test]
    fn test_cross_division_bout_counts_toward_home_division() {
        // Juryo wrestler 1 fights 14 juryo days and one fill-in makuuchi bout
        let mut bouts: Vec<BoutRow> = (0..14)
            .map(|_| {
                let mut b = bout(1, 2, Some(1));
                b.division = "juryo".into();
                b
            })
            .collect();
        bouts.push(bout(1, 3, Some(1)));

        let mut placements = HashMap::new();
        placements.insert((1, "195801".to_string()), placement("juryo", "J5e"));
        placements.insert((3, "195801".to_string()), placement("makuuchi", "M15w"));

        let records = build_records(&bouts, &placements);
        let home = records
            .iter()
            .find(|r| r.wrestler_id == 1 && r.division == "juryo")
            .unwrap();
        assert_eq!((home.wins, home.losses, home.absences), (14, 0, 0));
        assert_eq!(home.rank, "J5e");

        let visit = records
            .iter()
            .find(|r| r.wrestler_id == 1 && r.division == "makuuchi")
            .unwrap();
        assert_eq!((visit.wins, visit.absences), (1, 0));

        // No banzuke row for wrestler 2: measured against the bout division
        let opponent = records.iter().find(|r| r.wrestler_id == 2).unwrap();
        assert_eq!((opponent.losses, opponent.absences), (14, 1));

        // Makuuchi wrestler 3 fought once in its home division
        let host = records.iter().find(|r| r.wrestler_id == 3).unwrap();
        assert_eq!(host.absences, 14);
    }
}
