//! Work-unit enumeration. Pure functions of the calendar; no network access.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::model::{Division, TournamentId, EPOCH_YEAR, TOURNAMENT_DAYS, TOURNAMENT_MONTHS};

/// One independently fetchable and importable piece of work.
///
/// The textual form (`195801`, `195801/banzuke`, `195801/day/7`,
/// `roster/juryo`) is what the run summary prints for skipped units and what
/// `--only` accepts back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchUnit {
    /// Tournament metadata
    Tournament(TournamentId),
    Banzuke(TournamentId),
    Day(TournamentId, u8),
    /// Wrestler roster for one division; not tournament scoped
    Roster(Division),
}

impl FetchUnit {
    pub fn tournament(&self) -> Option<TournamentId> {
        match self {
            FetchUnit::Tournament(id) | FetchUnit::Banzuke(id) | FetchUnit::Day(id, _) => Some(*id),
            FetchUnit::Roster(_) => None,
        }
    }
}

impl fmt::Display for FetchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchUnit::Tournament(id) => write!(f, "{}", id),
            FetchUnit::Banzuke(id) => write!(f, "{}/banzuke", id),
            FetchUnit::Day(id, day) => write!(f, "{}/day/{}", id, day),
            FetchUnit::Roster(division) => write!(f, "roster/{}", division),
        }
    }
}

impl FromStr for FetchUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        match parts.as_slice() {
            ["roster", division] => Ok(FetchUnit::Roster(division.parse()?)),
            [id] => Ok(FetchUnit::Tournament(id.parse().map_err(|e| format!("{}", e))?)),
            [id, "banzuke"] => Ok(FetchUnit::Banzuke(id.parse().map_err(|e| format!("{}", e))?)),
            [id, "day", day] => {
                let id = id.parse().map_err(|e| format!("{}", e))?;
                let day: u8 = day.parse().map_err(|_| format!("invalid day in {:?}", s))?;
                if !(1..=TOURNAMENT_DAYS).contains(&day) {
                    return Err(format!("day out of range in {:?}", s));
                }
                Ok(FetchUnit::Day(id, day))
            }
            _ => Err(format!("unrecognized unit: {:?}", s)),
        }
    }
}

/// All tournaments from `from_year` (clamped to the 1958 epoch) whose month
/// has started on or before `today`, ascending by year then month.
pub fn enumerate_tournaments(from_year: i32, today: NaiveDate) -> Vec<TournamentId> {
    let first = from_year.max(EPOCH_YEAR);
    let mut units = Vec::new();

    for year in first..=today.year() {
        for month in TOURNAMENT_MONTHS {
            let Ok(id) = TournamentId::new(year, month) else {
                continue;
            };
            if id.month_start() > today {
                continue;
            }
            units.push(id);
        }
    }

    units
}

/// Sub-units of one tournament: its banzuke, each day of bouts, and the
/// roster divisions its wrestlers are drawn from.
pub fn enumerate_fetch_units(tournament: TournamentId) -> Vec<FetchUnit> {
    let mut units = Vec::with_capacity(1 + TOURNAMENT_DAYS as usize + Division::ALL.len());
    units.push(FetchUnit::Banzuke(tournament));
    units.extend((1..=TOURNAMENT_DAYS).map(|day| FetchUnit::Day(tournament, day)));
    units.extend(Division::ALL.into_iter().map(FetchUnit::Roster));
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_unit_is_195801() {
        let units = enumerate_tournaments(1958, date(2024, 6, 1));
        assert_eq!(units[0].to_string(), "195801");
        assert_eq!(units.last().unwrap().to_string(), "202405");
    }

    #[test]
    fn test_never_yields_future_units() {
        let today = date(2024, 3, 10);
        let units = enumerate_tournaments(1958, today);
        assert!(units.iter().all(|u| u.month_start() <= today));
        assert_eq!(units.last().unwrap().to_string(), "202403");
    }

    #[test]
    fn test_ordered_and_clamped() {
        let units = enumerate_tournaments(1900, date(1959, 1, 1));
        let ids: Vec<String> = units.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            ids,
            vec!["195801", "195803", "195805", "195807", "195809", "195811", "195901"]
        );
        let mut sorted = units.clone();
        sorted.sort();
        assert_eq!(units, sorted);
    }

    #[test]
    fn test_restartable() {
        let today = date(2001, 12, 31);
        assert_eq!(enumerate_tournaments(1990, today), enumerate_tournaments(1990, today));
        assert_eq!(enumerate_tournaments(1990, today).len(), 12 * 6);
    }

    #[test]
    fn test_fetch_units_for_tournament() {
        let id: TournamentId = "202401".parse().unwrap();
        let units = enumerate_fetch_units(id);
        assert_eq!(units.len(), 1 + 15 + 6);
        assert_eq!(units[0], FetchUnit::Banzuke(id));
        assert_eq!(units[1], FetchUnit::Day(id, 1));
        assert_eq!(units[15], FetchUnit::Day(id, 15));
        assert_eq!(units[16], FetchUnit::Roster(Division::Makuuchi));
    }

    #[test]
    fn test_unit_text_form() {
        for text in ["195801", "195801/banzuke", "195801/day/7", "roster/juryo"] {
            let unit: FetchUnit = text.parse().unwrap();
            assert_eq!(unit.to_string(), text);
        }
        assert!("195801/day/16".parse::<FetchUnit>().is_err());
        assert!("195801/results".parse::<FetchUnit>().is_err());
    }
}
