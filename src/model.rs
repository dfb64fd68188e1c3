//! Entity shapes shared by the normalizer, the importer and the aggregator.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Earliest year covered by the remote dataset
pub const EPOCH_YEAR: i32 = 1958;

/// Months in which a tournament is held
pub const TOURNAMENT_MONTHS: [u32; 6] = [1, 3, 5, 7, 9, 11];

/// Days of competition per tournament
pub const TOURNAMENT_DAYS: u8 = 15;

pub type WrestlerId = i64;

/// A tournament identifier: `{year}{month:02}`, e.g. `195801`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TournamentId {
    year: i32,
    month: u32,
}

impl TournamentId {
    /// Build an id, checking the year epoch and competition month
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidTournamentId> {
        // Upper bound only matters here; parsed ids have four year digits
        if year < EPOCH_YEAR || year > 9999 {
            return Err(InvalidTournamentId(format!("{}{:02}", year, month)));
        }
        if !TOURNAMENT_MONTHS.contains(&month) {
            return Err(InvalidTournamentId(format!("{}{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the tournament month, used for the "not in the future" check
    pub fn month_start(&self) -> NaiveDate {
        // Year and month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Venue, fixed by the month the tournament is held in
    pub fn location(&self) -> &'static str {
        match self.month {
            3 => "Osaka",
            7 => "Nagoya",
            11 => "Fukuoka",
            _ => "Tokyo",
        }
    }
}

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tournament id: {0:?}")]
pub struct InvalidTournamentId(pub String);

impl FromStr for TournamentId {
    type Err = InvalidTournamentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidTournamentId(s.to_string()));
        }
        let year: i32 = s[..4].parse().map_err(|_| InvalidTournamentId(s.to_string()))?;
        let month: u32 = s[4..].parse().map_err(|_| InvalidTournamentId(s.to_string()))?;
        Self::new(year, month).map_err(|_| InvalidTournamentId(s.to_string()))
    }
}

/// Competitive tiers, top division first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Division {
    Makuuchi,
    Juryo,
    Makushita,
    Sandanme,
    Jonidan,
    Jonokuchi,
}

impl Division {
    pub const ALL: [Division; 6] = [
        Division::Makuuchi,
        Division::Juryo,
        Division::Makushita,
        Division::Sandanme,
        Division::Jonidan,
        Division::Jonokuchi,
    ];

    /// Name as used by the remote API and stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Makuuchi => "makuuchi",
            Division::Juryo => "juryo",
            Division::Makushita => "makushita",
            Division::Sandanme => "sandanme",
            Division::Jonidan => "jonidan",
            Division::Jonokuchi => "jonokuchi",
        }
    }

    /// Bouts each wrestler is scheduled for in one tournament
    pub fn expected_bouts(&self) -> u32 {
        match self {
            Division::Makuuchi | Division::Juryo => 15,
            _ => 7,
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Division::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| format!("unknown division: {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    East,
    West,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::East => "east",
            Side::West => "west",
        }
    }

    /// Lenient parse; anything that is not recognizably west is east
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "west" | "w" | "nishi" => Side::West,
            _ => Side::East,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tournament {
    pub id: TournamentId,
    pub location: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wrestler {
    pub id: WrestlerId,
    pub shikona: String,
    pub real_name: String,
    pub birth_date: Option<String>,
    pub debut_date: Option<String>,
    pub retirement_date: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub shusshin: String,
    pub heya: String,
    pub foreign_born: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BanzukeEntry {
    pub tournament_id: TournamentId,
    pub wrestler_id: WrestlerId,
    pub division: Division,
    pub rank: String,
    pub rank_number: u32,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bout {
    pub tournament_id: TournamentId,
    pub day: u8,
    pub division: Division,
    pub east_id: WrestlerId,
    pub west_id: WrestlerId,
    pub winner_id: Option<WrestlerId>,
    pub kimarite: String,
    pub match_time_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrestlerTournamentRecord {
    pub wrestler_id: WrestlerId,
    pub tournament_id: String,
    pub division: String,
    pub rank: String,
    pub wins: u32,
    pub losses: u32,
    pub absences: u32,
}
