use std::fmt;

use crate::model::{Division, TournamentId};

/// Endpoint classes, each paced by its own rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    TournamentMetadata,
    Banzuke,
    DailyTorikumi,
    CompetitorRoster,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 4] = [
        EndpointClass::TournamentMetadata,
        EndpointClass::Banzuke,
        EndpointClass::DailyTorikumi,
        EndpointClass::CompetitorRoster,
    ];
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointClass::TournamentMetadata => "tournament",
            EndpointClass::Banzuke => "banzuke",
            EndpointClass::DailyTorikumi => "torikumi",
            EndpointClass::CompetitorRoster => "roster",
        };
        f.write_str(name)
    }
}

/// One request against the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /basho/{id}`
    Basho(TournamentId),
    /// `GET /basho/{id}/banzuke`
    Banzuke(TournamentId),
    /// `GET /basho/{id}/torikumi/{day}`
    Torikumi(TournamentId, u8),
    /// `GET /rikishi?division=&limit=&skip=`
    Rikishi {
        division: Division,
        limit: u32,
        skip: u32,
    },
}

impl Endpoint {
    pub fn class(&self) -> EndpointClass {
        match self {
            Endpoint::Basho(_) => EndpointClass::TournamentMetadata,
            Endpoint::Banzuke(_) => EndpointClass::Banzuke,
            Endpoint::Torikumi(..) => EndpointClass::DailyTorikumi,
            Endpoint::Rikishi { .. } => EndpointClass::CompetitorRoster,
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::Basho(id) => format!("/basho/{}", id),
            Endpoint::Banzuke(id) => format!("/basho/{}/banzuke", id),
            Endpoint::Torikumi(id, day) => format!("/basho/{}/torikumi/{}", id, day),
            Endpoint::Rikishi { .. } => "/rikishi".to_string(),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Rikishi {
                division,
                limit,
                skip,
            } => {
                let mut params = vec![
                    ("division", division.as_str().to_string()),
                    ("limit", limit.to_string()),
                ];
                if *skip > 0 {
                    params.push(("skip", skip.to_string()));
                }
                params
            }
            _ => Vec::new(),
        }
    }

    /// Stable key identifying this request, used as the response cache file name
    pub fn cache_key(&self) -> String {
        let mut key = self.path().trim_start_matches('/').replace('/', "_");
        for (name, value) in self.query() {
            key.push_str(&format!("_{}-{}", name, value));
        }
        key
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        let query = self.query();
        if !query.is_empty() {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            write!(f, "?{}", pairs.join("&"))?;
        }
        Ok(())
    }
}
