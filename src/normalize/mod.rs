//! Raw API payloads to entity shapes.
//!
//! Every function here is pure. Optional fields are extracted defensively:
//! a missing or mistyped field becomes empty/`None`, never an error. Only a
//! payload whose overall shape is wrong is rejected as [`MalformedPayload`].

pub mod birthplace;
pub mod rank;

use serde_json::Value;
use thiserror::Error;

use crate::model::{
    BanzukeEntry, Bout, Division, Side, Tournament, TournamentId, Wrestler, WrestlerId,
};

pub use birthplace::is_foreign_born;
pub use rank::{parse_rank, rank_ordinal, RankTier, UNRANKED};

#[derive(Debug, Error)]
#[error("malformed payload: {0}")]
pub struct MalformedPayload(pub String);

/// Tournament metadata from `GET /basho/{id}`
pub fn normalize_tournament(id: TournamentId, payload: &Value) -> Result<Tournament, MalformedPayload> {
    if !payload.is_object() {
        return Err(MalformedPayload(format!("tournament {} metadata is not an object", id)));
    }

    Ok(Tournament {
        id,
        location: id.location().to_string(),
        start_date: opt_text(payload, &["start_date", "startDate"]),
        end_date: opt_text(payload, &["end_date", "endDate"]),
    })
}

/// One roster record; `None` when it carries no usable id
pub fn normalize_wrestler(record: &Value) -> Option<Wrestler> {
    let id = opt_i64(record, &["id"])?;
    let shusshin = text(record, &["shusshin"]);

    Some(Wrestler {
        id,
        shikona: text(record, &["shikona", "shikonaEn"]),
        real_name: text(record, &["real_name", "realName"]),
        birth_date: opt_text(record, &["birth_date", "birthDate"]),
        debut_date: opt_text(record, &["debut_date", "debut"]),
        retirement_date: opt_text(record, &["retirement_date", "intai"]),
        height_cm: opt_f64(record, &["height"]),
        weight_kg: opt_f64(record, &["weight"]),
        foreign_born: is_foreign_born(&shusshin),
        heya: text(record, &["heya"]),
        shusshin,
    })
}

/// Roster page from `GET /rikishi`
pub fn normalize_roster(payload: &Value) -> Result<Vec<Wrestler>, MalformedPayload> {
    let records: &[Value] = match payload.get("records") {
        Some(Value::Array(records)) => records.as_slice(),
        Some(Value::Null) => &[],
        _ => return Err(MalformedPayload("roster page has no records list".to_string())),
    };

    let mut wrestlers = Vec::with_capacity(records.len());
    for record in records {
        match normalize_wrestler(record) {
            Some(w) => wrestlers.push(w),
            None => tracing::warn!("skipping roster record without id"),
        }
    }
    Ok(wrestlers)
}

/// Banzuke from `GET /basho/{id}/banzuke`: division name to list of entries.
///
/// Non-list values are ignored. A division name outside the six tiers falls
/// back to the division implied by each entry's rank.
pub fn normalize_banzuke(
    tournament_id: TournamentId,
    payload: &Value,
) -> Result<Vec<BanzukeEntry>, MalformedPayload> {
    let divisions = payload
        .as_object()
        .ok_or_else(|| MalformedPayload(format!("banzuke for {} is not an object", tournament_id)))?;

    let mut entries = Vec::new();

    for (name, list) in divisions {
        let Some(list) = list.as_array() else {
            continue;
        };
        let named_division = name.parse::<Division>().ok();

        for item in list {
            let Some(wrestler_id) = opt_i64(item, &["id", "rikishiID", "rikishi_id"]) else {
                tracing::warn!(tournament = %tournament_id, division = %name, "banzuke entry without wrestler id");
                continue;
            };
            let rank = text(item, &["rank"]);
            let parsed = parse_rank(&rank);

            let Some(division) = named_division.or_else(|| parsed.and_then(|r| r.tier.division())) else {
                tracing::warn!(tournament = %tournament_id, division = %name, wrestler_id, "unknown division");
                continue;
            };

            entries.push(BanzukeEntry {
                tournament_id,
                wrestler_id,
                division,
                rank_number: parsed.map(|r| r.ordinal()).unwrap_or(UNRANKED),
                rank,
                side: opt_text(item, &["side"])
                    .map(|s| Side::parse_lenient(&s))
                    .unwrap_or(Side::East),
            });
        }
    }

    Ok(entries)
}

/// Bouts of one day from `GET /basho/{id}/torikumi/{day}`
pub fn normalize_bouts(
    tournament_id: TournamentId,
    day: u8,
    payload: &Value,
) -> Result<Vec<Bout>, MalformedPayload> {
    let records: &[Value] = match payload.get("torikumi") {
        Some(Value::Array(records)) => records.as_slice(),
        Some(Value::Null) => &[],
        _ => {
            return Err(MalformedPayload(format!(
                "torikumi for {} day {} has no bout list",
                tournament_id, day
            )))
        }
    };

    let mut bouts = Vec::with_capacity(records.len());
    for record in records {
        let (Some(east_id), Some(west_id)) = (side_id(record, "east"), side_id(record, "west")) else {
            tracing::warn!(tournament = %tournament_id, day, "bout without both wrestler ids");
            continue;
        };

        let division = match opt_text(record, &["division"]) {
            None => Division::Makuuchi,
            Some(name) => match name.parse::<Division>() {
                Ok(division) => division,
                Err(_) => {
                    tracing::warn!(tournament = %tournament_id, day, division = %name, "bout in unknown division");
                    continue;
                }
            },
        };

        let winner_id = match opt_i64(record, &["winner_id", "winnerId"]) {
            Some(w) if w == east_id || w == west_id => Some(w),
            Some(w) => {
                tracing::warn!(
                    tournament = %tournament_id,
                    day,
                    east_id,
                    west_id,
                    winner_id = w,
                    "winner matches neither side; leaving unresolved"
                );
                None
            }
            None => None,
        };

        bouts.push(Bout {
            tournament_id,
            day,
            division,
            east_id,
            west_id,
            winner_id,
            kimarite: text(record, &["kimarite", "technique"]),
            match_time_seconds: opt_f64(record, &["match_time", "duration"]),
        });
    }

    Ok(bouts)
}

/// Wrestler id of one side of a bout: nested `{"east": {"id": 1}}` or flat
/// `{"east_id": 1}` / `{"eastId": 1}`.
fn side_id(record: &Value, side: &str) -> Option<WrestlerId> {
    let flat = format!("{}_id", side);
    let camel = format!("{}Id", side);
    record
        .get(side)
        .and_then(|s| opt_i64(s, &["id"]))
        .or_else(|| opt_i64(record, &[flat.as_str(), camel.as_str()]))
}

fn field<'a>(json: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| json.get(k))
        .find(|v| !v.is_null())
}

fn text(json: &Value, keys: &[&str]) -> String {
    opt_text(json, keys).unwrap_or_default()
}

fn opt_text(json: &Value, keys: &[&str]) -> Option<String> {
    field(json, keys)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn opt_i64(json: &Value, keys: &[&str]) -> Option<i64> {
    let v = field(json, keys)?;
    v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn opt_f64(json: &Value, keys: &[&str]) -> Option<f64> {
    let v = field(json, keys)?;
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn basho() -> TournamentId {
        "195801".parse().unwrap()
    }

    #[test]
    fn test_wrestler_defensive_extraction() {
        let w = normalize_wrestler(&json!({"id": 7, "shikona": "Hakuho", "shusshin": "Ulaanbaatar, Mongolia"}))
            .unwrap();
        assert_eq!(w.id, 7);
        assert_eq!(w.shikona, "Hakuho");
        assert_eq!(w.real_name, "");
        assert_eq!(w.birth_date, None);
        assert_eq!(w.height_cm, None);
        assert!(w.foreign_born);

        let w = normalize_wrestler(&json!({"id": "12", "height": "185.5", "weight": null})).unwrap();
        assert_eq!(w.id, 12);
        assert_eq!(w.height_cm, Some(185.5));
        assert!(!w.foreign_born);

        assert!(normalize_wrestler(&json!({"shikona": "no id"})).is_none());
    }

    #[test]
    fn test_roster_requires_records() {
        let wrestlers = normalize_roster(&json!({"records": [{"id": 1}, {"name": "x"}, {"id": 2}]})).unwrap();
        assert_eq!(wrestlers.len(), 2);
        assert!(normalize_roster(&json!({"records": null})).unwrap().is_empty());
        assert!(normalize_roster(&json!({"items": []})).is_err());
    }

    #[test]
    fn test_banzuke_entries() {
        let payload = json!({
            "makuuchi": [
                {"id": 1, "rank": "Yokozuna 1 East", "side": "east"},
                {"id": 2, "rank": "M3w", "side": "West"},
                {"rank": "M4e"}
            ],
            "juryo": [{"id": 3}],
            "Unknown": [{"id": 4, "rank": "Ms10e"}],
            "bashoId": "195801"
        });
        let mut entries = normalize_banzuke(basho(), &payload).unwrap();
        entries.sort_by_key(|e| e.wrestler_id);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].rank_number, 1);
        assert_eq!(entries[1].side, Side::West);
        assert_eq!(entries[2].division, Division::Juryo);
        assert_eq!(entries[2].rank_number, UNRANKED);
        assert_eq!(entries[2].side, Side::East);
        assert_eq!(entries[3].division, Division::Makushita);

        assert!(normalize_banzuke(basho(), &json!([1, 2])).is_err());
    }

    #[test]
    fn test_bouts() {
        let payload = json!({"torikumi": [
            {"division": "Makuuchi", "east": {"id": 1}, "west": {"id": 2}, "winner_id": 1, "kimarite": "yorikiri", "match_time": 12.5},
            {"east_id": 3, "west_id": 4, "winner_id": 99, "technique": "oshidashi"},
            {"east": {"id": 5}, "west": {}},
            {"division": "maezumo", "east": {"id": 6}, "west": {"id": 7}}
        ]});
        let bouts = normalize_bouts(basho(), 3, &payload).unwrap();

        assert_eq!(bouts.len(), 2);
        assert_eq!(bouts[0].day, 3);
        assert_eq!(bouts[0].winner_id, Some(1));
        assert_eq!(bouts[0].match_time_seconds, Some(12.5));
        assert_eq!(bouts[1].division, Division::Makuuchi);
        assert_eq!(bouts[1].winner_id, None);
        assert_eq!(bouts[1].kimarite, "oshidashi");
    }

    #[test]
    fn test_bouts_require_list() {
        assert!(normalize_bouts(basho(), 1, &json!({"torikumi": null})).unwrap().is_empty());
        assert!(normalize_bouts(basho(), 1, &json!({"error": "not found"})).is_err());
    }

    #[test]
    fn test_tournament_metadata() {
        let t = normalize_tournament(basho(), &json!({"startDate": "1958-01-12", "end_date": "1958-01-26"})).unwrap();
        assert_eq!(t.location, "Tokyo");
        assert_eq!(t.start_date.as_deref(), Some("1958-01-12"));
        assert_eq!(t.end_date.as_deref(), Some("1958-01-26"));
        assert!(normalize_tournament(basho(), &json!("oops")).is_err());
    }
}
