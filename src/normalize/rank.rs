//! Textual rank to ordinal.
//!
//! The ordinal is `tier base + number`, with the number clamped to the span
//! of its tier, so every rank of a higher division sorts before every rank
//! of a lower one:
//!
//! | Tier       | Abbrev. | Base | Span | Division  |
//! |------------|---------|------|------|-----------|
//! | Yokozuna   | Y       |    0 |    9 | makuuchi  |
//! | Ozeki      | O       |   10 |    9 | makuuchi  |
//! | Sekiwake   | S       |   20 |    9 | makuuchi  |
//! | Komusubi   | K       |   30 |    9 | makuuchi  |
//! | Maegashira | M       |   40 |   59 | makuuchi  |
//! | Juryo      | J       |  100 |   99 | juryo     |
//! | Makushita  | Ms      |  200 |   99 | makushita |
//! | Sandanme   | Sd      |  300 |   99 | sandanme  |
//! | Jonidan    | Jd      |  400 |  199 | jonidan   |
//! | Jonokuchi  | Jk      |  600 |   99 | jonokuchi |
//! | Mae-zumo   | Mz      |  800 |   99 | -         |
//!
//! Numbers past a tier's span tie at the span's last ordinal (`M60` and
//! `M80` both map to 99), so order inside a tier is only strict within the
//! span. Empty or unparseable text maps to [`UNRANKED`].

use crate::model::Division;

/// Ordinal for missing or unparseable ranks; sorts after every real rank
pub const UNRANKED: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RankTier {
    Yokozuna,
    Ozeki,
    Sekiwake,
    Komusubi,
    Maegashira,
    Juryo,
    Makushita,
    Sandanme,
    Jonidan,
    Jonokuchi,
    MaeZumo,
}

impl RankTier {
    fn from_prefix(prefix: &str) -> Option<Self> {
        let tier = match prefix {
            "y" | "yokozuna" => RankTier::Yokozuna,
            "o" | "ozeki" | "ōzeki" => RankTier::Ozeki,
            "s" | "sekiwake" => RankTier::Sekiwake,
            "k" | "komusubi" => RankTier::Komusubi,
            "m" | "maegashira" => RankTier::Maegashira,
            "j" | "juryo" | "jūryō" => RankTier::Juryo,
            "ms" | "makushita" => RankTier::Makushita,
            "sd" | "sandanme" => RankTier::Sandanme,
            "jd" | "jonidan" => RankTier::Jonidan,
            "jk" | "jonokuchi" => RankTier::Jonokuchi,
            "mz" | "mae-zumo" | "maezumo" => RankTier::MaeZumo,
            _ => return None,
        };
        Some(tier)
    }

    fn base_and_span(&self) -> (u32, u32) {
        match self {
            RankTier::Yokozuna => (0, 9),
            RankTier::Ozeki => (10, 9),
            RankTier::Sekiwake => (20, 9),
            RankTier::Komusubi => (30, 9),
            RankTier::Maegashira => (40, 59),
            RankTier::Juryo => (100, 99),
            RankTier::Makushita => (200, 99),
            RankTier::Sandanme => (300, 99),
            RankTier::Jonidan => (400, 199),
            RankTier::Jonokuchi => (600, 99),
            RankTier::MaeZumo => (800, 99),
        }
    }

    /// Division the tier belongs to; mae-zumo is below the banzuke
    pub fn division(&self) -> Option<Division> {
        match self {
            RankTier::Yokozuna
            | RankTier::Ozeki
            | RankTier::Sekiwake
            | RankTier::Komusubi
            | RankTier::Maegashira => Some(Division::Makuuchi),
            RankTier::Juryo => Some(Division::Juryo),
            RankTier::Makushita => Some(Division::Makushita),
            RankTier::Sandanme => Some(Division::Sandanme),
            RankTier::Jonidan => Some(Division::Jonidan),
            RankTier::Jonokuchi => Some(Division::Jonokuchi),
            RankTier::MaeZumo => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRank {
    pub tier: RankTier,
    pub number: u32,
}

impl ParsedRank {
    pub fn ordinal(&self) -> u32 {
        let (base, span) = self.tier.base_and_span();
        base + self.number.clamp(1, span)
    }
}

/// Parse `"Maegashira 3 East"`, `"M3e"`, `"Ms12w"`, `"Yokozuna"` and the like.
pub fn parse_rank(text: &str) -> Option<ParsedRank> {
    let text = text.trim();
    let prefix_end = text
        .find(|c: char| !(c.is_alphabetic() || c == '-'))
        .unwrap_or(text.len());
    let (prefix, rest) = text.split_at(prefix_end);

    let tier = RankTier::from_prefix(&prefix.to_lowercase())?;

    // Side letter, if any, follows the digits: "M3e"
    let rest = rest.trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let number = if digits_end == 0 {
        1
    } else {
        rest[..digits_end].parse().ok()?
    };
    if number == 0 {
        return None;
    }

    match rest[digits_end..].trim().to_lowercase().as_str() {
        "" | "e" | "w" | "east" | "west" => Some(ParsedRank { tier, number }),
        _ => None,
    }
}

/// Ordinal of a textual rank, [`UNRANKED`] when it cannot be parsed
pub fn rank_ordinal(text: &str) -> u32 {
    parse_rank(text).map(|r| r.ordinal()).unwrap_or(UNRANKED)
}
