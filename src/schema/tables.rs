//! Table definitions for the sumo history store

use super::types::*;

pub static TOURNAMENTS: TableSchema = TableSchema {
    name: "tournaments",
    columns: &[
        Column::required("id", ColumnType::Text),
        Column::required("year", ColumnType::Integer),
        Column::required("month", ColumnType::Integer),
        Column::new("location", ColumnType::Text),
        Column::new("start_date", ColumnType::Text),
        Column::new("end_date", ColumnType::Text),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[],
};

pub static WRESTLERS: TableSchema = TableSchema {
    name: "wrestlers",
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::new("shikona", ColumnType::Text),
        Column::new("real_name", ColumnType::Text),
        Column::new("birth_date", ColumnType::Text),
        Column::new("debut_date", ColumnType::Text),
        Column::new("retirement_date", ColumnType::Text),
        Column::new("height_cm", ColumnType::Real),
        Column::new("weight_kg", ColumnType::Real),
        Column::new("shusshin", ColumnType::Text),
        Column::new("heya", ColumnType::Text),
        Column::required("foreign_born", ColumnType::Boolean),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[Index::on(&["heya"])],
};

pub static BANZUKE: TableSchema = TableSchema {
    name: "banzuke",
    columns: &[
        Column::required("tournament_id", ColumnType::Text),
        Column::required("wrestler_id", ColumnType::Integer),
        Column::required("division", ColumnType::Text),
        Column::new("rank", ColumnType::Text),
        Column::required("rank_number", ColumnType::Integer),
        Column::required("east_west", ColumnType::Text),
    ],
    primary_key: &["tournament_id", "wrestler_id"],
    foreign_keys: &[ForeignKey::new("tournament_id", "tournaments")],
    indexes: &[Index::on(&["tournament_id", "rank_number"])],
};

/// `id` is a surrogate; identity is the natural key in the unique index
pub static BOUTS: TableSchema = TableSchema {
    name: "bouts",
    columns: &[
        Column::new("id", ColumnType::Integer),
        Column::required("tournament_id", ColumnType::Text),
        Column::required("day", ColumnType::Integer),
        Column::required("division", ColumnType::Text),
        Column::required("east_wrestler_id", ColumnType::Integer),
        Column::required("west_wrestler_id", ColumnType::Integer),
        Column::new("winner_id", ColumnType::Integer),
        Column::new("kimarite", ColumnType::Text),
        Column::new("match_time_seconds", ColumnType::Real),
    ],
    primary_key: &["id"],
    foreign_keys: &[ForeignKey::new("tournament_id", "tournaments")],
    indexes: &[
        Index::unique(&[
            "tournament_id",
            "day",
            "division",
            "east_wrestler_id",
            "west_wrestler_id",
        ]),
        Index::on(&["east_wrestler_id"]),
        Index::on(&["west_wrestler_id"]),
    ],
};

pub static WRESTLER_TOURNAMENTS: TableSchema = TableSchema {
    name: "wrestler_tournaments",
    columns: &[
        Column::required("wrestler_id", ColumnType::Integer),
        Column::required("tournament_id", ColumnType::Text),
        Column::required("division", ColumnType::Text),
        Column::new("rank", ColumnType::Text),
        Column::required("wins", ColumnType::Integer),
        Column::required("losses", ColumnType::Integer),
        Column::required("absences", ColumnType::Integer),
    ],
    primary_key: &["wrestler_id", "tournament_id", "division"],
    foreign_keys: &[],
    indexes: &[Index::on(&["tournament_id"])],
};

/// All tables, parents before children
pub static ALL_TABLES: &[&TableSchema] = &[
    &TOURNAMENTS,
    &WRESTLERS,
    &BANZUKE,
    &BOUTS,
    &WRESTLER_TOURNAMENTS,
];

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
