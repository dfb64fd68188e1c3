use rusqlite::Connection;

use crate::schema::{TableSchema, ALL_TABLES};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();
    let inline_pk = schema.primary_key.len() == 1;

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let pk = if inline_pk && schema.primary_key[0] == col.name {
            " PRIMARY KEY"
        } else {
            ""
        };

        columns.push(format!(
            "    {} {}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint
        ));
    }

    if !inline_pk && !schema.primary_key.is_empty() {
        columns.push(format!("    PRIMARY KEY ({})", schema.primary_key.join(", ")));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for the declared indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let unique = if index.unique { "UNIQUE " } else { "" };
            let prefix = if index.unique { "uq" } else { "idx" };
            format!(
                "CREATE {}INDEX IF NOT EXISTS {}_{}_{} ON {}({})",
                unique,
                prefix,
                schema.name,
                index.columns.join("_"),
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

/// Create every table and index. Idempotent.
///
/// Owned by the process entry point; the import core never issues DDL.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -64000;",
    )?;

    for schema in ALL_TABLES {
        conn.execute(&generate_create_table(schema), [])?;
        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])?;
        }
    }

    Ok(())
}

/// Names of required tables and natural-key indexes absent from the store
pub fn missing_schema_objects(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index')")?;
    let present: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut missing = Vec::new();
    for schema in ALL_TABLES {
        if !present.iter().any(|name| name == schema.name) {
            missing.push(schema.name.to_string());
        }
    }

    // Bout upserts depend on the natural-key index
    for index_sql in generate_indexes(&crate::schema::BOUTS) {
        if let Some(name) = index_sql.split_whitespace().find(|w| w.starts_with("uq_")) {
            if !present.iter().any(|p| p == name) {
                missing.push(name.to_string());
            }
        }
    }

    Ok(missing)
}
