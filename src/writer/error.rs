use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// A constraint rejected the unit's rows; its transaction was rolled back
    #[error("write conflict: {0}")]
    WriteConflict(rusqlite::Error),

    #[error("store is missing schema objects: {}", .0.join(", "))]
    MissingSchema(Vec<String>),

    #[error("store error: {0}")]
    Store(tokio_rusqlite::Error),
}

impl ImportError {
    /// Whether the whole run must stop, as opposed to skipping one unit
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ImportError::WriteConflict(_))
    }
}

impl From<tokio_rusqlite::Error> for ImportError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        match e {
            tokio_rusqlite::Error::Rusqlite(err) if is_constraint_violation(&err) => {
                ImportError::WriteConflict(err)
            }
            other => ImportError::Store(other),
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
