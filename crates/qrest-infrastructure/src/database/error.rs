//! sqlx error translation shared by every repository

use tracing::error;

use qrest_core::error::DomainError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a database failure onto the domain taxonomy. `context` names the
/// operation in the log line.
pub fn map_db_error(context: &str, e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::RowNotFound => DomainError::NotFound("Record"),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                DomainError::Conflict("A record with this value already exists".into())
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                DomainError::ValidationError("Referenced record does not exist".into())
            }
            _ => {
                error!("Database error {}: {}", context, e);
                DomainError::DatabaseError(e.to_string())
            }
        },
        _ => {
            error!("Database error {}: {}", context, e);
            DomainError::DatabaseError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = map_db_error("finding menu", sqlx::Error::RowNotFound);
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_other_errors_map_to_database_error() {
        let err = map_db_error("listing menus", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
