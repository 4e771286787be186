use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlazaError {
    #[error("{field} cannot be blank")]
    BlankField { field: String },

    #[error("role '{role}' is not offered by this course")]
    RoleNotOffered { role: String },

    #[error("user {user} already holds role '{role}'")]
    AlreadySubscribed { user: String, role: String },

    #[error("user {user} does not hold role '{role}'")]
    NotSubscribed { user: String, role: String },

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("not permitted: {action}")]
    NotPermitted { action: String },

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PlazaError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        PlazaError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Business-rule violations: rejected before any mutation, safe to
    /// retry identically from the client.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PlazaError::BlankField { .. }
                | PlazaError::RoleNotOffered { .. }
                | PlazaError::AlreadySubscribed { .. }
                | PlazaError::NotSubscribed { .. }
                | PlazaError::UnknownRole(_)
        )
    }
}

pub type PlazaResult<T> = Result<T, PlazaError>;
