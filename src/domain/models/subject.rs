use serde::Serialize;

/// Whom a booking is for: the account itself or one of its dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubjectRef {
    Account { user_id: String },
    Dependent { user_id: String, dependent_id: String },
}

impl SubjectRef {
    pub fn account(user_id: impl Into<String>) -> Self {
        SubjectRef::Account { user_id: user_id.into() }
    }

    pub fn dependent(user_id: impl Into<String>, dependent_id: impl Into<String>) -> Self {
        SubjectRef::Dependent { user_id: user_id.into(), dependent_id: dependent_id.into() }
    }

    /// The account that owns the booking.
    pub fn user_id(&self) -> &str {
        match self {
            SubjectRef::Account { user_id } | SubjectRef::Dependent { user_id, .. } => user_id,
        }
    }

    /// The id stored on the booking and used by the double-booking guard.
    pub fn subject_id(&self) -> &str {
        match self {
            SubjectRef::Account { user_id } => user_id,
            SubjectRef::Dependent { dependent_id, .. } => dependent_id,
        }
    }

    pub fn dependent_id(&self) -> Option<&str> {
        match self {
            SubjectRef::Account { .. } => None,
            SubjectRef::Dependent { dependent_id, .. } => Some(dependent_id),
        }
    }
}

/// Request-scoped caller identity handed to the services.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), is_admin: false }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), is_admin: true }
    }
}

#[derive(Debug, Clone)]
pub struct BookingContext {
    pub actor: Actor,
    pub subject: SubjectRef,
}
