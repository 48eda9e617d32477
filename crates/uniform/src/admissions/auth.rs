use serde::{Deserialize, Serialize};

use super::domain::InstitutionId;

/// Role carried by a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallerRole {
    Student,
    InstitutionAdmin,
    SystemAdmin,
}

/// Explicit caller context threaded through every admission operation, rather
/// than ambient request state. `institution_id` is populated only for
/// institution admins and scopes what they may read and review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedCaller {
    pub id: String,
    pub role: CallerRole,
    pub institution_id: Option<InstitutionId>,
}

impl AuthenticatedCaller {
    pub fn student(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: CallerRole::Student,
            institution_id: None,
        }
    }

    pub fn institution_admin(id: impl Into<String>, institution_id: InstitutionId) -> Self {
        Self {
            id: id.into(),
            role: CallerRole::InstitutionAdmin,
            institution_id: Some(institution_id),
        }
    }

    pub fn system_admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: CallerRole::SystemAdmin,
            institution_id: None,
        }
    }
}

/// Resolves an opaque bearer token into a caller context. Token issuance and
/// signing live outside this crate; implementations only need to map a token
/// to the identity it was minted for.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedCaller, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer credentials")]
    MissingCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
}
