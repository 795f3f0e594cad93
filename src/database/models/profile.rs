use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub persona_id: Option<String>,
    pub is_admin: bool,
    pub language_code: Option<String>,
}

/// Fields a user may change on their own profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub language_code: Option<String>,
    pub persona_id: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.language_code.is_none() && self.persona_id.is_none()
    }
}
