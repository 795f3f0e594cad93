use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role/segment classification attached to a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Persona {
    pub id: String,
    pub code: String,
    pub name_it: Option<String>,
    pub name_en: Option<String>,
    #[serde(skip_serializing)]
    pub default_landing_path: Option<String>,
}

impl Persona {
    /// Codes whose holders are managed by administrators.
    pub const PRIVILEGED_CODES: &'static [&'static str] = &["ADMIN", "MODERATOR"];

    /// Codes hidden from the public persona picker.
    pub const HIDDEN_CODES: &'static [&'static str] = &["ADMIN", "MOD", "MODERATOR"];

    pub fn normalized_code(&self) -> String {
        self.code.trim().to_uppercase()
    }

    pub fn is_privileged(&self) -> bool {
        Self::PRIVILEGED_CODES.contains(&self.normalized_code().as_str())
    }

    pub fn is_public(&self) -> bool {
        !Self::HIDDEN_CODES.contains(&self.normalized_code().as_str())
    }

    pub fn landing_info(&self) -> PersonaInfo {
        PersonaInfo {
            code: Some(self.code.clone()),
            default_landing_path: self.default_landing_path.clone(),
        }
    }
}

/// The two persona attributes landing resolution looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaInfo {
    pub code: Option<String>,
    pub default_landing_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona(code: &str) -> Persona {
        Persona {
            id: "p1".to_string(),
            code: code.to_string(),
            name_it: None,
            name_en: None,
            default_landing_path: None,
        }
    }

    #[test]
    fn privileged_and_hidden_codes_ignore_case() {
        assert!(persona("admin").is_privileged());
        assert!(persona(" Moderator ").is_privileged());
        assert!(!persona("MOD").is_privileged());
        assert!(!persona("MOD").is_public());
        assert!(persona("STUD_MIDDLE").is_public());
    }
}
