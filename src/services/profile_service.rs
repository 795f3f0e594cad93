use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::ServiceError;
use crate::database::models::{Persona, ProfileUpdate};
use crate::database::ProfileStore;

/// Body of `POST /api/profile/update`. Blank strings and non-string
/// values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default, deserialize_with = "string_only")]
    pub language_code: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub persona_id: Option<String>,
}

fn string_only<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NothingToUpdate,
    Saved,
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Personas offered on the public picker, privileged ones removed.
    pub async fn public_personas(&self) -> Result<Vec<Persona>, ServiceError> {
        let personas = self.profiles.list_personas().await?;
        Ok(personas.into_iter().filter(Persona::is_public).collect())
    }

    /// Apply a user's own settings change.
    ///
    /// Nobody can pick a privileged persona here, and users who already hold
    /// one cannot change persona at all: administrators manage those roles.
    pub async fn update_own_profile(
        &self,
        user_id: &str,
        request: ProfileUpdateRequest,
    ) -> Result<UpdateOutcome, ServiceError> {
        let language_code = blank_to_none(request.language_code);
        let requested_persona = blank_to_none(request.persona_id);

        let profile = self
            .profiles
            .profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Profile not found".to_string()))?;

        let mut update = ProfileUpdate {
            language_code,
            persona_id: None,
        };

        if let Some(requested) = requested_persona {
            let target = self
                .profiles
                .persona_by_id(&requested)
                .await?
                .ok_or_else(|| ServiceError::InvalidArgument("Requested persona not found".to_string()))?;

            if target.is_privileged() {
                return Err(ServiceError::Forbidden(
                    "Privileged personas (ADMIN/MODERATOR) cannot be selected here".to_string(),
                ));
            }

            let current = match profile.persona_id.as_deref() {
                Some(id) => self.profiles.persona_by_id(id).await?,
                None => None,
            };
            if current.as_ref().is_some_and(Persona::is_privileged) {
                return Err(ServiceError::Forbidden(
                    "Your role is managed by administrators; persona changes are not allowed here".to_string(),
                ));
            }

            update.persona_id = Some(target.id);
        }

        if update.is_empty() {
            return Ok(UpdateOutcome::NothingToUpdate);
        }

        self.profiles.update_profile(user_id, &update).await?;
        tracing::info!("Profile {} updated", user_id);
        Ok(UpdateOutcome::Saved)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_persona("p-admin", "ADMIN", None);
        store.add_persona("p-mod", "MODERATOR", None);
        store.add_persona("p-hidden", "MOD", None);
        store.add_persona("p-mid", "STUD_MIDDLE", None);
        store.add_persona("p-fan", "FAN", None);
        store.add_profile("student", Some("p-mid"), false);
        store.add_profile("admin", Some("p-admin"), true);
        store
    }

    fn request(language: Option<&str>, persona: Option<&str>) -> ProfileUpdateRequest {
        ProfileUpdateRequest {
            language_code: language.map(str::to_string),
            persona_id: persona.map(str::to_string),
        }
    }

    #[test]
    fn non_string_fields_are_ignored() {
        let request: ProfileUpdateRequest =
            serde_json::from_value(serde_json::json!({ "persona_id": 3, "language_code": "en" })).unwrap();
        assert_eq!(request.persona_id, None);
        assert_eq!(request.language_code.as_deref(), Some("en"));

        let request: ProfileUpdateRequest =
            serde_json::from_value(serde_json::json!({ "persona_id": null, "language_code": ["it"] })).unwrap();
        assert_eq!(request.persona_id, None);
        assert_eq!(request.language_code, None);
    }

    #[tokio::test]
    async fn public_personas_hide_privileged_codes() {
        let svc = ProfileService::new(store());
        let codes: Vec<_> = svc.public_personas().await.unwrap().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["FAN", "STUD_MIDDLE"]);
    }

    #[tokio::test]
    async fn blank_fields_mean_nothing_to_update() {
        let svc = ProfileService::new(store());
        let outcome = svc.update_own_profile("student", request(Some("  "), Some(""))).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::NothingToUpdate);
    }

    #[tokio::test]
    async fn student_can_switch_to_public_persona() {
        let store = store();
        let svc = ProfileService::new(store.clone());
        let outcome = svc
            .update_own_profile("student", request(Some("en"), Some("p-fan")))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Saved);

        let profile = store.profile_snapshot("student").unwrap();
        assert_eq!(profile.persona_id.as_deref(), Some("p-fan"));
        assert_eq!(profile.language_code.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn privileged_personas_are_guarded() {
        let svc = ProfileService::new(store());

        let err = svc.update_own_profile("student", request(None, Some("p-admin"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = svc.update_own_profile("admin", request(None, Some("p-fan"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // language alone is fine for privileged users
        let outcome = svc.update_own_profile("admin", request(Some("it"), None)).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Saved);
    }

    #[tokio::test]
    async fn unknown_profile_and_persona() {
        let svc = ProfileService::new(store());

        let err = svc.update_own_profile("ghost", request(Some("en"), None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = svc.update_own_profile("student", request(None, Some("p-none"))).await.unwrap_err();
        assert_eq!(err.to_string(), "Requested persona not found");
    }
}
