//! User Summary Entity
//!
//! Minimal projection of a user identity. Travels in the credential bundle,
//! the handoff URL and local storage, so it never holds secrets.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::value_object::user_role::UserRole;

/// `{ id, name, email, role }`
///
/// Unknown fields are ignored so a full user object can be projected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl UserSummary {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_is_stringified() {
        let user: UserSummary =
            serde_json::from_str(r#"{"id":1,"name":"Admin","email":"admin@example.com","role":"admin"}"#)
                .unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_projection_ignores_extra_fields() {
        let user: UserSummary = serde_json::from_str(
            r#"{"id":"u-7","name":"Jo","email":"jo@example.com","createdAt":"2024-01-01","password":"x"}"#,
        )
        .unwrap();
        assert_eq!(user, UserSummary::new("u-7", "Jo", "jo@example.com", UserRole::User));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(serde_json::from_str::<UserSummary>(r#"{"name":"Jo"}"#).is_err());
        assert!(serde_json::from_str::<UserSummary>(r#"{"id":null}"#).is_err());
    }
}
