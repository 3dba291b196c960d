use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried by a user summary
///
/// Codes are case-insensitive. Codes the shell does not know are kept
/// (lowercased), since the summary may come from another application over
/// the handoff URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    #[default]
    User,
    Manager,
    Admin,
    Other(OtherRole),
}

/// A role code outside the known set, always trimmed and lowercased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OtherRole(String);

impl OtherRole {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserRole {
    #[inline]
    pub fn code(&self) -> &str {
        use UserRole::*;
        match self {
            User => "user",
            Manager => "manager",
            Admin => "admin",
            Other(code) => code.as_str(),
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Self {
        use UserRole::*;
        let code = code.trim().to_ascii_lowercase();
        match code.as_str() {
            "" | "user" => User,
            "manager" => Manager,
            "admin" => Admin,
            _ => Other(OtherRole(code)),
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<String> for UserRole {
    fn from(code: String) -> Self {
        UserRole::from_code(&code)
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.code().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_code() {
        assert_eq!(UserRole::from_code("user"), UserRole::User);
        assert_eq!(UserRole::from_code("Admin"), UserRole::Admin);
        assert_eq!(UserRole::from_code("manager"), UserRole::Manager);
        assert_eq!(UserRole::from_code(""), UserRole::User);
        assert_eq!(UserRole::from_code("auditor").code(), "auditor");
        assert_eq!(UserRole::from_code(" Auditor ").code(), "auditor");
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::User.to_string(), "user");
        assert_eq!(UserRole::Manager.to_string(), "manager");
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(UserRole::from_code("Auditor").to_string(), "auditor");
    }

    #[test]
    fn test_user_role_serde_as_code() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let role: UserRole = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(role, UserRole::from_code("auditor"));
        assert!(matches!(role, UserRole::Other(_)));
    }

    #[test]
    fn test_user_role_survives_serde_whatever_the_case() {
        for code in ["Admin", "MANAGER", "user", "Auditor", " support "] {
            let role = UserRole::from_code(code);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(serde_json::from_str::<UserRole>(&json).unwrap(), role, "code {:?}", code);
        }
    }
}
