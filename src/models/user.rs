use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub password: String, // Always hashed
    pub password_changed_at: Option<DateTime>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime>,
    // Soft-delete flag; inactive users cannot sign in
    pub active: Option<bool>,
    pub last_signin: Option<DateTime>,
    pub failed_signins: Option<i32>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordInput {
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordInput {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

/// What the client gets back; the password hash never leaves the server.
#[derive(Serialize, Deserialize)]
pub struct UserSession {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub created_at: Option<DateTime>,
}

impl From<User> for UserSession {
    fn from(user: User) -> Self {
        UserSession {
            id: user.id.unwrap_or_default(),
            name: user.name,
            email: user.email,
            role: user.role,
            photo: user.photo,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&UserRole::LeadGuide).unwrap(),
            "\"lead-guide\""
        );
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let role: UserRole = serde_json::from_str("\"lead-guide\"").unwrap();
        assert_eq!(role, UserRole::LeadGuide);
    }

    #[test]
    fn test_role_defaults_to_user() {
        assert_eq!(UserRole::default(), UserRole::User);
    }
}
