//! Session claims and the request bodies of the auth and account routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Payload signed into the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Signed-in user.
    pub sub: UserId,
    /// Email the token was issued for.
    pub email: String,
    /// Unix time of issue.
    pub iat: i64,
    /// Unix time after which the token is refused.
    pub exp: i64,
}

impl Claims {
    /// Claims issued now and valid until `expires_at`.
    #[must_use]
    pub fn new(user_id: UserId, email: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// The `sub` claim.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.sub
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
///
/// With a `token`, the invitation must be unused, unexpired and issued to
/// the same email; the new user then joins the inviting group.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Invitation token from the signup link.
    pub token: Option<String>,
}

/// Account update payload. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    /// New display name.
    pub name: Option<String>,
    /// New avatar URL; `null` clears it.
    #[serde(default, with = "double_option")]
    pub avatar_url: Option<Option<String>>,
    /// Current password, required when changing the password.
    pub current_password: Option<String>,
    /// Replacement password.
    pub new_password: Option<String>,
}

/// Public user profile returned by auth and account endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// User ID.
    pub id: UserId,
    /// User email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if any.
    pub avatar_url: Option<String>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

/// Response body for login and registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Session token, also set as the `token` cookie.
    pub token: String,
    /// Authenticated user.
    pub user: UserInfo,
    /// Group joined through the invitation, on registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_uuid: Option<String>,
}

/// Distinguishes a missing JSON field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_sets_expiration_and_iat() {
        let expires_at = Utc::now() + Duration::days(30);
        let before = Utc::now().timestamp();
        let claims = Claims::new(UserId::new(5), "ana@example.com", expires_at);
        let after = Utc::now().timestamp();

        assert_eq!(claims.user_id(), UserId::new(5));
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.iat >= before && claims.iat <= after);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_update_account_distinguishes_null_from_missing() {
        let missing: UpdateAccountRequest = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();
        assert_eq!(missing.avatar_url, None);

        let cleared: UpdateAccountRequest = serde_json::from_str(r#"{"avatarUrl":null}"#).unwrap();
        assert_eq!(cleared.avatar_url, Some(None));

        let set: UpdateAccountRequest =
            serde_json::from_str(r#"{"avatarUrl":"https://cdn/a.png"}"#).unwrap();
        assert_eq!(set.avatar_url, Some(Some("https://cdn/a.png".to_string())));
    }

    #[test]
    fn test_register_request_token_optional() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"secret1","name":"A"}"#).unwrap();
        assert!(req.token.is_none());
    }
}
