use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;

use crate::entities::UserRole;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// Defaults to `creator` when absent. `admin` cannot be self-assigned.
    pub role: Option<UserRole>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_email(&self.email) {
            return Err("Invalid email format".to_string());
        }
        if self.password.len() < 8 {
            return Err("Password must be at least 8 characters".to_string());
        }
        if self.password.len() > 512 {
            return Err("Password too long".to_string());
        }
        if self.display_name.trim().is_empty() {
            return Err("Display name cannot be empty".to_string());
        }
        if matches!(self.role, Some(UserRole::Admin)) {
            return Err("Cannot sign up as admin".to_string());
        }
        Ok(())
    }

    pub fn role_or_default(&self) -> UserRole {
        self.role.unwrap_or(UserRole::Creator)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_email(&self.email) {
            return Err("Invalid email format".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// The authenticated user's own view of their account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: uuid::Uuid,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<crate::entities::User> for ProfileResponse {
    fn from(user: crate::entities::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            bio: user.bio,
            company_name: user.company_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, role: Option<UserRole>) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            display_name: "Ada".to_string(),
            role,
        }
    }

    #[test]
    fn signup_valid() {
        assert!(signup("user@example.com", "password123", None).validate().is_ok());
    }

    #[test]
    fn signup_invalid_email() {
        assert!(signup("not-an-email", "password123", None).validate().is_err());
    }

    #[test]
    fn signup_password_too_short() {
        assert!(signup("user@example.com", "short", None).validate().is_err());
    }

    #[test]
    fn signup_cannot_claim_admin() {
        assert!(
            signup("user@example.com", "password123", Some(UserRole::Admin))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn signup_default_role_is_creator() {
        assert_eq!(
            signup("user@example.com", "password123", None).role_or_default(),
            UserRole::Creator
        );
        assert_eq!(
            signup("user@example.com", "password123", Some(UserRole::Buyer)).role_or_default(),
            UserRole::Buyer
        );
    }

    #[test]
    fn login_requires_valid_email() {
        let req = LoginRequest {
            email: "bad".to_string(),
            password: "irrelevant".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
