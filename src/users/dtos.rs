use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{User, UserRole};
use crate::repositories::UserPatch;

/// Partial profile update. Absent fields keep their current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub company_name: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.display_name.is_none() && self.bio.is_none() && self.company_name.is_none() {
            return Err("No fields to update".to_string());
        }
        if let Some(name) = &self.display_name {
            let trimmed = name.trim();
            if trimmed.len() < 2 || trimmed.len() > 100 {
                return Err("Display name must be 2-100 characters".to_string());
            }
        }
        if let Some(bio) = &self.bio {
            if bio.len() > 500 {
                return Err("Bio must be at most 500 characters".to_string());
            }
        }
        Ok(())
    }

    pub fn into_patch(self) -> UserPatch {
        UserPatch {
            display_name: self.display_name.map(|name| name.trim().to_string()),
            bio: self.bio,
            company_name: self.company_name,
        }
    }
}

/// What anyone may see about a user. No email, ever.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicProfileResponse {
    pub id: uuid::Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for PublicProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            bio: user.bio,
            company_name: user.company_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
