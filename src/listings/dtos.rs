use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entities::ListingStatus;
use crate::repositories::{ListingPatch, NewListing};

const MIN_TITLE_LEN: usize = 2;
const MAX_TITLE_LEN: usize = 200;
const MIN_DESCRIPTION_LEN: usize = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    pub description: String,
    pub genre: String,
    pub format: String,
    #[serde(default)]
    pub logline: Option<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub comparables: Vec<String>,
    #[serde(default)]
    pub rights_holder: Option<String>,
    #[serde(default)]
    pub available_rights: Vec<String>,
}

impl CreateListingRequest {
    pub fn validate(&self) -> Result<(), String> {
        let title = self.title.trim();
        if title.len() < MIN_TITLE_LEN || title.len() > MAX_TITLE_LEN {
            return Err(format!(
                "Title must be between {} and {} characters",
                MIN_TITLE_LEN, MAX_TITLE_LEN
            ));
        }
        if self.description.trim().len() < MIN_DESCRIPTION_LEN {
            return Err(format!(
                "Description must be at least {} characters",
                MIN_DESCRIPTION_LEN
            ));
        }
        if self.genre.trim().is_empty() {
            return Err("Genre is required".to_string());
        }
        if self.format.trim().is_empty() {
            return Err("Format is required".to_string());
        }
        Ok(())
    }

    pub fn into_new_listing(self, slug: String) -> NewListing {
        NewListing {
            title: self.title.trim().to_string(),
            tagline: self.tagline,
            description: self.description,
            slug,
            genre: self.genre,
            format: self.format,
            logline: self.logline,
            themes: self.themes,
            target_audience: self.target_audience,
            comparables: self.comparables,
            rights_holder: self.rights_holder,
            available_rights: self.available_rights,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub format: Option<String>,
    pub logline: Option<String>,
    pub themes: Option<Vec<String>>,
    pub target_audience: Option<String>,
    pub comparables: Option<Vec<String>>,
    pub rights_holder: Option<String>,
    pub available_rights: Option<Vec<String>>,
    pub script_url: Option<String>,
    pub poster_url: Option<String>,
}

impl UpdateListingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            let title = title.trim();
            if title.len() < MIN_TITLE_LEN || title.len() > MAX_TITLE_LEN {
                return Err(format!(
                    "Title must be between {} and {} characters",
                    MIN_TITLE_LEN, MAX_TITLE_LEN
                ));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().len() < MIN_DESCRIPTION_LEN {
                return Err(format!(
                    "Description must be at least {} characters",
                    MIN_DESCRIPTION_LEN
                ));
            }
        }
        Ok(())
    }

    pub fn into_patch(self) -> ListingPatch {
        ListingPatch {
            title: self.title.map(|t| t.trim().to_string()),
            tagline: self.tagline,
            description: self.description,
            genre: self.genre,
            format: self.format,
            logline: self.logline,
            themes: self.themes,
            target_audience: self.target_audience,
            comparables: self.comparables,
            rights_holder: self.rights_holder,
            available_rights: self.available_rights,
            script_url: self.script_url,
            poster_url: self.poster_url,
        }
    }
}

/// Browse filters for the public catalog.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListingQuery {
    pub genre: Option<String>,
    pub status: Option<ListingStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
