use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::dtos::is_valid_email;
use crate::repositories::inquiry::NewInquiry;

const MIN_MESSAGE_LEN: usize = 10;
const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInquiryRequest {
    pub listing_id: Uuid,
    #[serde(default)]
    pub buyer_name: Option<String>,
    pub contact_email: String,
    #[serde(default)]
    pub company_name: Option<String>,
    pub message: String,
}

impl CreateInquiryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_email(&self.contact_email) {
            return Err("Invalid contact email".to_string());
        }
        let message = self.message.trim();
        if message.len() < MIN_MESSAGE_LEN {
            return Err("Message is too short".to_string());
        }
        if message.len() > MAX_MESSAGE_LEN {
            return Err("Message is too long".to_string());
        }
        Ok(())
    }

    pub fn into_new_inquiry(self, buyer_id: Uuid) -> NewInquiry {
        NewInquiry {
            listing_id: self.listing_id,
            buyer_id: Some(buyer_id),
            buyer_name: self.buyer_name,
            buyer_contact_email: self.contact_email,
            company_name: self.company_name,
            message: self.message.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, message: &str) -> CreateInquiryRequest {
        CreateInquiryRequest {
            listing_id: Uuid::new_v4(),
            buyer_name: None,
            contact_email: email.to_string(),
            company_name: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn valid_inquiry_passes() {
        assert!(
            request("buyer@example.com", "Interested in optioning this script.")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn bad_email_fails() {
        assert!(request("nope", "Interested in optioning this script.")
            .validate()
            .is_err());
    }

    #[test]
    fn short_message_fails() {
        assert!(request("buyer@example.com", "hi").validate().is_err());
    }
}
