pub mod dtos;
pub mod handlers;

pub use dtos::CreateInquiryRequest;
