pub mod admin;
pub mod ai;
pub mod analysis;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod entities;
pub mod favorites;
pub mod health;
pub mod inquiries;
pub mod jobs;
pub mod listings;
pub mod middleware;
pub mod passwords;
pub mod repositories;
pub mod users;
