pub mod client;
pub mod prompts;

pub use client::{EngineClient, EngineError};
