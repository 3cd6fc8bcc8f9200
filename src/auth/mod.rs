pub mod dtos;
pub mod handlers;
pub mod jwt;
pub mod middleware;
