// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod cache;
pub mod locationiq_client;
pub mod password;
pub mod place_service;
pub mod token_service;
pub mod user_service;

pub use cache::*;
pub use locationiq_client::*;
pub use place_service::*;
pub use token_service::*;
pub use user_service::*;
