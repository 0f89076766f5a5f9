// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod repository;
pub mod user_repository;

#[cfg(test)]
pub mod memory;

pub use repository::*;
pub use user_repository::*;
