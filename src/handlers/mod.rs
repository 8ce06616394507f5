// src/handlers/mod.rs
pub mod error;
pub mod update;

pub use error::UpdateError;
