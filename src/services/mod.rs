// src/services/mod.rs
pub mod calculations;
pub mod extractor;
pub mod fetch;
pub mod merger;
pub mod store;
