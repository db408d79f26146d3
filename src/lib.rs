// src/lib.rs - Trial site matching and categorization library
pub mod categorize;
pub mod matching;
pub mod models;
pub mod registry;
pub mod store;
pub mod utils;
