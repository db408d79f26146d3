// src/matching/mod.rs
pub mod canonicalize;
pub mod keywords;
pub mod normalize;
pub mod similarity;
