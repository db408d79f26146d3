// src/categorize/mod.rs
pub mod oracle;
pub mod prompts;

pub use oracle::{
    categorize_with_verification, detect_edge_case, CategorizationResult, ClassificationOracle,
    OpenAiOracle,
};
