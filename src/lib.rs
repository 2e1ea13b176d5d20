pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod domain_utils;
pub mod education;
pub mod enrichment;
pub mod extractor;
pub mod fusion;
pub mod heuristics;
pub mod marketing;
pub mod submission;
pub mod url_resolver;
pub mod verdict;

pub use analyzer::AnalysisEngine;
pub use config::Config;
pub use submission::{Platform, RawSubmission};
pub use verdict::Verdict;
