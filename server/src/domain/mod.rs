//! Domain logic for natural-language trace search and analysis
//!
//! - `nlquery` - Extraction, conversation sessions, analysis and trace rendering

pub mod nlquery;

pub use nlquery::{
    Analyzer, ErrorKind, Extractor, NlQueryComponents, NlQueryError, SearchBridge, SearchParams,
};
