//! Natural-language trace search and analysis
//!
//! - `extractor` / `heuristic` / `llm_extractor` - Free text to `SearchParams`
//! - `session` - Expiring, bounded conversation store
//! - `analyzer` - Span and trace explanations with follow-up questions
//! - `prune` - Compact text rendering of traces for prompts
//! - `bridge` - Executes extracted parameters against the trace backend
//! - `components` - Builds all of the above from configuration

mod analyzer;
mod bridge;
mod components;
mod error;
mod extractor;
mod heuristic;
mod llm_extractor;
mod params;
pub mod prompts;
pub mod prune;
mod session;

pub use analyzer::{Analysis, Analyzer, AnalyzerConfig};
pub use bridge::{SearchBridge, TraceSearchResult, build_trace_search_result};
pub use components::NlQueryComponents;
pub use error::{ErrorKind, NlQueryError};
pub use extractor::{Extractor, ExtractorKind, StubExtractor, build_extractor};
pub use heuristic::HeuristicExtractor;
pub use llm_extractor::LlmExtractor;
pub use params::SearchParams;
pub use prune::{PrunedEvent, PrunedSpan, PrunedTrace, format_span, format_trace, prune_span, prune_trace};
pub use session::{Message, Role, Session, SessionConfig, SessionStore};
