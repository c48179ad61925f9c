//! Natural-language trace query and analysis server

pub mod api;
mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
