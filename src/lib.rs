pub mod analyzers;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod parser;
pub mod roster;
pub mod stats;
