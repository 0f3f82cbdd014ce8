//! `rewriter` applies ordered pattern-to-replacement substitutions to files,
//! directory trees and literal strings.
//!
//! It provides the core logic for the `rewriter` command-line tool but can also
//! be used as a standalone library. The main components are:
//!
//! - `rules`: Building the ordered, optionally reversed `RuleSet` from change
//!   pairs and dictionaries.
//! - `transformer`: Applying every rule to a line, each rule seeing the output
//!   of the previous one.
//! - `replacer`: File mode, writing a `-Changed` copy, replacing the original
//!   or printing.
//! - `resolver`: Directory traversal, string mode and whole-run orchestration.
//! - `dictionary`: Loading JSON dictionaries and writing the example one.
//! - `config`: Loading defaults from a YAML file.

pub mod cli;
pub mod config;
pub mod dictionary;
pub mod errors;
pub mod logger;
pub mod replacer;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod transformer;

// Re-export main types for easier access by library users.
pub use errors::{Error, Result};
pub use replacer::{FileOutcome, OutputPolicy, Replacer};
pub use report::{ReportFormat, RunSummary};
pub use resolver::{Resolver, SuffixFilter, Target};
pub use rules::{Rule, RuleSet, RuleSetBuilder};
pub use transformer::LineTransformer;
