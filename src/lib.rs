//! Pipeline planning and execution runtime for repository lint engines.
//!
//! This crate specifies the *core*: given a set of checks (sinks), transforms,
//! and sources, [`plan::plug`] assembles the minimum-cost consumer tree that
//! feeds every reachable check, and [`pipeline::Pipeline`]/[`pipeline::GitPipeline`]
//! drive that tree over a sorted, interleaved item stream. [`scanner::Scanner`]
//! wraps that into a concurrent, per-unit fan-out, and [`reporter::Reporter`]
//! turns the resulting [`report::Report`] stream into output.
//!
//! What is deliberately *not* here: the concrete catalog of lint checks a real
//! deployment registers, the repository-traversal backends that implement
//! [`source::Source`] against an ebuild tree or a git log, and any
//! command-line surface. Those are external collaborators this crate's types
//! are built to be driven by.

pub mod check;
pub mod error;
pub mod filter;
pub mod interleave;
pub mod item;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod scanner;
pub mod scope;
pub mod source;
pub mod transform;

#[cfg(feature = "test")]
pub mod test;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
