//! examgrader-core — Submission model, normalization, grading, and statistics.
//!
//! This crate defines the submission lifecycle (`SubmissionDraft` ->
//! `Submission` -> `StoredSubmission`), the traits for grading services and
//! submission stores, and the pure logic the rest of examgrader builds on.

pub mod collector;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod statistics;
pub mod traits;
