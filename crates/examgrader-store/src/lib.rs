//! examgrader-store — Submission store backends.
//!
//! Implements the `SubmissionStore` trait for a Supabase table over its REST
//! API and for an in-process vector used by tests and dry runs.

pub mod memory;
pub mod row;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;
