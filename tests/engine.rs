//! Integration test driver.
//!
//! Compiling the suites as one crate keeps shared fixtures in
//! `common` and speeds up test builds.

mod common;

mod engine {
    pub mod indexing;
    pub mod retrieval;
}
