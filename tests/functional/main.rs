// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Functional tests for the poller, the scenario orchestrator and the kubedr
//! suites.
//!
//! These tests run WITHOUT a Kubernetes cluster. An in-memory gateway stands
//! in for the API server and a set of scripted reactions stands in for the
//! kubedr operator. Tokio's clock is paused, so multi-minute wait budgets
//! elapse instantly and elapsed times are exact.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_teardown_runs_in_reverse_creation_order
//! ```
//!
//! ## Test Categories
//!
//! - **Poller tests**: bounded waits, early exit, transient errors, job pod
//!   selection
//! - **Teardown tests**: reverse order, failure isolation, idempotent
//!   absence, skips, panics
//! - **Scenario tests**: the kubedr scenarios end to end against the fake
//!   operator

#[path = "../common/mod.rs"]
mod common;

mod poller_tests;
