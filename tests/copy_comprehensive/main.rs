//! Copy Comprehensive Test Suite
//!
//! End-to-end tests of a full copy run through the public facade.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Invariants**: partition completeness, pagination
//!   termination, batch size bound, final flush, aggregate correctness
//! - **Tier 2: Scenarios**: exact copy, empty table, schema mismatch,
//!   scanner count fallback, target creation
//! - **Tier 3: Failures**: read and write faults, stalled targets, retries
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test copy_comprehensive
//! ```

mod test_utils;

// Tier 1: Invariants
mod batch_invariants;
mod partition_invariants;

// Tier 2: Scenarios
mod provisioning_scenarios;
mod scenario_tests;

// Tier 3: Failures
mod failure_propagation;
