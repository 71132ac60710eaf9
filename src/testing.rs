//! Testing utilities for crosstally aggregators.
//!
//! This module gives end-users the pieces needed to test their own metric
//! sets without re-deriving the engine's guarantees by hand:
//!
//! - **Assertions**: compare query results and check the count invariants
//! - **Fixtures**: small deterministic message and event streams, plus the
//!   metric sets that classify them
//!
//! # Quick Start
//!
//! ```
//! use crosstally::Aggregator;
//! use crosstally::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut agg = Aggregator::with_all_combinations(message_metrics())?;
//! for msg in sample_messages() {
//!     agg.observe(&msg)?;
//! }
//!
//! assert_single_metric_totals(&agg);
//! assert_marginal_consistency(&agg, &["direction", "session"], "session");
//! # Ok(())
//! # }
//! ```
//!
//! # Assertion Functions
//!
//! - [`assert_rows_equal`]: exact, order-dependent row comparison
//! - [`assert_single_metric_totals`]: every single-metric table sums to the
//!   observed-record count
//! - [`assert_marginal_consistency`]: collapsing one metric out of a table
//!   reproduces the coarser table
//! - [`assert_all_marginals`]: the above for every tracked pair

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
