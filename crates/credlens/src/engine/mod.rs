//! Pure reward arithmetic: yield per card, break-even progress and the ROI verdict.
//!
//! Nothing in this module performs I/O or reads shared state; every function is a
//! deterministic mapping from its arguments.

mod break_even;
mod rewards;
mod verdict;

pub use break_even::{compute_break_even, BreakEvenStats, UNREACHABLE_SPEND};
pub use rewards::{compute_yield, CategoryReward, YieldResult};
pub use verdict::{classify, Verdict};
