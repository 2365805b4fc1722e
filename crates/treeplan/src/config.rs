//! Planner configuration, mirrored on the consumer side.

use serde::{Deserialize, Serialize};

/// Knobs that change the shape of the produced schedules. The consumer must
/// run with the same values; `bits_compress` in particular shifts the
/// row-summary global-offset arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanConfig {
    /// Widest column range packed into a single bit-vector node. 0 disables
    /// packing and bisection runs down to single-column leaves.
    pub bits_compress: u32,
    /// Widens row `i`'s autoregressive column range from `[0, i)` to
    /// `[0, i + 1)` so the diagonal is generated too.
    pub self_loops: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            bits_compress: 0,
            self_loops: false,
        }
    }
}

impl PlanConfig {
    /// True when a range of `width` columns stops bisection and packs into a
    /// bit-vector node.
    pub(crate) fn packs(&self, width: u32) -> bool {
        self.bits_compress > 0 && width <= self.bits_compress
    }
}
