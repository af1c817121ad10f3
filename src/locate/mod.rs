pub mod actions;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod retry;
pub mod role;
pub mod similarity;
pub mod strategy;

use std::time::Duration;

use crate::dom::ElementHandle;

pub use actions::{find_by_text, smart_click, smart_fill, smart_select, smart_wait};
pub use error::LocateError;
pub use orchestrator::resolve;
pub use retry::resolve_with_retry;

/// Minimum confidence a result must exceed (strictly) to be accepted.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.5;

/// Confidence at which the orchestrator stops trying further strategies.
pub const EARLY_EXIT_CONFIDENCE: f64 = 0.95;

/// A resolved element plus the evidence for trusting it.
#[derive(Debug, Clone)]
pub struct LocatorResult {
    pub element: ElementHandle,
    /// Relative trust in [0, 1], comparable across strategies.
    pub confidence: f64,
    /// Which heuristic produced this result.
    pub strategy: &'static str,
    pub matched_text: Option<String>,
    /// Diagnostic only; the selector the strategy queried, when meaningful.
    pub selector: Option<String>,
}

/// Per-call knobs for a resolution. Constructed fresh for every call.
#[derive(Debug, Clone)]
pub struct ResolutionOptions {
    /// Overall budget, split evenly across retry attempts.
    pub timeout: Duration,
    pub max_retries: u32,
    /// Try placeholder/label strategies before generic text strategies.
    pub prefer_inputs: bool,
    /// Floor below which the fuzzy full-document sweep reports nothing.
    pub fuzzy_floor: f64,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            prefer_inputs: false,
            fuzzy_floor: 0.3,
        }
    }
}

impl ResolutionOptions {
    pub fn prefer_inputs(mut self) -> Self {
        self.prefer_inputs = true;
        self
    }
}
