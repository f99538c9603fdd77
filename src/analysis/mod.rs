//! Cash-flow analysis modules.
//!
//! Deterministic metrics plus the plain-text digest the agent pipeline
//! embeds in its prompts.

pub mod digest;
pub mod metrics;

pub use digest::render_digest;
pub use metrics::{compute_metrics, CashFlowMetrics};
