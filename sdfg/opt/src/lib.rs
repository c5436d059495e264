//! Analyses over extracted SDFGs: reachability, register-relation-graph
//! reduction, datapath extraction, and FSM detection.

/// Reusable analyses.
pub mod analysis;
/// Graph-to-graph passes.
pub mod passes;

mod diagnostics;

pub use diagnostics::DiagnosticContext;
