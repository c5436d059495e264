//! FSM register detection.
//!
//! A register with a feedback path onto itself carrying control or data
//! is a potential FSM. Two independent filters then cut the candidate
//! list down using the flat RRG; both are always evaluated so that both
//! diagnostic categories are reported even when one alone would already
//! exclude the node:
//!
//! - no-control-output: a controller must steer something, so a node
//!   without a Control-typed RRG edge to a different node is dropped;
//! - data-input: a register receiving real data from a different node is
//!   a datapath or pipeline register, not a pure controller.

use sdfg_ir::{Context, EdgeKind, GraphId, NodeRef};
use sdfg_utils::SdfgResult;

use crate::DiagnosticContext;
use crate::analysis::PathFinder;
use crate::passes::build_rrg;

/// Knobs for a detection run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsmOptions {
    /// Restrict the scan to the top graph and keep the feedback search
    /// within it, trading completeness for speed.
    pub fast: bool,
    /// Drop any reachability state memoized on the finder before
    /// scanning.
    pub force: bool,
}

/// Detection statistics and the confirmed register list.
#[derive(Debug, Clone, Default)]
pub struct FsmReport {
    /// Nodes visited across the hierarchy.
    pub scanned: usize,
    /// Flip-flops and latches seen.
    pub registers: usize,
    /// Registers with a control/data feedback path.
    pub potential: usize,
    /// Registers surviving both filters.
    pub confirmed: Vec<NodeRef>,
}

/// Scans every register of the design rooted at `top`, recursing through
/// module children.
pub fn detect_fsms(
    ctx: &Context,
    top: GraphId,
    diag: &mut DiagnosticContext,
) -> SdfgResult<FsmReport> {
    let mut finder = PathFinder::new(ctx);
    detect_fsms_with(&mut finder, top, FsmOptions::default(), diag)
}

/// Detection on a caller-provided finder, so reachability memos survive
/// across runs unless `force` drops them.
pub fn detect_fsms_with(
    finder: &mut PathFinder,
    top: GraphId,
    opts: FsmOptions,
    diag: &mut DiagnosticContext,
) -> SdfgResult<FsmReport> {
    if opts.force {
        finder.clear();
    }
    let ctx = finder.context();
    let rrg = build_rrg(finder, top, diag)?;

    let mut report = FsmReport::default();
    let mut candidates = Vec::new();
    let graphs = if opts.fast {
        vec![top]
    } else {
        ctx.descendants(top)
    };
    for g in graphs {
        for (id, node) in ctx.graph(g).nodes() {
            report.scanned += 1;
            if !node.kind.is_register() {
                continue;
            }
            report.registers += 1;
            let n = NodeRef::new(g, id);
            let feedback = if opts.fast {
                finder.fast_self_path(n, diag)?
            } else {
                finder.self_path(n, diag)?
            };
            if feedback.is_some_and(|k| {
                k.intersects(EdgeKind::CONTROL | EdgeKind::DATA)
            }) {
                report.potential += 1;
                candidates.push(n);
            }
        }
    }

    let mut dropped_no_ctl = 0usize;
    let mut dropped_data_in = 0usize;
    for n in candidates {
        let Some(&r) = rrg.map.get(&n) else {
            log::warn!("potential FSM register missing from the RRG");
            continue;
        };
        let graph = rrg.graph();
        // both filters are evaluated unconditionally
        let has_ctl_out = graph
            .out_edges(r)
            .into_iter()
            .filter_map(|e| graph.edge(e))
            .any(|edge| {
                edge.kind.contains(EdgeKind::CONTROL) && edge.dst.node != r
            });
        let has_data_in = graph
            .in_edges(r)
            .into_iter()
            .filter_map(|e| graph.edge(e))
            .any(|edge| {
                edge.kind.contains(EdgeKind::DATA) && edge.src.node != r
            });
        if !has_ctl_out {
            dropped_no_ctl += 1;
        }
        if has_data_in {
            dropped_data_in += 1;
        }
        if has_ctl_out && !has_data_in {
            report.confirmed.push(n);
        }
    }
    log::debug!(
        "fsm detection: {} scanned, {} registers, {} potential, \
         {} confirmed ({} without control output, {} with data input)",
        report.scanned,
        report.registers,
        report.potential,
        report.confirmed.len(),
        dropped_no_ctl,
        dropped_data_in
    );
    Ok(report)
}
