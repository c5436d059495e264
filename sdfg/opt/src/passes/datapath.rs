//! Datapath extraction: prunes a design down to the nodes and edges that
//! carry data, recursing over the instance hierarchy.
//!
//! A node is data-relevant when any adjacent edge carries the Data kind.
//! Modules and ports are structurally relevant and always kept, and a
//! single one-hop bridge pass keeps nodes adjacent to an already-kept
//! node so intermediate non-data logic cannot disconnect the result.
//! Clock/reset-only edges never survive the copy.

use std::collections::{HashMap, HashSet};

use sdfg_ir::{Context, EdgeKind, GraphId, NodeKind, NodeRef};
use sdfg_utils::SdfgResult;

use crate::DiagnosticContext;
use crate::passes::{build_hier_rrg, detect_fsms};

#[derive(Debug, Clone, Copy)]
pub struct DatapathOptions {
    /// Keep confirmed FSM registers. Off by default: a pure controller is
    /// not datapath.
    pub with_fsm: bool,
    /// Also treat control-adjacent nodes as relevant.
    pub with_ctl: bool,
    /// Reduce the pruned hierarchy through the hierarchical RRG builder.
    pub to_rrg: bool,
}

impl Default for DatapathOptions {
    fn default() -> Self {
        Self {
            with_fsm: false,
            with_ctl: false,
            to_rrg: false,
        }
    }
}

pub struct Datapath {
    pub ctx: Context,
    pub top: GraphId,
}

/// Extracts the datapath of the design rooted at `top` into a fresh
/// context.
pub fn extract_datapath(
    src: &Context,
    top: GraphId,
    opts: DatapathOptions,
    diag: &mut DiagnosticContext,
) -> SdfgResult<Datapath> {
    let excluded: HashSet<NodeRef> = if opts.with_fsm {
        HashSet::new()
    } else {
        detect_fsms(src, top, diag)?.confirmed.into_iter().collect()
    };

    let relevant = if opts.with_ctl {
        EdgeKind::DATA | EdgeKind::CONTROL
    } else {
        EdgeKind::DATA
    };

    let mut ctx = Context::new();
    let mut graph_map: HashMap<GraphId, GraphId> = HashMap::new();
    let mut node_map: HashMap<NodeRef, NodeRef> = HashMap::new();

    // phase 1: classify and copy kept nodes
    for g in src.descendants(top) {
        let out = ctx.add_graph(&src.graph(g).name);
        graph_map.insert(g, out);

        let mut kept: HashSet<NodeRef> = HashSet::new();
        for (id, node) in src.graph(g).nodes() {
            let n = NodeRef::new(g, id);
            let structural =
                node.kind == NodeKind::Module || node.kind.is_port();
            if structural || adjacent_kind(src, n).intersects(relevant) {
                kept.insert(n);
            }
        }
        // one-hop bridge: adjacency to the initially kept set, one pass
        let seed = kept.clone();
        for (id, _) in src.graph(g).nodes() {
            let n = NodeRef::new(g, id);
            if kept.contains(&n) {
                continue;
            }
            let bridges = src
                .succs(n)
                .into_iter()
                .chain(src.preds(n))
                .any(|(far, _)| seed.contains(&far));
            if bridges {
                kept.insert(n);
            }
        }
        for n in &excluded {
            kept.remove(n);
        }

        for (id, node) in src.graph(g).nodes() {
            let n = NodeRef::new(g, id);
            if !kept.contains(&n) {
                continue;
            }
            let copy = ctx.graph_mut(out).add_node(node.kind, &node.name);
            if !node.portmap.is_empty()
                && let Some(c) = ctx.graph_mut(out).node_mut(copy)
            {
                c.portmap = node.portmap.clone();
            }
            node_map.insert(n, NodeRef::new(out, copy));
        }
    }

    // phase 2: copy surviving edges and re-link the hierarchy
    for (&g, &out) in &graph_map {
        for (_, edge) in src.graph(g).edges() {
            if edge.kind & !(EdgeKind::CLOCK | EdgeKind::RESET)
                == EdgeKind::empty()
            {
                continue;
            }
            let (Some(&s), Some(&d)) =
                (node_map.get(&edge.src), node_map.get(&edge.dst))
            else {
                continue;
            };
            ctx.add_edge(out, edge.kind, s, d, &edge.name)?;
        }
        let modules: Vec<(NodeRef, GraphId)> = src
            .graph(g)
            .nodes()
            .filter_map(|(id, node)| {
                node.child.map(|c| (NodeRef::new(g, id), c))
            })
            .collect();
        for (meta, child) in modules {
            if let (Some(&copy), Some(&out_child)) =
                (node_map.get(&meta), graph_map.get(&child))
            {
                ctx.connect_child(copy, out_child)?;
            }
        }
    }

    let out_top = graph_map[&top];
    ctx.set_entrypoint(out_top);

    if opts.to_rrg {
        let reduced = build_hier_rrg(&ctx, out_top, diag)?;
        return Ok(Datapath {
            ctx: reduced.ctx,
            top: reduced.top,
        });
    }
    Ok(Datapath { ctx, top: out_top })
}

/// Union of the kinds of all edges adjacent to `n`.
fn adjacent_kind(ctx: &Context, n: NodeRef) -> EdgeKind {
    ctx.succs(n)
        .into_iter()
        .chain(ctx.preds(n))
        .fold(EdgeKind::empty(), |acc, (_, k)| acc | k)
}
