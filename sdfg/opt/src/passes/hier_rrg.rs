//! Hierarchical register-relation-graph construction.
//!
//! Same reduction as the flat builder, but each module is reduced within
//! its own graph: Module meta-nodes survive as nodes whose `child` is the
//! recursively reduced child RRG, so the output mirrors the design
//! hierarchy.

use std::collections::HashMap;

use sdfg_ir::{Context, GraphId, NodeId, NodeKind, NodeRef};
use sdfg_utils::SdfgResult;

use crate::DiagnosticContext;
use crate::analysis::PathFinder;
use crate::passes::rrg::add_reduced_edge;

pub struct HierRrg {
    pub ctx: Context,
    pub top: GraphId,
}

/// Reduces every module of the design rooted at `top`, preserving the
/// hierarchy.
pub fn build_hier_rrg(
    src: &Context,
    top: GraphId,
    diag: &mut DiagnosticContext,
) -> SdfgResult<HierRrg> {
    let mut finder = PathFinder::new(src);
    let mut ctx = Context::new();
    let mut seen = HashMap::new();
    let out = reduce(src, &mut finder, top, &mut ctx, &mut seen, diag)?;
    ctx.set_entrypoint(out);
    Ok(HierRrg { ctx, top: out })
}

fn reduce(
    src: &Context,
    finder: &mut PathFinder,
    g: GraphId,
    ctx: &mut Context,
    seen: &mut HashMap<GraphId, GraphId>,
    diag: &mut DiagnosticContext,
) -> SdfgResult<GraphId> {
    if let Some(done) = seen.get(&g) {
        return Ok(*done);
    }
    let out = ctx.add_graph(&src.graph(g).name);
    seen.insert(g, out);

    // within one module, ports and Module meta-nodes terminate paths and
    // are retained alongside the registers
    let mut map: HashMap<NodeId, NodeId> = HashMap::new();
    let mut seeds = Vec::new();
    for (id, node) in src.graph(g).nodes() {
        let keep = node.kind.is_register()
            || node.kind.is_port()
            || node.kind == NodeKind::Module;
        if keep {
            let copy = ctx.graph_mut(out).add_node(node.kind, &node.name);
            if node.kind == NodeKind::Module
                && let Some(c) = ctx.graph_mut(out).node_mut(copy)
            {
                c.portmap = node.portmap.clone();
            }
            map.insert(id, copy);
            seeds.push(id);
        }
    }

    for seed in seeds {
        for (target, kind) in
            finder.fast_out_paths(NodeRef::new(g, seed), diag)?
        {
            // fast targets stay within this graph and are all retained
            let dst = map[&target.node];
            add_reduced_edge(ctx.graph_mut(out), map[&seed], dst, kind)?;
        }
    }

    // recurse into the children of retained meta-nodes
    let modules: Vec<(NodeId, GraphId)> = src
        .graph(g)
        .nodes()
        .filter_map(|(id, node)| node.child.map(|c| (id, c)))
        .collect();
    for (id, child) in modules {
        let reduced = reduce(src, finder, child, ctx, seen, diag)?;
        ctx.connect_child(NodeRef::new(out, map[&id]), reduced)?;
    }
    Ok(out)
}
