//! Flat register-relation-graph construction.
//!
//! Reduces a design to its stopping nodes: every flip-flop, latch, and
//! true top-level port becomes one node, and two nodes are connected
//! directly when at least one path connects them in the source design.
//! Module hierarchy is flattened away; registers buried in child modules
//! appear alongside the top module's own.

use std::collections::{HashMap, HashSet, VecDeque};

use sdfg_ir::{Context, EdgeKind, Graph, GraphId, Node, NodeId, NodeRef};
use sdfg_utils::{Error, SdfgResult};

use crate::DiagnosticContext;
use crate::analysis::PathFinder;

/// A reduced graph plus the mapping from source stopping nodes to their
/// copies.
pub struct Rrg {
    pub ctx: Context,
    pub top: GraphId,
    pub map: HashMap<NodeRef, NodeId>,
}

impl Rrg {
    pub fn graph(&self) -> &Graph {
        self.ctx.graph(self.top)
    }
}

/// Builds the flat RRG of the design rooted at `top`, reusing `finder`'s
/// memo tables.
pub fn build_rrg(
    finder: &mut PathFinder,
    top: GraphId,
    diag: &mut DiagnosticContext,
) -> SdfgResult<Rrg> {
    let src = finder.context();
    let mut ctx = Context::new();
    let out = ctx.add_graph(&format!("{}_rrg", src.graph(top).name));
    ctx.set_entrypoint(out);
    let mut map: HashMap<NodeRef, NodeId> = HashMap::new();

    // seed with every stopping node of the whole hierarchy
    let mut worklist: VecDeque<NodeRef> = VecDeque::new();
    for g in src.descendants(top) {
        let unfathered = src.graph(g).father.is_none();
        for (id, node) in src.graph(g).nodes() {
            // ports of fathered graphs proxy flow and own no RRG copy
            let stopping = if unfathered {
                node.kind.is_stopping()
            } else {
                node.kind.is_register()
            };
            if stopping {
                let n = NodeRef::new(g, id);
                map.insert(n, add_flat_node(ctx.graph_mut(out), node));
                worklist.push_back(n);
            }
        }
    }

    let mut done: HashSet<NodeRef> = HashSet::new();
    while let Some(n) = worklist.pop_front() {
        if !done.insert(n) {
            continue;
        }
        for (target, kind) in finder.out_paths(n, diag)? {
            let dst = match map.get(&target) {
                Some(dst) => *dst,
                None => {
                    let node = src
                        .resolve(target)
                        .ok_or_else(|| Error::undefined("path target"))?;
                    let dst = add_flat_node(ctx.graph_mut(out), node);
                    map.insert(target, dst);
                    worklist.push_back(target);
                    dst
                }
            };
            add_reduced_edge(ctx.graph_mut(out), map[&n], dst, kind)?;
        }
    }
    Ok(Rrg { ctx, top: out, map })
}

/// Copies a source node into the flat graph under its full hierarchical
/// name, which also stays its hierarchical name; `Graph::add_node` would
/// otherwise prefix it again with the RRG graph's own name.
fn add_flat_node(g: &mut Graph, node: &Node) -> NodeId {
    let id = g.add_node(node.kind, &node.hier_name);
    if let Some(copy) = g.node_mut(id) {
        copy.hier_name = node.hier_name.clone();
    }
    id
}

/// Adds one reduced edge. A pair's aggregated kind that is exactly clock
/// (or exactly reset) keeps its own single-kind edge; everything else
/// OR-merges into one edge per pair.
pub(crate) fn add_reduced_edge(
    g: &mut Graph,
    src: NodeId,
    dst: NodeId,
    kind: EdgeKind,
) -> SdfgResult<()> {
    if kind == EdgeKind::CLOCK || kind == EdgeKind::RESET {
        let present = g
            .edges_between(src, dst)
            .into_iter()
            .any(|e| g.edge(e).map(|e| e.kind) == Some(kind));
        if !present {
            g.add_edge(kind, src, dst)?;
        }
        return Ok(());
    }
    let merged = g.edges_between(src, dst).into_iter().find(|e| {
        g.edge(*e)
            .map(|e| e.kind != EdgeKind::CLOCK && e.kind != EdgeKind::RESET)
            .unwrap_or(false)
    });
    match merged {
        Some(e) => {
            if let Some(edge) = g.edge_mut(e) {
                edge.kind |= kind;
            }
        }
        None => {
            g.add_edge(kind, src, dst)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfg_ir::NodeKind;

    #[test]
    fn chain_reduces_to_direct_edge() {
        // ff_a -> comb -> ff_b becomes ff_a -> ff_b [data]
        let mut ctx = Context::new();
        let g = ctx.add_graph("top");
        let a = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "a");
        let c = ctx.graph_mut(g).add_node(NodeKind::Comb, "c");
        let b = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "b");
        ctx.graph_mut(g).add_edge(EdgeKind::DATA, a, c).unwrap();
        ctx.graph_mut(g).add_edge(EdgeKind::DATA, c, b).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let rrg = build_rrg(&mut finder, g, &mut diag).unwrap();
        assert_eq!(rrg.graph().num_nodes(), 2);
        assert_eq!(rrg.graph().num_edges(), 1);
        let ra = rrg.map[&NodeRef::new(g, a)];
        let rb = rrg.map[&NodeRef::new(g, b)];
        assert!(rrg.graph().exists_kind(ra, rb, EdgeKind::DATA));
    }

    #[test]
    fn every_rrg_edge_has_a_source_path() {
        // diamond with a mixed-kind side branch
        let mut ctx = Context::new();
        let g = ctx.add_graph("top");
        let a = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "a");
        let b = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "b");
        let d = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "d");
        let c1 = ctx.graph_mut(g).add_node(NodeKind::Comb, "c1");
        let c2 = ctx.graph_mut(g).add_node(NodeKind::Comb, "c2");
        let gm = ctx.graph_mut(g);
        gm.add_edge(EdgeKind::DATA, a, c1).unwrap();
        gm.add_edge(EdgeKind::DATA, c1, b).unwrap();
        gm.add_edge(EdgeKind::CONTROL, c1, c2).unwrap();
        gm.add_edge(EdgeKind::DATA, c2, d).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let rrg = build_rrg(&mut finder, g, &mut diag).unwrap();
        // soundness: every reduced edge corresponds to a real path whose
        // aggregated kind includes the edge kind
        for (_, edge) in rrg.graph().edges() {
            let src = *rrg
                .map
                .iter()
                .find(|(_, v)| **v == edge.src.node)
                .unwrap()
                .0;
            let dst = *rrg
                .map
                .iter()
                .find(|(_, v)| **v == edge.dst.node)
                .unwrap()
                .0;
            let reach = finder.out_paths(src, &mut diag).unwrap();
            let hit = reach.iter().find(|(t, _)| *t == dst).unwrap();
            assert!(hit.1.contains(edge.kind));
        }
    }

    #[test]
    fn pure_clock_keeps_its_own_edge() {
        let mut ctx = Context::new();
        let g = ctx.add_graph("top");
        let a = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "a");
        let b = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "b");
        ctx.graph_mut(g).add_edge(EdgeKind::CLOCK, a, b).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let rrg = build_rrg(&mut finder, g, &mut diag).unwrap();
        let ra = rrg.map[&NodeRef::new(g, a)];
        let rb = rrg.map[&NodeRef::new(g, b)];
        let edges = rrg.graph().edges_between(ra, rb);
        assert_eq!(edges.len(), 1);
        assert_eq!(rrg.graph().edge(edges[0]).unwrap().kind, EdgeKind::CLOCK);
    }

    #[test]
    fn child_registers_are_flattened_in() {
        let mut ctx = Context::new();
        let top = ctx.add_graph("top");
        let sub = ctx.add_graph("sub");
        let ff = ctx.graph_mut(top).add_node(NodeKind::FlipFlop, "ff");
        let meta = ctx.graph_mut(top).add_node(NodeKind::Module, "u0");
        ctx.connect_child(NodeRef::new(top, meta), sub).unwrap();
        let d = ctx.graph_mut(sub).add_node(NodeKind::InputPort, "d");
        let r = ctx.graph_mut(sub).add_node(NodeKind::FlipFlop, "r");
        ctx.graph_mut(sub).add_edge(EdgeKind::DATA, d, r).unwrap();
        ctx.add_edge(
            top,
            EdgeKind::DATA,
            NodeRef::new(top, ff),
            NodeRef::new(sub, d),
            "ff",
        )
        .unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let rrg = build_rrg(&mut finder, top, &mut diag).unwrap();
        let rff = rrg.map[&NodeRef::new(top, ff)];
        let rr = rrg.map[&NodeRef::new(sub, r)];
        assert!(rrg.graph().exists_kind(rff, rr, EdgeKind::DATA));
        // flat copies keep the source hierarchical name unprefixed
        assert_eq!(rrg.graph().node(rr).unwrap().hier_name, "sub.r");
        assert_eq!(rrg.graph().node(rff).unwrap().hier_name, "top.ff");
        // the child port is not a stopping node and owns no RRG copy
        assert!(!rrg.map.contains_key(&NodeRef::new(sub, d)));
    }
}
