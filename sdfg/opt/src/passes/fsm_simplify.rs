//! In-place FSM graph simplification.
//!
//! Contracts two-node cycles to a fixpoint: when `n` and `m` point at
//! each other, `m` absorbs `n`'s remaining connectivity and `n` is
//! deleted. Running the pass on an already-simplified graph performs
//! zero rewrites.

use std::collections::VecDeque;

use sdfg_ir::{EdgeKind, Graph, NodeId};
use sdfg_utils::SdfgResult;

/// Rewrites `g` until no two-node cycle remains. Returns the number of
/// contractions performed.
pub fn simplify_fsm(g: &mut Graph) -> SdfgResult<usize> {
    let mut worklist: VecDeque<NodeId> = g.node_ids().collect();
    let mut rewrites = 0usize;
    while let Some(n) = worklist.pop_front() {
        if g.node(n).is_none() {
            continue;
        }
        let partner = g
            .out_nodes(n)
            .into_iter()
            .find(|m| *m != n && g.exists(*m, n));
        let Some(m) = partner else {
            continue;
        };
        contract(g, n, m)?;
        worklist.push_back(m);
        rewrites += 1;
    }
    Ok(rewrites)
}

/// Redirects `n`'s connectivity onto `m`, then deletes `n`.
fn contract(g: &mut Graph, n: NodeId, m: NodeId) -> SdfgResult<()> {
    // redirect every other in-edge of n to m, skipping sources m already has
    for e in g.in_edges(n) {
        let Some(edge) = g.edge(e) else { continue };
        let (src, kind) = (edge.src.node, edge.kind);
        if src == m || src == n {
            continue;
        }
        if !g.exists(src, m) {
            g.add_edge(kind, src, m)?;
        }
    }
    // redirect every other out-edge of n to m
    for e in g.out_edges(n) {
        let Some(edge) = g.edge(e) else { continue };
        let (dst, kind) = (edge.dst.node, edge.kind);
        if dst == m || dst == n {
            continue;
        }
        if !g.exists(m, dst) {
            g.add_edge(kind, m, dst)?;
        }
    }
    let pair_kind = g
        .edges_between(n, m)
        .into_iter()
        .chain(g.edges_between(m, n))
        .fold(EdgeKind::empty(), |acc, e| {
            acc | g.edge(e).map(|e| e.kind).unwrap_or(EdgeKind::empty())
        });
    g.remove_edge_between(n, m);
    g.remove_edge_between(m, n);
    g.add_edge(pair_kind, n, m)?;
    // deleting n drops the fresh edge with it; m keeps the redirects
    g.remove_node(n)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfg_ir::{GraphId, NodeKind};
    use sdfg_utils::IndexRef;

    fn graph() -> Graph {
        Graph::new("fsm", GraphId::new(0))
    }

    #[test]
    fn contracts_a_two_cycle() {
        // c -> a <-> b -> d
        let mut g = graph();
        let a = g.add_node(NodeKind::FlipFlop, "a");
        let b = g.add_node(NodeKind::FlipFlop, "b");
        let c = g.add_node(NodeKind::FlipFlop, "c");
        let d = g.add_node(NodeKind::FlipFlop, "d");
        g.add_edge(EdgeKind::CONTROL, a, b).unwrap();
        g.add_edge(EdgeKind::CONTROL, b, a).unwrap();
        g.add_edge(EdgeKind::CONTROL, c, a).unwrap();
        g.add_edge(EdgeKind::CONTROL, b, d).unwrap();

        let rewrites = simplify_fsm(&mut g).unwrap();
        assert_eq!(rewrites, 1);
        assert_eq!(g.num_nodes(), 3);
        assert!(g.node(a).is_none());
        assert!(g.exists(c, b));
        assert!(g.exists(b, d));
    }

    #[test]
    fn chain_of_cycles_collapses() {
        // a <-> b <-> c collapses to a single node
        let mut g = graph();
        let a = g.add_node(NodeKind::FlipFlop, "a");
        let b = g.add_node(NodeKind::FlipFlop, "b");
        let c = g.add_node(NodeKind::FlipFlop, "c");
        g.add_edge(EdgeKind::CONTROL, a, b).unwrap();
        g.add_edge(EdgeKind::CONTROL, b, a).unwrap();
        g.add_edge(EdgeKind::CONTROL, b, c).unwrap();
        g.add_edge(EdgeKind::CONTROL, c, b).unwrap();

        let rewrites = simplify_fsm(&mut g).unwrap();
        assert_eq!(rewrites, 2);
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn idempotent_on_simplified_graph() {
        let mut g = graph();
        let a = g.add_node(NodeKind::FlipFlop, "a");
        let b = g.add_node(NodeKind::FlipFlop, "b");
        let c = g.add_node(NodeKind::FlipFlop, "c");
        g.add_edge(EdgeKind::CONTROL, a, b).unwrap();
        g.add_edge(EdgeKind::CONTROL, b, a).unwrap();
        g.add_edge(EdgeKind::DATA, c, a).unwrap();

        assert_eq!(simplify_fsm(&mut g).unwrap(), 1);
        let nodes = g.num_nodes();
        let edges = g.num_edges();
        // a second run finds nothing to rewrite
        assert_eq!(simplify_fsm(&mut g).unwrap(), 0);
        assert_eq!(g.num_nodes(), nodes);
        assert_eq!(g.num_edges(), edges);
    }

    #[test]
    fn graph_without_cycles_is_untouched() {
        let mut g = graph();
        let a = g.add_node(NodeKind::FlipFlop, "a");
        let b = g.add_node(NodeKind::FlipFlop, "b");
        g.add_edge(EdgeKind::CONTROL, a, b).unwrap();
        g.add_edge(EdgeKind::DATA, a, a).unwrap();

        assert_eq!(simplify_fsm(&mut g).unwrap(), 0);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 2);
    }
}
