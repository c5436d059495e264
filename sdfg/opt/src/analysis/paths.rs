//! Memoized reachability over stopping nodes.
//!
//! For a start node and a direction, the engine computes the set of
//! `(stopping node, aggregated kind)` pairs reachable without crossing a
//! stopping node: a flip-flop, a latch, or a port of a graph with no
//! father. Two families exist:
//!
//! - the cross-boundary family resolves every edge endpoint through the
//!   endpoint's owning graph, so boundary edges proxy the walk through
//!   module ports into and out of child graphs;
//! - the fast family confines the walk to the start node's own graph and
//!   treats Module meta-nodes and all ports as terminals.
//!
//! Expansion work is shared through per-direction relation maps: once a
//! node has been expanded, every later walk that reaches it fans out the
//! recorded stopping set instead of descending again, which keeps the
//! engine at O(V+E) amortized per start node despite the exponential
//! number of distinct paths.

use std::collections::{HashMap, HashSet};

use linked_hash_map::LinkedHashMap;
use sdfg_ir::{Context, EdgeKind, NodeKind, NodeRef};
use sdfg_utils::{Error, SdfgResult};

use crate::DiagnosticContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A fully enumerated path, as produced by [`PathFinder::enumerate_paths`].
/// Each hop records the node reached and the kind accumulated up to it.
#[derive(Debug, Clone)]
pub struct Path {
    pub source: NodeRef,
    pub target: NodeRef,
    pub hops: Vec<(NodeRef, EdgeKind)>,
    /// Aggregated kind over the whole path.
    pub kind: EdgeKind,
}

impl Path {
    /// Renders the path as `a -> b -> c [kind]` using hierarchical names.
    pub fn render(&self, ctx: &Context) -> String {
        let mut out = String::new();
        out.push_str(&node_name(ctx, self.source));
        for (hop, _) in &self.hops {
            out.push_str(" -> ");
            out.push_str(&node_name(ctx, *hop));
        }
        out.push_str(&format!(" [{}]", self.kind.tag()));
        out
    }
}

fn node_name(ctx: &Context, n: NodeRef) -> String {
    ctx.resolve(n)
        .map(|node| node.hier_name.clone())
        .unwrap_or_else(|| "<dead>".to_string())
}

type Reached = LinkedHashMap<NodeRef, EdgeKind>;

/// Reachability engine over one design. Keeps its memo tables across
/// queries; create one per analysis session and reuse it.
pub struct PathFinder<'a> {
    ctx: &'a Context,
    // relation maps: per direction and family, node -> stopping set
    memo: [HashMap<NodeRef, Reached>; 4],
}

fn slot(dir: Direction, fast: bool) -> usize {
    match (dir, fast) {
        (Direction::Forward, false) => 0,
        (Direction::Backward, false) => 1,
        (Direction::Forward, true) => 2,
        (Direction::Backward, true) => 3,
    }
}

impl<'a> PathFinder<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            memo: Default::default(),
        }
    }

    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    /// Drops every memoized relation, forcing later queries to recompute.
    pub fn clear(&mut self) {
        self.memo = Default::default();
    }

    /// Stopping nodes reachable forward from `start`, crossing module
    /// boundaries.
    pub fn out_paths(
        &mut self,
        start: NodeRef,
        diag: &mut DiagnosticContext,
    ) -> SdfgResult<Vec<(NodeRef, EdgeKind)>> {
        self.paths(start, Direction::Forward, false, diag)
    }

    /// Stopping nodes reaching `start` backward, crossing module
    /// boundaries.
    pub fn in_paths(
        &mut self,
        start: NodeRef,
        diag: &mut DiagnosticContext,
    ) -> SdfgResult<Vec<(NodeRef, EdgeKind)>> {
        self.paths(start, Direction::Backward, false, diag)
    }

    /// Forward reachability confined to the start node's graph; Module
    /// nodes and ports are terminals.
    pub fn fast_out_paths(
        &mut self,
        start: NodeRef,
        diag: &mut DiagnosticContext,
    ) -> SdfgResult<Vec<(NodeRef, EdgeKind)>> {
        self.paths(start, Direction::Forward, true, diag)
    }

    /// Backward counterpart of [`PathFinder::fast_out_paths`].
    pub fn fast_in_paths(
        &mut self,
        start: NodeRef,
        diag: &mut DiagnosticContext,
    ) -> SdfgResult<Vec<(NodeRef, EdgeKind)>> {
        self.paths(start, Direction::Backward, true, diag)
    }

    fn paths(
        &mut self,
        start: NodeRef,
        dir: Direction,
        fast: bool,
        diag: &mut DiagnosticContext,
    ) -> SdfgResult<Vec<(NodeRef, EdgeKind)>> {
        if self.ctx.resolve(start).is_none() {
            return Err(Error::undefined("path start node"));
        }
        let idx = slot(dir, fast);
        if !self.memo[idx].contains_key(&start) {
            let mut visited = HashSet::new();
            let mut trail = Vec::new();
            self.expand(start, dir, fast, &mut visited, &mut trail, diag);
        }
        Ok(self.memo[idx][&start]
            .iter()
            .map(|(t, k)| (*t, *k))
            .collect())
    }

    /// Expands `cur` once, recording its stopping set in the relation
    /// map. `visited` belongs to the live path only: a revisit aborts
    /// just that branch with a loop diagnostic, sibling branches keep
    /// going.
    fn expand(
        &mut self,
        cur: NodeRef,
        dir: Direction,
        fast: bool,
        visited: &mut HashSet<NodeRef>,
        trail: &mut Vec<NodeRef>,
        diag: &mut DiagnosticContext,
    ) {
        let idx = slot(dir, fast);
        visited.insert(cur);
        trail.push(cur);
        let mut reached = Reached::new();
        for (succ, kind) in self.neighbors(cur, dir, fast) {
            if self.stops(succ, fast) {
                merge(&mut reached, succ, kind);
                continue;
            }
            if !fast && self.kind_of(succ) == Some(NodeKind::Module) {
                // instance flow runs through the boundary edges at the
                // ports; the meta-node itself carries nothing here
                continue;
            }
            if let Some(entry) = self.memo[idx].get(&succ) {
                let cached: Vec<_> =
                    entry.iter().map(|(t, k)| (*t, *k)).collect();
                for (target, tk) in cached {
                    merge(&mut reached, target, kind.combine(tk));
                }
                continue;
            }
            if visited.contains(&succ) {
                diag.warning(Error::combinational_loop(
                    self.render_loop(trail, succ),
                ));
                continue;
            }
            self.expand(succ, dir, fast, visited, trail, diag);
            let cached: Vec<_> = self.memo[idx][&succ]
                .iter()
                .map(|(t, k)| (*t, *k))
                .collect();
            for (target, tk) in cached {
                merge(&mut reached, target, kind.combine(tk));
            }
        }
        visited.remove(&cur);
        trail.pop();
        self.memo[idx].insert(cur, reached);
    }

    /// Immediate neighbors with parallel edges OR-combined per neighbor.
    fn neighbors(
        &self,
        cur: NodeRef,
        dir: Direction,
        fast: bool,
    ) -> Vec<(NodeRef, EdgeKind)> {
        let raw = match dir {
            Direction::Forward => self.ctx.succs(cur),
            Direction::Backward => self.ctx.preds(cur),
        };
        let mut merged = Reached::new();
        for (far, kind) in raw {
            if fast && far.graph != cur.graph {
                continue;
            }
            merge(&mut merged, far, kind);
        }
        merged.into_iter().collect()
    }

    fn kind_of(&self, n: NodeRef) -> Option<NodeKind> {
        self.ctx.resolve(n).map(|node| node.kind)
    }

    fn stops(&self, n: NodeRef, fast: bool) -> bool {
        let Some(kind) = self.kind_of(n) else {
            return false;
        };
        if kind.is_register() {
            return true;
        }
        if fast {
            kind.is_port() || kind == NodeKind::Module
        } else {
            // only ports of an unfathered graph terminate; fathered ports
            // proxy the walk across the boundary
            kind.is_port() && self.ctx.graph(n.graph).father.is_none()
        }
    }

    fn render_loop(&self, trail: &[NodeRef], repeat: NodeRef) -> String {
        let mut names: Vec<String> = trail
            .iter()
            .skip_while(|n| **n != repeat)
            .map(|n| node_name(self.ctx, *n))
            .collect();
        names.push(node_name(self.ctx, repeat));
        names.join(" -> ")
    }

    /// Feedback search from `start` back to itself, used for FSM
    /// detection. The search is exhaustive and the result is the union of
    /// the aggregated kinds of every feedback loop, so an address- or
    /// clock-only loop cannot mask a control-carrying one. The hierarchy
    /// level counter distinguishes a true top-level port (level 0, no
    /// father) from a boundary crossing that must keep expanding.
    pub fn self_path(
        &mut self,
        start: NodeRef,
        _diag: &mut DiagnosticContext,
    ) -> SdfgResult<Option<EdgeKind>> {
        if self.ctx.resolve(start).is_none() {
            return Err(Error::undefined("self-path start node"));
        }
        let mut visited = HashSet::new();
        let mut found = None;
        self.self_walk(
            start,
            start,
            EdgeKind::empty(),
            0,
            false,
            &mut visited,
            &mut found,
        );
        Ok(found)
    }

    /// Feedback search confined to the start node's own graph; Module
    /// meta-nodes and ports are terminals, matching the fast reachability
    /// family.
    pub fn fast_self_path(
        &mut self,
        start: NodeRef,
        _diag: &mut DiagnosticContext,
    ) -> SdfgResult<Option<EdgeKind>> {
        if self.ctx.resolve(start).is_none() {
            return Err(Error::undefined("self-path start node"));
        }
        let mut visited = HashSet::new();
        let mut found = None;
        self.self_walk(
            start,
            start,
            EdgeKind::empty(),
            0,
            true,
            &mut visited,
            &mut found,
        );
        Ok(found)
    }

    #[allow(clippy::too_many_arguments)]
    fn self_walk(
        &self,
        start: NodeRef,
        cur: NodeRef,
        acc: EdgeKind,
        level: i32,
        fast: bool,
        visited: &mut HashSet<NodeRef>,
        found: &mut Option<EdgeKind>,
    ) {
        visited.insert(cur);
        for (succ, kind) in self.neighbors(cur, Direction::Forward, fast) {
            let agg = acc.combine(kind);
            let lvl = level + self.level_delta(cur, succ);
            if succ == start {
                *found = Some(found.map_or(agg, |k| k | agg));
                continue;
            }
            let Some(nk) = self.kind_of(succ) else {
                continue;
            };
            if nk.is_register() || nk == NodeKind::Module {
                continue;
            }
            if nk.is_port() {
                if fast {
                    continue;
                }
                if lvl == 0 && self.ctx.graph(succ.graph).father.is_none() {
                    continue;
                }
            }
            if visited.contains(&succ) {
                // a loop not through the start; handled by the plain
                // traversal's diagnostics, nothing to report twice
                log::debug!("self-path revisit at {}", node_name(self.ctx, succ));
                continue;
            }
            self.self_walk(start, succ, agg, lvl, fast, visited, found);
        }
        visited.remove(&cur);
    }

    /// +1 when stepping into a child graph, -1 when stepping out to the
    /// father, 0 within one graph.
    fn level_delta(&self, from: NodeRef, to: NodeRef) -> i32 {
        if from.graph == to.graph {
            return 0;
        }
        if self
            .ctx
            .graph(to.graph)
            .father
            .is_some_and(|f| f.graph == from.graph)
        {
            return 1;
        }
        if self
            .ctx
            .graph(from.graph)
            .father
            .is_some_and(|f| f.graph == to.graph)
        {
            return -1;
        }
        0
    }

    /// Enumerates up to `max` concrete paths from `from` to `to`,
    /// never expanding past a stopping node and never revisiting a node
    /// within one path.
    pub fn enumerate_paths(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        max: usize,
        fast: bool,
    ) -> SdfgResult<Vec<Path>> {
        if self.ctx.resolve(from).is_none() || self.ctx.resolve(to).is_none() {
            return Err(Error::undefined("path endpoint"));
        }
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut trail = Vec::new();
        self.enum_walk(
            from,
            from,
            to,
            fast,
            EdgeKind::empty(),
            &mut trail,
            &mut visited,
            &mut out,
            max,
        );
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn enum_walk(
        &self,
        source: NodeRef,
        cur: NodeRef,
        to: NodeRef,
        fast: bool,
        acc: EdgeKind,
        trail: &mut Vec<(NodeRef, EdgeKind)>,
        visited: &mut HashSet<NodeRef>,
        out: &mut Vec<Path>,
        max: usize,
    ) {
        if out.len() >= max {
            return;
        }
        visited.insert(cur);
        for (succ, kind) in self.neighbors(cur, Direction::Forward, fast) {
            let agg = acc.combine(kind);
            if succ == to {
                let mut hops = trail.clone();
                hops.push((succ, agg));
                out.push(Path {
                    source,
                    target: to,
                    hops,
                    kind: agg,
                });
                if out.len() >= max {
                    break;
                }
                continue;
            }
            if self.stops(succ, fast) || visited.contains(&succ) {
                continue;
            }
            if !fast && self.kind_of(succ) == Some(NodeKind::Module) {
                continue;
            }
            trail.push((succ, agg));
            self.enum_walk(
                source, succ, to, fast, agg, trail, visited, out, max,
            );
            trail.pop();
        }
        visited.remove(&cur);
    }
}

fn merge(into: &mut Reached, key: NodeRef, kind: EdgeKind) {
    match into.get_mut(&key) {
        Some(existing) => *existing |= kind,
        None => {
            into.insert(key, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfg_ir::{GraphId, NodeId};

    fn single(ctx: &mut Context) -> GraphId {
        ctx.add_graph("top")
    }

    fn nref(g: GraphId, n: NodeId) -> NodeRef {
        NodeRef::new(g, n)
    }

    #[test]
    fn two_registers_with_control_edge() {
        // FF_A --[Control]--> FF_B
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let a = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "ff_a");
        let b = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "ff_b");
        ctx.graph_mut(g).add_edge(EdgeKind::CONTROL, a, b).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let out = finder.out_paths(nref(g, a), &mut diag).unwrap();
        assert_eq!(out, vec![(nref(g, b), EdgeKind::CONTROL)]);
        let back = finder.in_paths(nref(g, b), &mut diag).unwrap();
        assert_eq!(back, vec![(nref(g, a), EdgeKind::CONTROL)]);
        assert_eq!(diag.loop_count(), 0);
    }

    #[test]
    fn combinational_cycle_terminates_with_one_diagnostic() {
        // X -> Y -> Z -> X, no register or port anywhere
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let x = ctx.graph_mut(g).add_node(NodeKind::Comb, "x");
        let y = ctx.graph_mut(g).add_node(NodeKind::Comb, "y");
        let z = ctx.graph_mut(g).add_node(NodeKind::Comb, "z");
        ctx.graph_mut(g).add_edge(EdgeKind::DATA, x, y).unwrap();
        ctx.graph_mut(g).add_edge(EdgeKind::DATA, y, z).unwrap();
        ctx.graph_mut(g).add_edge(EdgeKind::DATA, z, x).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let out = finder.out_paths(nref(g, x), &mut diag).unwrap();
        assert!(out.is_empty());
        assert_eq!(diag.loop_count(), 1);
    }

    #[test]
    fn parallel_edges_or_combine() {
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let a = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "a");
        let b = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "b");
        ctx.graph_mut(g).add_edge(EdgeKind::DATA, a, b).unwrap();
        ctx.graph_mut(g).add_edge(EdgeKind::CONTROL, a, b).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let out = finder.out_paths(nref(g, a), &mut diag).unwrap();
        assert_eq!(out, vec![(nref(g, b), EdgeKind::DATA | EdgeKind::CONTROL)]);
    }

    #[test]
    fn duality_on_a_dag() {
        // ff1 -> c1 -> ff2, ff1 -> c1 -> c2 -> ff3, ff2 -> c2 (shared comb)
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let ff1 = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "ff1");
        let ff2 = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "ff2");
        let ff3 = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "ff3");
        let c1 = ctx.graph_mut(g).add_node(NodeKind::Comb, "c1");
        let c2 = ctx.graph_mut(g).add_node(NodeKind::Comb, "c2");
        let gm = ctx.graph_mut(g);
        gm.add_edge(EdgeKind::DATA, ff1, c1).unwrap();
        gm.add_edge(EdgeKind::DATA, c1, ff2).unwrap();
        gm.add_edge(EdgeKind::CONTROL, c1, c2).unwrap();
        gm.add_edge(EdgeKind::DATA, c2, ff3).unwrap();
        gm.add_edge(EdgeKind::DATA, ff2, c2).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        for start in [ff1, ff2, ff3] {
            let fwd = finder.out_paths(nref(g, start), &mut diag).unwrap();
            for (target, kind) in fwd {
                let back = finder.in_paths(target, &mut diag).unwrap();
                let found = back
                    .iter()
                    .find(|(src, _)| *src == nref(g, start))
                    .unwrap_or_else(|| {
                        panic!("missing dual of {start:?} -> {target:?}")
                    });
                assert_eq!(found.1, kind);
            }
        }
        assert_eq!(diag.loop_count(), 0);
    }

    /// Unmemoized reference walk used to validate the relation-map
    /// sharing on acyclic graphs.
    fn naive_out(
        ctx: &Context,
        cur: NodeRef,
        finder: &PathFinder,
    ) -> Vec<(NodeRef, EdgeKind)> {
        let mut acc: LinkedHashMap<NodeRef, EdgeKind> = LinkedHashMap::new();
        for (succ, kind) in finder.neighbors(cur, Direction::Forward, false) {
            if finder.stops(succ, false) {
                merge(&mut acc, succ, kind);
            } else if finder.kind_of(succ) != Some(NodeKind::Module) {
                for (t, tk) in naive_out(ctx, succ, finder) {
                    merge(&mut acc, t, kind.combine(tk));
                }
            }
        }
        acc.into_iter().collect()
    }

    #[test]
    fn memoized_matches_naive_on_dag() {
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let ffs: Vec<_> = (0..4)
            .map(|i| {
                ctx.graph_mut(g)
                    .add_node(NodeKind::FlipFlop, &format!("ff{i}"))
            })
            .collect();
        let combs: Vec<_> = (0..4)
            .map(|i| {
                ctx.graph_mut(g).add_node(NodeKind::Comb, &format!("c{i}"))
            })
            .collect();
        let gm = ctx.graph_mut(g);
        gm.add_edge(EdgeKind::DATA, ffs[0], combs[0]).unwrap();
        gm.add_edge(EdgeKind::DATA, combs[0], combs[1]).unwrap();
        gm.add_edge(EdgeKind::CONTROL, combs[0], combs[2]).unwrap();
        gm.add_edge(EdgeKind::DATA, combs[1], ffs[1]).unwrap();
        gm.add_edge(EdgeKind::DATA, combs[2], ffs[2]).unwrap();
        gm.add_edge(EdgeKind::DATA, ffs[1], combs[3]).unwrap();
        gm.add_edge(EdgeKind::CLOCK, combs[3], ffs[3]).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        for (n, _) in ctx.graph(g).nodes() {
            let start = nref(g, n);
            let mut memoized =
                finder.out_paths(start, &mut diag).unwrap();
            let mut naive = naive_out(&ctx, start, &finder);
            memoized.sort();
            naive.sort();
            assert_eq!(memoized, naive, "divergence at {start:?}");
        }
    }

    #[test]
    fn walk_crosses_module_boundary() {
        // top: ff_in -> (boundary) sub.d -> sub.r
        let mut ctx = Context::new();
        let top = ctx.add_graph("top");
        let sub = ctx.add_graph("sub");
        let ff = ctx.graph_mut(top).add_node(NodeKind::FlipFlop, "ff_in");
        let meta = ctx.graph_mut(top).add_node(NodeKind::Module, "u0");
        ctx.connect_child(nref(top, meta), sub).unwrap();
        let d = ctx.graph_mut(sub).add_node(NodeKind::InputPort, "d");
        let r = ctx.graph_mut(sub).add_node(NodeKind::FlipFlop, "r");
        ctx.graph_mut(sub).add_edge(EdgeKind::DATA, d, r).unwrap();
        ctx.add_edge(top, EdgeKind::DATA, nref(top, ff), nref(sub, d), "ff_in")
            .unwrap();
        // opaque view for the fast family
        ctx.graph_mut(top)
            .add_edge(EdgeKind::DATA, ff, meta)
            .unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let out = finder.out_paths(nref(top, ff), &mut diag).unwrap();
        assert_eq!(out, vec![(nref(sub, r), EdgeKind::DATA)]);

        // the fast family stops at the meta-node instead
        let fast = finder.fast_out_paths(nref(top, ff), &mut diag).unwrap();
        assert_eq!(fast, vec![(nref(top, meta), EdgeKind::DATA)]);
    }

    #[test]
    fn self_path_finds_register_feedback() {
        // r -> c -> r with control, and r -> c2 -> other (no feedback)
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let r = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "r");
        let c = ctx.graph_mut(g).add_node(NodeKind::Comb, "c");
        let other = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "other");
        let gm = ctx.graph_mut(g);
        gm.add_edge(EdgeKind::CONTROL, r, c).unwrap();
        gm.add_edge(EdgeKind::CONTROL, c, r).unwrap();
        gm.add_edge(EdgeKind::DATA, c, other).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let fb = finder.self_path(nref(g, r), &mut diag).unwrap();
        assert_eq!(fb, Some(EdgeKind::CONTROL));
        let none = finder.self_path(nref(g, other), &mut diag).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn address_loop_does_not_mask_control_loop() {
        // two feedback loops; the address-only one is wired first and
        // must not hide the control-carrying one
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let r = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "r");
        let a = ctx.graph_mut(g).add_node(NodeKind::Comb, "addr_mux");
        let c = ctx.graph_mut(g).add_node(NodeKind::Comb, "next");
        let gm = ctx.graph_mut(g);
        gm.add_edge(EdgeKind::ADDRESS, r, a).unwrap();
        gm.add_edge(EdgeKind::ADDRESS, a, r).unwrap();
        gm.add_edge(EdgeKind::CONTROL, r, c).unwrap();
        gm.add_edge(EdgeKind::CONTROL, c, r).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let fb = finder.self_path(nref(g, r), &mut diag).unwrap().unwrap();
        assert!(fb.contains(EdgeKind::CONTROL));
        assert!(fb.contains(EdgeKind::ADDRESS));
    }

    #[test]
    fn self_path_through_child_instance() {
        // feedback routed through a child module's ports: the walk steps
        // into the child (+1) and back out (-1); the child's ports must
        // not terminate it
        let mut ctx = Context::new();
        let top = ctx.add_graph("top");
        let sub = ctx.add_graph("sub");
        let r = ctx.graph_mut(top).add_node(NodeKind::FlipFlop, "r");
        let meta = ctx.graph_mut(top).add_node(NodeKind::Module, "u0");
        ctx.connect_child(nref(top, meta), sub).unwrap();
        let d = ctx.graph_mut(sub).add_node(NodeKind::InputPort, "d");
        let q = ctx.graph_mut(sub).add_node(NodeKind::OutputPort, "q");
        ctx.graph_mut(sub).add_edge(EdgeKind::CONTROL, d, q).unwrap();
        ctx.add_edge(top, EdgeKind::CONTROL, nref(top, r), nref(sub, d), "r")
            .unwrap();
        ctx.add_edge(top, EdgeKind::CONTROL, nref(sub, q), nref(top, r), "q")
            .unwrap();
        // a would-be loop through a true top-level port stops instead
        let p = ctx.graph_mut(top).add_node(NodeKind::OutputPort, "p");
        ctx.graph_mut(top).add_edge(EdgeKind::DATA, r, p).unwrap();
        ctx.graph_mut(top).add_edge(EdgeKind::DATA, p, r).unwrap();

        let mut diag = DiagnosticContext::default();
        let mut finder = PathFinder::new(&ctx);
        let fb = finder.self_path(nref(top, r), &mut diag).unwrap().unwrap();
        assert_eq!(fb, EdgeKind::CONTROL);

        // the fast family never leaves the top graph, so the only loop
        // it could see runs through the top port, which is terminal
        let fast = finder.fast_self_path(nref(top, r), &mut diag).unwrap();
        assert_eq!(fast, None);
    }

    #[test]
    fn enumerate_paths_respects_max() {
        // two disjoint comb routes a -> b
        let mut ctx = Context::new();
        let g = single(&mut ctx);
        let a = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "a");
        let b = ctx.graph_mut(g).add_node(NodeKind::FlipFlop, "b");
        let c1 = ctx.graph_mut(g).add_node(NodeKind::Comb, "c1");
        let c2 = ctx.graph_mut(g).add_node(NodeKind::Comb, "c2");
        let gm = ctx.graph_mut(g);
        gm.add_edge(EdgeKind::DATA, a, c1).unwrap();
        gm.add_edge(EdgeKind::DATA, c1, b).unwrap();
        gm.add_edge(EdgeKind::CONTROL, a, c2).unwrap();
        gm.add_edge(EdgeKind::CONTROL, c2, b).unwrap();

        let mut finder = PathFinder::new(&ctx);
        let all = finder
            .enumerate_paths(nref(g, a), nref(g, b), 16, false)
            .unwrap();
        assert_eq!(all.len(), 2);
        let capped = finder
            .enumerate_paths(nref(g, a), nref(g, b), 1, false)
            .unwrap();
        assert_eq!(capped.len(), 1);
        for path in &all {
            assert_eq!(path.source, nref(g, a));
            assert_eq!(path.target, nref(g, b));
            assert_eq!(path.hops.last().unwrap().0, nref(g, b));
        }
    }
}
