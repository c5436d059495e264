use linked_hash_map::LinkedHashMap;
use sdfg_utils::{Error, IndexedStore, SdfgResult};

use crate::{
    Edge, EdgeKind, EdgeRef, Graph, GraphId, Node, NodeKind, NodeRef,
};

/// Registry owning every [`Graph`] of one analyzed design. Cross-graph
/// references (module instantiation, boundary edges) are ids resolved
/// through this registry; nothing holds a pointer across graphs.
#[derive(Debug, Clone, Default)]
pub struct Context {
    graphs: IndexedStore<GraphId, Graph>,
    names: LinkedHashMap<String, GraphId>,
    entrypoint: Option<GraphId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_graph(&mut self, name: &str) -> GraphId {
        let id = self.graphs.push(Graph::new(name, GraphId::from(0usize)));
        // the graph needs to know its own id for local edge construction
        self.graphs[id].set_id(id);
        self.names.insert(name.to_string(), id);
        id
    }

    pub fn graph(&self, id: GraphId) -> &Graph {
        &self.graphs[id]
    }

    pub fn graph_mut(&mut self, id: GraphId) -> &mut Graph {
        &mut self.graphs[id]
    }

    pub fn get_graph(&self, id: GraphId) -> Option<&Graph> {
        self.graphs.get(id)
    }

    pub fn graph_by_name(&self, name: &str) -> Option<GraphId> {
        self.names.get(name).copied()
    }

    pub fn graphs(&self) -> impl Iterator<Item = (GraphId, &Graph)> {
        self.graphs.iter()
    }

    pub fn entrypoint(&self) -> Option<GraphId> {
        self.entrypoint
    }

    pub fn set_entrypoint(&mut self, id: GraphId) {
        self.entrypoint = Some(id);
    }

    /// Resolves a qualified node handle through its owning graph.
    pub fn resolve(&self, nref: NodeRef) -> Option<&Node> {
        self.graphs.get(nref.graph)?.node(nref.node)
    }

    pub fn resolve_mut(&mut self, nref: NodeRef) -> Option<&mut Node> {
        self.graphs.get_mut(nref.graph)?.node_mut(nref.node)
    }

    pub fn edge(&self, eref: EdgeRef) -> Option<&Edge> {
        self.graphs.get(eref.graph)?.edge(eref.edge)
    }

    /// Links a Module-kind node to the graph it instantiates and sets the
    /// child's father back-pointer. The two sides must stay consistent, so
    /// this is the only way to establish the relation.
    pub fn connect_child(
        &mut self,
        parent: NodeRef,
        child: GraphId,
    ) -> SdfgResult<()> {
        if !self.graphs.contains(child) {
            return Err(Error::undefined("child graph"));
        }
        {
            let node = self
                .resolve_mut(parent)
                .ok_or_else(|| Error::undefined("module node"))?;
            if node.kind != NodeKind::Module {
                return Err(Error::malformed_structure(
                    "only Module nodes may carry a child graph",
                ));
            }
            node.child = Some(child);
        }
        self.graphs[child].father = Some(parent);
        Ok(())
    }

    /// Adds an edge owned by `owner` whose endpoints may live in other
    /// graphs. Used for parent-signal to child-port proxying at module
    /// boundaries.
    pub fn add_edge(
        &mut self,
        owner: GraphId,
        kind: EdgeKind,
        src: NodeRef,
        dst: NodeRef,
        name: &str,
    ) -> SdfgResult<EdgeRef> {
        if self.resolve(src).is_none() || self.resolve(dst).is_none() {
            return Err(Error::malformed_structure(
                "edge endpoint missing from the design",
            ));
        }
        if !self.graphs.contains(owner) {
            return Err(Error::undefined("owner graph"));
        }
        let edge = Edge {
            kind,
            src,
            dst,
            name: name.to_string(),
        };
        let id = self.graphs[owner].push_edge_raw(edge);
        let er = EdgeRef::new(owner, id);
        self.graphs[src.graph].attach_succ(src.node, er);
        self.graphs[dst.graph].attach_pred(dst.node, er);
        Ok(er)
    }

    /// Removes an edge wherever its endpoints live.
    pub fn remove_edge(&mut self, er: EdgeRef) -> SdfgResult<()> {
        let (src, dst) = {
            let edge = self
                .edge(er)
                .ok_or_else(|| Error::undefined("edge"))?;
            (edge.src, edge.dst)
        };
        self.graphs[src.graph].detach_succ(src.node, er);
        self.graphs[dst.graph].detach_pred(dst.node, er);
        self.graphs[er.graph].remove_edge_raw(er.edge);
        Ok(())
    }

    /// Successors of `n` with the kind of the connecting edge, resolving
    /// each edge through the graph that owns it. Parallel edges to the
    /// same successor appear once per edge.
    pub fn succs(&self, n: NodeRef) -> Vec<(NodeRef, EdgeKind)> {
        self.adjacent(n, true)
    }

    /// Predecessors of `n`, symmetric to [`Context::succs`].
    pub fn preds(&self, n: NodeRef) -> Vec<(NodeRef, EdgeKind)> {
        self.adjacent(n, false)
    }

    fn adjacent(&self, n: NodeRef, forward: bool) -> Vec<(NodeRef, EdgeKind)> {
        let Some(node) = self.resolve(n) else {
            return Vec::new();
        };
        let refs: Vec<EdgeRef> = if forward {
            node.out_edge_refs().collect()
        } else {
            node.in_edge_refs().collect()
        };
        refs.into_iter()
            .filter_map(|er| {
                let edge = self.edge(er)?;
                let far = if forward { edge.dst } else { edge.src };
                Some((far, edge.kind))
            })
            .collect()
    }

    /// All graphs reachable from `top` through module instantiation,
    /// including `top`, each exactly once, in discovery order.
    pub fn descendants(&self, top: GraphId) -> Vec<GraphId> {
        let mut seen = vec![top];
        let mut stack = vec![top];
        while let Some(g) = stack.pop() {
            for (_, node) in self.graph(g).nodes() {
                if let Some(child) = node.child {
                    if !seen.contains(&child) {
                        seen.push(child);
                        stack.push(child);
                    }
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn father_child_consistency() {
        let mut ctx = Context::new();
        let top = ctx.add_graph("top");
        let sub = ctx.add_graph("sub");
        let m = ctx.graph_mut(top).add_node(NodeKind::Module, "u0");
        let mref = NodeRef::new(top, m);
        ctx.connect_child(mref, sub).unwrap();
        assert_eq!(ctx.resolve(mref).unwrap().child, Some(sub));
        assert_eq!(ctx.graph(sub).father, Some(mref));
    }

    #[test]
    fn child_on_non_module_is_rejected() {
        let mut ctx = Context::new();
        let top = ctx.add_graph("top");
        let sub = ctx.add_graph("sub");
        let c = ctx.graph_mut(top).add_node(NodeKind::Comb, "c");
        assert!(ctx.connect_child(NodeRef::new(top, c), sub).is_err());
    }

    #[test]
    fn boundary_edge_adjacency() {
        let mut ctx = Context::new();
        let top = ctx.add_graph("top");
        let sub = ctx.add_graph("sub");
        let sig = ctx.graph_mut(top).add_node(NodeKind::Comb, "sig");
        let pin = ctx.graph_mut(sub).add_node(NodeKind::InputPort, "pin");
        let s = NodeRef::new(top, sig);
        let p = NodeRef::new(sub, pin);
        let er = ctx.add_edge(top, EdgeKind::DATA, s, p, "sig").unwrap();
        assert_eq!(ctx.succs(s), vec![(p, EdgeKind::DATA)]);
        assert_eq!(ctx.preds(p), vec![(s, EdgeKind::DATA)]);
        ctx.remove_edge(er).unwrap();
        assert!(ctx.succs(s).is_empty());
        assert!(ctx.preds(p).is_empty());
    }
}
