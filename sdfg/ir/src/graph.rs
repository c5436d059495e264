use linked_hash_map::LinkedHashMap;
use sdfg_utils::{Error, IndexedStore, SdfgResult};

use crate::{Edge, EdgeId, EdgeKind, EdgeRef, GraphId, Node, NodeId, NodeKind, NodeRef};

/// A typed multigraph over one elaborated module.
///
/// Nodes and edges live in arenas addressed by [`NodeId`]/[`EdgeId`];
/// removal leaves a tombstone so handles held elsewhere stay valid to
/// detect as dead. Edges whose endpoints live in another graph (boundary
/// edges through module ports) are owned by exactly one graph but appear
/// in the adjacency lists of both endpoints; those are managed through
/// [`Context`](crate::Context).
#[derive(Debug, Clone)]
pub struct Graph {
    id: GraphId,
    pub name: String,
    /// The Module-kind node in the parent graph this graph instantiates.
    /// `None` for the top-level graph.
    pub father: Option<NodeRef>,
    nodes: IndexedStore<NodeId, Node>,
    edges: IndexedStore<EdgeId, Edge>,
    names: LinkedHashMap<String, NodeId>,
}

impl Graph {
    pub fn new(name: &str, id: GraphId) -> Self {
        Self {
            id,
            name: name.to_string(),
            father: None,
            nodes: IndexedStore::new(),
            edges: IndexedStore::new(),
            names: LinkedHashMap::new(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: GraphId) {
        self.id = id;
    }

    /// Adds a node. The name-to-id map is overwritten when a duplicate
    /// name is inserted: lookups then resolve to the newest node while the
    /// older node stays in the graph. Downstream consumers rely on this
    /// last-write-wins behavior, so it is kept as-is.
    pub fn add_node(&mut self, kind: NodeKind, name: &str) -> NodeId {
        let hier_name = format!("{}.{}", self.name, name);
        let id = self.nodes.push(Node::new(kind, name, hier_name));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Adds an edge between two nodes of this graph. Fails if either
    /// endpoint is absent.
    pub fn add_edge(
        &mut self,
        kind: EdgeKind,
        src: NodeId,
        dst: NodeId,
    ) -> SdfgResult<EdgeId> {
        if !self.nodes.contains(src) || !self.nodes.contains(dst) {
            return Err(Error::malformed_structure(format!(
                "edge endpoint missing in graph `{}`",
                self.name
            )));
        }
        let edge = Edge {
            kind,
            src: NodeRef::new(self.id, src),
            dst: NodeRef::new(self.id, dst),
            name: String::new(),
        };
        let id = self.edges.push(edge);
        let er = EdgeRef::new(self.id, id);
        self.nodes[src].succs.push(er);
        self.nodes[dst].preds.push(er);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Out-edges of `id` owned by this graph.
    pub fn out_edges(&self, id: NodeId) -> Vec<EdgeId> {
        self.local_adjacent(id, true)
    }

    /// In-edges of `id` owned by this graph.
    pub fn in_edges(&self, id: NodeId) -> Vec<EdgeId> {
        self.local_adjacent(id, false)
    }

    /// Successor nodes of `id` through edges owned by this graph whose far
    /// endpoint is also local.
    pub fn out_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.out_edges(id)
            .into_iter()
            .filter_map(|e| {
                let dst = self.edges[e].dst;
                (dst.graph == self.id).then_some(dst.node)
            })
            .collect()
    }

    /// Predecessor nodes of `id` through local edges.
    pub fn in_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.in_edges(id)
            .into_iter()
            .filter_map(|e| {
                let src = self.edges[e].src;
                (src.graph == self.id).then_some(src.node)
            })
            .collect()
    }

    /// All local edges from `src` to `dst`, in insertion order.
    pub fn edges_between(&self, src: NodeId, dst: NodeId) -> Vec<EdgeId> {
        let from = NodeRef::new(self.id, src);
        let to = NodeRef::new(self.id, dst);
        self.edges
            .iter()
            .filter_map(|(id, e)| (e.src == from && e.dst == to).then_some(id))
            .collect()
    }

    pub fn exists(&self, src: NodeId, dst: NodeId) -> bool {
        !self.edges_between(src, dst).is_empty()
    }

    pub fn exists_kind(&self, src: NodeId, dst: NodeId, kind: EdgeKind) -> bool {
        self.edges_between(src, dst)
            .into_iter()
            .any(|e| self.edges[e].kind.intersects(kind))
    }

    /// Removes one edge by id. The edge must be local: both endpoints in
    /// this graph. Boundary edges go through
    /// [`Context::remove_edge`](crate::Context::remove_edge).
    pub fn remove_edge(&mut self, id: EdgeId) -> SdfgResult<()> {
        let (src, dst) = {
            let edge = self
                .edges
                .get(id)
                .ok_or_else(|| Error::undefined(format!("edge in `{}`", self.name)))?;
            if edge.src.graph != self.id || edge.dst.graph != self.id {
                return Err(Error::malformed_structure(
                    "boundary edge must be removed through the context",
                ));
            }
            (edge.src.node, edge.dst.node)
        };
        let er = EdgeRef::new(self.id, id);
        self.nodes[src].succs.retain(|e| *e != er);
        self.nodes[dst].preds.retain(|e| *e != er);
        self.edges.remove(id);
        Ok(())
    }

    /// Removes all parallel edges between `src` and `dst`. Returns how many
    /// edges were removed.
    pub fn remove_edge_between(&mut self, src: NodeId, dst: NodeId) -> usize {
        let ids = self.edges_between(src, dst);
        let n = ids.len();
        for id in ids {
            // local by construction of edges_between
            let _ = self.remove_edge(id);
        }
        n
    }

    /// Removes only the edges between `src` and `dst` whose kind overlaps
    /// `kind`. Returns how many edges were removed.
    pub fn remove_edge_matching(
        &mut self,
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
    ) -> usize {
        let ids: Vec<_> = self
            .edges_between(src, dst)
            .into_iter()
            .filter(|e| self.edges[*e].kind.intersects(kind))
            .collect();
        let n = ids.len();
        for id in ids {
            let _ = self.remove_edge(id);
        }
        n
    }

    /// Removes a node and all its incident edges. The node must not touch
    /// any boundary edge.
    pub fn remove_node(&mut self, id: NodeId) -> SdfgResult<()> {
        let incident: Vec<EdgeRef> = {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| Error::undefined(format!("node in `{}`", self.name)))?;
            node.succs.iter().chain(node.preds.iter()).copied().collect()
        };
        for er in &incident {
            if er.graph != self.id {
                return Err(Error::malformed_structure(
                    "node with boundary edges must be removed through the context",
                ));
            }
            let edge = &self.edges[er.edge];
            if edge.src.graph != self.id || edge.dst.graph != self.id {
                return Err(Error::malformed_structure(
                    "node with boundary edges must be removed through the context",
                ));
            }
        }
        for er in incident {
            // self-edges appear in both lists; the second removal is a no-op
            if self.edges.contains(er.edge) {
                self.remove_edge(er.edge)?;
            }
        }
        let node = self.nodes.remove(id).expect("checked above");
        if self.names.get(&node.name) == Some(&id) {
            self.names.remove(&node.name);
        }
        Ok(())
    }

    fn local_adjacent(&self, id: NodeId, forward: bool) -> Vec<EdgeId> {
        match self.nodes.get(id) {
            Some(node) => {
                let refs = if forward { &node.succs } else { &node.preds };
                refs.iter()
                    .filter_map(|er| (er.graph == self.id).then_some(er.edge))
                    .collect()
            }
            None => Vec::new(),
        }
    }

    // Adjacency maintenance for boundary edges, driven by the Context.
    pub(crate) fn push_edge_raw(&mut self, edge: Edge) -> EdgeId {
        self.edges.push(edge)
    }

    pub(crate) fn attach_succ(&mut self, node: NodeId, er: EdgeRef) {
        self.nodes[node].succs.push(er);
    }

    pub(crate) fn attach_pred(&mut self, node: NodeId, er: EdgeRef) {
        self.nodes[node].preds.push(er);
    }

    pub(crate) fn detach_succ(&mut self, node: NodeId, er: EdgeRef) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.succs.retain(|e| *e != er);
        }
    }

    pub(crate) fn detach_pred(&mut self, node: NodeId, er: EdgeRef) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.preds.retain(|e| *e != er);
        }
    }

    pub(crate) fn remove_edge_raw(&mut self, id: EdgeId) -> Option<Edge> {
        self.edges.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfg_utils::IndexRef;

    fn graph() -> Graph {
        Graph::new("top", GraphId::new(0))
    }

    #[test]
    fn add_and_query() {
        let mut g = graph();
        let a = g.add_node(NodeKind::FlipFlop, "a");
        let b = g.add_node(NodeKind::Comb, "b");
        let e = g.add_edge(EdgeKind::DATA, a, b).unwrap();
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.out_nodes(a), vec![b]);
        assert_eq!(g.in_nodes(b), vec![a]);
        assert!(g.exists(a, b));
        assert!(!g.exists(b, a));
        assert!(g.exists_kind(a, b, EdgeKind::DATA));
        assert!(!g.exists_kind(a, b, EdgeKind::CLOCK));
        assert_eq!(g.edge(e).unwrap().kind, EdgeKind::DATA);
        assert_eq!(g.node(a).unwrap().hier_name, "top.a");
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        let mut g = graph();
        let a = g.add_node(NodeKind::Comb, "a");
        let ghost = NodeId::new(7);
        assert!(g.add_edge(EdgeKind::DATA, a, ghost).is_err());
    }

    #[test]
    fn parallel_and_self_edges() {
        let mut g = graph();
        let a = g.add_node(NodeKind::Comb, "a");
        let b = g.add_node(NodeKind::Comb, "b");
        g.add_edge(EdgeKind::DATA, a, b).unwrap();
        g.add_edge(EdgeKind::CONTROL, a, b).unwrap();
        g.add_edge(EdgeKind::DATA, a, a).unwrap();
        assert_eq!(g.edges_between(a, b).len(), 2);
        assert_eq!(g.edges_between(a, a).len(), 1);
        assert_eq!(g.remove_edge_matching(a, b, EdgeKind::CONTROL), 1);
        assert_eq!(g.edges_between(a, b).len(), 1);
        assert_eq!(g.remove_edge_between(a, b), 1);
        assert!(!g.exists(a, b));
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut g = graph();
        let a = g.add_node(NodeKind::Comb, "a");
        let b = g.add_node(NodeKind::Comb, "b");
        let c = g.add_node(NodeKind::Comb, "c");
        g.add_edge(EdgeKind::DATA, a, b).unwrap();
        g.add_edge(EdgeKind::DATA, b, c).unwrap();
        g.add_edge(EdgeKind::DATA, b, b).unwrap();
        g.remove_node(b).unwrap();
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 0);
        assert!(g.get_node_by_name("b").is_none());
        // survivors keep their handles
        assert!(g.node(a).is_some());
        assert!(g.node(c).is_some());
    }

    #[test]
    fn duplicate_name_is_last_write_wins() {
        let mut g = graph();
        let first = g.add_node(NodeKind::Comb, "sig");
        let second = g.add_node(NodeKind::FlipFlop, "sig");
        assert_ne!(first, second);
        // the map now resolves to the newest node, the old node remains
        assert_eq!(g.get_node_by_name("sig"), Some(second));
        assert_eq!(g.num_nodes(), 2);
    }
}
