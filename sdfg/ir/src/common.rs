//! Graph-local and fully-qualified handles.
use sdfg_utils::impl_index;

/// Handle for a node within one [`Graph`](crate::Graph).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);
impl_index!(NodeId);

/// Handle for an edge within one [`Graph`](crate::Graph).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u32);
impl_index!(EdgeId);

/// Handle for a graph within a [`Context`](crate::Context).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u32);
impl_index!(GraphId);

/// A node handle qualified with its owning graph. Boundary edges connect
/// nodes that live in different graphs, so edge endpoints are always stored
/// in this form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub graph: GraphId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(graph: GraphId, node: NodeId) -> Self {
        Self { graph, node }
    }
}

/// An edge handle qualified with the graph that owns the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeRef {
    pub graph: GraphId,
    pub edge: EdgeId,
}

impl EdgeRef {
    pub fn new(graph: GraphId, edge: EdgeId) -> Self {
        Self { graph, edge }
    }
}
