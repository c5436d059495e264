//! Node and edge entities stored in a graph's arenas.
use smallvec::SmallVec;

use crate::{EdgeKind, EdgeRef, GraphId, NodeKind, NodeRef};

/// Opaque token identifying the netlist object a node was extracted from.
/// Minted by the elaborator and never interpreted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetRef(pub u64);

/// Position and bounding box used only by export tooling. Analysis never
/// reads these.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GraphicInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One entry of a module instance's port map: the child module's port
/// `port` is connected to the parent signal `signal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMap {
    pub port: String,
    pub signal: String,
}

/// A netlist element inside one graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Flat name within the owning module.
    pub name: String,
    /// Module-qualified name.
    pub hier_name: String,
    pub kind: NodeKind,
    /// The instantiated module's graph. Only set for [`NodeKind::Module`].
    pub child: Option<GraphId>,
    /// Back-reference into the elaborated netlist.
    pub backref: Option<NetRef>,
    pub graphics: GraphicInfo,
    /// Port-to-signal wiring of a module instance. Empty for other kinds.
    pub portmap: Vec<PortMap>,
    /// Edges leaving this node. The edge may be owned by another graph
    /// when it crosses a module boundary.
    pub(crate) succs: SmallVec<[EdgeRef; 4]>,
    /// Edges entering this node.
    pub(crate) preds: SmallVec<[EdgeRef; 4]>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, name: &str, hier_name: String) -> Self {
        Self {
            name: name.to_string(),
            hier_name,
            kind,
            child: None,
            backref: None,
            graphics: GraphicInfo::default(),
            portmap: Vec::new(),
            succs: SmallVec::new(),
            preds: SmallVec::new(),
        }
    }

    /// Edges leaving this node, wherever they are owned.
    pub fn out_edge_refs(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.succs.iter().copied()
    }

    /// Edges entering this node, wherever they are owned.
    pub fn in_edge_refs(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.preds.iter().copied()
    }
}

/// A directed, typed connection between two nodes. Graphs are multigraphs:
/// parallel edges and self-edges are allowed.
#[derive(Debug, Clone)]
pub struct Edge {
    pub kind: EdgeKind,
    pub src: NodeRef,
    pub dst: NodeRef,
    /// Name of the signal the edge was derived from. Export-only.
    pub name: String,
}
