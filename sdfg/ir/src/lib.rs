//! Internal representation for the SDFG engine.
//!
//! An SDFG is a typed multigraph over the elements of one elaborated
//! netlist module: ports, registers, combinational signals, and instances.
//! Graphs form a tree through module instantiation; every entity is
//! addressed by an arena index, never by pointer.

mod common;
mod context;
mod graph;
mod kind;
mod printer;
mod structure;

/// Module to build graphs from an elaborated netlist.
pub mod from_netlist;

pub use common::{EdgeId, EdgeRef, GraphId, NodeId, NodeRef};
pub use context::Context;
pub use graph::Graph;
pub use kind::{EdgeKind, NodeKind};
pub use printer::Printer;
pub use structure::{Edge, GraphicInfo, NetRef, Node, PortMap};
