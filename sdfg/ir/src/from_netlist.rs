//! Construction of SDFGs from an elaborated netlist.
//!
//! The elaborator stays outside this crate; it exposes one module at a
//! time through [`NetlistModule`] and the extractor walks the enumeration
//! once per distinct module, recursing into sub-instances. Instance
//! connections become a local edge to the Module meta-node (which carries
//! the port map) plus a boundary edge to the child graph's port node, so
//! hierarchical traversal can proxy through the boundary.

use std::collections::HashMap;

use sdfg_utils::{Error, SdfgResult};

use crate::{
    Context, EdgeKind, GraphId, NetRef, NodeKind, NodeRef, PortMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl PortDirection {
    fn node_kind(self) -> NodeKind {
        match self {
            PortDirection::Input => NodeKind::InputPort,
            PortDirection::Output => NodeKind::OutputPort,
            PortDirection::Inout => NodeKind::InOutPort,
        }
    }
}

/// Storage class of a declared net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Wire,
    FlipFlop,
    Latch,
}

impl StorageClass {
    fn node_kind(self) -> NodeKind {
        match self {
            StorageClass::Wire => NodeKind::Comb,
            StorageClass::FlipFlop => NodeKind::FlipFlop,
            StorageClass::Latch => NodeKind::Latch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortDecl {
    pub name: String,
    pub dir: PortDirection,
    /// Opaque handle onto the originating netlist object, carried through
    /// onto the node untouched.
    pub backref: Option<NetRef>,
}

#[derive(Debug, Clone)]
pub struct NetDecl {
    pub name: String,
    pub class: StorageClass,
    pub backref: Option<NetRef>,
}

/// What an instance instantiates.
#[derive(Debug, Clone)]
pub enum InstanceClass {
    /// A module known to the design, by name.
    Module(String),
    /// An opaque primitive.
    Gate,
}

/// One connection of an instance: the instantiated element's port `port`
/// is wired to the enclosing module's signal `signal`.
#[derive(Debug, Clone)]
pub struct Connection {
    pub port: String,
    pub signal: String,
    pub dir: PortDirection,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone)]
pub struct InstanceDecl {
    pub name: String,
    pub class: InstanceClass,
    pub connections: Vec<Connection>,
}

/// One driver: `target` is driven by each of `sources` with the given
/// edge kind (data, control, clock, reset, ...).
#[derive(Debug, Clone)]
pub struct DriverDecl {
    pub target: String,
    pub sources: Vec<(String, EdgeKind)>,
}

/// One elaborated module, enumerated in declaration order: ports, then
/// nets, then instances, then drivers.
pub trait NetlistModule {
    fn name(&self) -> &str;
    fn ports(&self) -> Vec<PortDecl>;
    fn nets(&self) -> Vec<NetDecl>;
    fn instances(&self) -> Vec<InstanceDecl>;
    fn drivers(&self) -> Vec<DriverDecl>;
}

/// An elaborated design: modules addressable by name.
pub trait NetlistDesign {
    type Module: NetlistModule;
    fn module(&self, name: &str) -> Option<&Self::Module>;
}

/// Builds one [`Graph`](crate::Graph) per distinct module reachable from
/// `top` and returns the populated context with its entrypoint set.
pub fn extract_design<D: NetlistDesign>(
    design: &D,
    top: &str,
) -> SdfgResult<Context> {
    let mut ctx = Context::new();
    let mut seen = HashMap::new();
    let top_id = extract_module(&mut ctx, design, top, &mut seen)?;
    ctx.set_entrypoint(top_id);
    Ok(ctx)
}

fn extract_module<D: NetlistDesign>(
    ctx: &mut Context,
    design: &D,
    name: &str,
    seen: &mut HashMap<String, GraphId>,
) -> SdfgResult<GraphId> {
    if let Some(id) = seen.get(name) {
        return Ok(*id);
    }
    let module = design
        .module(name)
        .ok_or_else(|| Error::undefined(format!("module `{name}`")))?;
    let id = ctx.add_graph(name);
    seen.insert(name.to_string(), id);
    log::debug!("extracting module `{name}`");

    for port in module.ports() {
        let n = ctx.graph_mut(id).add_node(port.dir.node_kind(), &port.name);
        if let Some(node) = ctx.graph_mut(id).node_mut(n) {
            node.backref = port.backref;
        }
    }
    for net in module.nets() {
        let n = ctx.graph_mut(id).add_node(net.class.node_kind(), &net.name);
        if let Some(node) = ctx.graph_mut(id).node_mut(n) {
            node.backref = net.backref;
        }
    }

    for inst in module.instances() {
        match inst.class {
            InstanceClass::Gate => {
                let gate = ctx.graph_mut(id).add_node(NodeKind::Gate, &inst.name);
                for conn in &inst.connections {
                    wire_local(ctx, id, gate, conn)?;
                }
            }
            InstanceClass::Module(ref module_name) => {
                let child = extract_module(ctx, design, module_name, seen)?;
                let meta = ctx.graph_mut(id).add_node(NodeKind::Module, &inst.name);
                ctx.connect_child(NodeRef::new(id, meta), child)?;
                for conn in &inst.connections {
                    wire_local(ctx, id, meta, conn)?;
                    wire_boundary(ctx, id, child, conn)?;
                    if let Some(node) = ctx.resolve_mut(NodeRef::new(id, meta))
                    {
                        node.portmap.push(PortMap {
                            port: conn.port.clone(),
                            signal: conn.signal.clone(),
                        });
                    }
                }
            }
        }
    }

    for driver in module.drivers() {
        let target = lookup(ctx, id, &driver.target)?;
        for (source, kind) in &driver.sources {
            let source = lookup(ctx, id, source)?;
            ctx.graph_mut(id).add_edge(*kind, source, target)?;
        }
    }
    Ok(id)
}

/// Edge between the enclosing module's signal and the instance node
/// itself, directed by the connection's port direction.
fn wire_local(
    ctx: &mut Context,
    graph: GraphId,
    inst: crate::NodeId,
    conn: &Connection,
) -> SdfgResult<()> {
    let signal = lookup(ctx, graph, &conn.signal)?;
    let g = ctx.graph_mut(graph);
    match conn.dir {
        PortDirection::Input => {
            g.add_edge(conn.kind, signal, inst)?;
        }
        PortDirection::Output => {
            g.add_edge(conn.kind, inst, signal)?;
        }
        PortDirection::Inout => {
            g.add_edge(conn.kind, signal, inst)?;
            g.add_edge(conn.kind, inst, signal)?;
        }
    }
    Ok(())
}

/// Boundary edge proxying the parent signal onto the child graph's port
/// node, so cross-boundary traversal can walk into the instance.
fn wire_boundary(
    ctx: &mut Context,
    graph: GraphId,
    child: GraphId,
    conn: &Connection,
) -> SdfgResult<()> {
    let signal = NodeRef::new(graph, lookup(ctx, graph, &conn.signal)?);
    let port = ctx
        .graph(child)
        .get_node_by_name(&conn.port)
        .ok_or_else(|| {
            Error::malformed_structure(format!(
                "instance connects missing port `{}` of `{}`",
                conn.port,
                ctx.graph(child).name
            ))
        })?;
    let port = NodeRef::new(child, port);
    match conn.dir {
        PortDirection::Input => {
            ctx.add_edge(graph, conn.kind, signal, port, &conn.signal)?;
        }
        PortDirection::Output => {
            ctx.add_edge(graph, conn.kind, port, signal, &conn.signal)?;
        }
        PortDirection::Inout => {
            ctx.add_edge(graph, conn.kind, signal, port, &conn.signal)?;
            ctx.add_edge(graph, conn.kind, port, signal, &conn.signal)?;
        }
    }
    Ok(())
}

fn lookup(
    ctx: &Context,
    graph: GraphId,
    name: &str,
) -> SdfgResult<crate::NodeId> {
    ctx.graph(graph).get_node_by_name(name).ok_or_else(|| {
        Error::undefined(format!(
            "signal `{name}` in module `{}`",
            ctx.graph(graph).name
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeModule {
        name: &'static str,
        ports: Vec<PortDecl>,
        nets: Vec<NetDecl>,
        instances: Vec<InstanceDecl>,
        drivers: Vec<DriverDecl>,
    }

    impl NetlistModule for FakeModule {
        fn name(&self) -> &str {
            self.name
        }
        fn ports(&self) -> Vec<PortDecl> {
            self.ports.clone()
        }
        fn nets(&self) -> Vec<NetDecl> {
            self.nets.clone()
        }
        fn instances(&self) -> Vec<InstanceDecl> {
            self.instances.clone()
        }
        fn drivers(&self) -> Vec<DriverDecl> {
            self.drivers.clone()
        }
    }

    struct FakeDesign(Vec<FakeModule>);

    impl NetlistDesign for FakeDesign {
        type Module = FakeModule;
        fn module(&self, name: &str) -> Option<&FakeModule> {
            self.0.iter().find(|m| m.name == name)
        }
    }

    fn port(name: &str, dir: PortDirection) -> PortDecl {
        PortDecl {
            name: name.to_string(),
            dir,
            backref: None,
        }
    }

    fn net(name: &str, class: StorageClass) -> NetDecl {
        NetDecl {
            name: name.to_string(),
            class,
            backref: None,
        }
    }

    #[test]
    fn extracts_hierarchy_with_boundary_edges() {
        let sub = FakeModule {
            name: "sub",
            ports: vec![
                port("d", PortDirection::Input),
                port("q", PortDirection::Output),
            ],
            nets: vec![net("r", StorageClass::FlipFlop)],
            instances: vec![],
            drivers: vec![
                DriverDecl {
                    target: "r".into(),
                    sources: vec![("d".into(), EdgeKind::DATA)],
                },
                DriverDecl {
                    target: "q".into(),
                    sources: vec![("r".into(), EdgeKind::DATA)],
                },
            ],
        };
        let top = FakeModule {
            name: "top",
            ports: vec![
                port("in", PortDirection::Input),
                port("out", PortDirection::Output),
            ],
            nets: vec![],
            instances: vec![InstanceDecl {
                name: "u0".into(),
                class: InstanceClass::Module("sub".into()),
                connections: vec![
                    Connection {
                        port: "d".into(),
                        signal: "in".into(),
                        dir: PortDirection::Input,
                        kind: EdgeKind::DATA,
                    },
                    Connection {
                        port: "q".into(),
                        signal: "out".into(),
                        dir: PortDirection::Output,
                        kind: EdgeKind::DATA,
                    },
                ],
            }],
            drivers: vec![],
        };
        let ctx = extract_design(&FakeDesign(vec![sub, top]), "top").unwrap();
        let top_id = ctx.entrypoint().unwrap();
        let sub_id = ctx.graph_by_name("sub").unwrap();

        let meta = ctx.graph(top_id).get_node_by_name("u0").unwrap();
        let meta_node = ctx.graph(top_id).node(meta).unwrap();
        assert_eq!(meta_node.kind, NodeKind::Module);
        assert_eq!(meta_node.child, Some(sub_id));
        assert_eq!(meta_node.portmap.len(), 2);
        assert_eq!(ctx.graph(sub_id).father.map(|f| f.node), Some(meta));

        // parent signal proxies onto the child port
        let sig = ctx.graph(top_id).get_node_by_name("in").unwrap();
        let succs = ctx.succs(NodeRef::new(top_id, sig));
        let d = ctx.graph(sub_id).get_node_by_name("d").unwrap();
        assert!(succs.contains(&(NodeRef::new(sub_id, d), EdgeKind::DATA)));
    }

    #[test]
    fn missing_module_is_an_error() {
        let top = FakeModule {
            name: "top",
            ports: vec![],
            nets: vec![],
            instances: vec![InstanceDecl {
                name: "u0".into(),
                class: InstanceClass::Module("ghost".into()),
                connections: vec![],
            }],
            drivers: vec![],
        };
        assert!(extract_design(&FakeDesign(vec![top]), "top").is_err());
    }
}
