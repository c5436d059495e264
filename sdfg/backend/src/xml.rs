//! XML interchange for SDFG designs.
//!
//! The document wraps one primary `<graph>` plus one `<graph>` per distinct
//! sub-module referenced transitively, each written exactly once. Module
//! nodes carry the name of the graph they instantiate together with their
//! `<portmap>` children; that is enough for the reader to re-link the
//! hierarchy and rebuild the boundary edges, which the schema itself does
//! not represent.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use sdfg_ir::{
    Context, EdgeKind, GraphId, NodeId, NodeKind, NodeRef, PortMap,
};
use sdfg_utils::{Error, SdfgResult};

#[derive(Serialize, Deserialize)]
#[serde(rename = "sdfg")]
struct SdfgDoc {
    #[serde(rename = "graph", default)]
    graphs: Vec<XmlGraph>,
}

#[derive(Serialize, Deserialize)]
struct XmlGraph {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "node", default, skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<XmlNode>,
    #[serde(rename = "edge", default, skip_serializing_if = "Vec::is_empty")]
    edges: Vec<XmlEdge>,
}

#[derive(Serialize, Deserialize)]
struct XmlNode {
    #[serde(rename = "@id")]
    id: u64,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@type")]
    typ: String,
    #[serde(
        rename = "portmap",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    portmap: Vec<XmlPortMap>,
}

#[derive(Serialize, Deserialize)]
struct XmlPortMap {
    #[serde(rename = "@port")]
    port: String,
    #[serde(rename = "@signal")]
    signal: String,
}

#[derive(Serialize, Deserialize)]
struct XmlEdge {
    #[serde(rename = "@source")]
    source: u64,
    #[serde(rename = "@target")]
    target: u64,
    #[serde(rename = "@name", default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "@type")]
    typ: String,
}

/// Serializes the design rooted at `top` into an XML string.
pub fn to_xml_string(ctx: &Context, top: GraphId) -> SdfgResult<String> {
    let doc = build_doc(ctx, top);
    quick_xml::se::to_string(&doc)
        .map_err(|e| Error::write_error(e.to_string()))
}

/// Serializes the design rooted at `top` to `out`.
pub fn write_xml<W: Write>(
    ctx: &Context,
    top: GraphId,
    out: &mut W,
) -> SdfgResult<()> {
    let text = to_xml_string(ctx, top)?;
    out.write_all(text.as_bytes())
        .and_then(|_| out.write_all(b"\n"))
        .map_err(|e| Error::write_error(e.to_string()))
}

fn build_doc(ctx: &Context, top: GraphId) -> SdfgDoc {
    let mut graphs = Vec::new();
    let mut written: HashSet<String> = HashSet::new();
    // descendants() puts `top` first and each child exactly once
    for g in ctx.descendants(top) {
        let name = &ctx.graph(g).name;
        if !written.insert(name.clone()) {
            log::warn!("duplicate module name `{name}` skipped in XML output");
            continue;
        }
        graphs.push(graph_to_xml(ctx, g));
    }
    SdfgDoc { graphs }
}

fn graph_to_xml(ctx: &Context, g: GraphId) -> XmlGraph {
    let graph = ctx.graph(g);
    let mut ids: HashMap<NodeId, u64> = HashMap::new();
    let mut nodes = Vec::new();
    for (id, node) in graph.nodes() {
        let xid = nodes.len() as u64;
        ids.insert(id, xid);
        // a module node is written under the name of the graph it
        // instantiates so the reader can re-link by name
        let name = match node.child {
            Some(child) => ctx.graph(child).name.clone(),
            None => node.name.clone(),
        };
        nodes.push(XmlNode {
            id: xid,
            name,
            typ: node.kind.tag().to_string(),
            portmap: node
                .portmap
                .iter()
                .map(|pm| XmlPortMap {
                    port: pm.port.clone(),
                    signal: pm.signal.clone(),
                })
                .collect(),
        });
    }
    // boundary edges are left out; they are rebuilt from the portmaps
    let edges = graph
        .edges()
        .filter(|(_, e)| e.src.graph == g && e.dst.graph == g)
        .map(|(_, e)| XmlEdge {
            source: ids[&e.src.node],
            target: ids[&e.dst.node],
            name: e.name.clone(),
            typ: e.kind.tag().to_string(),
        })
        .collect();
    XmlGraph {
        name: graph.name.clone(),
        nodes,
        edges,
    }
}

/// Deserializes an SDFG document from a reader. The first `<graph>` becomes
/// the entrypoint of the returned context.
pub fn read_xml<R: BufRead>(reader: R) -> SdfgResult<Context> {
    let doc: SdfgDoc = quick_xml::de::from_reader(reader)
        .map_err(|e| Error::parse_error(e.to_string()))?;
    build_context(doc)
}

/// Deserializes an SDFG document from a string.
pub fn read_xml_str(text: &str) -> SdfgResult<Context> {
    let doc: SdfgDoc = quick_xml::de::from_str(text)
        .map_err(|e| Error::parse_error(e.to_string()))?;
    build_context(doc)
}

fn build_context(doc: SdfgDoc) -> SdfgResult<Context> {
    if doc.graphs.is_empty() {
        return Err(Error::invalid_file("document contains no graph"));
    }
    let mut ctx = Context::new();

    // pass 1: graphs, nodes, and graph-local edges
    for xg in &doc.graphs {
        if ctx.graph_by_name(&xg.name).is_some() {
            return Err(Error::invalid_file(format!(
                "graph `{}` appears twice",
                xg.name
            )));
        }
        let g = ctx.add_graph(&xg.name);
        let mut map: HashMap<u64, NodeId> = HashMap::new();
        for xn in &xg.nodes {
            let kind = NodeKind::from_tag(&xn.typ).ok_or_else(|| {
                Error::invalid_file(format!(
                    "unknown node type `{}` in graph `{}`",
                    xn.typ, xg.name
                ))
            })?;
            let id = ctx.graph_mut(g).add_node(kind, &xn.name);
            if map.insert(xn.id, id).is_some() {
                return Err(Error::invalid_file(format!(
                    "node id {} appears twice in graph `{}`",
                    xn.id, xg.name
                )));
            }
            if !xn.portmap.is_empty() {
                if let Some(node) = ctx.graph_mut(g).node_mut(id) {
                    node.portmap = xn
                        .portmap
                        .iter()
                        .map(|pm| PortMap {
                            port: pm.port.clone(),
                            signal: pm.signal.clone(),
                        })
                        .collect();
                }
            }
        }
        for xe in &xg.edges {
            let kind = EdgeKind::from_tag(&xe.typ).ok_or_else(|| {
                Error::invalid_file(format!(
                    "unknown edge type `{}` in graph `{}`",
                    xe.typ, xg.name
                ))
            })?;
            let endpoint = |id: u64| {
                map.get(&id).copied().ok_or_else(|| {
                    Error::invalid_file(format!(
                        "edge endpoint {id} missing in graph `{}`",
                        xg.name
                    ))
                })
            };
            let (s, d) = (endpoint(xe.source)?, endpoint(xe.target)?);
            ctx.add_edge(
                g,
                kind,
                NodeRef::new(g, s),
                NodeRef::new(g, d),
                &xe.name,
            )?;
        }
    }

    // pass 2: re-link module nodes to their child graphs by name
    let mut metas: Vec<NodeRef> = Vec::new();
    for (g, graph) in ctx.graphs() {
        for (id, node) in graph.nodes() {
            if node.kind == NodeKind::Module {
                metas.push(NodeRef::new(g, id));
            }
        }
    }
    for meta in &metas {
        let name = match ctx.resolve(*meta) {
            Some(node) => node.name.clone(),
            None => continue,
        };
        match ctx.graph_by_name(&name) {
            Some(child) if child != meta.graph => {
                ctx.connect_child(*meta, child)?;
            }
            Some(_) => {
                return Err(Error::invalid_file(format!(
                    "module `{name}` instantiates itself"
                )));
            }
            None => {
                // external module, left as a leaf meta-node
                log::warn!("no graph found for module `{name}`");
            }
        }
    }

    // pass 3: rebuild the boundary edges from the portmaps
    for meta in metas {
        rebuild_boundary(&mut ctx, meta)?;
    }

    let entry = ctx
        .graph_by_name(&doc.graphs[0].name)
        .ok_or_else(|| Error::invalid_file("entry graph lookup failed"))?;
    ctx.set_entrypoint(entry);
    Ok(ctx)
}

/// Wires the parent signals named in `meta`'s portmap to the matching port
/// nodes of its child graph. The edge kind mirrors the graph-local edge
/// between the signal and the meta-node, defaulting to Data.
fn rebuild_boundary(ctx: &mut Context, meta: NodeRef) -> SdfgResult<()> {
    let Some(node) = ctx.resolve(meta) else {
        return Ok(());
    };
    let Some(child) = node.child else {
        return Ok(());
    };
    let portmap = node.portmap.clone();
    for pm in portmap {
        let Some(port) = ctx.graph(child).get_node_by_name(&pm.port) else {
            log::warn!(
                "portmap names missing port `{}` in `{}`",
                pm.port,
                ctx.graph(child).name
            );
            continue;
        };
        let Some(sig) = ctx.graph(meta.graph).get_node_by_name(&pm.signal)
        else {
            log::warn!(
                "portmap names missing signal `{}` in `{}`",
                pm.signal,
                ctx.graph(meta.graph).name
            );
            continue;
        };
        let kind = boundary_kind(ctx, meta, sig);
        let s = NodeRef::new(meta.graph, sig);
        let p = NodeRef::new(child, port);
        let dir = ctx.graph(child).node(port).map(|n| n.kind);
        match dir {
            Some(NodeKind::InputPort) => {
                ctx.add_edge(meta.graph, kind, s, p, &pm.signal)?;
            }
            Some(NodeKind::OutputPort) => {
                ctx.add_edge(meta.graph, kind, p, s, &pm.signal)?;
            }
            Some(NodeKind::InOutPort) => {
                ctx.add_edge(meta.graph, kind, s, p, &pm.signal)?;
                ctx.add_edge(meta.graph, kind, p, s, &pm.signal)?;
            }
            _ => {
                log::warn!(
                    "portmap target `{}` is not a port node",
                    pm.port
                );
            }
        }
    }
    Ok(())
}

fn boundary_kind(ctx: &Context, meta: NodeRef, sig: NodeId) -> EdgeKind {
    let graph = ctx.graph(meta.graph);
    let kind = graph
        .edges_between(sig, meta.node)
        .into_iter()
        .chain(graph.edges_between(meta.node, sig))
        .filter_map(|e| graph.edge(e).map(|e| e.kind))
        .fold(EdgeKind::empty(), |acc, k| acc | k);
    if kind.is_empty() { EdgeKind::DATA } else { kind }
}
