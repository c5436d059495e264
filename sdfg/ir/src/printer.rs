//! Plain-text rendering of graphs for reports.
use std::io;

use itertools::Itertools;
use sdfg_utils::IndexRef;

use crate::{Context, Graph, GraphId};

pub struct Printer;

impl Printer {
    /// Writes a listing of one graph: nodes with their kind tag, then
    /// edges with their kind tag.
    pub fn write_graph<W: io::Write>(
        graph: &Graph,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "graph {} {{", graph.name)?;
        for (_, node) in graph.nodes() {
            write!(out, "  [{}] {}", node.kind.tag(), node.name)?;
            if node.portmap.is_empty() {
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    " ({})",
                    node.portmap
                        .iter()
                        .map(|pm| format!("{}={}", pm.port, pm.signal))
                        .join(", ")
                )?;
            }
        }
        for (_, edge) in graph.edges() {
            writeln!(
                out,
                "  {} -> {} [{}]",
                edge.src.node.index(),
                edge.dst.node.index(),
                edge.kind.tag()
            )?;
        }
        writeln!(out, "}}")
    }

    /// Writes the whole design tree starting at `top`.
    pub fn write_context<W: io::Write>(
        ctx: &Context,
        top: GraphId,
        out: &mut W,
    ) -> io::Result<()> {
        for id in ctx.descendants(top) {
            Self::write_graph(ctx.graph(id), out)?;
        }
        Ok(())
    }
}
