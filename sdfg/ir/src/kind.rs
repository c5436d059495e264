use bitflags::bitflags;

/// The netlist element a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    InputPort,
    OutputPort,
    InOutPort,
    /// Combinational signal or expression.
    Comb,
    FlipFlop,
    Latch,
    /// Instance of another module; carries a `child` graph.
    Module,
    /// Opaque primitive instance.
    Gate,
}

impl NodeKind {
    pub fn is_port(self) -> bool {
        matches!(
            self,
            NodeKind::InputPort | NodeKind::OutputPort | NodeKind::InOutPort
        )
    }

    /// Flip-flops and latches.
    pub fn is_register(self) -> bool {
        matches!(self, NodeKind::FlipFlop | NodeKind::Latch)
    }

    /// Registers and ports terminate path expansion.
    pub fn is_stopping(self) -> bool {
        self.is_register() || self.is_port()
    }

    /// Tag used in the XML interchange format.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::InputPort => "iport",
            NodeKind::OutputPort => "oport",
            NodeKind::InOutPort => "port",
            NodeKind::Comb => "combi",
            NodeKind::FlipFlop => "ff",
            NodeKind::Latch => "latch",
            NodeKind::Module => "module",
            // The interchange schema has no gate tag.
            NodeKind::Gate => "unknown",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "iport" => Some(NodeKind::InputPort),
            "oport" => Some(NodeKind::OutputPort),
            "port" => Some(NodeKind::InOutPort),
            "combi" => Some(NodeKind::Comb),
            "ff" => Some(NodeKind::FlipFlop),
            "latch" => Some(NodeKind::Latch),
            "module" => Some(NodeKind::Module),
            "unknown" => Some(NodeKind::Gate),
            _ => None,
        }
    }
}

bitflags! {
    /// Capability set carried by an edge. A single edge may be data and
    /// control at the same time, so this stays a typed bitmask rather than
    /// a sum type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct EdgeKind: u16 {
        const DATA    = 1;
        const CONTROL = 1 << 1;
        const CLOCK   = 1 << 2;
        const RESET   = 1 << 3;
        const ADDRESS = 1 << 4;
        /// Write-side data mask.
        const WMASK   = 1 << 5;
        /// Read-side data mask.
        const RMASK   = 1 << 6;
    }
}

impl EdgeKind {
    /// Chain rule applied between consecutive hops of a path. Identity on
    /// an empty prefix, bitwise OR otherwise; bits already set are never
    /// cleared, so the aggregated kind of a growing path is monotone.
    pub fn combine(self, next: EdgeKind) -> EdgeKind {
        if self.is_empty() { next } else { self | next }
    }

    /// Tag used in the XML interchange format. Pure clock and pure reset
    /// keep their own tags; mixed kinds collapse onto the dominant bit.
    pub fn tag(self) -> &'static str {
        if self == EdgeKind::CLOCK {
            "clk"
        } else if self == EdgeKind::RESET {
            "rst"
        } else if self.contains(EdgeKind::DATA) {
            "data"
        } else if self.contains(EdgeKind::CONTROL) {
            "control"
        } else {
            "unknown"
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "data" => Some(EdgeKind::DATA),
            "control" => Some(EdgeKind::CONTROL),
            "clk" => Some(EdgeKind::CLOCK),
            "rst" => Some(EdgeKind::RESET),
            "unknown" => Some(EdgeKind::empty()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_is_monotone() {
        let a = EdgeKind::DATA;
        let b = EdgeKind::CONTROL | EdgeKind::CLOCK;
        assert_eq!(a.combine(b), a | b);
        assert_eq!(EdgeKind::empty().combine(b), b);
        // chaining never clears bits
        assert!(a.combine(b).contains(a));
    }

    #[test]
    fn tags_are_closed() {
        for kind in [EdgeKind::DATA, EdgeKind::CONTROL, EdgeKind::CLOCK, EdgeKind::RESET]
        {
            assert_eq!(EdgeKind::from_tag(kind.tag()), Some(kind));
        }
    }
}
