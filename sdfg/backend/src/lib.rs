//! Serialization backends for SDFG designs.
//!
//! Currently one interchange format: the XML schema consumed by external
//! visualization and layout tooling.

mod xml;

pub use xml::{read_xml, read_xml_str, to_xml_string, write_xml};
