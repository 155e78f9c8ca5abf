//! Indented outlines of XML document structure, for sussing out the shape of
//! an unfamiliar document.
//!
//! # Module Structure
//! - `parse_xml` - Load an XML file into an owned `XmlNode` tree
//! - `element` - The navigation contract the dumper works against
//! - `rules` - Per-tag formatting rules and the `book`/`full` presets
//! - `config` - Dumper defaults and per-call overrides
//! - `dump` - The rule-driven tree dumper
//! - `tag_graph` - Parent/child tag relationship graph and Graphviz output

pub mod config;
pub mod dump;
pub mod element;
pub mod error;
pub mod parse_xml;
pub mod rules;
pub mod tag_graph;

pub use config::{DumpConfig, DumpOptions, MaxDepth};
pub use dump::{format_element, relwrap, DumpLines, RenderedLine, TreeDumper};
pub use element::Element;
pub use error::{ConfigurationError, DumpError};
pub use parse_xml::{parse_xml_file, parse_xml_str, XmlNode};
pub use rules::{FormatSpec, RulesSource, Ruleset};
pub use tag_graph::{build_tag_graph, list_tags, unique_child_tags, write_graph, write_tag_graph, TagGraph};
