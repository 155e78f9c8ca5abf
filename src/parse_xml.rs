use std::fs::File;
use std::io::{BufRead, BufReader};
use indexmap::IndexMap;
use anyhow::Context;
use quick_xml::escape::{unescape_with, EscapeError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use tracing::debug;

/// Represents a parsed XML element with its properties
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// The name/tag of this element
    pub name: String,
    /// Attribute names to values, in document order
    pub attributes: IndexMap<String, String>,
    /// Text preceding the first child element, comment or processing
    /// instruction, untrimmed
    pub text_content: String,
    /// Child elements
    pub children: Vec<XmlNode>,
    /// Unique locator within the document, e.g. `/book/chapter[1]/title`
    pub path: String,
}

impl XmlNode {
    /// Creates a detached node with no path assigned.
    ///
    /// Call [`XmlNode::assign_paths`] on the finished root to fill in paths.
    pub fn new(name: impl Into<String>) -> Self {
        XmlNode {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Recomputes `path` for this node (as the document root) and every descendant.
    ///
    /// A step is `tag` when the element is the only sibling with that tag,
    /// otherwise `tag[n]` with `n` counted from 1 among same-tag siblings.
    pub fn assign_paths(&mut self) {
        self.path = format!("/{}", self.name);
        assign_child_paths(self);
    }
}

fn assign_child_paths(node: &mut XmlNode) {
    let mut totals: IndexMap<String, usize> = IndexMap::new();
    for child in &node.children {
        *totals.entry(child.name.clone()).or_insert(0) += 1;
    }

    let mut seen: IndexMap<String, usize> = IndexMap::new();
    for child in node.children.iter_mut() {
        let ordinal = seen.entry(child.name.clone()).or_insert(0);
        *ordinal += 1;
        child.path = if totals[&child.name] > 1 {
            format!("{}/{}[{}]", node.path, child.name, ordinal)
        } else {
            format!("{}/{}", node.path, child.name)
        };
        assign_child_paths(child);
    }
}

/// Parses an XML file and returns the root element
///
/// # Arguments
/// * `path` - The file path to the XML file to parse
///
/// # Example
/// ```ignore
/// let book = parse_xml_file("protocol.xml")?;
/// println!("Root element: {}", book.name);
/// ```
pub fn parse_xml_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<XmlNode> {
    let file = File::open(&path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.as_ref().display(), e))?;
    debug!(path = %path.as_ref().display(), "parsing XML file");
    parse_document(Reader::from_reader(BufReader::new(file)))
}

/// Parses an XML document held in memory
pub fn parse_xml_str(xml: &str) -> anyhow::Result<XmlNode> {
    parse_document(Reader::from_str(xml))
}

fn parse_document<R: BufRead>(mut reader: Reader<R>) -> anyhow::Result<XmlNode> {
    // Text is kept verbatim; the dumper dedents it later
    reader.trim_text(false);

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let maybe_root = match event {
            Event::Start(start) => Some((start.into_owned(), false)),
            Event::Empty(start) => Some((start.into_owned(), true)),
            Event::Eof => {
                anyhow::bail!("XML document is empty");
            }
            _ => None,
        };

        if let Some((start, self_closing)) = maybe_root {
            let mut node_buf = Vec::new();
            let mut root = parse_node(&mut reader, &mut node_buf, start, self_closing)?;
            root.assign_paths();
            debug!(root = %root.name, "parsed XML document");
            return Ok(root);
        }
    }
}

fn parse_node<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: BytesStart<'static>,
    self_closing: bool,
) -> anyhow::Result<XmlNode> {
    let element_name_bytes = start.name().as_ref().to_vec();
    let element_name = String::from_utf8_lossy(&element_name_bytes).to_string();
    let attributes = collect_attributes(&start)
        .with_context(|| format!("Failed to read attributes of <{}>", element_name))?;

    let mut node = XmlNode {
        name: element_name,
        attributes,
        ..Default::default()
    };

    if self_closing {
        return Ok(node);
    }

    // Only text ahead of the first child, comment or PI belongs to this
    // element; anything later is the tail of that node.
    let mut text_done = false;
    loop {
        buf.clear();
        let event = reader.read_event_into(buf)?;
        match event {
            Event::Start(child_start) => {
                text_done = true;
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), false)?;
                node.children.push(child);
            }
            Event::Empty(child_start) => {
                text_done = true;
                let mut child_buf = Vec::new();
                let child = parse_node(reader, &mut child_buf, child_start.into_owned(), true)?;
                node.children.push(child);
            }
            Event::Comment(_) | Event::PI(_) => text_done = true,
            Event::Text(text) if !text_done => {
                let raw = reader.decoder().decode(&text)?;
                let unescaped = unescape_keeping_unknown(&raw)
                    .with_context(|| format!("Failed to decode text of <{}>", node.name))?;
                node.text_content.push_str(&unescaped);
            }
            Event::CData(text) if !text_done => {
                node.text_content.push_str(&String::from_utf8_lossy(text.as_ref()));
            }
            Event::End(end) => {
                anyhow::ensure!(
                    end.name().as_ref() == element_name_bytes.as_slice(),
                    "unexpected closing tag '</{}>' while parsing '<{}>'",
                    String::from_utf8_lossy(end.name().as_ref()),
                    node.name
                );
                return Ok(node);
            }
            Event::Eof => {
                anyhow::bail!("unexpected end of file while parsing element '{}'", node.name);
            }
            _ => {}
        }
    }
}

fn collect_attributes(start: &BytesStart<'_>) -> anyhow::Result<IndexMap<String, String>> {
    let mut map = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = std::str::from_utf8(&attr.value)?;
        let value = unescape_keeping_unknown(raw)
            .with_context(|| format!("Failed to decode attribute '{}'", key))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

/// Replaces predefined and numeric character references. Named entities that
/// only a DTD could define (`&nbsp;`, `&product;`) are left as written.
fn unescape_keeping_unknown(raw: &str) -> Result<Cow<'_, str>, EscapeError> {
    let references: Vec<&str> = raw
        .match_indices('&')
        .filter_map(|(start, _)| {
            let len = raw[start..].find(';')?;
            Some(&raw[start..=start + len])
        })
        .collect();
    unescape_with(raw, |name| {
        references
            .iter()
            .copied()
            .find(|reference| &reference[1..reference.len() - 1] == name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_index_only_repeated_tags() {
        let root = parse_xml_str(
            "<book><title>T</title><chapter/><chapter><section/></chapter></book>",
        )
        .unwrap();
        assert_eq!(root.path, "/book");
        assert_eq!(root.children[0].path, "/book/title");
        assert_eq!(root.children[1].path, "/book/chapter[1]");
        assert_eq!(root.children[2].path, "/book/chapter[2]");
        assert_eq!(root.children[2].children[0].path, "/book/chapter[2]/section");
    }

    #[test]
    fn test_text_stops_at_first_child() {
        let root = parse_xml_str("<para>\n  lead <b>bold</b> tail</para>").unwrap();
        assert_eq!(root.text_content, "\n  lead ");
        assert_eq!(root.children[0].text_content, "bold");
    }

    #[test]
    fn test_entities_and_attributes_are_decoded() {
        let root = parse_xml_str(r#"<cmd name="a &amp; b" id="1">x &lt; y</cmd>"#).unwrap();
        assert_eq!(root.text_content, "x < y");
        assert_eq!(root.attributes.get("name").map(String::as_str), Some("a & b"));
        assert_eq!(root.attributes.keys().collect::<Vec<_>>(), vec!["name", "id"]);
    }

    #[test]
    fn test_text_stops_at_comment_or_pi() {
        let root = parse_xml_str("<a>lead<!-- c --> tail <b/></a>").unwrap();
        assert_eq!(root.text_content, "lead");

        let root = parse_xml_str("<a><!-- c --> tail <b/></a>").unwrap();
        assert_eq!(root.text_content, "");

        let root = parse_xml_str("<a><?render fast?> tail</a>").unwrap();
        assert_eq!(root.text_content, "");
    }

    #[test]
    fn test_undeclared_entities_are_kept_verbatim() {
        let root = parse_xml_str(
            r#"<!DOCTYPE para [<!ENTITY nbsp "&#160;">]><para id="x&nbsp;1">a&nbsp;b &lt; c &#65;</para>"#,
        )
        .unwrap();
        assert_eq!(root.text_content, "a&nbsp;b < c A");
        assert_eq!(root.attributes.get("id").map(String::as_str), Some("x&nbsp;1"));
    }

    #[test]
    fn test_bad_reference_names_the_element() {
        let err = parse_xml_str("<book><para>x &#xZZ; y</para></book>").unwrap_err();
        assert!(format!("{:#}", err).contains("<para>"));
    }

    #[test]
    fn test_mismatched_close_is_an_error() {
        assert!(parse_xml_str("<a><b></a>").is_err());
        assert!(parse_xml_str("").is_err());
    }
}
