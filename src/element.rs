//! Navigation contract the dumper and tag graph rely on

use crate::parse_xml::XmlNode;
use std::borrow::Cow;
use std::marker::PhantomData;

/// A read-only handle to an XML-like element borrowed from a document `'a`.
///
/// Handles are cheap copies: `&XmlNode` for the owned tree, or an index/node
/// handle for arena-backed documents. Implementors supply the tag, direct
/// text, ordered children and a unique path; lookup by child tag and
/// descendant traversal come for free.
pub trait Element<'a>: Copy + 'a {
    type Children: DoubleEndedIterator<Item = Self> + 'a;

    fn tag(self) -> &'a str;

    /// Direct text of this element, excluding descendants' text
    fn text(self) -> Option<&'a str>;

    fn children(self) -> Self::Children;

    fn path(self) -> Cow<'a, str>;

    /// First direct child with the given tag
    fn find_child(self, tag: &str) -> Option<Self> {
        self.children().find(|c| c.tag() == tag)
    }

    /// Pre-order traversal of this element and everything below it
    fn descendants(self) -> Descendants<'a, Self> {
        Descendants { stack: vec![self], _doc: PhantomData }
    }
}

/// Iterator returned by [`Element::descendants`]; yields self first
pub struct Descendants<'a, E> {
    stack: Vec<E>,
    _doc: PhantomData<&'a ()>,
}

impl<'a, E: Element<'a>> Iterator for Descendants<'a, E> {
    type Item = E;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().rev());
        Some(node)
    }
}

impl<'a> Element<'a> for &'a XmlNode {
    type Children = std::slice::Iter<'a, XmlNode>;

    fn tag(self) -> &'a str {
        &self.name
    }

    fn text(self) -> Option<&'a str> {
        if self.text_content.is_empty() {
            None
        } else {
            Some(&self.text_content)
        }
    }

    fn children(self) -> Self::Children {
        self.children.iter()
    }

    fn path(self) -> Cow<'a, str> {
        Cow::Borrowed(&self.path)
    }
}
