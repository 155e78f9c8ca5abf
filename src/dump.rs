//! Rule-driven outline of an XML tree
//!
//! Each visited element becomes a summary of the form `label (path): text`,
//! indented four spaces per depth level and wrapped to the configured width.
//! The label is the text of the element's `title` child, or `[tag]` when it
//! has none.
//!
//! ```ignore
//! let book = parse_xml_file("protocol.xml")?;
//! let dumper = TreeDumper::new(DumpConfig { maxdepth: MaxDepth::Limit(2), ..Default::default() });
//! dumper.dump(&book, &DumpOptions::new())?;
//! ```

use crate::config::{DumpConfig, DumpOptions, MaxDepth};
use crate::element::Element;
use crate::error::{ConfigurationError, DumpError};
use crate::rules::{FormatSpec, Ruleset};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::io::{self, Write};
use textwrap::{Options, WordSeparator, WrapAlgorithm};
use tracing::debug;

/// One wrapped block of output, possibly spanning several physical lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub depth: usize,
    pub text: String,
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renders elements according to a ruleset, holding default settings that
/// individual calls may override.
#[derive(Debug, Clone, Default)]
pub struct TreeDumper {
    config: DumpConfig,
}

impl TreeDumper {
    pub fn new(config: DumpConfig) -> Self {
        TreeDumper { config }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Lazily renders `node` and, as the rules allow, its descendants.
    ///
    /// The ruleset is resolved up front, so an unknown preset fails here. A tag
    /// that no rule covers surfaces as an `Err` item, after which the iterator
    /// is exhausted.
    pub fn lines<'a, E: Element<'a>>(
        &self,
        node: E,
        options: &DumpOptions,
    ) -> Result<DumpLines<'a, E>, ConfigurationError> {
        if self.config.width == 0 {
            return Err(ConfigurationError::InvalidWidth(self.config.width));
        }
        let rules = match &options.rules {
            Some(source) => source.resolve()?,
            None => self.config.rules.resolve()?,
        };
        let depth = options.depth.unwrap_or(self.config.depth);
        let maxdepth = options.maxdepth.unwrap_or(self.config.maxdepth);
        debug!(tag = node.tag(), depth, ?maxdepth, "starting dump");

        Ok(DumpLines {
            rules,
            maxdepth,
            width: self.config.width,
            stack: vec![(node, depth)],
            pending: VecDeque::new(),
            _doc: PhantomData,
        })
    }

    /// Writes the outline to standard output
    pub fn dump<'a, E: Element<'a>>(&self, node: E, options: &DumpOptions) -> Result<(), DumpError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.dump_to(&mut out, node, options)
    }

    pub fn dump_to<'a, W: Write, E: Element<'a>>(
        &self,
        writer: &mut W,
        node: E,
        options: &DumpOptions,
    ) -> Result<(), DumpError> {
        for line in self.lines(node, options)? {
            writeln!(writer, "{}", line?)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Renders the whole outline into a string, one block per line
    pub fn render<'a, E: Element<'a>>(&self, node: E, options: &DumpOptions) -> Result<String, ConfigurationError> {
        let mut out = String::new();
        for line in self.lines(node, options)? {
            out.push_str(&line?.text);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Pre-order stream of rendered blocks, see [`TreeDumper::lines`]
pub struct DumpLines<'a, E> {
    rules: Ruleset,
    maxdepth: MaxDepth,
    width: usize,
    stack: Vec<(E, usize)>,
    // Second block of a `linebreak` element
    pending: VecDeque<RenderedLine>,
    _doc: PhantomData<&'a ()>,
}

impl<'a, E: Element<'a>> Iterator for DumpLines<'a, E> {
    type Item = Result<RenderedLine, ConfigurationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.pop_front() {
            return Some(Ok(line));
        }
        let (node, depth) = self.stack.pop()?;
        let spec = match self.rules.lookup(node.tag()) {
            Ok(spec) => spec,
            Err(err) => {
                // Nothing further is rendered after a missing rule
                self.stack.clear();
                return Some(Err(err));
            }
        };

        if spec.recurse && self.maxdepth.allows_children_of(depth) {
            self.stack
                .extend(node.children().rev().map(|child| (child, depth + 1)));
        }

        let mut blocks = format_element(node, depth, &spec, self.width).into_iter();
        let first = blocks.next()?;
        self.pending.extend(blocks);
        Some(Ok(first))
    }
}

/// Renders a single element as one block, or two when `spec.linebreak` is set
pub fn format_element<'a, E: Element<'a>>(
    node: E,
    depth: usize,
    spec: &FormatSpec,
    width: usize,
) -> Vec<RenderedLine> {
    let label = match node.find_child("title").and_then(|t| t.text()) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => format!("[{}]", node.tag()),
    };
    let path = node.path();
    let text = node.text().map(textwrap::dedent).unwrap_or_default();

    if spec.linebreak {
        let summary = format!("{} ({}):", label, path);
        vec![
            RenderedLine { depth, text: relwrap(&summary, depth, width) },
            RenderedLine { depth: depth + 1, text: relwrap(&text, depth + 1, width) },
        ]
    } else {
        let summary = if spec.with_text {
            format!("{} ({}): {}", label, path, text)
        } else {
            format!("{} ({})", label, path)
        };
        vec![RenderedLine { depth, text: relwrap(&summary, depth, width) }]
    }
}

/// Wraps `text` to `width` columns, indenting four spaces per `depth` level.
///
/// Continuation lines get two extra spaces. Tabs expand to 8-column stops,
/// then every whitespace character becomes a plain space, so embedded
/// newlines do not survive wrapping. Each line carries at least one character
/// even when the indent alone fills `width`.
pub fn relwrap(text: &str, depth: usize, width: usize) -> String {
    let flat: String = expand_tabs(text)
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.trim().is_empty() {
        return String::new();
    }

    let initial_indent = "    ".repeat(depth);
    let subsequent_indent = format!("{}  ", initial_indent);
    let width = width.max(initial_indent.len() + 1);
    let options = Options::new(width)
        .initial_indent(&initial_indent)
        .subsequent_indent(&subsequent_indent)
        .word_separator(WordSeparator::AsciiSpace)
        .wrap_algorithm(WrapAlgorithm::FirstFit)
        .break_words(true);

    textwrap::wrap(&flat, &options).join("\n")
}

fn expand_tabs(text: &str) -> Cow<'_, str> {
    const TAB_STOP: usize = 8;
    if !text.contains('\t') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + TAB_STOP);
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB_STOP - column % TAB_STOP;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    Cow::Owned(out)
}
