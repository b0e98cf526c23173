use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::str;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Attribute, Document, NodeId};
use crate::diagnostics::{Category, Location, Reporter};

// -----------------------------------------------------------------------------
// LineCounter

/// Turns byte offsets into line numbers.
///
/// Offsets handed to [`LineCounter::line_at`] never decrease, so each
/// byte of the input is scanned at most once.
struct LineCounter<'a> {
    input: &'a [u8],
    offset: usize,
    line: u32,
}

impl<'a> LineCounter<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, pos: usize) -> u32 {
        let pos = pos.min(self.input.len());
        if pos > self.offset {
            let newlines = self.input[self.offset..pos]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.line += newlines as u32;
            self.offset = pos;
        }
        self.line
    }
}

// -----------------------------------------------------------------------------
// Parser

pub(super) fn parse(input: &str, source: &str, reporter: &Reporter) -> Option<Document> {
    let mut reader = Reader::from_str(input);
    let mut lines = LineCounter::new(input);
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        // Events are located where they start, so multi-line tags report
        // their first line.
        let start = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let line = lines.line_at(reader.buffer_position() as usize);
                reporter.error(
                    Category::Structural,
                    &Location::new(source, Some(line)),
                    alloc::format!("malformed XML: {err}"),
                );
                return None;
            }
        };
        let line = lines.line_at(start);

        match event {
            Event::Start(start) => {
                let id = open(&mut doc, &stack, &start, source, line, reporter)?;
                stack.push(id);
            }
            Event::Empty(start) => {
                open(&mut doc, &stack, &start, source, line, reporter)?;
            }
            Event::End(_) => {
                if let Some(id) = stack.pop() {
                    close(&mut doc, id);
                }
            }
            Event::Text(text) => {
                let text = match text.unescape() {
                    Ok(text) => text,
                    Err(err) => {
                        reporter.error(
                            Category::Structural,
                            &Location::new(source, Some(line)),
                            alloc::format!("malformed text: {err}"),
                        );
                        return None;
                    }
                };
                push_text(&mut doc, &stack, &text, source, line, reporter);
            }
            Event::CData(data) => {
                let data = data.into_inner();
                let text = String::from_utf8_lossy(&data);
                push_text(&mut doc, &stack, &text, source, line, reporter);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry nothing for the engine.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        reporter.error(
            Category::Structural,
            &doc.location(*open, source),
            alloc::format!("element <{}> is never closed", doc.tag(*open)),
        );
        return None;
    }

    Some(doc)
}

fn open(
    doc: &mut Document,
    stack: &[NodeId],
    start: &BytesStart<'_>,
    source: &str,
    line: u32,
    reporter: &Reporter,
) -> Option<NodeId> {
    let at = Location::new(source, Some(line));

    let Ok(tag) = str::from_utf8(start.name().as_ref()).map(String::from) else {
        reporter.error(Category::Structural, &at, "element name is not valid UTF-8");
        return None;
    };

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                reporter.error(
                    Category::Shape,
                    &at,
                    alloc::format!("bad attribute on <{tag}>: {err}"),
                );
                continue;
            }
        };
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(err) => {
                reporter.error(
                    Category::Shape,
                    &at,
                    alloc::format!("bad value for attribute `{name}` on <{tag}>: {err}"),
                );
                continue;
            }
        };
        attrs.push(Attribute { name, value });
    }

    let id = match stack.last() {
        Some(parent) => doc.add_child(*parent, tag),
        None => doc.add_root(tag),
    };
    let node = doc.node_mut(id);
    node.attrs = attrs;
    node.line = Some(line);
    Some(id)
}

fn push_text(
    doc: &mut Document,
    stack: &[NodeId],
    text: &Cow<'_, str>,
    source: &str,
    line: u32,
    reporter: &Reporter,
) {
    match stack.last() {
        Some(id) => doc
            .node_mut(*id)
            .text
            .get_or_insert_with(String::new)
            .push_str(text),
        None if text.trim().is_empty() => {}
        None => reporter.error(
            Category::Structural,
            &Location::new(source, Some(line)),
            "text outside of the root element",
        ),
    }
}

/// Formatting whitespace between child elements is not content.
fn close(doc: &mut Document, id: NodeId) {
    let node = doc.node_mut(id);
    if node.has_children() && node.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        node.text = None;
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::diagnostics::Reporter;
    use crate::document::Document;

    #[test]
    fn keeps_text_and_lines() {
        let reporter = Reporter::logging();
        let input = "<Record>\n  <name>  padded  </name>\n  <empty />\n  <esc>a &amp; b</esc>\n</Record>";
        let doc = Document::from_xml(input, "test", &reporter).unwrap();

        let root = doc.root().unwrap();
        assert!(doc.text(root).is_none());
        assert_eq!(doc.children(root).len(), 3);

        let name = doc.child_named(root, "name").unwrap();
        assert_eq!(doc.text(name), Some("  padded  "));
        assert_eq!(doc.node(name).line, Some(2));

        let empty = doc.child_named(root, "empty").unwrap();
        assert!(doc.text(empty).is_none());

        let esc = doc.child_named(root, "esc").unwrap();
        assert_eq!(doc.text(esc), Some("a & b"));
    }

    #[test]
    fn multi_line_tags_start_on_their_first_line() {
        let reporter = Reporter::logging();
        let input = "<Defs>\n  <Item\n    defName=\"Sword\"\n    abstract=\"false\">\n    <damage>3</damage>\n  </Item>\n  <Item\n    defName=\"Bow\" />\n</Defs>";
        let doc = Document::from_xml(input, "test", &reporter).unwrap();

        let root = doc.root().unwrap();
        let items = doc.children(root);
        assert_eq!(doc.node(items[0]).line, Some(2));
        assert_eq!(doc.node(items[1]).line, Some(7));

        let damage = doc.child_named(items[0], "damage").unwrap();
        assert_eq!(doc.node(damage).line, Some(5));
    }

    #[test]
    fn malformed_is_reported() {
        let (reporter, collected) = Reporter::collecting();
        assert!(Document::from_xml("<a><b></a>", "broken", &reporter).is_none());
        assert_eq!(collected.errors().len(), 1);
    }
}
