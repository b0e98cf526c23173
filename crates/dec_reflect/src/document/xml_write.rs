use alloc::string::String;
use alloc::vec::Vec;

use quick_xml::escape::escape;

use super::{Document, NodeId};

enum Step {
    Open(NodeId, usize),
    Close(NodeId, usize),
}

/// Writes the tree with an explicit stack, deep documents are fine.
pub(super) fn write(doc: &Document, pretty: bool) -> String {
    let mut out = String::new();
    let mut stack: Vec<Step> = doc
        .roots()
        .iter()
        .rev()
        .map(|root| Step::Open(*root, 0))
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Open(id, depth) => {
                let node = doc.node(id);
                indent(&mut out, depth, pretty);
                out.push('<');
                out.push_str(&node.tag);
                for attr in &node.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape(attr.value.as_str()));
                    out.push('"');
                }

                let text = node.text.as_deref().filter(|t| !t.is_empty());
                if node.children.is_empty() {
                    match text {
                        Some(text) => {
                            out.push('>');
                            out.push_str(&escape(text));
                            close_tag(&mut out, &node.tag);
                        }
                        None => out.push_str(" />"),
                    }
                    newline(&mut out, pretty);
                } else {
                    out.push('>');
                    if let Some(text) = text {
                        out.push_str(&escape(text));
                    }
                    newline(&mut out, pretty);
                    stack.push(Step::Close(id, depth));
                    stack.extend(
                        node.children
                            .iter()
                            .rev()
                            .map(|child| Step::Open(*child, depth + 1)),
                    );
                }
            }
            Step::Close(id, depth) => {
                indent(&mut out, depth, pretty);
                close_tag(&mut out, doc.tag(id));
                newline(&mut out, pretty);
            }
        }
    }

    out
}

#[inline]
fn close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[inline]
fn indent(out: &mut String, depth: usize, pretty: bool) {
    if pretty {
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
}

#[inline]
fn newline(out: &mut String, pretty: bool) {
    if pretty {
        out.push('\n');
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::diagnostics::Reporter;
    use crate::document::Document;

    #[test]
    fn compact_and_pretty() {
        let mut doc = Document::new();
        let root = doc.add_root("Record");
        let a = doc.add_child(root, "a");
        doc.set_text(a, "x < y");
        let b = doc.add_child(root, "b");
        doc.set_attr(b, "null", "true");

        assert_eq!(
            doc.to_xml(false),
            "<Record><a>x &lt; y</a><b null=\"true\" /></Record>"
        );
        assert_eq!(
            doc.to_xml(true),
            "<Record>\n  <a>x &lt; y</a>\n  <b null=\"true\" />\n</Record>\n"
        );

        let reporter = Reporter::logging();
        let again = Document::from_xml(&doc.to_xml(true), "again", &reporter).unwrap();
        let root = again.root().unwrap();
        assert_eq!(again.text(again.child_named(root, "a").unwrap()), Some("x < y"));
    }
}
