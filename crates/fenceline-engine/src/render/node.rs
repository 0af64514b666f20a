use serde::Serialize;

/// Abstract output node.
///
/// The engine never renders to a concrete markup syntax; consumers walk this
/// tree and map it onto whatever output they produce (the bundled TUI maps
/// element names to terminal styles). `Group` and `Line` are structural:
/// a `Group` holds segments that were merged for a single render operation,
/// a `Line` is the wrapper every rendered source line ends up under before
/// full-line annotations are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Node {
    Text(String),
    Element(Element),
    Group(Vec<Node>),
    Line(Vec<Node>),
}

/// A named element wrapping child nodes, with flat string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(text.into())
    }

    pub fn element(name: impl Into<String>, children: Vec<Node>) -> Node {
        Node::Element(Element {
            name: name.into(),
            attrs: Vec::new(),
            children,
        })
    }

    /// Concatenated text content of this node and its descendants.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Group(children) | Node::Line(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Compact one-line rendering for tests and debugging: elements print as
    /// `<name>…</name>` (attributes as `<name k=v>`), groups and lines print
    /// their children back to back.
    pub fn to_compact_string(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                out.push('>');
                for child in &element.children {
                    child.write_compact(out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
            Node::Group(children) | Node::Line(children) => {
                for child in children {
                    child.write_compact(out);
                }
            }
        }
    }
}
