//! Minimal vector document used as the drawing backend.
//!
//! Overlay markup and the generated paths both end up as [`Element`]s. Only
//! the operations the renderer needs exist: attribute get/set, child append
//! and serialization.

use std::fmt::Write;

use glam::{DVec2, dvec2};

use crate::render::path::fmt_num;

/// SVG namespace URI
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// A node in a markup tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data, kept as authored (entities are not decoded)
    Text(String),
    /// Comment body, without the `<!--`/`-->` delimiters
    Comment(String),
}

/// A markup element with ordered attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as a number, if present and numeric
    pub fn numeric_attr(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// Replace an attribute's value, or append it if absent
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn set_numeric_attr(&mut self, name: &str, value: f64) {
        self.set_attr(name, fmt_num(value));
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Apply `f` to this element and every descendant element, pre-order
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(e) = child {
                e.visit_mut(f);
            }
        }
    }

    /// Serialize this element and its subtree
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        let _ = write!(out, " {}=\"{}\"", name, escape_markup(value, true));
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(e, out),
            Node::Text(t) => out.push_str(&escape_markup(t, false)),
            Node::Comment(c) => {
                let _ = write!(out, "<!--{}-->", c);
            }
        }
    }
    let _ = write!(out, "</{}>", element.name);
}

/// Escape text for markup output.
///
/// Entity-like sequences (`&amp;`, `&#38;`) pass through unchanged, bare `&`
/// becomes `&amp;`, `<` and `>` are always escaped. In attribute values `"`
/// is escaped as well.
pub fn escape_markup(s: &str, in_attribute: bool) -> String {
    let mut result = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    for (i, ch) in s.char_indices() {
        match ch {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if in_attribute => result.push_str("&quot;"),
            '&' if is_entity_at(bytes, i) => result.push('&'),
            '&' => result.push_str("&amp;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Check if position i in bytes starts an entity: `&[#]?[a-zA-Z0-9]+;`
fn is_entity_at(bytes: &[u8], i: usize) -> bool {
    if i >= bytes.len() || bytes[i] != b'&' {
        return false;
    }
    let mut j = i + 1;
    if j < bytes.len() && bytes[j] == b'#' {
        j += 1;
    }
    let start = j;
    while j < bytes.len() {
        let c = bytes[j];
        if c == b';' {
            return j > start;
        } else if c.is_ascii_alphanumeric() {
            j += 1;
        } else {
            return false;
        }
    }
    false
}

/// The drawing surface: a root `svg` element that paths and markup are appended to
#[derive(Debug, Clone)]
pub struct Canvas {
    root: Element,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_view_box(DVec2::ZERO, dvec2(width, height))
    }

    /// A canvas whose view box starts at `origin` rather than `0 0`
    pub fn with_view_box(origin: DVec2, size: DVec2) -> Self {
        let root = Element::new("svg")
            .with_attr("xmlns", SVG_NS)
            .with_attr("width", fmt_num(size.x))
            .with_attr("height", fmt_num(size.y))
            .with_attr(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    fmt_num(origin.x),
                    fmt_num(origin.y),
                    fmt_num(size.x),
                    fmt_num(size.y)
                ),
            );
        Self { root }
    }

    /// Append a `path` element with the given instruction string and style attributes
    pub fn add_path<'a>(
        &mut self,
        d: &str,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let mut path = Element::new("path").with_attr("d", d);
        for (name, value) in attributes {
            path.set_attr(name, value);
        }
        self.root.append(path);
    }

    pub fn append(&mut self, element: Element) {
        self.root.append(element);
    }

    pub fn to_svg_string(&self) -> String {
        self.root.to_markup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attr_replaces_in_place() {
        let mut e = Element::new("text").with_attr("x", "1").with_attr("y", "2");
        e.set_attr("x", "5");
        assert_eq!(e.attr("x"), Some("5"));
        assert_eq!(e.attributes.len(), 2);
        assert_eq!(e.numeric_attr("y"), Some(2.0));
        assert_eq!(e.numeric_attr("fill"), None);
    }

    #[test]
    fn escape_passes_entities_through() {
        assert_eq!(escape_markup("a &amp; b & c", false), "a &amp; b &amp; c");
        assert_eq!(escape_markup("&#8594;<", false), "&#8594;&lt;");
        assert_eq!(escape_markup("say \"hi\"", true), "say &quot;hi&quot;");
    }

    #[test]
    fn serializes_nested_elements() {
        let mut g = Element::new("g").with_attr("class", "door");
        let mut text = Element::new("text").with_attr("x", "3");
        text.append(Node::Text("D".into()));
        g.append(text);
        g.append(Node::Comment(" hinge ".into()));
        g.append(Element::new("rect"));
        assert_eq!(
            g.to_markup(),
            r#"<g class="door"><text x="3">D</text><!-- hinge --><rect/></g>"#
        );
    }

    #[test]
    fn visit_mut_walks_whole_tree() {
        let mut g = Element::new("g");
        let mut inner = Element::new("g");
        inner.append(Element::new("text"));
        g.append(inner);
        g.append(Element::new("circle"));
        let mut names = Vec::new();
        g.visit_mut(&mut |e: &mut Element| names.push(e.name.clone()));
        assert_eq!(names, vec!["g", "g", "text", "circle"]);
    }

    #[test]
    fn canvas_wraps_paths_in_svg_root() {
        let mut canvas = Canvas::new(200.0, 100.0);
        canvas.add_path("M 0 0 h 10", [("stroke", "black")]);
        assert_eq!(
            canvas.to_svg_string(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 200 100"><path d="M 0 0 h 10" stroke="black"/></svg>"#
        );
    }
}
