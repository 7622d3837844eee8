// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Bastien Orivel <eijebong+minidom@bananium.fr>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Serialization of documents and subtrees.
//!
//! The printer tracks which prefixes the text written so far binds. An element
//! declares the namespaces it uses (its tag's and its prefixed attributes')
//! unless an enclosing element of the output already did, so any subtree
//! printed on its own is namespace-complete. Declarations nothing in the
//! element uses are dropped; a descendant that needs them writes them again.

use crate::document::Document;
use crate::error::Result;
use crate::namespaces::Namespace;
use crate::node::NodeId;
use crate::prefixes::{Prefix, XML_NS};

use std::borrow::Cow;
use std::io::Write;

/// Default indentation of the pretty printers.
pub const DEFAULT_INDENT: &str = "  ";

fn escape_with<'a>(raw: &'a str, to_escape: fn(u8) -> Option<&'static str>) -> Cow<'a, str> {
    let mut escapes: Vec<(usize, &'static str)> = Vec::new();
    for (loc, b) in raw.bytes().enumerate() {
        if let Some(escaped) = to_escape(b) {
            escapes.push((loc, escaped));
        }
    }

    if escapes.is_empty() {
        Cow::Borrowed(raw)
    } else {
        let len = raw.len();
        let mut v = String::with_capacity(len + escapes.len() * 4);
        let mut start = 0;
        for (i, r) in escapes {
            v.push_str(&raw[start..i]);
            v.push_str(r);
            start = i + 1;
        }

        if start < len {
            v.push_str(&raw[start..]);
        }
        Cow::Owned(v)
    }
}

/// Escapes an attribute value.
///
/// ```rust
/// use xmldom::printer::escape_attribute;
///
/// assert_eq!(escape_attribute(r#"a "b" & 'c'"#), "a &quot;b&quot; &amp; &apos;c&apos;");
/// assert_eq!(escape_attribute("1\t2\n"), "1&#x9;2&#xA;");
/// ```
pub fn escape_attribute(raw: &str) -> Cow<'_, str> {
    escape_with(raw, |b| match b {
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        b'\'' => Some("&apos;"),
        b'&' => Some("&amp;"),
        b'"' => Some("&quot;"),
        b'\t' => Some("&#x9;"),
        b'\n' => Some("&#xA;"),
        b'\r' => Some("&#xD;"),
        _ => None,
    })
}

/// Escapes character data. Quotes and whitespace control characters are
/// escaped too, so text survives a re-parse unchanged.
///
/// ```rust
/// use xmldom::printer::escape_text;
///
/// assert_eq!(escape_text("it's \"x\" < y"), "it&apos;s &quot;x&quot; &lt; y");
/// assert_eq!(escape_text("a\r\nb"), "a&#xD;&#xA;b");
/// ```
pub fn escape_text(raw: &str) -> Cow<'_, str> {
    escape_attribute(raw)
}

/// Whether an attribute namespace that no prefix resolves is a URI rather
/// than a prefix nothing bound.
fn looks_like_uri(stored: &str) -> bool {
    stored.contains(':') || stored.contains('/')
}

struct Printer<'d> {
    doc: &'d Document,
    indent: &'d str,
    out: String,
    /// Bindings made by the elements currently open in the output
    scope: Vec<Namespace>,
}

impl<'d> Printer<'d> {
    fn new(doc: &'d Document, indent: &'d str) -> Self {
        Printer {
            doc,
            indent,
            out: String::new(),
            scope: Vec::new(),
        }
    }

    fn pretty(&self) -> bool {
        !self.indent.is_empty()
    }

    fn bound(&self, prefix: &Prefix) -> Option<&str> {
        if prefix.as_deref() == Some("xml") {
            return Some(XML_NS);
        }
        self.scope
            .iter()
            .rev()
            .find(|ns| ns.prefix == *prefix)
            .map(|ns| ns.uri.as_str())
    }

    fn is_bound(&self, ns: &Namespace) -> bool {
        match self.bound(&ns.prefix) {
            Some(uri) => uri == ns.uri,
            None => ns.prefix.is_none() && ns.uri.is_empty(),
        }
    }

    /// Bindings the element's tag and attributes rely on, tag first, and the
    /// prefix each attribute is written with.
    fn needs(&self, id: NodeId) -> (Vec<Namespace>, Vec<Option<String>>) {
        let node = self.doc.node(id);
        let mut needs: Vec<Namespace> = Vec::new();
        match self.doc.resolve_namespace(id) {
            Some(ns) if ns.prefix.is_some() && ns.uri.is_empty() => {}
            Some(ns) => needs.push(ns),
            None => needs.push(Namespace::new("", "")),
        }

        let mut prefixes = Vec::with_capacity(node.attributes().len());
        for attr in node.attributes() {
            let stored = match attr.namespace.as_deref() {
                None | Some("xmlns") => {
                    prefixes.push(None);
                    continue;
                }
                Some(stored) => stored,
            };
            let prefix = match self.doc.attribute_namespace(id, attr) {
                Some(ns) => self.bind(id, &mut needs, ns),
                None if looks_like_uri(stored) => {
                    self.bind(id, &mut needs, Namespace { prefix: None, uri: stored.to_owned() })
                }
                None => stored.to_owned(),
            };
            prefixes.push(Some(prefix));
        }
        needs.retain(|ns| ns.prefix.as_deref() != Some("xml"));
        (needs, prefixes)
    }

    /// Records that an attribute needs `ns` and returns the prefix to write.
    /// A binding without a prefix, or whose prefix the element already uses
    /// for another URI, gets a fresh `tnsN`.
    fn bind(&self, id: NodeId, needs: &mut Vec<Namespace>, ns: Namespace) -> String {
        let written = self.doc.node(id).attributes();
        if let Some(prefix) = ns.prefix() {
            match needs.iter().find(|need| need.prefix() == Some(prefix)) {
                Some(need) if need.uri == ns.uri => return prefix.to_owned(),
                Some(_) => {}
                None => {
                    needs.push(ns.clone());
                    return prefix.to_owned();
                }
            }
        }
        if let Some(prefix) = needs
            .iter()
            .find(|need| need.uri == ns.uri)
            .and_then(Namespace::prefix)
        {
            return prefix.to_owned();
        }
        let prefix = (0..)
            .map(|n| format!("tns{}", n))
            .find(|prefix| {
                let prefix = prefix.as_str();
                self.bound(&Some(prefix.to_owned())).is_none()
                    && !needs.iter().any(|need| need.prefix() == Some(prefix))
                    && !written.iter().any(|attr| attr.namespace.as_deref() == Some(prefix))
                    && self.doc.lookup_prefix(id, Some(prefix)).is_none()
            })
            .unwrap_or_default();
        needs.push(Namespace::new(prefix.as_str(), ns.uri));
        prefix
    }

    fn write_declaration(&mut self, ns: &Namespace) {
        self.out.push(' ');
        self.out.push_str(&ns.to_attribute().qualified_name());
        self.out.push_str("=\"");
        self.out.push_str(&escape_attribute(&ns.uri));
        self.out.push('"');
    }

    fn write_indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str(self.indent);
        }
    }

    fn print_node(&mut self, id: NodeId, level: usize) {
        let doc = self.doc;
        let node = doc.node(id);
        let mark = self.scope.len();
        let qualified_name = node.qualified_name();

        if self.pretty() {
            self.write_indent(level);
        }
        self.out.push('<');
        self.out.push_str(&qualified_name);

        let (needs, prefixes) = self.needs(id);
        let declarations = doc.namespace_declarations(id);
        for ns in &needs {
            if !self.is_bound(ns) && !declarations.contains(ns) {
                self.write_declaration(ns);
                self.scope.push(ns.clone());
            }
        }

        for (attr, prefix) in node.attributes().iter().zip(prefixes) {
            if let Some(ns) = attr.as_declaration() {
                if needs.contains(&ns) && !self.is_bound(&ns) {
                    self.write_declaration(&ns);
                    self.scope.push(ns);
                }
                continue;
            }
            self.out.push(' ');
            if let Some(prefix) = prefix {
                self.out.push_str(&prefix);
                self.out.push(':');
            }
            self.out.push_str(&attr.name);
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute(&attr.value));
            self.out.push('"');
        }

        if node.is_empty() {
            if doc.empty_element_tag {
                self.out.push_str(" />");
            } else {
                self.out.push_str("></");
                self.out.push_str(&qualified_name);
                self.out.push('>');
            }
        } else {
            self.out.push('>');
            if !node.children().is_empty() {
                if self.pretty() {
                    self.out.push('\n');
                }
                for child in node.children() {
                    self.print_node(*child, level + 1);
                }
            }
            if doc.text_safe_mode {
                self.out.push_str(&escape_text(node.text()));
            } else {
                self.out.push_str(node.text());
            }
            if self.pretty() && !node.children().is_empty() {
                self.write_indent(level);
            }
            self.out.push_str("</");
            self.out.push_str(&qualified_name);
            self.out.push('>');
        }

        if self.pretty() {
            self.out.push('\n');
        }
        self.scope.truncate(mark);
    }

    fn print_document(mut self) -> String {
        let doc = self.doc;
        let pretty = self.pretty();
        if !doc.proc_inst.is_empty() {
            self.out.push_str(&doc.proc_inst);
            if pretty {
                self.out.push('\n');
            }
        }
        for directive in &doc.directives {
            self.out.push_str(directive);
            if pretty {
                self.out.push('\n');
            }
        }
        if let Some(root) = doc.root() {
            self.print_node(root, 0);
        }
        self.out
    }
}

impl Document {
    /// The whole document as compact XML: processing instruction, directives
    /// and root element, with nothing in between.
    ///
    /// ```rust
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str("<?xml version=\"1.0\"?>\n<a>\n  <b>x &amp; y</b>\n</a>").unwrap();
    /// assert_eq!(doc.xml(), r#"<?xml version="1.0"?><a><b>x &amp; y</b></a>"#);
    /// ```
    pub fn xml(&self) -> String {
        Printer::new(self, "").print_document()
    }

    /// The whole document, one element per line, indented by two spaces.
    pub fn xml_pretty(&self) -> String {
        self.xml_with_indent(DEFAULT_INDENT)
    }

    /// The whole document, one element per line, `indent` repeated once per
    /// level. An empty `indent` gives the compact form.
    pub fn xml_with_indent(&self, indent: &str) -> String {
        Printer::new(self, indent).print_document()
    }

    /// The subtree at `id` as compact XML, declaring the namespaces it uses.
    pub fn node_xml(&self, id: NodeId) -> String {
        self.node_xml_with_indent(id, "")
    }

    /// The subtree at `id`, pretty-printed with the default indentation.
    pub fn node_xml_pretty(&self, id: NodeId) -> String {
        self.node_xml_with_indent(id, DEFAULT_INDENT)
    }

    /// The subtree at `id` with a custom indentation.
    pub fn node_xml_with_indent(&self, id: NodeId, indent: &str) -> String {
        let mut printer = Printer::new(self, indent);
        printer.print_node(id, 0);
        printer.out
    }

    /// Writes the compact form of the document to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.xml().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape_attribute("&<>'\""), "&amp;&lt;&gt;&apos;&quot;");
        assert_eq!(escape_attribute("plain"), "plain");
        assert_eq!(escape_attribute("a\r\nb"), "a&#xD;&#xA;b");
        assert_eq!(
            escape_text("<a href='x'>&\"</a>"),
            "&lt;a href=&apos;x&apos;&gt;&amp;&quot;&lt;/a&gt;"
        );
        assert_eq!(escape_text("1\t2"), "1&#x9;2");
        assert_eq!(escape_text("héllo & wörld"), "héllo &amp; wörld");
    }

    #[test]
    fn empty_element_tag() {
        let mut doc = Document::parse_str("<a><b/><c></c><d>x</d></a>").unwrap();
        assert_eq!(doc.xml(), "<a><b /><c /><d>x</d></a>");
        doc.empty_element_tag = false;
        assert_eq!(doc.xml(), "<a><b></b><c></c><d>x</d></a>");
    }

    #[test]
    fn text_safe_mode() {
        let mut doc = Document::new("a");
        let root = doc.root().unwrap();
        doc.set_text(root, "1 < 2 & 3");
        assert_eq!(doc.node_xml(root), "<a>1 &lt; 2 &amp; 3</a>");
        doc.text_safe_mode = false;
        assert_eq!(doc.node_xml(root), "<a>1 < 2 & 3</a>");
    }

    #[test]
    fn text_with_quotes_and_controls() {
        let mut doc = Document::new("a");
        let root = doc.root().unwrap();
        doc.set_text(root, "say \"hi\"\tit's\r\nok");
        let xml = doc.node_xml(root);
        assert_eq!(xml, "<a>say &quot;hi&quot;&#x9;it&apos;s&#xD;&#xA;ok</a>");

        let parsed = Document::parse_str(&xml).unwrap();
        assert_eq!(parsed.node(parsed.root().unwrap()).text(), "say \"hi\"\tit's\r\nok");
    }

    #[test]
    fn uri_attributes_get_a_prefix() {
        let mut doc = Document::new("a");
        let root = doc.root().unwrap();
        doc.set_attr(root, "urn:x:k", "1");
        doc.set_attr(root, "http://example.com/ns:m", "2");
        doc.set_attr(root, "tns0:n", "3");
        assert_eq!(
            doc.node_xml(root),
            r#"<a xmlns:tns1="urn:x" xmlns:tns2="http://example.com/ns" tns1:k="1" tns2:m="2" tns0:n="3" />"#
        );
    }

    #[test]
    fn pretty_layout() {
        let doc = Document::parse_str("<a><b><c>t</c></b><d/></a>").unwrap();
        assert_eq!(
            doc.xml_pretty(),
            "<a>\n  <b>\n    <c>t</c>\n  </b>\n  <d />\n</a>\n"
        );
        assert_eq!(
            doc.xml_with_indent("\t"),
            "<a>\n\t<b>\n\t\t<c>t</c>\n\t</b>\n\t<d />\n</a>\n"
        );
        let b = doc.first_child(doc.root().unwrap()).unwrap();
        assert_eq!(doc.node_xml_pretty(b), "<b>\n  <c>t</c>\n</b>\n");
    }

    #[test]
    fn mixed_content_puts_text_after_children() {
        let doc = Document::parse_str("<a>text<b/></a>").unwrap();
        assert_eq!(doc.xml(), "<a><b />text</a>");
        assert_eq!(doc.xml_pretty(), "<a>\n  <b />\ntext</a>\n");
    }

    #[test]
    fn subtree_declares_inherited_namespaces() {
        let doc = Document::parse_str(
            r#"<S:E xmlns:S="urn:s" xmlns:x="urn:x"><S:B><x:C x:id="1"><x:D/></x:C></S:B></S:E>"#,
        )
        .unwrap();
        let root = doc.root().unwrap();
        let body = doc.first_child(root).unwrap();
        let c = doc.first_child(body).unwrap();

        assert_eq!(
            doc.node_xml(root),
            r#"<S:E xmlns:S="urn:s"><S:B><x:C xmlns:x="urn:x" x:id="1"><x:D /></x:C></S:B></S:E>"#
        );
        assert_eq!(doc.node_xml(body), r#"<S:B xmlns:S="urn:s"><x:C xmlns:x="urn:x" x:id="1"><x:D /></x:C></S:B>"#);
        assert_eq!(doc.node_xml(c), r#"<x:C xmlns:x="urn:x" x:id="1"><x:D /></x:C>"#);
    }

    #[test]
    fn default_namespace() {
        let doc = Document::parse_str(r#"<a xmlns="urn:a"><b/><c xmlns=""><d/></c></a>"#).unwrap();
        let root = doc.root().unwrap();
        let b = doc.first_child(root).unwrap();
        let c = doc.last_child(root).unwrap();

        assert_eq!(doc.xml(), r#"<a xmlns="urn:a"><b /><c xmlns=""><d /></c></a>"#);
        assert_eq!(doc.node_xml(b), r#"<b xmlns="urn:a" />"#);
        assert_eq!(doc.node_xml(c), "<c><d /></c>");
    }

    #[test]
    fn shadowed_prefix_is_redeclared() {
        let doc = Document::parse_str(r#"<p:a xmlns:p="1"><p:b xmlns:p="2"><p:c/></p:b><p:d/></p:a>"#)
            .unwrap();
        assert_eq!(
            doc.xml(),
            r#"<p:a xmlns:p="1"><p:b xmlns:p="2"><p:c /></p:b><p:d /></p:a>"#
        );
    }

    #[test]
    fn redundant_declarations_are_dropped() {
        let doc = Document::parse_str(r#"<p:a xmlns:p="1"><p:b xmlns:p="1"/></p:a>"#).unwrap();
        assert_eq!(doc.xml(), r#"<p:a xmlns:p="1"><p:b /></p:a>"#);
    }

    #[test]
    fn document_level_declarations() {
        let mut doc = Document::new("");
        let root = doc.new_node("ds:Signature");
        doc.declare_namespace("ds", "urn:ds");
        doc.set_root(root);
        let info = doc.create_node(root, "ds:SignedInfo");

        assert_eq!(doc.resolve_namespace(info), Some(Namespace::new("ds", "urn:ds")));
        assert_eq!(
            doc.xml(),
            r#"<?xml version="1.0" encoding="UTF-8"?><ds:Signature xmlns:ds="urn:ds"><ds:SignedInfo /></ds:Signature>"#
        );
    }

    #[test]
    fn write_to_writer() {
        let doc = Document::new("a");
        let mut out = Vec::new();
        doc.write_to(&mut out).unwrap();
        assert_eq!(out, br#"<?xml version="1.0" encoding="UTF-8"?><a />"#.to_vec());
        assert_eq!(doc.to_string(), String::from(&doc));
    }
}
