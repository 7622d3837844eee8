// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Astro <astro@spaceboyz.net>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
// Copyright (c) 2020 Xidorn Quan <me@upsuper.org>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Namespaces and their resolution along the ancestor chain.
//!
//! A node only remembers the prefix and URI its tag was written with. Which
//! declaration is in force is found by walking from the node towards the root,
//! so that a subtree printed on its own still knows the namespaces declared
//! above it.

use crate::document::Document;
use crate::node::{Attribute, NodeId};
use crate::prefixes::{well_known_uri, Prefix};

use std::iter;

/// A prefix bound to a namespace URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// The prefix, `None` for the default namespace.
    pub prefix: Prefix,
    /// The namespace URI.
    pub uri: String,
}

impl Namespace {
    /// Creates a binding; an empty prefix means the default namespace.
    pub fn new<P: Into<String>, U: Into<String>>(prefix: P, uri: U) -> Namespace {
        let prefix = prefix.into();
        Namespace {
            prefix: if prefix.is_empty() { None } else { Some(prefix) },
            uri: uri.into(),
        }
    }

    /// Whether this is the default namespace.
    pub fn is_default(&self) -> bool {
        self.prefix.is_none()
    }

    /// The prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The declaration attribute for this binding.
    pub fn to_attribute(&self) -> Attribute {
        match self.prefix {
            Some(ref prefix) => Attribute::qualified(Some("xmlns"), prefix.as_str(), self.uri.as_str()),
            None => Attribute::qualified(None::<String>, "xmlns", self.uri.as_str()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// Use to compare namespaces
pub enum NSChoice<'a> {
    /// The element must have no namespace
    None,
    /// The element's namespace must match the specified namespace
    OneOf(&'a str),
    /// The element's namespace must be in the specified vector
    AnyOf(&'a [&'a str]),
    /// The element can have any namespace, or no namespace
    Any,
}

impl<'a> From<&'a str> for NSChoice<'a> {
    fn from(ns: &'a str) -> NSChoice<'a> {
        NSChoice::OneOf(ns)
    }
}

impl<'a> NSChoice<'a> {
    pub(crate) fn compare(&self, ns: Option<&str>) -> bool {
        match (ns, self) {
            (None, NSChoice::None) => true,
            (Some(_), NSChoice::None) => false,
            (_, NSChoice::Any) => true,
            (Some(ns), NSChoice::OneOf(wanted_ns)) => ns == *wanted_ns,
            (Some(ns), NSChoice::AnyOf(wanted_nss)) => wanted_nss.iter().any(|w| ns == *w),
            (None, _) => false,
        }
    }
}

fn declared<'d>(attrs: &'d [Attribute], prefix: Option<&str>) -> Option<&'d str> {
    attrs.iter().find_map(|attr| match (attr.namespace.as_deref(), prefix) {
        (Some("xmlns"), Some(prefix)) if attr.name == prefix => Some(attr.value.as_str()),
        (None, None) if attr.name == "xmlns" => Some(attr.value.as_str()),
        _ => None,
    })
}

impl Document {
    /// The namespace declarations (`xmlns`, `xmlns:*`) carried by a node's own
    /// attributes.
    pub fn namespace_declarations(&self, id: NodeId) -> Vec<Namespace> {
        self.node(id)
            .attributes
            .iter()
            .filter_map(Attribute::as_declaration)
            .collect()
    }

    /// URI bound to `prefix` at `id`: the nearest declaration on the node or
    /// one of its ancestors, then the document-level declarations, then the
    /// well-known namespaces (`xml`, `xmlns`, `xlink`, `xsi`).
    pub fn lookup_prefix(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|node| declared(&self.node(node).attributes, prefix))
            .or_else(|| self.namespaces.get(&prefix.map(str::to_owned)))
            .or_else(|| prefix.and_then(well_known_uri))
    }

    /// Nearest prefix bound to `uri` at `id`, searched like
    /// [`lookup_prefix`](Document::lookup_prefix). The outer `Option` is
    /// whether one was found, the inner one is `None` for the default
    /// namespace.
    pub fn lookup_namespace_prefix(&self, id: NodeId, uri: &str) -> Option<Prefix> {
        for node in iter::once(id).chain(self.ancestors(id)) {
            for decl in self.namespace_declarations(node) {
                if decl.uri == uri && self.lookup_prefix(id, decl.prefix()) == Some(uri) {
                    return Some(decl.prefix);
                }
            }
        }
        self.namespaces.prefix_of(uri).cloned()
    }

    /// The binding behind a prefixed attribute of `id`.
    ///
    /// Parsed attributes keep either a well-known prefix (`xlink`, `xsi`,
    /// ...), a prefix nothing bound, or the namespace URI itself. A URI is
    /// mapped back to the nearest prefix declared for it. Returns `None` for
    /// unprefixed attributes, declarations and anything that does not
    /// resolve.
    ///
    /// ```rust
    /// use xmldom::{Document, Namespace};
    ///
    /// let doc = Document::parse_str(r#"<r xmlns:foo="urn:x" foo:bar="1"/>"#).unwrap();
    /// let root = doc.root().unwrap();
    /// let bar = doc.node(root).attribute("bar").unwrap();
    ///
    /// assert_eq!(bar.qualified_name(), "urn:x:bar");
    /// assert_eq!(doc.attribute_namespace(root, bar), Some(Namespace::new("foo", "urn:x")));
    /// ```
    pub fn attribute_namespace(&self, id: NodeId, attr: &Attribute) -> Option<Namespace> {
        let stored = match attr.namespace.as_deref() {
            None | Some("xmlns") => return None,
            Some(stored) => stored,
        };
        if let Some(uri) = well_known_uri(stored) {
            return Some(Namespace::new(stored, uri));
        }
        match self.lookup_prefix(id, Some(stored)) {
            Some(uri) if !uri.is_empty() => Some(Namespace::new(stored, uri)),
            _ => match self.lookup_namespace_prefix(id, stored) {
                Some(Some(prefix)) => Some(Namespace::new(prefix, stored)),
                _ => None,
            },
        }
    }

    /// Value of the attribute `name` in the namespace `uri`, however its
    /// prefix was written.
    pub fn attr_ns(&self, id: NodeId, uri: &str, name: &str) -> Option<&str> {
        self.attr_ns_position(id, uri, name)
            .map(|index| self.node(id).attributes[index].value.as_str())
    }

    pub(crate) fn attr_ns_position(&self, id: NodeId, uri: &str, name: &str) -> Option<usize> {
        self.node(id).attributes.iter().position(|attr| {
            attr.name == name
                && !attr.is_declaration()
                && match self.attribute_namespace(id, attr) {
                    Some(ns) => ns.uri == uri,
                    None => attr.namespace.as_deref() == Some(uri),
                }
        })
    }

    /// The namespace in force for the tag of `id`.
    ///
    /// Looks for a declaration of the tag's prefix on the node and then on
    /// each ancestor; the first one wins. Without any declaration in the tree
    /// the document-level declarations are consulted, and finally the binding
    /// recorded on the node itself is returned, so that a detached or
    /// programmatically built node keeps its namespace.
    ///
    /// ```rust
    /// use xmldom::{Document, Namespace};
    ///
    /// let doc = Document::parse_str(
    ///     r#"<S:Envelope xmlns:S="urn:s"><S:Body><S:Item/></S:Body></S:Envelope>"#,
    /// ).unwrap();
    /// let item = doc.find_one_by_name(doc.root().unwrap(), "Item").unwrap();
    ///
    /// assert!(doc.namespace_declarations(item).is_empty());
    /// assert_eq!(doc.resolve_namespace(item), Some(Namespace::new("S", "urn:s")));
    /// ```
    pub fn resolve_namespace(&self, id: NodeId) -> Option<Namespace> {
        let stored = self.node(id).namespace.as_ref()?;
        let uri = iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|node| declared(&self.node(node).attributes, stored.prefix()))
            .or_else(|| self.namespaces.get(&stored.prefix))
            .unwrap_or(stored.uri.as_str());
        Some(Namespace {
            prefix: stored.prefix.clone(),
            uri: uri.to_owned(),
        })
    }

    /// Returns whether the node has the given name and namespace.
    ///
    /// ```rust
    /// use xmldom::{Document, NSChoice};
    ///
    /// let doc = Document::parse_str(r#"<a xmlns="ns1"/>"#).unwrap();
    /// let root = doc.root().unwrap();
    ///
    /// assert!(doc.is(root, "a", "ns1"));
    /// assert!(doc.is(root, "a", NSChoice::AnyOf(&["foo", "ns1"])));
    /// assert!(!doc.is(root, "a", NSChoice::None));
    /// assert!(!doc.is(root, "b", NSChoice::Any));
    /// ```
    pub fn is<'a, N: AsRef<str>, NS: Into<NSChoice<'a>>>(
        &self,
        id: NodeId,
        name: N,
        namespace: NS,
    ) -> bool {
        let ns = self.resolve_namespace(id);
        self.node(id).name == name.as_ref()
            && namespace.into().compare(ns.as_ref().map(|ns| ns.uri.as_str()))
    }
}
