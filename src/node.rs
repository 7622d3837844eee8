// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the `Node` struct, which represents an element in the DOM, and its
//! `Attribute`s.

use crate::namespaces::Namespace;

use std::borrow::Cow;

/// Handle to a node stored in a [`Document`](crate::Document).
///
/// Ids are only meaningful for the document that allocated them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> NodeId {
        NodeId(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// An attribute, optionally qualified by a namespace prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace prefix, e.g. `xlink` for `xlink:href` or `xmlns` for a
    /// prefixed namespace declaration.
    pub namespace: Option<String>,
    /// Local name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute; a `prefix:local` name becomes a qualified
    /// attribute.
    ///
    /// ```rust
    /// use xmldom::Attribute;
    ///
    /// let attr = Attribute::new("xlink:href", "#a");
    /// assert_eq!(attr.namespace.as_deref(), Some("xlink"));
    /// assert_eq!(attr.name, "href");
    /// assert_eq!(attr.qualified_name(), "xlink:href");
    /// ```
    pub fn new<N: AsRef<str>, V: Into<String>>(name: N, value: V) -> Attribute {
        let (namespace, name) = split_qualified(name.as_ref());
        Attribute {
            namespace: namespace.map(str::to_owned),
            name: name.to_owned(),
            value: value.into(),
        }
    }

    /// Creates an attribute with an explicit prefix.
    pub fn qualified<P, N, V>(prefix: Option<P>, name: N, value: V) -> Attribute
    where
        P: Into<String>,
        N: Into<String>,
        V: Into<String>,
    {
        Attribute {
            namespace: prefix.map(Into::into),
            name: name.into(),
            value: value.into(),
        }
    }

    /// The name as written in XML, `prefix:name` or `name`.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.namespace {
            Some(ref prefix) => Cow::Owned(format!("{}:{}", prefix, self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }

    /// Whether `key` designates this attribute. A key containing `:` must
    /// match the qualified name, any other key matches the local name.
    ///
    /// ```rust
    /// use xmldom::Attribute;
    ///
    /// let attr = Attribute::qualified(Some("urn:x"), "bar", "1");
    /// assert!(attr.matches("bar"));
    /// assert!(attr.matches("urn:x:bar"));
    /// assert!(!attr.matches("x:bar"));
    /// ```
    pub fn matches(&self, key: &str) -> bool {
        match split_qualified(key) {
            (Some(_), _) => self.qualified_name() == key,
            (None, name) => self.name == name,
        }
    }

    /// The namespace this attribute declares, if it is `xmlns` or `xmlns:*`.
    pub fn as_declaration(&self) -> Option<Namespace> {
        match self.namespace.as_deref() {
            Some("xmlns") => Some(Namespace::new(self.name.as_str(), self.value.as_str())),
            None if self.name == "xmlns" => Some(Namespace::new("", self.value.as_str())),
            _ => None,
        }
    }

    /// Whether this is a namespace declaration.
    pub fn is_declaration(&self) -> bool {
        match self.namespace.as_deref() {
            Some("xmlns") => true,
            None => self.name == "xmlns",
            _ => false,
        }
    }
}

/// Splits at the last `:`, so a `<uri>:<local>` name keeps the whole URI.
pub(crate) fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once(':') {
        Some((prefix, local)) if !prefix.is_empty() => (Some(prefix), local),
        _ => (None, name),
    }
}

/// An element of the tree.
///
/// Nodes are owned by their [`Document`](crate::Document); structural fields
/// change only through the document so that parent links stay consistent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) namespace: Option<Namespace>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) text: String,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub(crate) fn new<S: Into<String>>(name: S) -> Node {
        Node {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
            parent: None,
        }
    }

    /// Local tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the tag, if any.
    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    /// Tag name as written in XML, with the stored prefix.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.namespace.as_ref().and_then(|ns| ns.prefix.as_deref()) {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First attribute matching `key`, see [`Attribute::matches`].
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.matches(key))
    }

    /// Value of the first attribute matching `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attribute(key).map(|attr| attr.value.as_str())
    }

    /// Child ids in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Character data directly under this node.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parent id, `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether the node has neither children nor text.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_empty()
    }
}
