// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mutation of the tree.
//!
//! Operations taking a `NodeId` panic when the id was not allocated by this
//! document, like [`Document::node`]. The ones that can fail for other
//! reasons return a [`Result`].

use crate::convert::IntoAttributeValue;
use crate::document::Document;
use crate::error::{Error, InvalidArgument, Result};
use crate::namespaces::Namespace;
use crate::node::{split_qualified, Attribute, Node, NodeId};
use crate::prefixes::canonical_prefix;

use std::collections::BTreeSet;
use std::mem;

impl Document {
    /// Allocates a detached node. A `prefix:local` name gets a namespace with
    /// that prefix and an empty URI until it is attached or given one.
    pub fn new_node<S: AsRef<str>>(&mut self, name: S) -> NodeId {
        let (prefix, local) = split_qualified(name.as_ref());
        let mut node = Node::new(local);
        node.namespace = prefix.map(|prefix| Namespace::new(prefix, ""));
        self.alloc(node)
    }

    fn new_node_under(&mut self, parent: NodeId, name: &str) -> NodeId {
        let (prefix, local) = split_qualified(name);
        let namespace = prefix.map(|prefix| {
            Namespace::new(prefix, self.lookup_prefix(parent, Some(prefix)).unwrap_or_default())
        });
        let mut node = Node::new(local);
        node.namespace = namespace;
        self.alloc(node)
    }

    /// Creates a node named `name` and appends it to `parent`. A prefixed
    /// name takes the namespace bound to that prefix at `parent`.
    ///
    /// ```rust
    /// use xmldom::Document;
    ///
    /// let mut doc = Document::new("testsuites");
    /// let root = doc.root().unwrap();
    /// let suite = doc.create_node(root, "testsuite");
    /// doc.set_attr(suite, "name", "pkg");
    ///
    /// assert_eq!(doc.node_xml(root), r#"<testsuites><testsuite name="pkg" /></testsuites>"#);
    /// ```
    pub fn create_node<S: AsRef<str>>(&mut self, parent: NodeId, name: S) -> NodeId {
        let id = self.new_node_under(parent, name.as_ref());
        self.attach(parent, id);
        id
    }

    /// Creates a node and inserts it at `index` among the children of
    /// `parent`; `index` may equal the number of children.
    pub fn create_node_at<S: AsRef<str>>(
        &mut self,
        parent: NodeId,
        index: usize,
        name: S,
    ) -> Result<NodeId> {
        let len = self.node(parent).children.len();
        if index > len {
            return Err(Error::Index { index, len });
        }
        let id = self.new_node_under(parent, name.as_ref());
        self.node_mut(id).parent = Some(parent);
        self.node_mut(parent).children.insert(index, id);
        Ok(id)
    }

    /// Unlinks `id` from its parent, or from the root slot.
    pub(crate) fn detach(&mut self, id: NodeId) {
        match self.node_mut(id).parent.take() {
            Some(parent) => self.node_mut(parent).children.retain(|c| *c != id),
            None if self.root == Some(id) => self.root = None,
            None => {}
        }
    }

    /// Moves `child`, with its subtree, to the end of `parent`'s children.
    ///
    /// Fails with [`InvalidArgument::Cycle`] when `child` is `parent` or one
    /// of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::InvalidArgument(InvalidArgument::Cycle));
        }
        self.detach(child);
        self.attach(parent, child);
        Ok(())
    }

    /// Detaches `child` from `parent`. Does nothing if it is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(child).parent == Some(parent) {
            self.detach(child);
        }
    }

    /// Sets the first attribute matching `name`, or appends a new one. A value
    /// converting to `None` removes the attribute instead.
    pub fn set_attr<S: AsRef<str>, V: IntoAttributeValue>(&mut self, id: NodeId, name: S, value: V) {
        let name = name.as_ref();
        let value = match value.into_attribute_value() {
            Some(value) => value,
            None => return self.remove_attr(id, name),
        };
        let node = self.node_mut(id);
        match node.attributes.iter_mut().find(|attr| attr.matches(name)) {
            Some(attr) => attr.value = value,
            None => node.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Removes the first attribute matching `name`, if any.
    pub fn remove_attr<S: AsRef<str>>(&mut self, id: NodeId, name: S) {
        let node = self.node_mut(id);
        if let Some(index) = node.attributes.iter().position(|attr| attr.matches(name.as_ref())) {
            node.attributes.remove(index);
        }
    }

    /// Sets an attribute in the namespace `uri`, or removes it when the value
    /// converts to `None`.
    ///
    /// The attribute is stored like a parsed one: under the canonical prefix
    /// of a well-known namespace, else under the URI itself. The printer picks
    /// the nearest prefix bound to the URI, or declares a fresh `tnsN`.
    ///
    /// ```rust
    /// use xmldom::Document;
    ///
    /// let mut doc = Document::new("a");
    /// let root = doc.root().unwrap();
    /// doc.set_attr_ns(root, "urn:example", "kind", "x");
    ///
    /// assert_eq!(doc.attr_ns(root, "urn:example", "kind"), Some("x"));
    /// assert_eq!(doc.node_xml(root), r#"<a xmlns:tns0="urn:example" tns0:kind="x" />"#);
    /// ```
    pub fn set_attr_ns<N: AsRef<str>, V: IntoAttributeValue>(
        &mut self,
        id: NodeId,
        uri: &str,
        name: N,
        value: V,
    ) {
        let name = name.as_ref();
        let index = self.attr_ns_position(id, uri, name);
        match (value.into_attribute_value(), index) {
            (Some(value), Some(index)) => self.node_mut(id).attributes[index].value = value,
            (Some(value), None) => {
                let namespace = canonical_prefix(uri).unwrap_or(uri);
                self.node_mut(id)
                    .attributes
                    .push(Attribute::qualified(Some(namespace), name, value));
            }
            (None, Some(index)) => {
                self.node_mut(id).attributes.remove(index);
            }
            (None, None) => {}
        }
    }

    /// Replaces the character data of a node.
    pub fn set_text<S: Into<String>>(&mut self, id: NodeId, text: S) {
        self.node_mut(id).text = text.into();
    }

    /// Sets or clears the namespace of a node's tag.
    pub fn set_namespace(&mut self, id: NodeId, namespace: Option<Namespace>) {
        self.node_mut(id).namespace = namespace;
    }

    /// Declares `prefix` (empty for the default namespace) at document level.
    /// Such declarations apply wherever the tree does not declare the prefix
    /// itself, and are written out by the first element that needs them.
    pub fn declare_namespace<P: Into<String>, U: Into<String>>(&mut self, prefix: P, uri: U) {
        let ns = Namespace::new(prefix, uri);
        self.namespaces.insert(ns.prefix, ns.uri);
    }

    /// Document-level namespace declarations.
    pub fn declared_namespaces(&self) -> impl Iterator<Item = Namespace> + '_ {
        self.namespaces
            .declared_prefixes()
            .iter()
            .map(|(prefix, uri)| Namespace {
                prefix: prefix.clone(),
                uri: uri.clone(),
            })
    }

    /// Makes `id` take over the contents of `replacement`: name, namespace,
    /// attributes, text and children. `id` keeps its place in the tree; the
    /// replacement is left detached and childless, and the former children
    /// of `id` are detached.
    ///
    /// Fails with [`InvalidArgument::Cycle`] when `replacement` is an
    /// ancestor of `id`.
    pub fn change_to(&mut self, id: NodeId, replacement: NodeId) -> Result<()> {
        self.check(id)?;
        self.check(replacement)?;
        if id == replacement {
            return Ok(());
        }
        if self.ancestors(id).any(|a| a == replacement) {
            return Err(Error::InvalidArgument(InvalidArgument::Cycle));
        }
        self.detach(replacement);

        for child in mem::take(&mut self.node_mut(id).children) {
            self.node_mut(child).parent = None;
        }

        let source = self.node_mut(replacement);
        let children = mem::take(&mut source.children);
        let name = source.name.clone();
        let namespace = source.namespace.clone();
        let attributes = source.attributes.clone();
        let text = source.text.clone();

        for child in &children {
            self.node_mut(*child).parent = Some(id);
        }
        let target = self.node_mut(id);
        target.name = name;
        target.namespace = namespace;
        target.attributes = attributes;
        target.text = text;
        target.children = children;
        Ok(())
    }

    /// Copies the subtree at `id` of `other` into this document, detached.
    ///
    /// The copy carries the namespace URIs it had in `other`: declarations
    /// made above `id` there are added to the top of the copy where the
    /// subtree relies on them.
    pub fn import_node(&mut self, other: &Document, id: NodeId) -> NodeId {
        let top = self.copy_subtree(other, id);

        let mut missing = BTreeSet::new();
        for copied in self.descendants(top).collect::<Vec<_>>() {
            for attr in &self.node(copied).attributes {
                if let Some(ref stored) = attr.namespace {
                    if !attr.is_declaration() && self.attribute_namespace(copied, attr).is_none() {
                        missing.insert(stored.clone());
                    }
                }
            }
        }
        for stored in missing {
            let found = match other.lookup_prefix(id, Some(stored.as_str())) {
                Some(uri) if !uri.is_empty() => Some(Namespace::new(stored.as_str(), uri)),
                _ => match other.lookup_namespace_prefix(id, &stored) {
                    Some(Some(prefix)) => Some(Namespace::new(prefix, stored)),
                    _ => None,
                },
            };
            if let Some(ns) = found {
                self.node_mut(top).attributes.push(ns.to_attribute());
            }
        }
        top
    }

    fn copy_subtree(&mut self, other: &Document, id: NodeId) -> NodeId {
        let source = other.node(id);
        let mut node = Node::new(source.name.as_str());
        node.namespace = other.resolve_namespace(id);
        node.attributes = source.attributes.clone();
        node.text = source.text.clone();
        let copy = self.alloc(node);
        for child in &source.children {
            let child = self.copy_subtree(other, *child);
            self.attach(copy, child);
        }
        copy
    }
}
