// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Bastien Orivel <eijebong+minidom@bananium.fr>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
// Copyright (c) 2020 Yue Liu <amznyue@amazon.com>
// Copyright (c) 2020 Matt Bilker <me@mbilker.us>
// Copyright (c) 2020 Xidorn Quan <me@upsuper.org>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the `Document` type, which owns every node of a tree.
//!
//! Nodes live in an arena inside the document and refer to each other through
//! [`NodeId`]s, so the parent link of a node is a plain index and dropping the
//! document frees the whole tree. A `NodeId` handed out by one document means
//! nothing to another one; use [`Document::import_node`] to copy a subtree
//! across documents.
//!
//! Mutation needs `&mut Document`, which rules out walking a subtree while it
//! is being edited. Sharing a document between threads needs an external lock.

use crate::error::{Error, InvalidArgument, Result};
use crate::namespaces::NSChoice;
use crate::node::{Node, NodeId};
use crate::prefixes::Prefixes;
use crate::token::{TokenSource, XmlTokens};
use crate::tree_builder::TreeBuilder;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// The XML declaration put on documents built with [`Document::new`].
pub const DEFAULT_PROC_INST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// An XML document: prologue, root element and serialization flags.
#[derive(Clone, Debug)]
pub struct Document {
    /// Raw processing instruction emitted before everything else, usually the
    /// XML declaration. May be empty.
    pub proc_inst: String,
    /// Raw directives such as `<!DOCTYPE ...>`, in encounter order.
    pub directives: Vec<String>,
    /// Collapse childless, textless elements into `<tag />`.
    pub empty_element_tag: bool,
    /// Escape text content; when off, text is written verbatim.
    pub text_safe_mode: bool,
    pub(crate) namespaces: Prefixes,
    pub(crate) root: Option<NodeId>,
    pub(crate) nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            proc_inst: String::new(),
            directives: Vec::new(),
            empty_element_tag: true,
            text_safe_mode: true,
            namespaces: Prefixes::default(),
            root: None,
            nodes: Vec::new(),
        }
    }
}

impl Document {
    /// Creates a document with the default XML declaration and a root element
    /// called `name`. An empty `name` leaves the document without a root.
    ///
    /// ```rust
    /// use xmldom::Document;
    ///
    /// let doc = Document::new("testsuites");
    /// assert_eq!(doc.xml(), r#"<?xml version="1.0" encoding="UTF-8"?><testsuites />"#);
    /// ```
    pub fn new<S: Into<String>>(name: S) -> Document {
        let name = name.into();
        let mut doc = Document {
            proc_inst: DEFAULT_PROC_INST.to_owned(),
            ..Document::default()
        };
        if !name.is_empty() {
            let root = doc.alloc(Node::new(name));
            doc.root = Some(root);
        }
        doc
    }

    /// Builds a document from any token source.
    pub fn from_tokens<S: TokenSource>(mut source: S) -> Result<Document> {
        Ok(TreeBuilder::new().build(&mut source)?)
    }

    /// Parse a document from a `BufRead`.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Document> {
        Document::from_tokens(XmlTokens::new(reader))
    }

    /// Parse a document from a string.
    ///
    /// ```rust
    /// use xmldom::Document;
    ///
    /// let doc = Document::parse_str("<a><b id='x'/></a>").unwrap();
    /// let b = doc.find_by_id(doc.root().unwrap(), "x").unwrap();
    /// assert_eq!(doc.node(b).name(), "b");
    /// ```
    pub fn parse_str(s: &str) -> Result<Document> {
        Document::from_reader(s.as_bytes())
    }

    /// Parse a document from raw bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
        Document::from_reader(bytes)
    }

    /// Parse the document stored at `path`.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
        let file = File::open(path)?;
        Document::from_reader(BufReader::new(file))
    }

    /// Replaces the prologue and the tree with the ones parsed from `source`,
    /// keeping this document's serialization flags and namespace
    /// declarations. On error the document is left as it was.
    pub fn load<S: TokenSource>(&mut self, source: S) -> Result<()> {
        let parsed = Document::from_tokens(source)?;
        self.proc_inst = parsed.proc_inst;
        self.directives = parsed.directives;
        self.root = parsed.root;
        self.nodes = parsed.nodes;
        Ok(())
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Appends `child` to `parent` without any check; `child` must be detached.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.nodes[id.index()].parent = None;
        self.root = Some(id);
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(InvalidArgument::UnknownNode))
        }
    }

    /// Number of nodes allocated so far, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The root element, if the document has one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of `id`, in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// First child of `id`.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    /// Last child of `id`.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.last().copied()
    }

    /// Position of `child` among the children of `parent`.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.node(parent).children.iter().position(|c| *c == child)
    }

    /// The sibling right before `id`.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(parent, id)?;
        index
            .checked_sub(1)
            .map(|prev| self.node(parent).children[prev])
    }

    /// The sibling right after `id`.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(parent, id)?;
        self.node(parent).children.get(index + 1).copied()
    }

    /// First child of `parent` named `name`.
    pub fn get_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.node(*c).name == name)
    }

    /// First child of `parent` with this name and namespace.
    pub fn get_child_ns<'a, NS: Into<NSChoice<'a>>>(
        &self,
        parent: NodeId,
        name: &str,
        namespace: NS,
    ) -> Option<NodeId> {
        let namespace = namespace.into();
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.is(*c, name, namespace))
    }

    /// All children of `parent` named `name`.
    pub fn get_children(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|c| self.node(*c).name == name)
            .collect()
    }

    /// Iterator over the ancestors of `id`, parent first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Iterator over `id` and its descendants, in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.ancestors(id).any(|a| a == ancestor)
    }

    /// First node in the subtree of `id` (itself included) whose `id`
    /// attribute equals `value`.
    pub fn find_by_id(&self, id: NodeId, value: &str) -> Option<NodeId> {
        self.descendants(id)
            .find(|n| self.node(*n).attr("id") == Some(value))
    }

    /// First node in the subtree of `id` (itself included) named `name`.
    pub fn find_one_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id).find(|n| self.node(*n).name == name)
    }

    /// Every node in the subtree of `id` (itself included) named `name`, in
    /// document order.
    pub fn find_by_name(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|n| self.node(*n).name == name)
            .collect()
    }

    /// Structural equality of two subtrees: names, namespace URIs, attributes,
    /// text and children, in order. Namespace declarations are not compared,
    /// only the namespaces they resolve to, for tags and attributes alike.
    pub fn subtree_eq(&self, id: NodeId, other: &Document, other_id: NodeId) -> bool {
        let (a, b) = (self.node(id), other.node(other_id));
        let uri = |doc: &Document, id| doc.resolve_namespace(id).map(|ns| ns.uri);
        a.name == b.name
            && uri(self, id) == uri(other, other_id)
            && plain_attributes(self, id).eq(plain_attributes(other, other_id))
            && a.text == b.text
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .zip(b.children.iter())
                .all(|(x, y)| self.subtree_eq(*x, other, *y))
    }
}

fn plain_attributes(
    doc: &Document,
    id: NodeId,
) -> impl Iterator<Item = (Option<String>, &str, &str)> {
    doc.node(id)
        .attributes
        .iter()
        .filter(|attr| !attr.is_declaration())
        .map(move |attr| {
            let namespace = match doc.attribute_namespace(id, attr) {
                Some(ns) => Some(ns.uri),
                None => attr.namespace.clone(),
            };
            (namespace, attr.name.as_str(), attr.value.as_str())
        })
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.proc_inst == other.proc_inst
            && self.directives == other.directives
            && match (self.root, other.root) {
                (Some(a), Some(b)) => self.subtree_eq(a, other, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Document> {
        Document::parse_str(s)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xml())
    }
}

impl<'a> From<&'a Document> for String {
    fn from(doc: &'a Document) -> String {
        doc.xml()
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}
