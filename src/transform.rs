// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rewriting a subtree through its serialized form.

use crate::document::Document;
use crate::error::{BoxError, Result, TransformError};
use crate::node::NodeId;
use crate::prefixes::Prefixes;
use crate::token::XmlTokens;
use crate::tree_builder::TreeBuilder;

use std::collections::BTreeMap;

impl Document {
    /// Serializes the subtree at `id`, hands the bytes to `f` and replaces
    /// the subtree with the parsed result, in place: `id` stays valid and
    /// keeps its position.
    ///
    /// The output may use any prefix bound around `id` without declaring it.
    /// If `f` fails, or its output does not parse into exactly one element,
    /// the document is left untouched.
    ///
    /// ```rust
    /// use xmldom::Document;
    ///
    /// let mut doc = Document::parse_str("<a><b>1</b></a>").unwrap();
    /// let b = doc.first_child(doc.root().unwrap()).unwrap();
    /// doc.transform(b, |xml| {
    ///     let xml = String::from_utf8(xml.to_vec())?;
    ///     Ok::<_, std::string::FromUtf8Error>(xml.replace('b', "c").into_bytes())
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(doc.node_xml(doc.root().unwrap()), "<a><c>1</c></a>");
    /// ```
    pub fn transform<F, E>(&mut self, id: NodeId, f: F) -> Result<()>
    where
        F: FnOnce(&[u8]) -> std::result::Result<Vec<u8>, E>,
        E: Into<BoxError>,
    {
        self.check(id)?;
        let input = self.node_xml(id);
        let output = f(input.as_bytes()).map_err(|e| TransformError::Rewrite(e.into()))?;

        let parsed = TreeBuilder::new()
            .with_prefixes_stack(self.scope_around(id))
            .build(&mut XmlTokens::new(&output[..]))
            .map_err(|e| {
                log::debug!("transform output rejected: {}", e);
                TransformError::Parse(e)
            })?;
        let root = parsed.root().ok_or(TransformError::EmptyOutput)?;

        let replacement = self.import_node(&parsed, root);
        self.change_to(id, replacement)?;
        log::debug!(
            "transformed <{}>: {} bytes in, {} bytes out",
            self.node(id).name(),
            input.len(),
            output.len()
        );
        Ok(())
    }

    /// Namespace scopes enclosing `id`, outermost first.
    fn scope_around(&self, id: NodeId) -> Vec<Prefixes> {
        let mut stack = vec![self.namespaces.clone()];
        let mut ancestors: Vec<NodeId> = self.ancestors(id).collect();
        ancestors.reverse();
        for ancestor in ancestors {
            let declarations: BTreeMap<_, _> = self
                .namespace_declarations(ancestor)
                .into_iter()
                .map(|ns| (ns.prefix, ns.uri))
                .collect();
            stack.push(Prefixes::from(declarations));
        }
        stack
    }
}
