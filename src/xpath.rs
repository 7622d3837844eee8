// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Adapter for an external XPath engine.
//!
//! This crate does not evaluate XPath itself. An engine implements
//! [`XPathEngine`] on top of the navigation methods of [`Document`] and the
//! query helpers below delegate to it.

use crate::document::Document;
use crate::node::NodeId;

/// An XPath evaluator.
pub trait XPathEngine {
    /// Evaluates `expr` with `context` as the context node and returns the
    /// selected elements in document order. An expression the engine cannot
    /// evaluate selects nothing.
    fn select(&self, doc: &Document, context: NodeId, expr: &str) -> Vec<NodeId>;
}

impl<'a, T: XPathEngine + ?Sized> XPathEngine for &'a T {
    fn select(&self, doc: &Document, context: NodeId, expr: &str) -> Vec<NodeId> {
        (**self).select(doc, context, expr)
    }
}

impl Document {
    /// All nodes selected by `expr` from `context`.
    pub fn query<X: XPathEngine>(&self, engine: &X, context: NodeId, expr: &str) -> Vec<NodeId> {
        let selected = engine.select(self, context, expr);
        log::trace!("{:?} selected {} nodes", expr, selected.len());
        selected
    }

    /// The first node selected by `expr` from `context`.
    pub fn query_one<X: XPathEngine>(
        &self,
        engine: &X,
        context: NodeId,
        expr: &str,
    ) -> Option<NodeId> {
        self.query(engine, context, expr).into_iter().next()
    }

    /// Calls `f` with the position and id of every selected node.
    pub fn query_each<X, F>(&self, engine: &X, context: NodeId, expr: &str, mut f: F)
    where
        X: XPathEngine,
        F: FnMut(usize, NodeId),
    {
        for (i, id) in self.query(engine, context, expr).into_iter().enumerate() {
            f(i, id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Understands `//name` and absolute-from-anywhere paths like `//a/b/c`.
    pub(crate) struct Descendant;

    impl XPathEngine for Descendant {
        fn select(&self, doc: &Document, context: NodeId, expr: &str) -> Vec<NodeId> {
            let steps: Vec<&str> = match expr.strip_prefix("//") {
                Some(path) => path.split('/').collect(),
                None => return Vec::new(),
            };
            let (first, rest) = match steps.split_first() {
                Some(split) => split,
                None => return Vec::new(),
            };
            let mut current: Vec<NodeId> = doc
                .descendants(context)
                .filter(|id| *first == "*" || doc.node(*id).name() == *first)
                .collect();
            for step in rest {
                current = current
                    .iter()
                    .flat_map(|id| doc.get_children(*id, step))
                    .collect();
            }
            current
        }
    }

    const DATA: &str = r#"<testsuites>
        <testsuite name="pkg">
            <testcase id="one"/>
            <testcase id="two"/>
        </testsuite>
    </testsuites>"#;

    #[test]
    fn query_helpers() {
        let doc = Document::parse_str(DATA).unwrap();
        let root = doc.root().unwrap();

        assert_eq!(doc.query(&Descendant, root, "//*").len(), 4);
        let cases = doc.query(&Descendant, root, "//testcase");
        assert_eq!(cases.len(), 2);

        let first = doc.query_one(&Descendant, root, "//testsuite/testcase").unwrap();
        assert_eq!(doc.node(first).attr("id"), Some("one"));
        assert_eq!(doc.query_one(&Descendant, root, "//missing"), None);
        assert!(doc.query(&Descendant, root, "bad").is_empty());

        let mut ids = Vec::new();
        doc.query_each(&Descendant, root, "//testcase", |i, id| {
            ids.push(format!("{}:{}", i, doc.node(id).attr("id").unwrap()))
        });
        assert_eq!(ids, vec!["0:one", "1:two"]);
    }

    #[test]
    fn engine_by_reference() {
        let doc = Document::parse_str(DATA).unwrap();
        let engine: &dyn XPathEngine = &Descendant;
        let root = doc.root().unwrap();
        assert_eq!(doc.query(&engine, root, "//testsuite").len(), 1);
    }
}
