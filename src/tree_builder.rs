// Copyright (c) 2022 Astro <astro@spaceboyz.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Token stream to DOM tree conversion

use crate::document::Document;
use crate::error::ParseError;
use crate::namespaces::Namespace;
use crate::node::{Attribute, Node, NodeId};
use crate::prefixes::{self, Prefixes, XML_NS};
use crate::token::{RawAttribute, Token, TokenSource};

/// Tree-building parser state
pub struct TreeBuilder {
    doc: Document,
    /// Innermost open element
    current: Option<NodeId>,
    /// Namespace set stack by prefix
    prefixes_stack: Vec<Prefixes>,
    /// Character data not yet assigned to `current`
    pending_text: Option<String>,
    seen_element: bool,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Create a new one
    pub fn new() -> Self {
        TreeBuilder {
            doc: Document::default(),
            current: None,
            prefixes_stack: vec![Prefixes::from((Some(String::from("xml")), XML_NS.to_owned()))],
            pending_text: None,
            seen_element: false,
        }
    }

    /// Allow setting prefixes stack.
    ///
    /// Useful to provide knowledge of namespaces that would have been declared on parent elements
    /// not present in the reader.
    pub fn with_prefixes_stack(mut self, prefixes_stack: Vec<Prefixes>) -> Self {
        self.prefixes_stack.extend(prefixes_stack);
        self
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.current;
        while let Some(id) = cursor {
            depth += 1;
            cursor = self.doc.node(id).parent;
        }
        depth
    }

    /// Lookup XML namespace declaration for given prefix (or no prefix)
    fn lookup_prefix(&self, prefix: &Option<String>) -> Option<&str> {
        prefixes::lookup(&self.prefixes_stack, prefix)
    }

    /// What a prefixed attribute keeps as its namespace: the canonical prefix
    /// of a well-known URI, the URI itself for any other bound prefix, and the
    /// prefix as written when nothing binds it.
    fn attribute_namespace(&self, prefix: String) -> String {
        match self.lookup_prefix(&Some(prefix.clone())) {
            Some(uri) if !uri.is_empty() => match prefixes::canonical_prefix(uri) {
                Some(canonical) => canonical.to_owned(),
                None => uri.to_owned(),
            },
            _ => prefix,
        }
    }

    fn flush_text(&mut self) {
        if let Some(text) = self.pending_text.take() {
            if let Some(current) = self.current {
                self.doc.node_mut(current).text = text.trim().to_owned();
            }
        }
    }

    fn process_start_tag(
        &mut self,
        prefix: Option<String>,
        name: String,
        raw_attributes: Vec<RawAttribute>,
    ) -> Result<(), ParseError> {
        if self.current.is_none() && self.doc.root().is_some() {
            return Err(ParseError::MultipleRoots);
        }

        let mut declarations = Prefixes::default();
        for attr in &raw_attributes {
            match (attr.prefix.as_deref(), attr.name.as_str()) {
                (None, "xmlns") => declarations.insert(None, attr.value.as_str()),
                (Some("xmlns"), prefix) => {
                    declarations.insert(Some(prefix.to_owned()), attr.value.as_str())
                }
                _ => {}
            }
        }
        self.prefixes_stack.push(declarations);

        let attributes = raw_attributes
            .into_iter()
            .map(|attr| {
                let namespace = match attr.prefix {
                    Some(prefix) if prefix != "xmlns" => Some(self.attribute_namespace(prefix)),
                    prefix => prefix,
                };
                Attribute::qualified(namespace, attr.name, attr.value)
            })
            .collect();

        let namespace = match (self.lookup_prefix(&prefix), prefix) {
            (Some(uri), prefix) if prefix.is_some() || !uri.is_empty() => Some(Namespace {
                prefix,
                uri: uri.to_owned(),
            }),
            (None, Some(prefix)) => {
                log::debug!("prefix {} of <{}> is not bound", prefix, name);
                Some(Namespace {
                    prefix: Some(prefix),
                    uri: String::new(),
                })
            }
            _ => None,
        };

        let mut node = Node::new(name);
        node.namespace = namespace;
        node.attributes = attributes;
        let id = self.doc.alloc(node);
        match self.current {
            Some(parent) => self.doc.attach(parent, id),
            None => self.doc.set_root(id),
        }
        self.current = Some(id);
        self.seen_element = true;
        Ok(())
    }

    fn process_end_tag(&mut self) -> Result<(), ParseError> {
        let current = self.current.ok_or(ParseError::UnmatchedEndTag)?;
        self.prefixes_stack.pop();
        self.current = self.doc.node(current).parent;
        Ok(())
    }

    fn process_text(&mut self, text: String) {
        if self.current.is_some() {
            match self.pending_text {
                Some(ref mut pending) => pending.push_str(&text),
                None => self.pending_text = Some(text),
            }
        }
    }

    /// Process a token pulled from a `TokenSource`
    pub fn process_token(&mut self, token: Token) -> Result<(), ParseError> {
        log::trace!("token {:?}", token);
        if !matches!(token, Token::CharData(_)) {
            self.flush_text();
        }

        match token {
            Token::StartElement {
                prefix,
                name,
                attributes,
            } => self.process_start_tag(prefix, name, attributes)?,

            Token::EndElement => self.process_end_tag()?,

            Token::CharData(text) => self.process_text(text),

            Token::ProcessingInstruction { target, data } => {
                if !self.seen_element {
                    self.doc.proc_inst = if data.is_empty() {
                        format!("<?{}?>", target)
                    } else {
                        format!("<?{} {}?>", target, data)
                    };
                }
            }

            Token::Directive(directive) => self.doc.directives.push(format!("<!{}>", directive)),
        }

        Ok(())
    }

    /// Drain `source` and return the finished document.
    pub fn build<S: TokenSource>(mut self, source: &mut S) -> Result<Document, ParseError> {
        while let Some(token) = source.next_token()? {
            self.process_token(token)?;
        }
        self.finish()
    }

    /// Check that every element was closed and return the document.
    pub fn finish(mut self) -> Result<Document, ParseError> {
        self.flush_text();
        if self.current.is_some() {
            return Err(ParseError::EndOfDocument);
        }
        log::debug!(
            "parsed document with {} nodes and {} directives",
            self.doc.node_count(),
            self.doc.directives.len()
        );
        Ok(self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefixes::XLINK_NS;
    use crate::token::TokenIter;

    fn start(name: &str, attributes: Vec<RawAttribute>) -> Token {
        let (prefix, name) = crate::node::split_qualified(name);
        Token::StartElement {
            prefix: prefix.map(str::to_owned),
            name: name.to_owned(),
            attributes,
        }
    }

    #[test]
    fn builds_from_tokens() {
        let tokens = vec![
            Token::ProcessingInstruction {
                target: String::from("xml"),
                data: String::from("version=\"1.0\""),
            },
            Token::Directive(String::from("DOCTYPE a")),
            start("a", vec![RawAttribute::new("id", "1")]),
            Token::CharData(String::from("\n  ")),
            start("b", vec![]),
            Token::CharData(String::from("  hello ")),
            Token::CharData(String::from("world  ")),
            Token::EndElement,
            Token::CharData(String::from("\n")),
            Token::EndElement,
            Token::CharData(String::from("trailing")),
        ];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();

        assert_eq!(doc.proc_inst, "<?xml version=\"1.0\"?>");
        assert_eq!(doc.directives, vec![String::from("<!DOCTYPE a>")]);
        let root = doc.root().unwrap();
        assert_eq!(doc.node(root).attr("id"), Some("1"));
        assert_eq!(doc.node(root).text(), "");
        let b = doc.first_child(root).unwrap();
        assert_eq!(doc.node(b).text(), "hello world");
        assert_eq!(doc.parent(b), Some(root));
    }

    #[test]
    fn unmatched_end_tag() {
        let tokens = vec![start("a", vec![]), Token::EndElement, Token::EndElement];
        assert!(matches!(
            TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())),
            Err(ParseError::UnmatchedEndTag)
        ));
    }

    #[test]
    fn premature_end() {
        let tokens = vec![start("a", vec![]), start("b", vec![]), Token::EndElement];
        assert!(matches!(
            TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())),
            Err(ParseError::EndOfDocument)
        ));
    }

    #[test]
    fn no_element_means_no_root() {
        let tokens = vec![Token::CharData(String::from("stray"))];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();
        assert_eq!(doc.root(), None);
    }

    #[test]
    fn second_root_is_rejected() {
        let tokens = vec![start("a", vec![]), Token::EndElement, start("b", vec![])];
        assert!(matches!(
            TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())),
            Err(ParseError::MultipleRoots)
        ));
    }

    #[test]
    fn processing_instruction_after_root_is_ignored() {
        let tokens = vec![
            start("a", vec![]),
            Token::ProcessingInstruction {
                target: String::from("late"),
                data: String::new(),
            },
            Token::EndElement,
        ];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();
        assert_eq!(doc.proc_inst, "");
    }

    #[test]
    fn namespaces_from_scope() {
        let tokens = vec![
            start(
                "S:Envelope",
                vec![
                    RawAttribute::new("xmlns:S", "urn:s"),
                    RawAttribute::new("xmlns", "urn:default"),
                ],
            ),
            start("S:Body", vec![RawAttribute::new("xml:lang", "en")]),
            start("item", vec![]),
            Token::EndElement,
            start("plain", vec![RawAttribute::new("xmlns", "")]),
            Token::EndElement,
            Token::EndElement,
            Token::EndElement,
        ];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();
        let root = doc.root().unwrap();
        let body = doc.first_child(root).unwrap();
        let item = doc.first_child(body).unwrap();
        let plain = doc.last_child(body).unwrap();

        assert_eq!(doc.node(root).namespace(), Some(&Namespace::new("S", "urn:s")));
        assert_eq!(doc.node(body).namespace(), Some(&Namespace::new("S", "urn:s")));
        assert_eq!(doc.node(item).namespace(), Some(&Namespace::new("", "urn:default")));
        assert_eq!(doc.node(plain).namespace(), None);
        assert_eq!(doc.node(body).attr("xml:lang"), Some("en"));
    }

    #[test]
    fn unbound_prefixes_are_kept() {
        let tokens = vec![
            start("p:a", vec![RawAttribute::new("x:y", "1")]),
            Token::EndElement,
        ];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.node(root).namespace(), Some(&Namespace::new("p", "")));
        assert_eq!(doc.node(root).attributes()[0].qualified_name(), "x:y");
    }

    #[test]
    fn attribute_namespaces() {
        let tokens = vec![
            start(
                "r",
                vec![
                    RawAttribute::new("xmlns:l", XLINK_NS),
                    RawAttribute::new("xmlns:foo", "urn:x"),
                    RawAttribute::new("l:href", "#a"),
                    RawAttribute::new("foo:bar", "1"),
                    RawAttribute::new("xml:lang", "en"),
                ],
            ),
            Token::EndElement,
        ];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();
        let root = doc.root().unwrap();
        let names: Vec<_> = doc
            .node(root)
            .attributes()
            .iter()
            .map(|attr| attr.qualified_name().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["xmlns:l", "xmlns:foo", "xlink:href", "urn:x:bar", "xml:lang"]
        );
        assert_eq!(doc.node(root).attr("urn:x:bar"), Some("1"));
    }

    #[test]
    fn mixed_content_keeps_the_last_run() {
        let tokens = vec![
            start("a", vec![]),
            Token::CharData(String::from("x")),
            start("b", vec![]),
            Token::EndElement,
            Token::CharData(String::from("\n")),
            Token::EndElement,
        ];
        let doc = TreeBuilder::new().build(&mut TokenIter(tokens.into_iter())).unwrap();
        assert_eq!(doc.node(doc.root().unwrap()).text(), "");
    }

    #[test]
    fn outer_prefixes() {
        let outer = Prefixes::from((Some(String::from("stream")), String::from("urn:stream")));
        let tokens = vec![start("stream:features", vec![]), Token::EndElement];
        let doc = TreeBuilder::new()
            .with_prefixes_stack(vec![outer])
            .build(&mut TokenIter(tokens.into_iter()))
            .unwrap();
        let root = doc.root().unwrap();
        assert_eq!(
            doc.node(root).namespace(),
            Some(&Namespace::new("stream", "urn:stream"))
        );
    }
}
