// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Bastien Orivel <eijebong+minidom@bananium.fr>
// Copyright (c) 2020 Astro <astro@spaceboyz.net>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![deny(missing_docs)]

//! A mutable XML DOM that keeps namespace prefixes as written and prints any
//! subtree with the declarations it needs.
//!
//! A [`Document`] owns its elements in an arena and hands out [`NodeId`]s.
//! Text is parsed through a [`TokenSource`], [`XmlTokens`] (quick-xml) by
//! default or [`RxmlTokens`] for restricted XMPP-style input, and printed
//! back compact or pretty.
//!
//! # Example
//!
//! ```rust
//! use xmldom::Document;
//!
//! const DATA: &'static str = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
//!     <S:Body>
//!         <ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
//!             <ds:SignedInfo><ds:DigestValue>KHDH==</ds:DigestValue></ds:SignedInfo>
//!         </ds:Signature>
//!     </S:Body>
//! </S:Envelope>"#;
//!
//! fn main() {
//!     let mut doc: Document = DATA.parse().unwrap();
//!     let root = doc.root().unwrap();
//!
//!     let info = doc.find_one_by_name(root, "SignedInfo").unwrap();
//!     assert_eq!(
//!         doc.node_xml(info),
//!         r#"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:DigestValue>KHDH==</ds:DigestValue></ds:SignedInfo>"#,
//!     );
//!
//!     let digest = doc.find_one_by_name(info, "DigestValue").unwrap();
//!     doc.set_text(digest, "AAAA==");
//!     assert!(doc.xml().contains("<ds:DigestValue>AAAA==</ds:DigestValue>"));
//! }
//! ```

pub mod convert;
pub mod document;
mod editor;
pub mod error;
mod namespaces;
pub mod node;
pub mod prefixes;
pub mod printer;
pub mod token;
mod transform;
pub mod tree_builder;
pub mod xpath;


pub use convert::IntoAttributeValue;
pub use document::Document;
pub use error::{must, Error, ParseError, Result, TransformError};
pub use namespaces::{NSChoice, Namespace};
pub use node::{Attribute, Node, NodeId};
pub use prefixes::{XLINK_NS, XMLNS_NS, XML_NS, XSI_NS};
pub use token::{RxmlTokens, Token, TokenIter, TokenSource, XmlTokens};
pub use xpath::XPathEngine;
