// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Bastien Orivel <eijebong+minidom@bananium.fr>
// Copyright (c) 2020 Astro <astro@spaceboyz.net>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
// Copyright (c) 2020 Matt Bilker <me@mbilker.us>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides the error types for this crate.

use std::error::Error as StdError;
use std::fmt;

/// Errors raised while turning a token stream into a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Error reported by the quick-xml tokenizer.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error reported by the rxml tokenizer.
    #[error("XML error: {0}")]
    Rxml(#[from] rxml::Error),

    /// A malformed attribute in a start tag.
    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A malformed character or entity reference.
    #[error("malformed escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// The input is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An entity reference other than the five predefined ones.
    #[error("unknown entity `&{0};`")]
    UnknownEntity(String),

    /// An end tag arrived while no element was open.
    #[error("end tag without a matching start tag")]
    UnmatchedEndTag,

    /// The end of the document was reached while elements were still open.
    #[error("the end of the document has been reached prematurely")]
    EndOfDocument,

    /// A second element was opened at the top level.
    #[error("the document has more than one root element")]
    MultipleRoots,
}

impl From<rxml::error::XmlError> for ParseError {
    fn from(err: rxml::error::XmlError) -> ParseError {
        ParseError::Rxml(err.into())
    }
}

/// Boxed cause returned by a transform function.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors raised by [`Document::transform`](crate::Document::transform).
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The rewrite function itself failed.
    #[error("rewrite function failed: {0}")]
    Rewrite(#[source] BoxError),

    /// The rewritten bytes could not be parsed back.
    #[error("parse transform xml error: {0}")]
    Parse(#[source] ParseError),

    /// The rewritten bytes contain no root element.
    #[error("the rewritten XML has no root element")]
    EmptyOutput,
}

/// Our main error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A mutation received an argument it cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(InvalidArgument),

    /// An insertion index past the end of a child list.
    #[error("index {index} is out of bounds for {len} children")]
    Index {
        /// The requested position.
        index: usize,
        /// The number of children at the time of the call.
        len: usize,
    },

    /// A subtree transform failed; the tree was left untouched.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Reading a source or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What was wrong with an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// The id does not belong to this document's arena.
    UnknownNode,
    /// The operation would make a node its own ancestor.
    Cycle,
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidArgument::UnknownNode => write!(fmt, "the node does not belong to this document"),
            InvalidArgument::Cycle => write!(fmt, "a node cannot become its own descendant"),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Parse(err.into())
    }
}

/// Our simplified Result type.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Unwraps a result, panicking with the error's message otherwise.
///
/// ```rust
/// use xmldom::{must, Document};
///
/// let doc = must(Document::parse_str("<a/>"));
/// assert!(doc.root().is_some());
/// ```
#[track_caller]
pub fn must<T, E: fmt::Display>(result: ::std::result::Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    }
}
