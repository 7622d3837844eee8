// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Token sources feeding the tree builder.
//!
//! The tree builder never looks at raw bytes. It pulls [`Token`]s from a
//! [`TokenSource`]: [`XmlTokens`] wraps quick-xml and accepts full XML 1.0
//! (declaration, DOCTYPE, processing instructions, comments, CDATA), while
//! [`RxmlTokens`] wraps rxml's restricted parser, which rejects everything an
//! XMPP stream may not contain.

use crate::error::ParseError;
use crate::node::split_qualified;

use std::io::BufRead;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use rxml::{EventRead, Lexer, PullDriver, RawEvent, RawParser};

/// An attribute as written in a start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAttribute {
    /// Prefix as written, `xmlns` for prefixed namespace declarations.
    pub prefix: Option<String>,
    /// Local name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

impl RawAttribute {
    /// Splits a `prefix:local` name.
    pub fn new<N: AsRef<str>, V: Into<String>>(name: N, value: V) -> RawAttribute {
        let (prefix, name) = split_qualified(name.as_ref());
        RawAttribute {
            prefix: prefix.map(str::to_owned),
            name: name.to_owned(),
            value: value.into(),
        }
    }
}

/// One syntactic event of an XML document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// A start tag; empty-element tags produce a start and an end token.
    StartElement {
        /// Prefix as written.
        prefix: Option<String>,
        /// Local name.
        name: String,
        /// Attributes in document order.
        attributes: Vec<RawAttribute>,
    },
    /// An end tag.
    EndElement,
    /// Unescaped character data, possibly a fragment of a longer run.
    CharData(String),
    /// A processing instruction, including the XML declaration.
    ProcessingInstruction {
        /// `xml` for the declaration.
        target: String,
        /// Everything after the target.
        data: String,
    },
    /// The content of a `<!...>` directive, such as `DOCTYPE html`.
    Directive(String),
}

/// A pull-based stream of tokens; `Ok(None)` marks the end of input.
pub trait TokenSource {
    /// Returns the next token.
    fn next_token(&mut self) -> Result<Option<Token>, ParseError>;
}

/// Adapts any iterator of tokens, mostly useful to feed a prepared sequence.
pub struct TokenIter<I>(pub I);

impl<I: Iterator<Item = Token>> TokenSource for TokenIter<I> {
    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        Ok(self.0.next())
    }
}

/// Full XML 1.0 tokenizer built on quick-xml.
pub struct XmlTokens<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending_end: bool,
}

impl<R: BufRead> XmlTokens<R> {
    /// Tokenizes `source`.
    pub fn new(source: R) -> XmlTokens<R> {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);
        XmlTokens {
            reader,
            buf: Vec::new(),
            pending_end: false,
        }
    }
}

impl<R: BufRead> TokenSource for XmlTokens<R> {
    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        if self.pending_end {
            self.pending_end = false;
            return Ok(Some(Token::EndElement));
        }

        loop {
            self.buf.clear();
            let token = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => Some(start_element(&e)?),
                Event::Empty(e) => {
                    let token = start_element(&e)?;
                    self.pending_end = true;
                    Some(token)
                }
                Event::End(_) => Some(Token::EndElement),
                Event::Text(e) => {
                    let raw = std::str::from_utf8(&*e)?;
                    Some(Token::CharData(quick_xml::escape::unescape(raw)?.into_owned()))
                }
                Event::CData(e) => {
                    let bytes = e.into_inner();
                    Some(Token::CharData(std::str::from_utf8(&bytes)?.to_owned()))
                }
                Event::GeneralRef(e) => {
                    let name = std::str::from_utf8(e.as_ref())?;
                    Some(Token::CharData(resolve_reference(name)?))
                }
                Event::PI(e) => Some(Token::ProcessingInstruction {
                    target: std::str::from_utf8(e.target())?.to_owned(),
                    data: std::str::from_utf8(e.content())?.trim_start().to_owned(),
                }),
                Event::Decl(d) => Some(declaration(&d)?),
                Event::DocType(e) => {
                    let raw = std::str::from_utf8(e.as_ref())?;
                    Some(Token::Directive(format!("DOCTYPE {}", raw.trim())))
                }
                Event::Eof => return Ok(None),
                // Comments carry nothing the tree keeps.
                _ => None,
            };
            if token.is_some() {
                return Ok(token);
            }
        }
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<Token, ParseError> {
    let qname = e.name();
    let (prefix, name) = split_qualified(std::str::from_utf8(qname.as_ref())?);

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let raw = std::str::from_utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw)?;
        attributes.push(RawAttribute::new(key, value.into_owned()));
    }

    Ok(Token::StartElement {
        prefix: prefix.map(str::to_owned),
        name: name.to_owned(),
        attributes,
    })
}

/// The declaration as written, minus the `xml` target.
fn declaration(d: &BytesDecl<'_>) -> Result<Token, ParseError> {
    let raw = std::str::from_utf8(d)?;
    let data = raw.strip_prefix("xml").unwrap_or(raw).trim();
    Ok(Token::ProcessingInstruction {
        target: String::from("xml"),
        data: data.to_owned(),
    })
}

/// Resolves `&name;` for the predefined entities and character references.
fn resolve_reference(name: &str) -> Result<String, ParseError> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        return value
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| ParseError::UnknownEntity(name.to_owned()));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_owned)
        .ok_or_else(|| ParseError::UnknownEntity(name.to_owned()))
}

/// Restricted XML tokenizer built on rxml.
///
/// Rejects comments, processing instructions other than the XML declaration,
/// and DOCTYPE, so it suits protocol streams rather than documents. rxml only
/// reports the version of an XML declaration, so the declaration comes out as
/// `<?xml version="1.0"?>` whatever encoding or standalone flag it carried.
pub struct RxmlTokens<R: BufRead> {
    driver: PullDriver<R, RawParser>,
    head: Option<(Option<String>, String, Vec<RawAttribute>)>,
}

impl<R: BufRead> RxmlTokens<R> {
    /// Tokenizes `source`.
    pub fn new(source: R) -> RxmlTokens<R> {
        RxmlTokens {
            driver: PullDriver::wrap(source, Lexer::new(), RawParser::new()),
            head: None,
        }
    }
}

impl<R: BufRead> TokenSource for RxmlTokens<R> {
    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        while let Some(event) = self.driver.read()? {
            match event {
                RawEvent::XmlDeclaration(_, _) => {
                    return Ok(Some(Token::ProcessingInstruction {
                        target: String::from("xml"),
                        data: String::from("version=\"1.0\""),
                    }));
                }

                RawEvent::ElementHeadOpen(_, (prefix, name)) => {
                    self.head = Some((
                        prefix.map(|prefix| prefix.as_str().to_owned()),
                        name.as_str().to_owned(),
                        Vec::new(),
                    ));
                }

                RawEvent::Attribute(_, (prefix, name), value) => {
                    if let Some((_, _, ref mut attributes)) = self.head.as_mut() {
                        attributes.push(RawAttribute {
                            prefix: prefix.map(|prefix| prefix.as_str().to_owned()),
                            name: name.as_str().to_owned(),
                            value: value.as_str().to_owned(),
                        });
                    }
                }

                RawEvent::ElementHeadClose(_) => {
                    if let Some((prefix, name, attributes)) = self.head.take() {
                        return Ok(Some(Token::StartElement {
                            prefix,
                            name,
                            attributes,
                        }));
                    }
                }

                RawEvent::ElementFoot(_) => return Ok(Some(Token::EndElement)),

                RawEvent::Text(_, text) => {
                    return Ok(Some(Token::CharData(text.as_str().to_owned())));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<S: TokenSource>(mut source: S) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(token) = source.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    #[test]
    fn quick_xml_tokens() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE junit SYSTEM "junit-result.dtd">
<!-- dropped -->
<a:root xmlns:a="urn:a" x="1 &amp; 2"><b/>t&lt;<![CDATA[<raw>]]></a:root>"#;
        let tokens = collect(XmlTokens::new(xml.as_bytes())).unwrap();
        let structural: Vec<&Token> = tokens
            .iter()
            .filter(|t| !matches!(t, Token::CharData(s) if s.trim().is_empty()))
            .collect();

        assert_eq!(
            structural[0],
            &Token::ProcessingInstruction {
                target: String::from("xml"),
                data: String::from(r#"version="1.0" encoding="UTF-8""#),
            }
        );
        assert_eq!(
            structural[1],
            &Token::Directive(String::from(r#"DOCTYPE junit SYSTEM "junit-result.dtd""#))
        );
        assert_eq!(
            structural[2],
            &Token::StartElement {
                prefix: Some(String::from("a")),
                name: String::from("root"),
                attributes: vec![
                    RawAttribute::new("xmlns:a", "urn:a"),
                    RawAttribute::new("x", "1 & 2"),
                ],
            }
        );
        assert_eq!(
            structural[3],
            &Token::StartElement {
                prefix: None,
                name: String::from("b"),
                attributes: vec![],
            }
        );
        assert_eq!(structural[4], &Token::EndElement);
        let text: String = structural[5..structural.len() - 1]
            .iter()
            .map(|t| match t {
                Token::CharData(s) => s.as_str(),
                other => panic!("unexpected token {:?}", other),
            })
            .collect();
        assert_eq!(text, "t<<raw>");
        assert_eq!(structural.last(), Some(&&Token::EndElement));
    }

    #[test]
    fn declaration_is_kept_as_written() {
        let tokens =
            collect(XmlTokens::new(&b"<?xml version='1.0' standalone='yes' ?><r/>"[..])).unwrap();
        assert_eq!(
            tokens[0],
            Token::ProcessingInstruction {
                target: String::from("xml"),
                data: String::from("version='1.0' standalone='yes'"),
            }
        );
    }

    #[test]
    fn rxml_declaration() {
        let tokens = collect(RxmlTokens::new(&b"<?xml version='1.0' encoding='utf-8'?><r/>"[..]))
            .unwrap();
        assert_eq!(
            tokens[0],
            Token::ProcessingInstruction {
                target: String::from("xml"),
                data: String::from("version=\"1.0\""),
            }
        );
    }

    #[test]
    fn processing_instruction_data() {
        let tokens = collect(XmlTokens::new(&b"<?style href='a.css'?><r/>"[..])).unwrap();
        assert_eq!(
            tokens[0],
            Token::ProcessingInstruction {
                target: String::from("style"),
                data: String::from("href='a.css'"),
            }
        );
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        assert!(collect(XmlTokens::new(&b"<a></b>"[..])).is_err());
    }

    #[test]
    fn references() {
        assert_eq!(resolve_reference("amp").unwrap(), "&");
        assert_eq!(resolve_reference("quot").unwrap(), "\"");
        assert_eq!(resolve_reference("#x41").unwrap(), "A");
        assert_eq!(resolve_reference("#66").unwrap(), "B");
        assert!(matches!(
            resolve_reference("nbsp"),
            Err(ParseError::UnknownEntity(name)) if name == "nbsp"
        ));
    }

    #[test]
    fn rxml_tokens() {
        let tokens = collect(RxmlTokens::new(&b"<a xmlns='ns1' x='y'><p:b xmlns:p='ns2'>hi</p:b></a>"[..]))
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StartElement {
                    prefix: None,
                    name: String::from("a"),
                    attributes: vec![RawAttribute::new("xmlns", "ns1"), RawAttribute::new("x", "y")],
                },
                Token::StartElement {
                    prefix: Some(String::from("p")),
                    name: String::from("b"),
                    attributes: vec![RawAttribute::new("xmlns:p", "ns2")],
                },
                Token::CharData(String::from("hi")),
                Token::EndElement,
                Token::EndElement,
            ]
        );
    }

    #[test]
    fn rxml_rejects_comments() {
        assert!(collect(RxmlTokens::new(&b"<a><!-- no --></a>"[..])).is_err());
    }
}
