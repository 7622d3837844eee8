// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
// Copyright (c) 2020 Astro <astro@spaceboyz.net>
// Copyright (c) 2020 Maxime “pep” Buquet <pep@bouah.net>
// Copyright (c) 2020 Xidorn Quan <me@upsuper.org>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Prefix to namespace URI bindings, and the table of well-known namespaces.

use std::collections::BTreeMap;
use std::fmt;

/// A namespace prefix; `None` stands for the default namespace.
pub type Prefix = Option<String>;

/// The `xml` namespace, bound implicitly in every document.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// The namespace of `xmlns` declarations.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
/// XLink.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// XML Schema instance.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

static WELL_KNOWN: [(&str, &str); 4] = [
    ("xml", XML_NS),
    ("xmlns", XMLNS_NS),
    ("xlink", XLINK_NS),
    ("xsi", XSI_NS),
];

/// Canonical prefix of a well-known namespace URI.
pub fn canonical_prefix(uri: &str) -> Option<&'static str> {
    WELL_KNOWN
        .iter()
        .find(|(_, known)| *known == uri)
        .map(|(prefix, _)| *prefix)
}

/// URI of a well-known prefix.
pub fn well_known_uri(prefix: &str) -> Option<&'static str> {
    WELL_KNOWN
        .iter()
        .find(|(known, _)| *known == prefix)
        .map(|(_, uri)| *uri)
}

/// A set of namespace declarations, keyed by prefix.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Prefixes {
    prefixes: BTreeMap<Prefix, String>,
}

impl fmt::Debug for Prefixes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefixes(")?;
        for (i, (prefix, namespace)) in self.prefixes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(
                f,
                "xmlns{}={:?}",
                match prefix {
                    None => String::new(),
                    Some(prefix) => format!(":{}", prefix),
                },
                namespace
            )?;
        }
        write!(f, ")")
    }
}

impl Prefixes {
    /// All declared bindings, in prefix order.
    pub fn declared_prefixes(&self) -> &BTreeMap<Prefix, String> {
        &self.prefixes
    }

    /// URI bound to `prefix`, if declared here.
    pub fn get(&self, prefix: &Prefix) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// First prefix declared here for `uri`.
    pub fn prefix_of(&self, uri: &str) -> Option<&Prefix> {
        self.prefixes
            .iter()
            .find(|(_, bound)| *bound == uri)
            .map(|(prefix, _)| prefix)
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub(crate) fn insert<S: Into<String>>(&mut self, prefix: Prefix, namespace: S) {
        self.prefixes.insert(prefix, namespace.into());
    }
}

/// Looks `prefix` up in a stack of scopes, innermost last.
pub(crate) fn lookup<'a>(stack: &'a [Prefixes], prefix: &Prefix) -> Option<&'a str> {
    stack.iter().rev().find_map(|scope| scope.get(prefix))
}

impl From<BTreeMap<Prefix, String>> for Prefixes {
    fn from(prefixes: BTreeMap<Prefix, String>) -> Self {
        Prefixes { prefixes }
    }
}

impl From<(Prefix, String)> for Prefixes {
    fn from(prefix_namespace: (Prefix, String)) -> Self {
        let (prefix, namespace) = prefix_namespace;
        let mut prefixes = BTreeMap::new();
        prefixes.insert(prefix, namespace);

        Prefixes { prefixes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_table_is_symmetric() {
        assert_eq!(canonical_prefix(XLINK_NS), Some("xlink"));
        assert_eq!(well_known_uri("xsi"), Some(XSI_NS));
        assert_eq!(canonical_prefix("urn:unknown"), None);
        assert_eq!(well_known_uri("ds"), None);
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let outer = Prefixes::from((Some(String::from("p")), String::from("ns1")));
        let inner = Prefixes::from((Some(String::from("p")), String::from("ns2")));
        let stack = vec![outer, inner];
        assert_eq!(lookup(&stack, &Some(String::from("p"))), Some("ns2"));
        assert_eq!(lookup(&stack[..1], &Some(String::from("p"))), Some("ns1"));
        assert_eq!(lookup(&stack, &None), None);
    }

    #[test]
    fn debug_lists_declarations() {
        let mut prefixes = Prefixes::default();
        prefixes.insert(None, "ns1");
        prefixes.insert(Some(String::from("ds")), "ns2");
        assert_eq!(format!("{:?}", prefixes), r#"Prefixes(xmlns="ns1" xmlns:ds="ns2")"#);
        assert_eq!(prefixes.prefix_of("ns2"), Some(&Some(String::from("ds"))));
    }
}
