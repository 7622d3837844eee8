// Copyright (c) 2020 lumi <lumi@pew.im>
// Copyright (c) 2020 Emmanuel Gil Peyrot <linkmauve@linkmauve.fr>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversions of Rust values into attribute values.

use std::borrow::Cow;

/// A trait for types which can be converted to an attribute value.
///
/// [`Document::set_attr`](crate::Document::set_attr) removes the attribute when
/// the conversion yields `None`.
pub trait IntoAttributeValue {
    /// Turns this into an attribute string, or None if the attribute should
    /// not be present.
    fn into_attribute_value(self) -> Option<String>;
}

macro_rules! impl_into_attribute_value {
    ($t:ty) => {
        impl IntoAttributeValue for $t {
            fn into_attribute_value(self) -> Option<String> {
                Some(format!("{}", self))
            }
        }
    };
}

macro_rules! impl_into_attribute_values {
    ($($t:ty),*) => {
        $(impl_into_attribute_value!($t);)*
    }
}

impl_into_attribute_values!(
    usize,
    u64,
    u32,
    u16,
    u8,
    isize,
    i64,
    i32,
    i16,
    i8,
    f32,
    f64,
    bool,
    char
);

impl IntoAttributeValue for String {
    fn into_attribute_value(self) -> Option<String> {
        Some(self)
    }
}

impl<'a> IntoAttributeValue for &'a String {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl<'a> IntoAttributeValue for &'a str {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl<'a> IntoAttributeValue for Cow<'a, str> {
    fn into_attribute_value(self) -> Option<String> {
        Some(self.into_owned())
    }
}

impl<T: IntoAttributeValue> IntoAttributeValue for Option<T> {
    fn into_attribute_value(self) -> Option<String> {
        self.and_then(IntoAttributeValue::into_attribute_value)
    }
}

#[cfg(test)]
mod tests {
    use super::IntoAttributeValue;
    use std::borrow::Cow;

    #[test]
    fn test_into_attribute_value_on_ints() {
        assert_eq!(16u8.into_attribute_value().unwrap(), "16");
        assert_eq!(18u32.into_attribute_value().unwrap(), "18");
        assert_eq!((-17i16).into_attribute_value().unwrap(), "-17");
        assert_eq!((-19i64).into_attribute_value().unwrap(), "-19");
    }

    #[test]
    fn scalars_and_strings() {
        assert_eq!(0.004f64.into_attribute_value().unwrap(), "0.004");
        assert_eq!(true.into_attribute_value().unwrap(), "true");
        assert_eq!('x'.into_attribute_value().unwrap(), "x");
        assert_eq!(Cow::Borrowed("pkg").into_attribute_value().unwrap(), "pkg");
        assert_eq!(String::from("a&b").into_attribute_value().unwrap(), "a&b");
    }

    #[test]
    fn none_means_absent() {
        assert_eq!(None::<&str>.into_attribute_value(), None);
        assert_eq!(Some(3u8).into_attribute_value().unwrap(), "3");
    }
}
