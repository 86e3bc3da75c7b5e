//! Value types an option can hold, and how each one maps onto a raw node.
//!
//! | type | encoding |
//! |------|----------|
//! | integers | decimal node value |
//! | `bool` | `True` / `False` |
//! | `String` | verbatim node value |
//! | enums ([`option_enum!`](crate::option_enum)) | variant name |
//! | `I18nString` | node value is the fallback, each locale is a child |
//! | `Vec<T>` | children `0`, `1`, … holding one element each |
//! | configurations ([`configuration!`](crate::configuration)) | nested options, node tagged with the type name |

use serde::{Deserialize, Serialize};
use std::fmt;

use arbor_core::{I18nString, NodeId, RawConfig};

use crate::option::ConfigWarning;

/// Type tag written as `Type=` in description dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    Integer,
    Boolean,
    String,
    Enum,
    I18NString,
    Configuration,
    List(Box<OptionKind>),
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Integer => f.write_str("Integer"),
            OptionKind::Boolean => f.write_str("Boolean"),
            OptionKind::String => f.write_str("String"),
            OptionKind::Enum => f.write_str("Enum"),
            OptionKind::I18NString => f.write_str("I18NString"),
            OptionKind::Configuration => f.write_str("Configuration"),
            OptionKind::List(inner) => write!(f, "List|{}", inner),
        }
    }
}

/// A value type that knows how to marshal itself into a raw node.
pub trait OptionType: Clone + Default + PartialEq + fmt::Debug {
    fn kind() -> OptionKind;

    fn marshal(&self, raw: &mut RawConfig, node: NodeId);

    /// Overwrite `self` from `node`. Returns `false` when the node does not
    /// hold a well-formed value of this type; `self` is then unspecified and
    /// the caller discards it.
    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> bool;

    /// Like [`unmarshal`](OptionType::unmarshal), also collecting options
    /// rejected inside the value, with paths relative to `node`.
    fn unmarshal_with_warnings(
        &mut self,
        raw: &RawConfig,
        node: NodeId,
        _nested: &mut Vec<ConfigWarning>,
    ) -> bool {
        self.unmarshal(raw, node)
    }

    /// Static type metadata for a description dump, such as enum variants.
    fn describe_type(_option_path: &str, _raw: &mut RawConfig, _group: NodeId) {}

    /// Describe this type when it is the element of a list option. Only
    /// sub-configurations have a schema of their own to dump.
    fn describe_element(_option_path: &str, _raw: &mut RawConfig, _group: NodeId) {}

    /// Record `self` as the default value of the option at `option_path`.
    fn describe_default(&self, _option_path: &str, raw: &mut RawConfig, group: NodeId) {
        let slot = raw.entry(group, "DefaultValue");
        self.marshal(raw, slot);
    }

    /// Make nested defaults follow current values. Only sub-configurations
    /// carry defaults of their own.
    fn sync_defaults(&mut self) {}
}

pub(crate) fn describe_key(raw: &mut RawConfig, group: NodeId, key: &str, value: impl Into<String>) {
    let id = raw.entry(group, key);
    raw.set_value(id, value);
}

macro_rules! integer_option_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl OptionType for $ty {
                fn kind() -> OptionKind {
                    OptionKind::Integer
                }

                fn marshal(&self, raw: &mut RawConfig, node: NodeId) {
                    raw.set_value(node, self.to_string());
                }

                fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> bool {
                    match raw.value(node).and_then(|v| v.trim().parse().ok()) {
                        Some(parsed) => {
                            *self = parsed;
                            true
                        }
                        None => false,
                    }
                }
            }
        )*
    };
}

integer_option_type!(i32, i64, u32);

impl OptionType for bool {
    fn kind() -> OptionKind {
        OptionKind::Boolean
    }

    fn marshal(&self, raw: &mut RawConfig, node: NodeId) {
        raw.set_value(node, if *self { "True" } else { "False" });
    }

    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> bool {
        match raw.value(node).map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => *self = true,
            Some(v) if v.eq_ignore_ascii_case("false") => *self = false,
            _ => return false,
        }
        true
    }
}

impl OptionType for String {
    fn kind() -> OptionKind {
        OptionKind::String
    }

    fn marshal(&self, raw: &mut RawConfig, node: NodeId) {
        raw.set_value(node, self.as_str());
    }

    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> bool {
        match raw.value(node) {
            Some(v) => {
                *self = v.to_string();
                true
            }
            None => false,
        }
    }
}

impl OptionType for I18nString {
    fn kind() -> OptionKind {
        OptionKind::I18NString
    }

    fn marshal(&self, raw: &mut RawConfig, node: NodeId) {
        raw.remove_all(node);
        match self.fallback() {
            Some(text) => raw.set_value(node, text),
            None => raw.clear_value(node),
        }
        for (locale, text) in self.localized() {
            let child = raw.entry(node, locale);
            raw.set_value(child, text);
        }
    }

    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> bool {
        let mut parsed = I18nString::new();
        if let Some(text) = raw.value(node) {
            parsed.set_fallback(text);
        }
        for child in raw.children(node) {
            if let Some(text) = raw.value(*child) {
                parsed.set(text, raw.name(*child));
            }
        }
        *self = parsed;
        true
    }
}

impl<T: OptionType> OptionType for Vec<T> {
    fn kind() -> OptionKind {
        OptionKind::List(Box::new(T::kind()))
    }

    fn marshal(&self, raw: &mut RawConfig, node: NodeId) {
        raw.remove_all(node);
        raw.clear_value(node);
        for (index, item) in self.iter().enumerate() {
            let child = raw.entry(node, &index.to_string());
            item.marshal(raw, child);
        }
    }

    fn unmarshal(&mut self, raw: &RawConfig, node: NodeId) -> bool {
        self.unmarshal_with_warnings(raw, node, &mut Vec::new())
    }

    fn unmarshal_with_warnings(
        &mut self,
        raw: &RawConfig,
        node: NodeId,
        nested: &mut Vec<ConfigWarning>,
    ) -> bool {
        let mut items = Vec::new();
        let mut warnings = Vec::new();
        while let Some(child) = raw.get(node, &items.len().to_string()) {
            let index = items.len().to_string();
            let mut item = T::default();
            let mut item_warnings = Vec::new();
            if !item.unmarshal_with_warnings(raw, child, &mut item_warnings) {
                return false;
            }
            warnings.extend(item_warnings.into_iter().map(|w| w.nested_under(&index)));
            items.push(item);
        }
        *self = items;
        nested.extend(warnings);
        true
    }

    fn describe_type(option_path: &str, raw: &mut RawConfig, group: NodeId) {
        T::describe_type(option_path, raw, group);
        T::describe_element(option_path, raw, group);
    }

    fn sync_defaults(&mut self) {
        for item in self.iter_mut() {
            item.sync_defaults();
        }
    }
}

/// Declare an enum usable as an option value.
///
/// The first variant is the default. Variants are marshalled by name.
///
/// ```
/// arbor_config::option_enum! {
///     pub enum Layout { Horizontal, Vertical }
/// }
/// assert_eq!(Layout::default(), Layout::Horizontal);
/// assert_eq!(Layout::from_name("Vertical"), Some(Layout::Vertical));
/// ```
#[macro_export]
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident $(, $rest:ident)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        $vis enum $name {
            #[default]
            $first,
            $($rest,)*
        }

        impl $name {
            pub const VARIANTS: &'static [&'static str] =
                &[stringify!($first) $(, stringify!($rest))*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::$first => stringify!($first),
                    $(Self::$rest => stringify!($rest),)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                [Self::$first $(, Self::$rest)*]
                    .into_iter()
                    .find(|variant| variant.as_str() == name)
            }
        }

        impl $crate::OptionType for $name {
            fn kind() -> $crate::OptionKind {
                $crate::OptionKind::Enum
            }

            fn marshal(&self, raw: &mut $crate::RawConfig, node: $crate::NodeId) {
                raw.set_value(node, self.as_str());
            }

            fn unmarshal(&mut self, raw: &$crate::RawConfig, node: $crate::NodeId) -> bool {
                match raw.value(node).map(str::trim).and_then(Self::from_name) {
                    Some(variant) => {
                        *self = variant;
                        true
                    }
                    None => false,
                }
            }

            fn describe_type(
                _option_path: &str,
                raw: &mut $crate::RawConfig,
                group: $crate::NodeId,
            ) {
                for (index, variant) in Self::VARIANTS.iter().enumerate() {
                    let id = raw.entry(group, &format!("Enum/{}", index));
                    raw.set_value(id, *variant);
                }
            }
        }
    };
}
