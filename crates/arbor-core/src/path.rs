//! Path utilities for addressing nodes in a [`RawConfig`](crate::RawConfig).
//!
//! Paths are `/`-separated and every segment is a literal child name. The
//! `$TypeName` suffix only has meaning in INI group headers, where
//! [`Segment`] splits it off into the node's type tag.

use std::fmt;

pub const SEPARATOR: char = '/';
pub const TYPE_TAG_MARKER: char = '$';

/// One INI header segment, split into its name and optional type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub name: &'a str,
    pub tag: Option<&'a str>,
}

impl<'a> Segment<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(TYPE_TAG_MARKER) {
            Some((name, tag)) => Segment {
                name,
                tag: (!tag.is_empty()).then_some(tag),
            },
            None => Segment { name: raw, tag: None },
        }
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if let Some(tag) = self.tag {
            write!(f, "{}{}", TYPE_TAG_MARKER, tag)?;
        }
        Ok(())
    }
}

/// Split a path into child names. Empty segments (`A//B`, leading or
/// trailing separators) are skipped, so `""` addresses the anchor node itself.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

/// `name` and `tag` joined the way INI headers spell them, e.g.
/// `SubConfigOption$TestSubConfig`.
pub fn tagged(name: &str, tag: &str) -> String {
    format!("{}{}{}", name, TYPE_TAG_MARKER, tag)
}
