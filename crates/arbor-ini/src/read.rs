use std::fmt;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use arbor_core::path::{self, Segment};
use arbor_core::{NodeId, RawConfig, Result};

/// A line the parser could not interpret. Parsing continues past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDiagnostic {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
}

impl fmt::Display for IniDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: expected `[group]` or `key=value`, found {:?}",
            self.line, self.content
        )
    }
}

/// Parse INI text into `raw`, merging with whatever the tree already holds.
///
/// `$TypeName` suffixes in group headers are recorded as node type tags and
/// do not change the tree shape. Malformed lines are reported and skipped.
pub fn parse_ini_str(raw: &mut RawConfig, text: &str) -> Vec<IniDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut group = raw.root();
    let mut comments: Vec<&str> = Vec::new();

    for (index, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let trimmed = line.trim();

        if trimmed.is_empty() {
            comments.clear();
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#').or_else(|| trimmed.strip_prefix(';')) {
            comments.push(comment.trim());
            continue;
        }

        if let Some(path) = trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            group = open_group(raw, path.trim());
            attach_comment(raw, group, &mut comments);
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                let node = raw.entry(group, key.trim());
                raw.set_value(node, value);
                attach_comment(raw, node, &mut comments);
            }
            _ => {
                warn!(line = index + 1, content = %trimmed, "skipping malformed ini line");
                diagnostics.push(IniDiagnostic {
                    line: index + 1,
                    content: trimmed.to_string(),
                });
                comments.clear();
            }
        }
    }
    diagnostics
}

/// Walk a header path from the root, splitting `name$Tag` segments into the
/// child name and its type tag.
fn open_group(raw: &mut RawConfig, path: &str) -> NodeId {
    let mut current = raw.root();
    for segment in path::segments(path)
        .map(Segment::parse)
        .filter(|segment| !segment.name.is_empty())
    {
        current = raw.entry(current, segment.name);
        if let Some(tag) = segment.tag {
            raw.set_type_tag(current, tag);
        }
    }
    current
}

fn attach_comment(raw: &mut RawConfig, id: NodeId, comments: &mut Vec<&str>) {
    if !comments.is_empty() {
        raw.set_comment(id, comments.join(" "));
        comments.clear();
    }
}

/// Read a whole document from `reader` into `raw`.
pub fn read_ini(raw: &mut RawConfig, mut reader: impl io::Read) -> Result<Vec<IniDiagnostic>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(parse_ini_str(raw, &text))
}

/// Read the file at `path` into `raw`.
pub fn read_ini_file(raw: &mut RawConfig, path: &Path) -> Result<Vec<IniDiagnostic>> {
    info!(?path, "reading ini file");
    let text = std::fs::read_to_string(path)?;
    Ok(parse_ini_str(raw, &text))
}
