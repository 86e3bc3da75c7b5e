use std::io;
use std::path::Path;
use tracing::{debug, info};

use arbor_core::path::Segment;
use arbor_core::{NodeId, RawConfig, Result};

/// Render the whole tree as INI text.
///
/// Valued children of the root come first without a header. The root's own
/// value has no key to live under and is not written.
pub fn to_ini_string(raw: &RawConfig) -> String {
    let mut out = String::new();
    let root = raw.root();
    write_values(raw, root, &mut out);

    let mut segments = Vec::new();
    for child in raw.children(root) {
        write_group(raw, *child, &mut segments, &mut out);
    }
    out
}

/// Write the tree to any byte sink in one call.
pub fn write_ini(raw: &RawConfig, mut writer: impl io::Write) -> Result<()> {
    writer.write_all(to_ini_string(raw).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write the tree to `path`, creating parent directories as needed.
pub fn write_ini_file(raw: &RawConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let text = to_ini_string(raw);
    std::fs::write(path, &text)?;
    info!(?path, bytes = text.len(), "wrote ini file");
    Ok(())
}

fn write_comment(comment: Option<&str>, out: &mut String) {
    if let Some(comment) = comment.filter(|c| !c.is_empty() && !c.contains('\n')) {
        out.push_str("# ");
        out.push_str(comment);
        out.push('\n');
    }
}

fn write_values(raw: &RawConfig, id: NodeId, out: &mut String) {
    for child in raw.children(id) {
        if let Some(value) = raw.value(*child) {
            write_comment(raw.comment(*child), out);
            out.push_str(raw.name(*child));
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
    }
}

fn write_group(raw: &RawConfig, id: NodeId, segments: &mut Vec<String>, out: &mut String) {
    let has_children = raw.has_sub_items(id);
    let tagged = raw.type_tag(id).is_some();
    let empty_leaf = !has_children && raw.value(id).is_none();
    // Valued leaves were written as keys of the parent group.
    if !has_children && !empty_leaf && !tagged {
        return;
    }

    segments.push(
        Segment {
            name: raw.name(id),
            tag: raw.type_tag(id),
        }
        .to_string(),
    );

    let has_values = raw.children(id).iter().any(|c| raw.value(*c).is_some());
    if has_values || empty_leaf || tagged {
        if !out.is_empty() {
            out.push('\n');
        }
        if raw.value(id).is_none() {
            write_comment(raw.comment(id), out);
        }
        out.push('[');
        out.push_str(&segments.join("/"));
        out.push_str("]\n");
        write_values(raw, id, out);
    } else {
        debug!(group = %segments.join("/"), "group has no values, header skipped");
    }

    for child in raw.children(id) {
        write_group(raw, *child, segments, out);
    }
    segments.pop();
}
