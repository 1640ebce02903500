//! Mounts a backend-supplied HTML+script fragment into the document.
//!
//! The payload is parsed into a detached fragment first. Markup nodes are
//! cloned onto the mount (cloning never runs embedded behavior); script
//! nodes are NOT attached from the parse tree. Instead a brand-new script
//! element is constructed per script, copying attributes and inline text
//! verbatim, and attached after all sibling markup, in source order.
//! Attaching a freshly constructed script is the one thing that triggers
//! execution, so every script runs exactly once and can already see the
//! markup it references.

use anyhow::Result;
use log::{debug, info};

use crate::dom::{Document, Node, ScriptElement, ScriptHost};
use crate::error::ChatError;

/// A parsed payload, detached from any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    pub fn scripts(&self) -> impl Iterator<Item = &ScriptElement> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Script(script) => Some(script),
            Node::Markup(_) => None,
        })
    }
}

/// Inject a fragment into the named mount point.
///
/// Fails fast with [`ChatError::MountTargetMissing`] and performs no
/// mutation when the mount does not exist (including a mount torn down while
/// a visualization request was in flight).
pub fn inject(
    doc: &mut Document,
    target: &str,
    payload: &str,
    host: &mut dyn ScriptHost,
) -> Result<()> {
    let Some(mount) = doc.mount_mut(target) else {
        return Err(ChatError::MountTargetMissing(target.to_string()).into());
    };

    let fragment = parse_fragment(payload);
    debug!(
        "injecting fragment into '{}': {} nodes, {} scripts",
        target,
        fragment.nodes.len(),
        fragment.scripts().count()
    );

    let mut scripts = Vec::new();
    for node in fragment.nodes {
        match node {
            Node::Markup(markup) => mount.attach(Node::Markup(markup)),
            Node::Script(script) => scripts.push(script),
        }
    }

    for script in scripts {
        let fresh = ScriptElement {
            attributes: script.attributes.clone(),
            code: script.code.clone(),
        };
        mount.attach(Node::Script(fresh));
        host.execute(&script, mount)?;
    }

    info!("fragment mounted into '{}'", target);
    Ok(())
}

/// Parse an HTML fragment into markup and script nodes, preserving order.
/// Markup is kept verbatim; whitespace-only text between elements is
/// dropped. Script tags are matched case-insensitively, scanning the
/// payload bytes in place so non-ASCII markup never shifts tag offsets.
pub fn parse_fragment(payload: &str) -> Fragment {
    let bytes = payload.as_bytes();
    let mut nodes = Vec::new();
    let mut markup_start = 0;
    let mut search = 0;

    while let Some(open_start) = find_ci(bytes, b"<script", search) {
        let after_name = open_start + "<script".len();
        let at_boundary = bytes
            .get(after_name)
            .is_some_and(|b| b.is_ascii_whitespace() || *b == b'>');
        if !at_boundary {
            search = open_start + 1;
            continue;
        }

        let Some(open_end) = payload[after_name..].find('>') else {
            break; // unterminated open tag, treat the rest as markup
        };
        let code_start = after_name + open_end + 1;
        let Some(code_end) = find_ci(bytes, b"</script", code_start) else {
            break; // unterminated script, treat the rest as markup
        };
        let tail = payload[code_end..]
            .find('>')
            .map(|i| code_end + i + 1)
            .unwrap_or(payload.len());

        push_markup(&mut nodes, &payload[markup_start..open_start]);
        nodes.push(Node::Script(ScriptElement {
            attributes: parse_attributes(&payload[after_name..after_name + open_end]),
            code: payload[code_start..code_end].to_string(),
        }));

        markup_start = tail;
        search = tail;
    }

    push_markup(&mut nodes, &payload[markup_start..]);
    Fragment { nodes }
}

/// Case-insensitive ASCII substring search. Matches always start at an
/// ASCII byte of the needle, so a hit is a valid char boundary.
fn find_ci(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|i| from + i)
}

fn push_markup(nodes: &mut Vec<Node>, text: &str) {
    if !text.trim().is_empty() {
        nodes.push(Node::Markup(text.to_string()));
    }
}

/// Tokenize the attribute list of an open tag. Values may be double-quoted,
/// single-quoted, or bare; a trailing `/` from self-closing syntax is
/// ignored.
fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'/'
        {
            i += 1;
        }
        if i == name_start {
            continue;
        }
        let name = source[name_start..i].to_string();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            attributes.push((name, String::new()));
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
            let quote = bytes[i];
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            attributes.push((name, source[value_start..i].to_string()));
            i += 1;
        } else {
            let value_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            attributes.push((name, source[value_start..i].to_string()));
        }
    }

    attributes
}
