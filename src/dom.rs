//! In-memory document model for injected visualization fragments.
//!
//! The engine does not run inside a browser, so it carries its own notion of
//! a live document: named mount points holding attached nodes. Markup nodes
//! are inert strings; script nodes only take effect when a freshly
//! constructed element is attached, at which point the configured
//! [`ScriptHost`] runs it against the mount it landed in.

use std::collections::HashMap;

/// A script element detached from a fragment or attached to a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    /// Attributes in source order, e.g. `src`, `type`.
    pub attributes: Vec<(String, String)>,
    /// Inline script text, verbatim. Empty for external scripts.
    pub code: String,
}

impl ScriptElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// External source reference, when present.
    pub fn src(&self) -> Option<&str> {
        self.attribute("src")
    }
}

/// A node attached to a mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Inert markup, preserved verbatim. Attaching it never executes anything.
    Markup(String),
    Script(ScriptElement),
}

/// A live location content can be attached to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MountPoint {
    nodes: Vec<Node>,
}

impl MountPoint {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn attach(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Concatenated markup of all attached non-script nodes.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            if let Node::Markup(markup) = node {
                out.push_str(markup);
                out.push('\n');
            }
        }
        out
    }

    /// Whether an attached markup node declares `id="..."` for the given id.
    pub fn has_element_with_id(&self, id: &str) -> bool {
        let double = format!("id=\"{}\"", id);
        let single = format!("id='{}'", id);
        self.nodes.iter().any(|node| match node {
            Node::Markup(markup) => markup.contains(&double) || markup.contains(&single),
            Node::Script(_) => false,
        })
    }
}

/// Runs attached script elements. Implementations decide what "execution"
/// means: evaluating chart code, logging, or asserting in tests.
pub trait ScriptHost {
    fn execute(&mut self, script: &ScriptElement, mount: &MountPoint) -> anyhow::Result<()>;
}

/// The session-scoped document: a set of named mount points, created at
/// session start and torn down with it.
#[derive(Debug, Default)]
pub struct Document {
    mounts: HashMap<String, MountPoint>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_mount(&mut self, id: &str) -> &mut MountPoint {
        self.mounts.entry(id.to_string()).or_default()
    }

    /// Tear down a mount point. Later injections into it fail fast.
    pub fn remove_mount(&mut self, id: &str) -> bool {
        self.mounts.remove(id).is_some()
    }

    pub fn mount(&self, id: &str) -> Option<&MountPoint> {
        self.mounts.get(id)
    }

    pub fn mount_mut(&mut self, id: &str) -> Option<&mut MountPoint> {
        self.mounts.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_lifecycle() {
        let mut doc = Document::new();
        doc.create_mount("chart-content");
        assert!(doc.mount("chart-content").is_some());
        assert!(doc.remove_mount("chart-content"));
        assert!(doc.mount("chart-content").is_none());
    }

    #[test]
    fn finds_element_ids_in_markup() {
        let mut mount = MountPoint::default();
        mount.attach(Node::Markup("<div id=\"chart\"><canvas id='plot'></canvas></div>".into()));
        assert!(mount.has_element_with_id("chart"));
        assert!(mount.has_element_with_id("plot"));
        assert!(!mount.has_element_with_id("missing"));
    }

    #[test]
    fn script_attribute_lookup() {
        let script = ScriptElement {
            attributes: vec![("src".into(), "https://cdn.example/chart.js".into())],
            code: String::new(),
        };
        assert_eq!(script.src(), Some("https://cdn.example/chart.js"));
        assert_eq!(script.attribute("type"), None);
    }
}
