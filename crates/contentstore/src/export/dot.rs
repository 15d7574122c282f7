//! DOT format export for Graphviz visualization.
//!
//! Tree edges are drawn solid from parent to child; detail and collection
//! links are drawn dashed and labelled with their slot.

use crate::item::{DetailValue, ItemKey};
use crate::{ContentStore, Result};
use std::collections::{HashMap, HashSet};

/// Options for styling DOT export
#[derive(Debug, Clone)]
pub struct DotOptions {
    /// Node colors by discriminator (hex color codes)
    pub colors: HashMap<String, String>,
    /// Node shape (box, ellipse, folder, etc.)
    pub shape: String,
    /// Graph layout direction: LR, TB, RL, BT
    pub rankdir: String,
    /// Detail names to show in node labels
    pub show_details: Vec<String>,
    /// Draw link edges in addition to tree edges
    pub include_links: bool,
}

impl Default for DotOptions {
    fn default() -> Self {
        DotOptions {
            colors: HashMap::new(),
            shape: "box".to_string(),
            rankdir: "TB".to_string(),
            show_details: vec![],
            include_links: true,
        }
    }
}

impl DotOptions {
    /// Color items of `discriminator` with `color`.
    pub fn with_color(mut self, discriminator: impl Into<String>, color: impl Into<String>) -> Self {
        self.colors.insert(discriminator.into(), color.into());
        self
    }
}

/// Export the given items of `store` to Graphviz DOT format.
///
/// Edges are only drawn between items of `scope`.
pub fn export_dot(store: &ContentStore, scope: &[ItemKey], options: &DotOptions) -> Result<String> {
    let members: HashSet<ItemKey> = scope.iter().copied().collect();
    let mut output = String::new();

    output.push_str("digraph content {\n");
    output.push_str(&format!("    rankdir={};\n", options.rankdir));
    output.push_str("    node [style=filled];\n\n");

    for key in scope {
        let item = store.item(*key)?;

        let mut label = format!(
            "{}\\n({})",
            escape_dot_label(&item.title),
            escape_dot_label(item.discriminator())
        );
        for name in &options.show_details {
            if let Some(value) = item.detail(name) {
                label.push_str(&format!("\\n{}:{}", escape_dot_label(name), format_value(value)));
            }
        }

        let color = options
            .colors
            .get(item.discriminator())
            .map(|s| s.as_str())
            .unwrap_or("#FFFFFF");

        output.push_str(&format!(
            "    n{} [label=\"{label}\", shape={}, fillcolor=\"{color}\"];\n",
            key.raw(),
            options.shape
        ));
    }

    output.push('\n');

    for key in scope {
        let item = store.item(*key)?;

        if let Some(parent) = store.tree().parent_of(*key).filter(|p| members.contains(p)) {
            output.push_str(&format!("    n{} -> n{};\n", parent.raw(), key.raw()));
        }

        if options.include_links {
            for (slot, target) in item.links().filter(|(_, t)| members.contains(t)) {
                output.push_str(&format!(
                    "    n{} -> n{} [label=\"{}\", style=dashed];\n",
                    key.raw(),
                    target.raw(),
                    escape_dot_label(slot)
                ));
            }
        }
    }

    output.push_str("}\n");

    Ok(output)
}

/// Escape special characters for DOT labels
fn escape_dot_label(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Format detail value for display
fn format_value(value: &DetailValue) -> String {
    match value {
        DetailValue::String(s) => escape_dot_label(s),
        DetailValue::Int(i) => i.to_string(),
        DetailValue::Float(f) => f.to_string(),
        DetailValue::Bool(b) => b.to_string(),
        DetailValue::DateTime(d) => d.format("%Y-%m-%d").to_string(),
        DetailValue::Link(target) => target.to_string(),
        DetailValue::Null => "null".to_string(),
    }
}
