//! Document tree to text.

use crate::tree::{Document, NodeId, NodeKind};

const CLOCK_FORMAT: &str = "%H:%M";

/// Writes every line followed by `\n`.
pub fn serialize(document: &Document) -> String {
    let mut out = String::new();
    for &child in document.children(document.root()) {
        write_node(document, child, &mut out);
    }
    out
}

/// Serializes without the final newline. For a parsed document this
/// reproduces the input text.
pub fn render(document: &Document) -> String {
    let mut out = serialize(document);
    out.pop();
    out
}

fn write_node(document: &Document, id: NodeId, out: &mut String) {
    match document.kind(id) {
        NodeKind::Root => {
            for &child in document.children(id) {
                write_node(document, child, out);
            }
        }
        NodeKind::EmptyLine => out.push('\n'),
        NodeKind::Alias(alias) => {
            out.push_str(&format!("{} as {}\n", alias.issue_key, alias.name));
        }
        NodeKind::Day(day) => {
            out.push_str(&format!("{}{}\n", day.date, day.decoration));
            for &child in document.children(id) {
                write_node(document, child, out);
            }
        }
        NodeKind::Time(time) => {
            out.push_str(&time.clock.format(CLOCK_FORMAT).to_string());
            if let Some((minutes, entry)) = document.quick_entry(id) {
                out.push_str(&format!(" {minutes}m"));
                push_entry(document, entry, out);
            }
            out.push('\n');
        }
        NodeKind::Minutes(minutes) => {
            out.push_str(&format!("{}m", minutes.minutes));
            if let Some(&entry) = document.children(id).first() {
                push_entry(document, entry, out);
            }
            out.push('\n');
        }
        NodeKind::Issue(_) | NodeKind::Pause(_) => {
            out.push_str(&entry_text(document, id));
            out.push('\n');
        }
    }
}

/// Appends ` <entry>` for a quick entry with text.
fn push_entry(document: &Document, entry: NodeId, out: &mut String) {
    let text = entry_text(document, entry);
    if !text.is_empty() {
        out.push(' ');
        out.push_str(&text);
    }
}

/// Text of an issue or pause line without the newline.
fn entry_text(document: &Document, id: NodeId) -> String {
    match document.kind(id) {
        NodeKind::Issue(issue) if issue.is_done => format!("{} x", issue.input),
        NodeKind::Issue(issue) => issue.input.clone(),
        NodeKind::Pause(pause) if pause.is_done => "x".to_string(),
        _ => String::new(),
    }
}
