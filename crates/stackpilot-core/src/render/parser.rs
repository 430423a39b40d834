//! Template mini-AST: literal text and named guarded blocks
//!
//! Templates contain `${NAME}` placeholders and guarded regions delimited by
//! `{% if NAME %}` / `{% endif NAME %}`. Guards nest. A falsy governing
//! value (absent key never occurs; empty string or "false") removes the
//! whole region including its delimiters; a truthy value strips only the
//! delimiters. Parsing up front avoids the ordering bugs of rewriting
//! marker strings in place when guard names share prefixes.

use crate::error::CoreError;
use anyhow::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Guard { key: String, children: Vec<Node> },
}

#[derive(Debug)]
enum Marker {
    If(String),
    Endif(String),
}

/// Parse template source into a node sequence. Mismatched or malformed
/// guard markers are configuration integrity errors.
pub fn parse(source: &str) -> Result<Vec<Node>> {
    let mut stack: Vec<(String, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("{%") {
        let end = rest[start..]
            .find("%}")
            .map(|e| start + e + 2)
            .ok_or_else(|| CoreError::ConfigIntegrity("unterminated {% marker".to_string()))?;

        let (before, marker_text) = (&rest[..start], &rest[start..end]);
        let mut after = &rest[end..];

        // A marker alone on its line swallows its trailing newline so that
        // stripped delimiters leave no blank lines behind.
        let line_start = before.is_empty() || before.ends_with('\n');
        if line_start && after.starts_with('\n') {
            after = &after[1..];
        }

        if !before.is_empty() {
            current.push(Node::Text(before.to_string()));
        }

        match parse_marker(marker_text)? {
            Marker::If(key) => {
                stack.push((key, std::mem::take(&mut current)));
            }
            Marker::Endif(key) => {
                let (open_key, parent) = stack.pop().ok_or_else(|| {
                    CoreError::ConfigIntegrity(format!("endif {} without matching if", key))
                })?;
                if open_key != key {
                    return Err(CoreError::ConfigIntegrity(format!(
                        "endif {} does not match open guard {}",
                        key, open_key
                    ))
                    .into());
                }
                let children = std::mem::replace(&mut current, parent);
                current.push(Node::Guard { key, children });
            }
        }

        rest = after;
    }

    if let Some((key, _)) = stack.last() {
        return Err(CoreError::ConfigIntegrity(format!("unclosed guard {}", key)).into());
    }

    if !rest.is_empty() {
        current.push(Node::Text(rest.to_string()));
    }

    Ok(current)
}

fn parse_marker(text: &str) -> Result<Marker> {
    let inner = text
        .strip_prefix("{%")
        .and_then(|t| t.strip_suffix("%}"))
        .unwrap_or("")
        .trim();
    let mut words = inner.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("if"), Some(key), None) => Ok(Marker::If(key.to_string())),
        (Some("endif"), Some(key), None) => Ok(Marker::Endif(key.to_string())),
        _ => Err(CoreError::ConfigIntegrity(format!("malformed template marker {}", text)).into()),
    }
}

fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "false"
}

/// Render a parsed node sequence against the substitution context. Any
/// `${NAME}` without a context entry, and any guard on an unknown key, is
/// fatal before a single byte is emitted.
pub fn render(nodes: &[Node], ctx: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::new();
    render_into(nodes, ctx, &mut out)?;
    Ok(out)
}

fn render_into(nodes: &[Node], ctx: &BTreeMap<String, String>, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => substitute(text, ctx, out)?,
            Node::Guard { key, children } => {
                let value = ctx.get(key).ok_or_else(|| {
                    CoreError::ConfigIntegrity(format!("guard on unknown setting {}", key))
                })?;
                if truthy(value) {
                    render_into(children, ctx, out)?;
                }
            }
        }
    }
    Ok(())
}

fn substitute(text: &str, ctx: &BTreeMap<String, String>, out: &mut String) -> Result<()> {
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            CoreError::ConfigIntegrity("unterminated ${ placeholder".to_string())
        })?;
        let name = &after[..end];
        let value = ctx.get(name).ok_or_else(|| {
            CoreError::ConfigIntegrity(format!("unresolved placeholder ${{{}}}", name))
        })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(())
}
