//! Field path lookups on loosely-typed resources
//!
//! Paths are dot separated (`spec.nsgName`). Array elements are addressed
//! with brackets (`spec.names[0]`); a bare segment is always a field name,
//! even when numeric (`spec.ports.0` reads the key `"0"`).

use anyhow::{Context, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Field(&'a str),
    Index(usize),
}

fn parse(path: &str) -> Result<Vec<Segment<'_>>> {
    if path.is_empty() {
        anyhow::bail!("empty field path");
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (field, mut rest) = match part.find('[') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };

        if field.is_empty() && rest.is_empty() {
            anyhow::bail!("invalid field path {:?}: empty segment", path);
        }

        if !field.is_empty() {
            segments.push(Segment::Field(field));
        }

        while !rest.is_empty() {
            let Some(end) = rest.find(']') else {
                anyhow::bail!("invalid field path {:?}: unclosed bracket", path);
            };
            let idx = rest[1..end]
                .parse::<usize>()
                .with_context(|| format!("invalid field path {:?}: bad index", path))?;
            segments.push(Segment::Index(idx));
            rest = &rest[end + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                anyhow::bail!("invalid field path {:?}: unexpected {:?}", path, rest);
            }
        }
    }

    Ok(segments)
}

/// Resolve `path` inside `doc`
pub fn get_value<'a>(doc: &'a Value, path: &str) -> Result<&'a Value> {
    let mut current = doc;

    for segment in parse(path)? {
        let next = match segment {
            Segment::Field(name) => current.get(name),
            Segment::Index(idx) => current.get(idx),
        };
        current = match next {
            Some(v) => v,
            None => anyhow::bail!("no such field: {}", path),
        };
    }

    Ok(current)
}

/// Resolve `path` inside `doc` and require a string
pub fn get_string(doc: &Value, path: &str) -> Result<String> {
    match get_value(doc, path)? {
        Value::String(s) => Ok(s.clone()),
        other => anyhow::bail!("{}: not a string: {}", path, type_name(other)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
