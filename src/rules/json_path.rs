use serde_json::Value;

/// Resolves a dotted path such as `$.data.items[0].id` or `data.items.0.id`.
#[must_use]
pub fn lookup<'doc>(document: &'doc Value, path: &str) -> Option<&'doc Value> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Some(document);
    }

    let mut current = document;
    for segment in trimmed.split('.') {
        let (name, indexes) = split_indexes(segment)?;
        if !name.is_empty() {
            current = step(current, name)?;
        }
        for index in indexes {
            current = current.as_array()?.get(index)?;
        }
    }
    Some(current)
}

fn step<'doc>(current: &'doc Value, name: &str) -> Option<&'doc Value> {
    match current {
        Value::Object(map) => map.get(name),
        Value::Array(items) => name.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}

/// Splits `items[0][1]` into `("items", [0, 1])`.
fn split_indexes(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = segment.find('[') else {
        return Some((segment, Vec::new()));
    };
    let (name, mut rest) = segment.split_at(open);
    let mut indexes = Vec::new();
    while let Some(after_open) = rest.strip_prefix('[') {
        let close = after_open.find(']')?;
        let (digits, after_close) = after_open.split_at(close);
        indexes.push(digits.trim().parse::<usize>().ok()?);
        rest = after_close.strip_prefix(']')?;
    }
    if rest.is_empty() {
        Some((name, indexes))
    } else {
        None
    }
}
