//! Helpers to pull embedded payloads out of HTML pages.
//!
//! Pages served by the site carry their state as a single JSON (or JSON-like)
//! blob. Everything here works on plain text and never tries to understand the
//! surrounding markup.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

use crate::error::{ScwsError, ScwsResult};

/// Entities that appear in `data-page` attributes. No key is a prefix of
/// another, so a single left-to-right scan decodes them unambiguously.
const ENTITIES: &[(&str, &str)] = &[
    ("&quot;", "\""),
    ("&#039;", "'"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
];

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Returns the text between the first `start` marker and the first `end`
/// marker that follows it.
pub fn extract_between<'a>(document: &'a str, start: &str, end: &str) -> ScwsResult<&'a str> {
    let (_, rest) = document
        .split_once(start)
        .ok_or_else(|| ScwsError::missing(format!("marker `{start}`")))?;
    let (inner, _) = rest
        .split_once(end)
        .ok_or_else(|| ScwsError::missing(format!("marker `{end}`")))?;
    Ok(inner)
}

pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(position) = rest.find('&') {
        output.push_str(&rest[..position]);
        rest = &rest[position..];

        match ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, replacement)) => {
                output.push_str(replacement);
                rest = &rest[entity.len()..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);

    Cow::Owned(output)
}

/// Parses the `data-page` attribute embedded in every page of the site.
pub fn data_page(document: &str) -> ScwsResult<serde_json::Value> {
    let tag = extract_between(document, r#"<div id="app""#, r#""><!--"#)?;
    let (_, raw) = tag
        .split_once(r#"data-page=""#)
        .ok_or_else(|| ScwsError::missing("data-page attribute"))?;
    Ok(serde_json::from_str(&decode_entities(raw))?)
}

/// Parses a javascript object literal written with single quotes.
pub fn js_object(raw: &str) -> ScwsResult<serde_json::Value> {
    let raw = raw.trim().trim_end_matches(';');
    let normalized = raw.replace('\'', "\"");
    let normalized = TRAILING_COMMA.replace_all(&normalized, "$1");
    Ok(serde_json::from_str(&normalized)?)
}
