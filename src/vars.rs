//! Variable substitution plumbing.
//!
//! The hosting page's query string is parsed once into the substitution map
//! consumed by the render function, and the embed contract builds the
//! reverse direction: a URL (or `<img>` tag) encoding `(template_id,
//! substitutions)` that the render-as-image service resolves to the same
//! visual output.

use std::collections::HashMap;

/// Parses a URL query string into a substitution map.
///
/// Accepts an optional leading `?`. Pairs without a value are kept with an
/// empty value (which the render function treats as "no override"). On a
/// duplicate key the last pair wins. `+` and percent-escapes decode per the
/// usual query-string rules; a pair whose key fails to decode is skipped.
///
/// # Arguments
///
/// * `query` - Raw query string, e.g. `"?title=Sale&logo=https%3A%2F%2F..."`
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut substitutions = HashMap::new();

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = match urlencoding::decode(&raw_key.replace('+', " ")) {
            Ok(key) if !key.is_empty() => key.into_owned(),
            _ => continue,
        };
        let value = urlencoding::decode(&raw_value.replace('+', " "))
            .map(|v| v.into_owned())
            .unwrap_or_default();
        substitutions.insert(key, value);
    }

    substitutions
}

/// Builds the render-service URL for a template with substitutions baked in.
///
/// Fetching the URL reproduces the render function's output server-side.
/// Variables are sorted by name so the same inputs always produce the same
/// URL.
///
/// # Arguments
///
/// * `base_url` - Service origin, e.g. `"https://api.example.com"`
/// * `template_id` - The stored template's id
/// * `substitutions` - Variable values to encode
pub fn embed_url(
    base_url: &str,
    template_id: &str,
    substitutions: &HashMap<String, String>,
) -> String {
    let base = base_url.trim_end_matches('/');
    let mut url = format!(
        "{}/templates/{}/render",
        base,
        urlencoding::encode(template_id)
    );

    let mut names: Vec<&String> = substitutions.keys().collect();
    names.sort();
    for (i, name) in names.iter().enumerate() {
        let separator = if i == 0 { '?' } else { '&' };
        url.push(separator);
        url.push_str(&urlencoding::encode(name));
        url.push('=');
        url.push_str(&urlencoding::encode(&substitutions[*name]));
    }

    url
}

/// Builds an embeddable `<img>` tag for a stored template.
///
/// # Arguments
///
/// * `base_url` - Service origin
/// * `template_id` - The stored template's id
/// * `template_name` - Used as the alt text
/// * `substitutions` - Variable values to encode into the src URL
pub fn embed_tag(
    base_url: &str,
    template_id: &str,
    template_name: &str,
    substitutions: &HashMap<String, String>,
) -> String {
    let src = embed_url(base_url, template_id, substitutions);
    format!(
        "<img src=\"{}\" alt=\"{}\" />",
        src,
        escape_attribute(template_name)
    )
}

fn escape_attribute(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reads the hosting page's query string (wasm builds).
#[cfg(target_arch = "wasm32")]
pub fn page_substitutions() -> HashMap<String, String> {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    parse_query(&search)
}

/// Reads substitutions from the `PLACARD_SUBSTITUTIONS` environment variable
/// (native builds), using the same query-string format as the hosted page.
#[cfg(not(target_arch = "wasm32"))]
pub fn page_substitutions() -> HashMap<String, String> {
    std::env::var("PLACARD_SUBSTITUTIONS")
        .map(|query| parse_query(&query))
        .unwrap_or_default()
}
