//! Expression extraction from markup content.
//!
//! The shadow generator does not understand the markup grammar; it only
//! needs the expressions embedded in it so the analysis service can flag
//! unresolved identifiers. Interpolations are found with a brace-depth
//! counter that is quote-aware rather than a regex, so nested braces and
//! string literals inside an expression do not end it early. Both `{expr}`
//! and `{{ expr }}` interpolation styles are recognized.

use once_cell::sync::Lazy;
use regex::Regex;

// Event-handler attributes with a quoted value: on:click="...", @input='...',
// onclick="...". Brace-delimited handler values are picked up by the brace
// scanner instead.
static HANDLER_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:\bon:?[\w.-]+|@[\w.-]+)\s*=\s*(?:"([^"{}]+)"|'([^'{}]+)')"#).unwrap()
});

/// Collects every expression a markup region embeds: interpolations first
/// (in document order), then quoted event-handler values.
pub fn collect_expressions(markup: &str) -> Vec<String> {
    let mut expressions = collect_interpolations(markup);

    expressions.extend(
        HANDLER_ATTR
            .captures_iter(markup)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|expr| !expr.is_empty()),
    );

    expressions
}

fn collect_interpolations(markup: &str) -> Vec<String> {
    let bytes = markup.as_bytes();
    let mut expressions = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let double = bytes.get(i + 1) == Some(&b'{');
        let body_start = if double { i + 2 } else { i + 1 };
        match scan_braced(bytes, body_start, double) {
            Some((body_end, next)) => {
                if let Some(expr) = normalize(&markup[body_start..body_end]) {
                    expressions.push(expr);
                }
                i = next;
            }
            None => break,
        }
    }

    expressions
}

/// Scans a brace-delimited body starting at `start`, returning the body end
/// offset and the offset just past the closing brace(s). Tracks nested
/// braces and string literals.
fn scan_braced(bytes: &[u8], start: usize, double: bool) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 1;
            } else if c == q {
                quote = None;
            }
        } else {
            match c {
                b'\'' | b'"' | b'`' => quote = Some(c),
                b'{' => depth += 1,
                b'}' => {
                    if depth > 0 {
                        depth -= 1;
                    } else if double {
                        if bytes.get(i + 1) == Some(&b'}') {
                            return Some((i, i + 2));
                        }
                        // Lone brace closing a mustache: tolerate it.
                        return Some((i, i + 1));
                    } else {
                        return Some((i, i + 1));
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    None
}

/// Reduces a raw interpolation body to the expression worth checking.
///
/// Block closers (`{/if}`) and continuations (`{:else}`) carry no
/// expression. Block openers (`{#if cond}`) and keyword tags (`{@html x}`)
/// contribute their trailing expression; an `as` binding clause is cut off
/// since the bound name is not a reference.
fn normalize(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let expr = match trimmed.as_bytes()[0] {
        b'/' | b':' => return None,
        b'#' | b'@' => {
            let rest = trimmed[1..].trim_start();
            let tail = rest.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
            let tail = match tail.split_once(" as ") {
                Some((head, _)) => head.to_string(),
                None => tail,
            };
            tail.trim().to_string()
        }
        _ => trimmed.to_string(),
    };

    if expr.is_empty() {
        None
    } else {
        Some(expr)
    }
}
