//! Block extraction for single-file component documents.
//!
//! An SFC interleaves markup, script, and style regions in one file. This
//! module splits the raw text into typed byte-range blocks in a single
//! forward pass: find the next opening tag of a recognized kind, then find
//! the matching closing tag of the same kind after it. Closing tags inside
//! script/style blocks are located with a lexical scanner that understands
//! string literals and comments, so `"</script>"` inside a string does not
//! end the block early.
//!
//! Malformed input degrades to less analysis: a block with no closing tag
//! is dropped, never reported as an error.

use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// The kind of a block within a component document.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BlockKind {
    Markup,
    Script,
    ModuleScript,
    Style,
    Custom,
}

/// A parsed attribute value: bare attributes are presence flags, quoted
/// (or unquoted `key=value`) attributes carry a string.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AttrValue {
    Flag,
    Value(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Value(value) => Some(value),
            AttrValue::Flag => None,
        }
    }
}

/// One typed block of a component document.
///
/// `original_start..original_end` is the half-open byte range of the block
/// content in the original text. For the markup block the range spans from
/// the first to the last markup byte; its `content` is the concatenation of
/// the disjoint markup spans.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SfcBlock {
    pub kind: BlockKind,
    /// Tag name for tag-delimited blocks; `template` markup keeps its tag.
    pub tag: String,
    pub content: String,
    pub original_start: usize,
    pub original_end: usize,
    pub attributes: HashMap<String, AttrValue>,
    pub is_setup_script: bool,
}

// Opening tag of a recognized container. The attribute section tolerates
// quoted values containing `>`.
static CONTAINER_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(template|script|style)((?:[\s/](?:[^>"']|"[^"]*"|'[^']*')*)?)>"#).unwrap()
});

// Any opening tag; used to find custom blocks between containers.
static ANY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:[\s/](?:[^>"']|"[^"]*"|'[^']*')*)?)>"#).unwrap()
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([:@a-zA-Z_][-:.\w@]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).unwrap()
});

/// Splits component text into typed blocks.
///
/// Recognized containers are `<template>`, `<script>` and `<style>`. When a
/// template block is present, any other top-level tag pair between the
/// containers becomes a [`BlockKind::Custom`] block; without a template
/// block the document is treated as top-level markup and unknown tags stay
/// part of it. The markup block is the residual text outside all other
/// blocks, trimmed of leading and trailing whitespace.
pub fn extract(text: &str) -> Vec<SfcBlock> {
    let mut raw = Vec::new();
    let mut consumed: Vec<Range<usize>> = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(caps) = CONTAINER_TAG.captures(&text[pos..]) else {
            break;
        };
        let full = caps.get(0).unwrap();
        let open_start = pos + full.start();

        // An opening tag inside a markup comment is not a block boundary.
        if let Some(rel) = text[pos..open_start].find("<!--") {
            let comment_start = pos + rel;
            match text[comment_start..].find("-->") {
                Some(end) => {
                    pos = comment_start + end + 3;
                    continue;
                }
                None => break,
            }
        }

        let tag = caps.get(1).unwrap().as_str().to_ascii_lowercase();
        let attr_src = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let content_start = pos + full.end();

        if attr_src.trim_end().ends_with('/') {
            // Self-closing container carries no content.
            pos = content_start;
            continue;
        }

        let mode = match tag.as_str() {
            "script" => ScanMode::Script,
            "style" => ScanMode::Style,
            _ => ScanMode::Markup,
        };

        match find_closing_tag(text, content_start, &tag, mode) {
            Some((content_end, outer_end)) => {
                raw.push(RawBlock {
                    tag,
                    attributes: parse_attributes(attr_src),
                    content: content_start..content_end,
                });
                consumed.push(open_start..outer_end);
                pos = outer_end;
            }
            None => {
                // Unterminated block: drop it and everything it swallowed.
                consumed.push(open_start..text.len());
                pos = text.len();
            }
        }
    }

    let has_template = raw.iter().any(|block| block.tag == "template");
    let mut residual = complement(text.len(), &consumed);

    let mut blocks: Vec<SfcBlock> = Vec::new();
    let mut markup_spans: Vec<Range<usize>> = Vec::new();
    let mut markup_attrs: HashMap<String, AttrValue> = HashMap::new();

    for block in raw {
        match block.tag.as_str() {
            "template" => {
                markup_attrs = block.attributes;
                markup_spans.push(block.content);
            }
            "script" => {
                let is_module = block.attributes.contains_key("module")
                    || block.attributes.get("context").and_then(AttrValue::as_str)
                        == Some("module");
                let kind = if is_module {
                    BlockKind::ModuleScript
                } else {
                    BlockKind::Script
                };
                let is_setup = block.attributes.contains_key("setup");
                blocks.push(make_block(text, kind, "script", block, is_setup));
            }
            "style" => blocks.push(make_block(text, BlockKind::Style, "style", block, false)),
            _ => unreachable!("container regex only matches recognized tags"),
        }
    }

    if has_template {
        for span in std::mem::take(&mut residual) {
            extract_custom(text, span, &mut blocks, &mut markup_spans);
        }
    } else {
        markup_spans.extend(residual);
    }

    markup_spans.sort_by_key(|span| span.start);
    if let Some(markup) = build_markup(text, &markup_spans, markup_attrs) {
        blocks.push(markup);
    }

    blocks
}

struct RawBlock {
    tag: String,
    attributes: HashMap<String, AttrValue>,
    content: Range<usize>,
}

fn make_block(
    text: &str,
    kind: BlockKind,
    tag: &str,
    raw: RawBlock,
    is_setup_script: bool,
) -> SfcBlock {
    SfcBlock {
        kind,
        tag: tag.to_string(),
        content: text[raw.content.clone()].to_string(),
        original_start: raw.content.start,
        original_end: raw.content.end,
        attributes: raw.attributes,
        is_setup_script,
    }
}

/// Scans one residual span for custom top-level tag pairs; anything that is
/// not a complete tag pair stays markup.
fn extract_custom(
    text: &str,
    span: Range<usize>,
    blocks: &mut Vec<SfcBlock>,
    markup_spans: &mut Vec<Range<usize>>,
) {
    let mut pos = span.start;
    while pos < span.end {
        let Some(caps) = ANY_TAG.captures(&text[pos..span.end]) else {
            break;
        };
        let full = caps.get(0).unwrap();
        let open_start = pos + full.start();
        let tag = caps.get(1).unwrap().as_str().to_ascii_lowercase();
        let content_start = pos + full.end();

        match find_closing_tag(text, content_start, &tag, ScanMode::Markup) {
            Some((content_end, outer_end)) if outer_end <= span.end => {
                if open_start > pos {
                    markup_spans.push(pos..open_start);
                }
                blocks.push(SfcBlock {
                    kind: BlockKind::Custom,
                    tag: tag.clone(),
                    content: text[content_start..content_end].to_string(),
                    original_start: content_start,
                    original_end: content_end,
                    attributes: parse_attributes(caps.get(2).map(|m| m.as_str()).unwrap_or("")),
                    is_setup_script: false,
                });
                pos = outer_end;
            }
            _ => {
                markup_spans.push(pos..content_start);
                pos = content_start;
            }
        }
    }
    if pos < span.end {
        markup_spans.push(pos..span.end);
    }
}

fn build_markup(
    text: &str,
    spans: &[Range<usize>],
    attributes: HashMap<String, AttrValue>,
) -> Option<SfcBlock> {
    let trimmed: Vec<Range<usize>> = spans
        .iter()
        .map(|span| {
            let slice = &text[span.clone()];
            let lead = slice.len() - slice.trim_start().len();
            let tail = slice.len() - slice.trim_end().len();
            span.start + lead..span.end - tail
        })
        .filter(|span| span.start < span.end)
        .collect();

    let first = trimmed.first()?;
    let last = trimmed.last()?;
    let content = trimmed
        .iter()
        .map(|span| &text[span.clone()])
        .collect::<Vec<_>>()
        .join("\n");

    Some(SfcBlock {
        kind: BlockKind::Markup,
        tag: "template".to_string(),
        content,
        original_start: first.start,
        original_end: last.end,
        attributes,
        is_setup_script: false,
    })
}

fn complement(len: usize, consumed: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    for range in consumed {
        if range.start > cursor {
            spans.push(cursor..range.start);
        }
        cursor = cursor.max(range.end);
    }
    if cursor < len {
        spans.push(cursor..len);
    }
    spans
}

fn parse_attributes(source: &str) -> HashMap<String, AttrValue> {
    ATTRIBUTE
        .captures_iter(source)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| AttrValue::Value(m.as_str().to_string()))
                .unwrap_or(AttrValue::Flag);
            Some((name.to_string(), value))
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum ScanMode {
    Script,
    Style,
    Markup,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum ScanState {
    Code,
    Str(u8),
    LineComment,
    BlockComment,
}

/// Finds the closing tag for `tag` starting at `from`.
///
/// Script and style content is scanned lexically: closing-tag text inside a
/// string literal, template literal, line comment or block comment does not
/// terminate the block. Markup content uses a plain scan.
///
/// Returns `(content_end, outer_end)`: the offset of the `<` of the closing
/// tag and the offset just past its `>`.
fn find_closing_tag(
    text: &str,
    from: usize,
    tag: &str,
    mode: ScanMode,
) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let tag_bytes = tag.as_bytes();
    let mut state = ScanState::Code;
    let mut i = from;

    while i < bytes.len() {
        match state {
            ScanState::Code => {
                let c = bytes[i];
                if c == b'<' && is_closing_at(bytes, i, tag_bytes) {
                    let close = bytes[i..].iter().position(|&b| b == b'>')?;
                    return Some((i, i + close + 1));
                }
                match mode {
                    ScanMode::Markup => {}
                    ScanMode::Script | ScanMode::Style => match c {
                        b'"' | b'\'' => state = ScanState::Str(c),
                        b'`' if mode == ScanMode::Script => state = ScanState::Str(b'`'),
                        b'/' if i + 1 < bytes.len() => match bytes[i + 1] {
                            b'/' if mode == ScanMode::Script => {
                                state = ScanState::LineComment;
                                i += 1;
                            }
                            b'*' => {
                                state = ScanState::BlockComment;
                                i += 1;
                            }
                            _ => {}
                        },
                        _ => {}
                    },
                }
            }
            ScanState::Str(quote) => {
                let c = bytes[i];
                if c == b'\\' {
                    i += 1;
                } else if c == quote {
                    state = ScanState::Code;
                } else if c == b'\n' && quote != b'`' {
                    // Unterminated plain string; resynchronize at the newline.
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if bytes[i] == b'\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    state = ScanState::Code;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    None
}

fn is_closing_at(bytes: &[u8], i: usize, tag: &[u8]) -> bool {
    if bytes.len() < i + 2 + tag.len() {
        return false;
    }
    if bytes[i] != b'<' || bytes[i + 1] != b'/' {
        return false;
    }
    if !bytes[i + 2..i + 2 + tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    matches!(
        bytes.get(i + 2 + tag.len()),
        None | Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn block<'a>(blocks: &'a [SfcBlock], kind: BlockKind) -> &'a SfcBlock {
        blocks
            .iter()
            .find(|b| b.kind == kind)
            .unwrap_or_else(|| panic!("no {:?} block in {:?}", kind, blocks))
    }

    #[test]
    fn test_extract_template_script_style() {
        let text = "<template>\n  <p>{{ count }}</p>\n</template>\n<script setup>\nconst count = reactive(0);\n</script>\n<style scoped>\np { color: red; }\n</style>\n";
        let blocks = extract(text);

        let script = block(&blocks, BlockKind::Script);
        assert_eq!(script.content, "\nconst count = reactive(0);\n");
        assert!(script.is_setup_script);
        assert_eq!(
            &text[script.original_start..script.original_end],
            script.content
        );

        let style = block(&blocks, BlockKind::Style);
        assert!(style.attributes.contains_key("scoped"));
        assert_eq!(style.attributes.get("scoped"), Some(&AttrValue::Flag));

        let markup = block(&blocks, BlockKind::Markup);
        assert_eq!(markup.content, "<p>{{ count }}</p>");
    }

    #[test]
    fn test_extract_top_level_markup() {
        let text = "<script>\nlet name = 'world';\n</script>\n\n<h1>Hello {name}</h1>\n";
        let blocks = extract(text);

        let markup = block(&blocks, BlockKind::Markup);
        assert_eq!(markup.content, "<h1>Hello {name}</h1>");
        assert_eq!(&text[markup.original_start..markup.original_end], markup.content);
    }

    #[test]
    fn test_module_script_classification() {
        let svelte = "<script context=\"module\">export const total = 1;</script>";
        let blocks = extract(svelte);
        assert_eq!(blocks[0].kind, BlockKind::ModuleScript);

        let bare = "<script module>export const total = 1;</script>";
        let blocks = extract(bare);
        assert_eq!(blocks[0].kind, BlockKind::ModuleScript);

        let plain = "<script>const total = 1;</script>";
        let blocks = extract(plain);
        assert_eq!(blocks[0].kind, BlockKind::Script);
    }

    #[test]
    fn test_attribute_values() {
        let text = "<script lang=\"ts\" setup>let x = 1;</script>";
        let blocks = extract(text);
        let script = block(&blocks, BlockKind::Script);
        assert_eq!(
            script.attributes.get("lang"),
            Some(&AttrValue::Value("ts".to_string()))
        );
        assert_eq!(script.attributes.get("setup"), Some(&AttrValue::Flag));
        assert!(script.is_setup_script);
    }

    #[test]
    fn test_unterminated_block_is_dropped() {
        let text = "<p>intro</p>\n<script>\nconst x = 1;\n";
        let blocks = extract(text);

        assert!(blocks.iter().all(|b| b.kind != BlockKind::Script));
        let markup = block(&blocks, BlockKind::Markup);
        assert_eq!(markup.content, "<p>intro</p>");
    }

    #[test]
    fn test_closing_tag_in_string_literal_does_not_truncate() {
        let text = "<script>const tag = \"</script>\"; const x = 1;</script>";
        let blocks = extract(text);
        let script = block(&blocks, BlockKind::Script);
        assert_eq!(script.content, "const tag = \"</script>\"; const x = 1;");
    }

    #[test]
    fn test_closing_tag_in_comments_does_not_truncate() {
        let line = "<script>// </script> not yet\nlet a = 2;</script>";
        let script = extract(line);
        assert_eq!(
            block(&script, BlockKind::Script).content,
            "// </script> not yet\nlet a = 2;"
        );

        let block_comment = "<style>/* </style> */ p { }</style>";
        let style = extract(block_comment);
        assert_eq!(
            block(&style, BlockKind::Style).content,
            "/* </style> */ p { }"
        );
    }

    #[test]
    fn test_closing_tag_in_template_literal_does_not_truncate() {
        let text = "<script>const s = `</script>`;</script>";
        let blocks = extract(text);
        assert_eq!(
            block(&blocks, BlockKind::Script).content,
            "const s = `</script>`;"
        );
    }

    #[test]
    fn test_blocks_are_disjoint() {
        let text = "<template><i>{{ a }}</i></template><script module>const a = 1;</script><script>let b = 2;</script><style>i {}</style><docs>notes</docs>";
        let blocks = extract(text);

        let spans = blocks
            .iter()
            .filter(|b| b.kind != BlockKind::Markup)
            .map(|b| (b.original_start, b.original_end))
            .collect_vec();
        for (left, right) in spans.iter().tuple_combinations() {
            assert!(
                left.1 <= right.0 || right.1 <= left.0,
                "blocks overlap: {:?} and {:?}",
                left,
                right
            );
        }
    }

    #[test]
    fn test_custom_block_requires_template_mode() {
        let with_template = "<template><p>hi</p></template><docs># Notes</docs>";
        let blocks = extract(with_template);
        let custom = block(&blocks, BlockKind::Custom);
        assert_eq!(custom.tag, "docs");
        assert_eq!(custom.content, "# Notes");

        // Without a template block, unknown tags are ordinary markup.
        let top_level = "<script>let x = 1;</script><div>hi</div>";
        let blocks = extract(top_level);
        assert!(blocks.iter().all(|b| b.kind != BlockKind::Custom));
        assert_eq!(block(&blocks, BlockKind::Markup).content, "<div>hi</div>");
    }

    #[test]
    fn test_commented_out_container_is_ignored() {
        let text = "<!-- <script>old</script> -->\n<script>let live = true;</script>";
        let blocks = extract(text);
        let scripts = blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Script)
            .collect_vec();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].content, "let live = true;");
    }

    #[test]
    fn test_whitespace_only_residual_yields_no_markup() {
        let text = "\n\n<script>let x = 1;</script>\n\n";
        let blocks = extract(text);
        assert!(blocks.iter().all(|b| b.kind != BlockKind::Markup));
    }

    #[test]
    fn test_empty_input() {
        assert!(extract("").is_empty());
    }
}
