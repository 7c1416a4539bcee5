//! Shadow document synthesis.
//!
//! A shadow document is a script-only rendition of a component document,
//! registered with the external analysis service in place of the original.
//! Script blocks are copied verbatim with mapping records so positions
//! translate losslessly; everything else — the ambient prelude, template
//! usage checks, the default export — is synthetic text with no mapping.

pub mod mapping;
pub mod template;

use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, Url};

use crate::blocks::{BlockKind, SfcBlock};
use crate::text;
use mapping::{MappingKind, MappingRecord, PositionMap};

/// Ambient declarations for the reactive/lifecycle primitives the component
/// runtime exposes, so script blocks that use them type-check standalone.
pub const AMBIENT_PRELUDE: &str = "\
// Ambient declarations for the component runtime.
declare function reactive<T>(value: T): { value: T };
declare function computed<T>(getter: () => T): { readonly value: T };
declare function watch<T>(source: () => T, callback: (value: T, previous: T) => void): void;
declare function onMount(callback: () => void | (() => void)): void;
declare function onDestroy(callback: () => void): void;
declare function emit(event: string, detail?: unknown): void;
declare const props: Record<string, unknown>;
";

#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub prelude: bool,
    pub template_checks: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            prelude: true,
            template_checks: true,
        }
    }
}

/// Output of one generator run: the shadow text and the mapping records
/// created while emitting it, in emission order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GeneratedShadow {
    pub text: String,
    pub mappings: Vec<MappingRecord>,
}

/// Emits the shadow text for a set of extracted blocks.
///
/// Emission order: ambient prelude, module-script content, plain/setup
/// script content (or a placeholder comment when the document has none),
/// template usage checks, and a default export keeping the result a valid
/// standalone module. Pure function of its inputs: identical blocks yield
/// byte-identical output.
pub fn generate(blocks: &[SfcBlock], options: GenerateOptions) -> GeneratedShadow {
    let mut text = String::new();
    let mut mappings = Vec::new();

    if options.prelude {
        text.push_str(AMBIENT_PRELUDE);
        text.push('\n');
    }

    if let Some(module) = blocks.iter().find(|b| b.kind == BlockKind::ModuleScript) {
        push_mapped(&mut text, &mut mappings, module, MappingKind::Module);
    }

    match blocks.iter().find(|b| b.kind == BlockKind::Script) {
        Some(script) => push_mapped(&mut text, &mut mappings, script, MappingKind::Script),
        None => text.push_str("// component has no script block\n"),
    }

    if options.template_checks {
        if let Some(markup) = blocks.iter().find(|b| b.kind == BlockKind::Markup) {
            push_template_checks(&mut text, &markup.content);
        }
    }

    text.push_str("\nexport default {};\n");

    GeneratedShadow { text, mappings }
}

/// Copies block content verbatim and records the span it came from.
fn push_mapped(
    text: &mut String,
    mappings: &mut Vec<MappingRecord>,
    block: &SfcBlock,
    kind: MappingKind,
) {
    mappings.push(MappingRecord {
        original_offset: block.original_start,
        original_length: block.content.len(),
        generated_offset: text.len(),
        kind,
    });
    text.push_str(&block.content);
    if !block.content.ends_with('\n') {
        text.push('\n');
    }
}

/// Emits every markup expression as a statement that merely references it,
/// wrapped in a never-called function. The fragments are re-ordered
/// relative to their source positions, so they stay synthetic (unmapped):
/// only their presence is checked.
fn push_template_checks(text: &mut String, markup: &str) {
    let expressions = template::collect_expressions(markup);
    if expressions.is_empty() {
        return;
    }

    text.push_str("\nfunction __template_check() {\n");
    for expression in &expressions {
        text.push_str("void (");
        text.push_str(expression);
        text.push_str(");\n");
    }
    text.push_str("}\n");
}

/// One original document's derived state: the generated text, its position
/// map, and the blocks it was generated from. Immutable once built; the
/// registry replaces the whole document on every edit.
#[derive(Debug)]
pub struct ShadowDocument {
    pub original_uri: Url,
    pub virtual_id: String,
    pub text: String,
    pub map: PositionMap,
    pub blocks: Vec<SfcBlock>,
    original: Rope,
}

impl ShadowDocument {
    pub fn new(
        original_uri: Url,
        virtual_id: String,
        original_text: &str,
        blocks: Vec<SfcBlock>,
        generated: GeneratedShadow,
    ) -> ShadowDocument {
        ShadowDocument {
            original_uri,
            virtual_id,
            original: Rope::from_str(original_text),
            text: generated.text,
            map: PositionMap::new(generated.mappings),
            blocks,
        }
    }

    /// Translates a position in the original document into a generated-text
    /// byte offset.
    pub fn generated_offset_at(&self, position: Position) -> Option<usize> {
        let original = text::offset_at(&self.original, position)?;
        Some(self.map.to_generated(original))
    }

    /// Translates a generated-text span back into an original-document
    /// range. Spans map 1:1, so the end is the start's translation plus the
    /// span length.
    pub fn original_range(&self, start: usize, length: usize) -> Range {
        let original_start = self.map.to_original(start);
        text::range_from_span(&self.original, original_start..original_start + length)
    }

    /// Whether a generated offset lands in mapped (copied) text rather than
    /// a synthetic region.
    pub fn is_mapped(&self, generated_offset: usize) -> bool {
        self.map.record_at_generated(generated_offset).is_some()
    }
}
