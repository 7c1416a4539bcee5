//! Hover provider backed by the analysis service's quick info.
//!
//! The hover position translates into shadow coordinates, and the info
//! span comes back through the same captured position map, so the reported
//! range always highlights original text.

use tower_lsp::lsp_types::{
    Hover, HoverContents, HoverParams, MarkupContent, MarkupKind, Url,
};

use crate::registry::ShadowRegistry;

fn hover_markup(contents: &str) -> MarkupContent {
    MarkupContent {
        kind: MarkupKind::Markdown,
        value: format!("```ts\n{}\n```", contents),
    }
}

/// Generate hover content for the position in `params`.
///
/// Returns `None` if hover is disabled in settings, the document is not
/// registered, the position does not resolve, or the service has nothing
/// to say.
pub async fn hover(
    registry: &ShadowRegistry,
    params: &HoverParams,
    uri: &Url,
) -> Option<Hover> {
    if !registry.settings().hover {
        return None;
    }

    let cursor_position = params.text_document_position_params.position;
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let info = match registry.host().quick_info_at(&shadow.virtual_id, offset).await {
        Ok(info) => info?,
        Err(err) => {
            tracing::warn!("quick info failed for {uri}: {err}");
            return None;
        }
    };

    // Only spans in the requesting document's own shadow highlight a range;
    // quick info about foreign files keeps its text but loses the range.
    let range = (info.span.file == shadow.virtual_id)
        .then(|| shadow.original_range(info.span.start, info.span.length));

    Some(Hover {
        contents: HoverContents::Markup(hover_markup(&info.contents)),
        range,
    })
}
