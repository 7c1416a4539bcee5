use tower_lsp::lsp_types::{DocumentHighlight, DocumentHighlightKind, Position, Url};

use crate::registry::ShadowRegistry;

/// Occurrence highlights for the symbol under the cursor.
///
/// Highlights are a single-document feature: spans the service reports in
/// other files are ignored, the rest translate through the captured map.
pub async fn document_highlights(
    registry: &ShadowRegistry,
    cursor_position: Position,
    uri: &Url,
) -> Option<Vec<DocumentHighlight>> {
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let highlights = match registry
        .host()
        .document_highlights(&shadow.virtual_id, offset)
        .await
    {
        Ok(highlights) => highlights,
        Err(err) => {
            tracing::warn!("highlight request failed for {uri}: {err}");
            return None;
        }
    };

    Some(
        highlights
            .into_iter()
            .filter(|highlight| highlight.span.file == shadow.virtual_id)
            .map(|highlight| DocumentHighlight {
                range: shadow.original_range(highlight.span.start, highlight.span.length),
                kind: Some(if highlight.is_write {
                    DocumentHighlightKind::WRITE
                } else {
                    DocumentHighlightKind::READ
                }),
            })
            .collect(),
    )
}
