use tower_lsp::lsp_types::{Location, Position, Url};

use crate::registry::ShadowRegistry;

/// Find-references through the shadow document, with every returned span
/// translated back to the original coordinates of whichever open document
/// owns it.
pub async fn references(
    registry: &ShadowRegistry,
    cursor_position: Position,
    uri: &Url,
) -> Option<Vec<Location>> {
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let spans = match registry
        .host()
        .references_at(&shadow.virtual_id, offset)
        .await
    {
        Ok(spans) => spans,
        Err(err) => {
            tracing::warn!("reference lookup failed for {uri}: {err}");
            return None;
        }
    };

    Some(
        spans
            .iter()
            .filter_map(|span| registry.resolve_span(&shadow, span))
            .collect::<Vec<_>>(),
    )
}
