use tower_lsp::lsp_types::{Location, Position, Url};

use crate::registry::ShadowRegistry;

/// Go-to-definition, delegated through the shadow document.
///
/// The cursor position translates into the shadow coordinate space, the
/// analysis service answers against the shadow text, and every resulting
/// span translates back — including spans pointing into a different open
/// document's shadow, which resolve to that document's original identifier.
pub async fn goto_definition(
    registry: &ShadowRegistry,
    cursor_position: Position,
    uri: &Url,
) -> Option<Vec<Location>> {
    // Capture the snapshot before awaiting so the response is translated
    // with the same map generation the service saw.
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let spans = match registry
        .host()
        .definitions_at(&shadow.virtual_id, offset)
        .await
    {
        Ok(spans) => spans,
        Err(err) => {
            tracing::warn!("definition lookup failed for {uri}: {err}");
            return None;
        }
    };

    Some(
        spans
            .iter()
            .filter_map(|span| registry.resolve_span(&shadow, span))
            .collect(),
    )
}
