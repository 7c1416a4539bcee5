use itertools::Itertools;
use tower_lsp::lsp_types::{RenameParams, TextEdit, Url, WorkspaceEdit};

use crate::registry::ShadowRegistry;

/// Rename the symbol under the cursor everywhere the analysis service finds
/// it, with each edit location translated back to the owning original
/// document.
pub async fn rename(
    registry: &ShadowRegistry,
    params: &RenameParams,
    uri: &Url,
) -> Option<WorkspaceEdit> {
    let cursor_position = params.text_document_position.position;
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let spans = match registry
        .host()
        .rename_locations_at(&shadow.virtual_id, offset)
        .await
    {
        Ok(spans) => spans,
        Err(err) => {
            tracing::warn!("rename lookup failed for {uri}: {err}");
            return None;
        }
    };

    let changes = spans
        .iter()
        .filter_map(|span| registry.resolve_span(&shadow, span))
        .map(|location| {
            (
                location.uri,
                TextEdit {
                    range: location.range,
                    new_text: params.new_name.clone(),
                },
            )
        })
        .into_group_map();

    if changes.is_empty() {
        return None;
    }

    Some(WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    })
}
