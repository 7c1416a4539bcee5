use itertools::Itertools;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionParams, CompletionResponse, Url,
};

use crate::registry::ShadowRegistry;
use crate::service::{ServiceCompletion, ServiceSymbolKind};

/// Completions at a component-document position, answered by the analysis
/// service against the shadow document.
///
/// Completion items carry no positions, so only the request direction needs
/// translation.
pub async fn get_completions(
    registry: &ShadowRegistry,
    params: &CompletionParams,
    uri: &Url,
) -> Option<CompletionResponse> {
    let cursor_position = params.text_document_position.position;
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let completions = match registry
        .host()
        .completions_at(&shadow.virtual_id, offset)
        .await
    {
        Ok(completions) => completions,
        Err(err) => {
            tracing::warn!("completion request failed for {uri}: {err}");
            return None;
        }
    };

    let items = completions
        .into_iter()
        .map(to_completion_item)
        .collect_vec();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: true,
        items,
    }))
}

fn to_completion_item(completion: ServiceCompletion) -> CompletionItem {
    CompletionItem {
        label: completion.name,
        kind: Some(match completion.kind {
            ServiceSymbolKind::Variable => CompletionItemKind::VARIABLE,
            ServiceSymbolKind::Function => CompletionItemKind::FUNCTION,
            ServiceSymbolKind::Property => CompletionItemKind::PROPERTY,
            ServiceSymbolKind::Class => CompletionItemKind::CLASS,
            ServiceSymbolKind::Module => CompletionItemKind::MODULE,
            ServiceSymbolKind::Keyword => CompletionItemKind::KEYWORD,
            ServiceSymbolKind::Other => CompletionItemKind::TEXT,
        }),
        detail: completion.detail,
        sort_text: completion.sort_text,
        ..Default::default()
    }
}
