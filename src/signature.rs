use tower_lsp::lsp_types::{
    Documentation, ParameterInformation, ParameterLabel, Position, SignatureHelp,
    SignatureInformation, Url,
};

use crate::registry::ShadowRegistry;

/// Signature help at a call site, delegated through the shadow document.
/// The response carries no file spans, so only the request position needs
/// translation.
pub async fn signature_help(
    registry: &ShadowRegistry,
    cursor_position: Position,
    uri: &Url,
) -> Option<SignatureHelp> {
    let shadow = registry.snapshot(uri)?;
    let offset = shadow.generated_offset_at(cursor_position)?;

    let help = match registry
        .host()
        .signature_help_at(&shadow.virtual_id, offset)
        .await
    {
        Ok(help) => help?,
        Err(err) => {
            tracing::warn!("signature help failed for {uri}: {err}");
            return None;
        }
    };

    Some(SignatureHelp {
        signatures: help
            .signatures
            .into_iter()
            .map(|signature| SignatureInformation {
                label: signature.label,
                documentation: signature.documentation.map(Documentation::String),
                parameters: Some(
                    signature
                        .parameters
                        .into_iter()
                        .map(|parameter| ParameterInformation {
                            label: ParameterLabel::Simple(parameter),
                            documentation: None,
                        })
                        .collect(),
                ),
                active_parameter: None,
            })
            .collect(),
        active_signature: Some(help.active_signature),
        active_parameter: Some(help.active_parameter),
    })
}
