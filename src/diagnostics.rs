//! Diagnostics for component documents.
//!
//! The analysis service checks the shadow text; diagnostics landing in
//! mapped regions translate back to original coordinates and are published
//! from the document-lifecycle hooks. Diagnostics in synthetic regions
//! (the prelude, template usage checks, the default export) have no
//! original position and are filtered out rather than shown somewhere
//! misleading.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Url};

use crate::registry::ShadowRegistry;
use crate::service::ServiceSeverity;

pub async fn diagnostics(registry: &ShadowRegistry, uri: &Url) -> Vec<Diagnostic> {
    if !registry.settings().diagnostics {
        return Vec::new();
    }

    let Some(shadow) = registry.snapshot(uri) else {
        return Vec::new();
    };

    let reported = match registry.host().diagnostics_for(&shadow.virtual_id).await {
        Ok(reported) => reported,
        Err(err) => {
            tracing::warn!("diagnostics request failed for {uri}: {err}");
            return Vec::new();
        }
    };

    reported
        .into_iter()
        .filter(|diagnostic| diagnostic.span.file == shadow.virtual_id)
        .filter(|diagnostic| shadow.is_mapped(diagnostic.span.start))
        .map(|diagnostic| Diagnostic {
            range: shadow.original_range(diagnostic.span.start, diagnostic.span.length),
            severity: Some(match diagnostic.severity {
                ServiceSeverity::Error => DiagnosticSeverity::ERROR,
                ServiceSeverity::Warning => DiagnosticSeverity::WARNING,
                ServiceSeverity::Hint => DiagnosticSeverity::HINT,
            }),
            code: diagnostic.code.map(NumberOrString::String),
            source: Some("umbra".to_string()),
            message: diagnostic.message,
            ..Default::default()
        })
        .collect()
}
