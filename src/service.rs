//! The external static-analysis service boundary.
//!
//! The analysis service only understands plain script, so every operation
//! here is keyed by a virtual identifier and a byte offset into the shadow
//! text registered under it. The trait is injected into the registry and
//! the feature bridge; nothing in this crate reaches for a global service
//! instance.

use async_trait::async_trait;
use thiserror::Error;
use tower_lsp::lsp_types::Url;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("analysis service transport failed: {0}")]
    Transport(String),
    #[error("analysis service does not know document {0}")]
    UnknownDocument(String),
}

/// A contiguous span in a shadow document, identified by virtual id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpan {
    pub file: String,
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSymbolKind {
    Variable,
    Function,
    Property,
    Class,
    Module,
    Keyword,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCompletion {
    pub name: String,
    pub kind: ServiceSymbolKind,
    pub detail: Option<String>,
    pub sort_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceQuickInfo {
    pub contents: String,
    pub span: ServiceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHighlight {
    pub span: ServiceSpan,
    pub is_write: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSignature {
    pub label: String,
    pub parameters: Vec<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSignatureHelp {
    pub signatures: Vec<ServiceSignature>,
    pub active_signature: u32,
    pub active_parameter: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSeverity {
    Error,
    Warning,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDiagnostic {
    pub span: ServiceSpan,
    pub message: String,
    pub severity: ServiceSeverity,
    pub code: Option<String>,
}

/// Registration handle for one shadow document. The registry disposes it
/// exactly once when the shadow is replaced or the document closes.
pub trait ServiceHandle: Send + Sync {
    fn dispose(&mut self);
}

/// The analysis service operations the feature bridge delegates to.
///
/// Document registration is synchronous — edit handling replaces shadow
/// documents without awaiting — while queries are asynchronous, matching a
/// remote or worker-hosted service.
#[async_trait]
pub trait AnalysisHost: Send + Sync {
    fn add_virtual_document(&self, virtual_id: &str, text: &str) -> Box<dyn ServiceHandle>;

    async fn completions_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceCompletion>, ServiceError>;

    async fn quick_info_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Option<ServiceQuickInfo>, ServiceError>;

    async fn definitions_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError>;

    async fn references_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError>;

    async fn document_highlights(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceHighlight>, ServiceError>;

    async fn rename_locations_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError>;

    async fn signature_help_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Option<ServiceSignatureHelp>, ServiceError>;

    async fn diagnostics_for(
        &self,
        virtual_id: &str,
    ) -> Result<Vec<ServiceDiagnostic>, ServiceError>;
}

/// Derives the virtual identifier a component document's shadow is
/// registered under by a fixed extension substitution: `app.sfc` becomes
/// `app.sfc.ts`. Returns `None` for documents that are not of the
/// recognized component kind.
pub fn virtual_id_for(uri: &Url, settings: &Settings) -> Option<String> {
    let component_suffix = format!(".{}", settings.component_extension);
    let uri = uri.as_str();
    uri.ends_with(&component_suffix)
        .then(|| format!("{}.{}", uri, settings.shadow_extension))
}

/// Reverses [`virtual_id_for`] without an auxiliary table.
pub fn original_uri_for(virtual_id: &str, settings: &Settings) -> Option<Url> {
    let shadow_suffix = format!(".{}", settings.shadow_extension);
    let component_suffix = format!(".{}", settings.component_extension);
    let original = virtual_id.strip_suffix(&shadow_suffix)?;
    if !original.ends_with(&component_suffix) {
        return None;
    }
    Url::parse(original).ok()
}

/// A host that answers every query with an empty result. The standalone
/// binary runs with this until a real analysis backend is wired in; tests
/// use it where responses do not matter.
#[derive(Debug, Default)]
pub struct NullHost;

struct NullHandle;

impl ServiceHandle for NullHandle {
    fn dispose(&mut self) {}
}

#[async_trait]
impl AnalysisHost for NullHost {
    fn add_virtual_document(&self, _virtual_id: &str, _text: &str) -> Box<dyn ServiceHandle> {
        Box::new(NullHandle)
    }

    async fn completions_at(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Vec<ServiceCompletion>, ServiceError> {
        Ok(Vec::new())
    }

    async fn quick_info_at(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Option<ServiceQuickInfo>, ServiceError> {
        Ok(None)
    }

    async fn definitions_at(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError> {
        Ok(Vec::new())
    }

    async fn references_at(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError> {
        Ok(Vec::new())
    }

    async fn document_highlights(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Vec<ServiceHighlight>, ServiceError> {
        Ok(Vec::new())
    }

    async fn rename_locations_at(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError> {
        Ok(Vec::new())
    }

    async fn signature_help_at(
        &self,
        _virtual_id: &str,
        _offset: usize,
    ) -> Result<Option<ServiceSignatureHelp>, ServiceError> {
        Ok(None)
    }

    async fn diagnostics_for(
        &self,
        _virtual_id: &str,
    ) -> Result<Vec<ServiceDiagnostic>, ServiceError> {
        Ok(Vec::new())
    }
}
