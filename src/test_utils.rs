//! Shared test utilities.
//!
//! Only compiled for tests. `StubHost` stands in for the external analysis
//! service: it records registrations and handle disposals, answers queries
//! with canned responses, and can be switched into a failing mode to
//! exercise the bridge's error boundary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tower_lsp::lsp_types::Url;

use crate::config::Settings;
use crate::registry::ShadowRegistry;
use crate::service::{
    AnalysisHost, ServiceCompletion, ServiceDiagnostic, ServiceError, ServiceHandle,
    ServiceHighlight, ServiceQuickInfo, ServiceSignatureHelp, ServiceSpan,
};

pub fn component_uri(stem: &str) -> Url {
    Url::parse(&format!("file:///srv/app/{stem}.sfc")).unwrap()
}

/// Registry wired to a shared stub host with default settings.
pub fn stub_registry(host: &Arc<StubHost>) -> ShadowRegistry {
    ShadowRegistry::new(Arc::clone(host) as Arc<dyn AnalysisHost>, Settings::default())
}

#[derive(Default)]
pub struct StubHost {
    created: AtomicUsize,
    disposed: Arc<AtomicUsize>,
    registered: Mutex<HashMap<String, String>>,
    pub completions: Mutex<Vec<ServiceCompletion>>,
    pub quick_info: Mutex<Option<ServiceQuickInfo>>,
    pub definitions: Mutex<Vec<ServiceSpan>>,
    pub references: Mutex<Vec<ServiceSpan>>,
    pub highlights: Mutex<Vec<ServiceHighlight>>,
    pub rename_locations: Mutex<Vec<ServiceSpan>>,
    pub signature_help: Mutex<Option<ServiceSignatureHelp>>,
    pub diagnostics: Mutex<Vec<ServiceDiagnostic>>,
    pub fail: AtomicBool,
    /// Last `(virtual_id, offset)` a query was issued against.
    pub last_query: Mutex<Option<(String, usize)>>,
}

impl StubHost {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn registered_text(&self, virtual_id: &str) -> Option<String> {
        self.registered.lock().unwrap().get(virtual_id).cloned()
    }

    pub fn last_query(&self) -> Option<(String, usize)> {
        self.last_query.lock().unwrap().clone()
    }

    fn record_query(&self, virtual_id: &str, offset: usize) -> Result<(), ServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport("stub host failure".to_string()));
        }
        *self.last_query.lock().unwrap() = Some((virtual_id.to_string(), offset));
        Ok(())
    }
}

struct StubHandle {
    disposed: Arc<AtomicUsize>,
}

impl ServiceHandle for StubHandle {
    fn dispose(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisHost for StubHost {
    fn add_virtual_document(&self, virtual_id: &str, text: &str) -> Box<dyn ServiceHandle> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.registered
            .lock()
            .unwrap()
            .insert(virtual_id.to_string(), text.to_string());
        Box::new(StubHandle {
            disposed: Arc::clone(&self.disposed),
        })
    }

    async fn completions_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceCompletion>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.completions.lock().unwrap().clone())
    }

    async fn quick_info_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Option<ServiceQuickInfo>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.quick_info.lock().unwrap().clone())
    }

    async fn definitions_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.definitions.lock().unwrap().clone())
    }

    async fn references_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.references.lock().unwrap().clone())
    }

    async fn document_highlights(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceHighlight>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.highlights.lock().unwrap().clone())
    }

    async fn rename_locations_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Vec<ServiceSpan>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.rename_locations.lock().unwrap().clone())
    }

    async fn signature_help_at(
        &self,
        virtual_id: &str,
        offset: usize,
    ) -> Result<Option<ServiceSignatureHelp>, ServiceError> {
        self.record_query(virtual_id, offset)?;
        Ok(self.signature_help.lock().unwrap().clone())
    }

    async fn diagnostics_for(
        &self,
        virtual_id: &str,
    ) -> Result<Vec<ServiceDiagnostic>, ServiceError> {
        self.record_query(virtual_id, 0)?;
        Ok(self.diagnostics.lock().unwrap().clone())
    }
}
