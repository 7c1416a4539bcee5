//! Per-open-document shadow registry.
//!
//! One entry exists per open component document. Every edit replaces the
//! entry's shadow document wholesale: extraction and generation re-run
//! synchronously, the old service-registration handles are disposed, and
//! the new shadow text is registered under the same virtual identifier. A
//! feature request issued immediately after an edit observes the new shadow
//! document, never a half-updated one. There is no debouncing; every
//! content change pays for a full regeneration.
//!
//! Entries for different documents are independent; the map supports
//! concurrent insertion and removal from the document-lifecycle callbacks.

use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::{Location, Range, Url};

use crate::blocks;
use crate::config::Settings;
use crate::service::{self, AnalysisHost, ServiceHandle, ServiceSpan};
use crate::shadow::{self, GenerateOptions, ShadowDocument};

pub struct ShadowRegistry {
    entries: DashMap<Url, RegistryEntry>,
    host: Arc<dyn AnalysisHost>,
    settings: Settings,
}

struct RegistryEntry {
    shadow: Arc<ShadowDocument>,
    handles: Vec<Box<dyn ServiceHandle>>,
}

impl ShadowRegistry {
    pub fn new(host: Arc<dyn AnalysisHost>, settings: Settings) -> ShadowRegistry {
        ShadowRegistry {
            entries: DashMap::new(),
            host,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host(&self) -> &dyn AnalysisHost {
        self.host.as_ref()
    }

    /// Creates the entry for a newly opened component document. Documents
    /// of any other kind are ignored.
    pub fn register(&self, uri: &Url, text: &str) {
        let Some(virtual_id) = service::virtual_id_for(uri, &self.settings) else {
            return;
        };
        tracing::debug!("registering shadow document {virtual_id}");

        let (shadow, handle) = self.build(uri, virtual_id, text);
        if let Some(mut previous) = self.entries.insert(
            uri.clone(),
            RegistryEntry {
                shadow,
                handles: vec![handle],
            },
        ) {
            dispose_handles(&mut previous.handles);
        }
    }

    /// Replaces a document's shadow after a content change.
    pub fn on_edit(&self, uri: &Url, text: &str) {
        let Some(virtual_id) = service::virtual_id_for(uri, &self.settings) else {
            return;
        };

        let Some(mut entry) = self.entries.get_mut(uri) else {
            // Edit for a document we never saw opened; degrade to a fresh
            // registration.
            return self.register(uri, text);
        };

        let (shadow, handle) = self.build(uri, virtual_id, text);
        dispose_handles(&mut entry.handles);
        entry.shadow = shadow;
        entry.handles.push(handle);
    }

    /// Disposes all handles and removes the entry when a document closes.
    pub fn unregister(&self, uri: &Url) {
        if let Some((_, mut entry)) = self.entries.remove(uri) {
            dispose_handles(&mut entry.handles);
            tracing::debug!("unregistered shadow for {uri}");
        }
    }

    /// Current shadow snapshot for an open document.
    pub fn snapshot(&self, uri: &Url) -> Option<Arc<ShadowDocument>> {
        self.entries.get(uri).map(|entry| Arc::clone(&entry.shadow))
    }

    /// Current shadow snapshot owning a virtual identifier, for cross-file
    /// results pointing into another open document's shadow.
    pub fn snapshot_by_virtual_id(&self, virtual_id: &str) -> Option<Arc<ShadowDocument>> {
        self.entries.iter().find_map(|entry| {
            (entry.shadow.virtual_id == virtual_id).then(|| Arc::clone(&entry.shadow))
        })
    }

    /// Translates a service span into original-document coordinates.
    ///
    /// Spans in the requesting document translate through the captured
    /// snapshot, so a concurrent edit cannot mix maps from two shadow
    /// generations. Spans in other open documents use that document's own
    /// map. A span whose virtual identifier has no live entry still gets
    /// its identifier rewritten, with a degenerate range, rather than
    /// failing the whole request.
    pub fn resolve_span(
        &self,
        origin: &Arc<ShadowDocument>,
        span: &ServiceSpan,
    ) -> Option<Location> {
        if span.file == origin.virtual_id {
            return Some(Location {
                uri: origin.original_uri.clone(),
                range: origin.original_range(span.start, span.length),
            });
        }

        if let Some(other) = self.snapshot_by_virtual_id(&span.file) {
            return Some(Location {
                uri: other.original_uri.clone(),
                range: other.original_range(span.start, span.length),
            });
        }

        let uri = service::original_uri_for(&span.file, &self.settings)?;
        Some(Location {
            uri,
            range: Range::default(),
        })
    }

    fn build(
        &self,
        uri: &Url,
        virtual_id: String,
        text: &str,
    ) -> (Arc<ShadowDocument>, Box<dyn ServiceHandle>) {
        let blocks = blocks::extract(text);
        let generated = shadow::generate(
            &blocks,
            GenerateOptions {
                prelude: self.settings.prelude,
                template_checks: self.settings.template_checks,
            },
        );
        let handle = self.host.add_virtual_document(&virtual_id, &generated.text);
        let shadow = Arc::new(ShadowDocument::new(
            uri.clone(),
            virtual_id,
            text,
            blocks,
            generated,
        ));
        (shadow, handle)
    }
}

fn dispose_handles(handles: &mut Vec<Box<dyn ServiceHandle>>) {
    for handle in handles.iter_mut() {
        handle.dispose();
    }
    handles.clear();
}
