//! Integration tests for the registry lifecycle and the feature bridge,
//! driven through the public API with a minimal in-process analysis host.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tower_lsp::lsp_types::{Position, Url};

use umbra::config::Settings;
use umbra::gotodef;
use umbra::registry::ShadowRegistry;
use umbra::service::{
    AnalysisHost, ServiceCompletion, ServiceDiagnostic, ServiceError, ServiceHandle,
    ServiceHighlight, ServiceQuickInfo, ServiceSignatureHelp, ServiceSpan,
};

/// Records registrations and handle disposals; answers definition queries
/// with a canned span list and everything else empty.
#[derive(Default)]
struct MiniHost {
    created: AtomicUsize,
    disposed: Arc<AtomicUsize>,
    definitions: Mutex<Vec<ServiceSpan>>,
    registered: Mutex<Vec<(String, String)>>,
}

struct MiniHandle {
    disposed: Arc<AtomicUsize>,
}

impl ServiceHandle for MiniHandle {
    fn dispose(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisHost for MiniHost {
    fn add_virtual_document(&self, virtual_id: &str, text: &str) -> Box<dyn ServiceHandle> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.registered
            .lock()
            .unwrap()
            .push((virtual_id.to_string(), text.to_string()));
        Box::new(MiniHandle {
            disposed: Arc::clone(&self.disposed),
        })
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
        Ok(self.definitions.lock().unwrap().clone())
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

fn setup() -> (Arc<MiniHost>, ShadowRegistry) {
    let host = Arc::new(MiniHost::default());
    let registry = ShadowRegistry::new(
        Arc::clone(&host) as Arc<dyn AnalysisHost>,
        Settings::default(),
    );
    (host, registry)
}

fn uri(stem: &str) -> Url {
    Url::parse(&format!("file:///ws/{stem}.sfc")).unwrap()
}

#[test]
fn test_edit_lifecycle_has_no_handle_leaks() {
    let (host, registry) = setup();
    let doc = uri("counter");

    registry.register(&doc, "<script>let n = 0;</script>");
    registry.on_edit(&doc, "<script>let n = 1;</script>");
    registry.on_edit(&doc, "<script>let n = 2;</script>");

    // Each edit fully replaced the previous shadow and its handle.
    assert_eq!(host.created.load(Ordering::SeqCst), 3);
    assert_eq!(host.disposed.load(Ordering::SeqCst), 2);

    let registered = host.registered.lock().unwrap();
    assert_eq!(registered.len(), 3);
    // Same virtual identifier across generations.
    assert!(registered
        .iter()
        .all(|(virtual_id, _)| virtual_id == "file:///ws/counter.sfc.ts"));
    assert!(registered[2].1.contains("let n = 2;"));
    drop(registered);

    registry.unregister(&doc);
    assert_eq!(
        host.created.load(Ordering::SeqCst),
        host.disposed.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_definition_into_other_open_document() {
    let (host, registry) = setup();
    let consumer = uri("consumer");
    let provider = uri("provider");

    registry.register(&consumer, "<script>let value = shared;</script>");
    registry.register(&provider, "<script>export let shared = 1;</script>");

    let provider_shadow = registry.snapshot(&provider).unwrap();
    let provider_script = provider_shadow.map.records()[0].generated_offset;
    // `shared` is 11 bytes into the provider's script content.
    *host.definitions.lock().unwrap() = vec![ServiceSpan {
        file: provider_shadow.virtual_id.clone(),
        start: provider_script + 11,
        length: 6,
    }];

    // Cursor on `shared` in the consumer (offset 20).
    let locations = gotodef::goto_definition(&registry, Position::new(0, 20), &consumer)
        .await
        .expect("definition resolves");

    assert_eq!(locations.len(), 1);
    // Translated to the provider's original identifier and offsets, not
    // left pointing at the shadow identifier.
    assert_eq!(locations[0].uri, provider);
    assert_eq!(locations[0].range.start, Position::new(0, 19));
    assert_eq!(locations[0].range.end, Position::new(0, 25));
}

#[tokio::test]
async fn test_request_after_edit_observes_new_shadow() {
    let (host, registry) = setup();
    let doc = uri("live");

    registry.register(&doc, "<script>let before = 1;</script>");
    registry.on_edit(&doc, "<script>let after = 2;</script>");

    let shadow = registry.snapshot(&doc).unwrap();
    assert!(shadow.text.contains("let after = 2;"));

    let script_start = shadow.map.records()[0].generated_offset;
    *host.definitions.lock().unwrap() = vec![ServiceSpan {
        file: shadow.virtual_id.clone(),
        start: script_start + 4,
        length: 5,
    }];

    let locations = gotodef::goto_definition(&registry, Position::new(0, 12), &doc)
        .await
        .expect("definition resolves");
    assert_eq!(locations[0].range.start, Position::new(0, 12));
    assert_eq!(locations[0].range.end, Position::new(0, 17));
}
