use iiif_bench_runner::prelude::*;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// In-memory annotation store used to exercise the step runner and driver
/// without a server.
#[derive(Default)]
pub struct MemoryState {
    pub manifests: HashMap<ManifestId, Vec<CanvasId>>,
    pub annotations: HashMap<CanvasId, Vec<AnnotationId>>,
    /// Every canvas that ever received an annotation-list insert, across
    /// purges. Used to check the sampling invariant.
    pub list_inserted_canvases: HashSet<CanvasId>,
    /// Set if the same canvas receives a second annotation-list insert.
    pub duplicate_list_insert: bool,
    pub update_count: u64,
    pub purge_count: u64,
    /// Number of manifests present when the most recent purge started.
    pub manifests_at_purge: usize,
}

pub struct MemoryStore {
    caps: Capabilities,
    pub state: Mutex<MemoryState>,
    fail_manifest_inserts: AtomicBool,
    every_other_manifest_fails: AtomicBool,
    manifest_insert_attempts: AtomicU64,
}

impl MemoryStore {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            state: Mutex::new(MemoryState::default()),
            fail_manifest_inserts: AtomicBool::new(false),
            every_other_manifest_fails: AtomicBool::new(false),
            manifest_insert_attempts: AtomicU64::new(0),
        }
    }

    pub fn full_caps() -> Self {
        Self::new(Capabilities {
            annotation_fetch: true,
            annotation_update: true,
            annotation_list_insert: true,
            manifest_delete: true,
        })
    }

    /// Make every manifest insert fail, so Populate produces no canvases.
    pub fn fail_manifest_inserts(self) -> Self {
        self.fail_manifest_inserts.store(true, Ordering::SeqCst);
        self
    }

    /// Make every second manifest insert fail.
    pub fn flaky_manifest_inserts(self) -> Self {
        self.every_other_manifest_fails.store(true, Ordering::SeqCst);
        self
    }
}

impl AnnotationStore for MemoryStore {
    fn server_name(&self) -> &str {
        "memory"
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn insert_manifest(&self, manifest: &ManifestPayload) -> Result<Vec<CanvasId>, StoreError> {
        let attempt = self.manifest_insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_manifest_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::UnexpectedResponse("insert refused".to_string()));
        }
        if self.every_other_manifest_fails.load(Ordering::SeqCst) && attempt % 2 == 1 {
            return Err(StoreError::UnexpectedResponse("insert refused".to_string()));
        }

        let mut state = self.state.lock();
        state
            .manifests
            .insert(manifest.manifest_id.clone(), manifest.canvas_ids.clone());
        Ok(manifest.canvas_ids.clone())
    }

    fn insert_annotation(&self, annotation: &AnnotationPayload) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state
            .annotations
            .entry(annotation.canvas_id.clone())
            .or_default()
            .push(annotation.annotation_id.clone());
        Ok(())
    }

    fn insert_annotation_list(&self, list: &AnnotationListPayload) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if !state.list_inserted_canvases.insert(list.canvas_id.clone()) {
            state.duplicate_list_insert = true;
        }
        let entry = state.annotations.entry(list.canvas_id.clone()).or_default();
        entry.extend(
            list.annotations
                .iter()
                .map(|annotation| annotation.annotation_id.clone()),
        );
        Ok(())
    }

    fn get_annotation_list(&self, canvas: &str) -> Result<Vec<AnnotationId>, StoreError> {
        let state = self.state.lock();
        Ok(state.annotations.get(canvas).cloned().unwrap_or_default())
    }

    fn get_annotation(&self, annotation: &str) -> Result<serde_json::Value, StoreError> {
        Ok(serde_json::json!({ "@id": annotation }))
    }

    fn update_annotation(&self, _annotation: &AnnotationPayload) -> Result<(), StoreError> {
        self.state.lock().update_count += 1;
        Ok(())
    }

    fn delete_annotation(&self, annotation: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        for ids in state.annotations.values_mut() {
            ids.retain(|id| id != annotation);
        }
        Ok(())
    }

    fn delete_manifest(&self, manifest: &str) -> Result<(), StoreError> {
        self.state.lock().manifests.remove(manifest);
        Ok(())
    }

    fn list_manifest_ids(&self) -> Result<Vec<ManifestId>, StoreError> {
        Ok(self.state.lock().manifests.keys().cloned().collect())
    }

    fn purge(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.manifests_at_purge = state.manifests.len();
        state.manifests.clear();
        state.annotations.clear();
        state.purge_count += 1;
        Ok(())
    }
}

/// Cheap payload source: bodies are tiny JSON stubs, identifiers are
/// sequential and unique for the lifetime of the source.
#[derive(Default)]
pub struct TestPayloads {
    next_id: AtomicU64,
}

impl TestPayloads {
    fn next(&self, kind: &str) -> String {
        format!("{}-{}", kind, self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl PayloadSource for TestPayloads {
    fn manifest(&self, canvas_count: u64) -> ManifestPayload {
        let manifest_id = self.next("manifest");
        let canvas_ids: Vec<CanvasId> =
            (0..canvas_count).map(|_| self.next("canvas")).collect();
        ManifestPayload {
            body: serde_json::json!({ "@id": manifest_id, "canvases": canvas_ids }),
            manifest_id,
            canvas_ids,
        }
    }

    fn annotation(&self, canvas_id: &str) -> AnnotationPayload {
        let annotation_id = self.next("annotation");
        AnnotationPayload {
            body: serde_json::json!({ "@id": annotation_id, "on": canvas_id }),
            annotation_id,
            canvas_id: canvas_id.to_string(),
        }
    }

    fn annotation_list(&self, canvas_id: &str, annotation_count: u64) -> AnnotationListPayload {
        let annotations: Vec<AnnotationPayload> = (0..annotation_count)
            .map(|_| self.annotation(canvas_id))
            .collect();
        AnnotationListPayload {
            body: serde_json::json!({
                "on": canvas_id,
                "resources": annotations.iter().map(|a| a.body.clone()).collect::<Vec<_>>(),
            }),
            canvas_id: canvas_id.to_string(),
            annotations,
        }
    }

    fn revised_annotation(&self, annotation: &AnnotationPayload) -> AnnotationPayload {
        AnnotationPayload {
            annotation_id: annotation.annotation_id.clone(),
            canvas_id: annotation.canvas_id.clone(),
            body: serde_json::json!({
                "@id": annotation.annotation_id,
                "on": annotation.canvas_id,
                "revised": true,
            }),
        }
    }
}

/// A config suitable for in-process tests: small, quiet, logging to a
/// caller-provided directory.
pub fn test_config(out_dir: std::path::PathBuf) -> BenchmarkConfig {
    BenchmarkConfig {
        threads: 4,
        sample_ratio: 0.5,
        iterations: 5,
        annotations_per_canvas: 3,
        out_dir,
        write_log: true,
        show_progress: false,
    }
}
