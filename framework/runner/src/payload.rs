use crate::store::{AnnotationId, CanvasId, ManifestId};

/// A generated manifest, ready to send.
///
/// The identifiers are carried alongside the JSON body so that neither the
/// runner nor the adapters have to parse the payload to find out what it
/// contains.
#[derive(Debug, Clone)]
pub struct ManifestPayload {
    pub manifest_id: ManifestId,
    pub canvas_ids: Vec<CanvasId>,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AnnotationPayload {
    pub annotation_id: AnnotationId,
    pub canvas_id: CanvasId,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AnnotationListPayload {
    pub canvas_id: CanvasId,
    pub annotations: Vec<AnnotationPayload>,
    pub body: serde_json::Value,
}

/// Synthetic-data generator the runner draws payloads from.
///
/// Implementations own their configuration explicitly; there is no shared
/// template state between calls, so a source can be used from any thread.
pub trait PayloadSource: Send + Sync {
    /// A fresh manifest carrying `canvas_count` canvases.
    fn manifest(&self, canvas_count: u64) -> ManifestPayload;

    /// A fresh annotation targeting `canvas_id`.
    fn annotation(&self, canvas_id: &str) -> AnnotationPayload;

    /// A fresh annotation list of `annotation_count` annotations, all
    /// targeting `canvas_id`.
    fn annotation_list(&self, canvas_id: &str, annotation_count: u64) -> AnnotationListPayload;

    /// A new body for an existing annotation, keeping its identifier and
    /// target canvas. Used to drive update benchmarks.
    fn revised_annotation(&self, annotation: &AnnotationPayload) -> AnnotationPayload;
}
