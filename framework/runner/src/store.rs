/// Opaque identifiers handed out by the backend (or minted client-side where
/// a backend echoes the payload's own identifiers back).
pub type ManifestId = String;
pub type CanvasId = String;
pub type AnnotationId = String;

use crate::payload::{AnnotationListPayload, AnnotationPayload, ManifestPayload};

/// What a backend adapter can do beyond the mandatory operations.
///
/// The step runner consults these flags up front instead of probing for
/// "not implemented" failures at call time. Operations whose flag is off are
/// simply not benchmarked for that backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// The backend can fetch a single annotation by identifier.
    pub annotation_fetch: bool,
    /// The backend can update an existing annotation.
    pub annotation_update: bool,
    /// The backend accepts a whole annotation list in one call. Adapters may
    /// still implement `insert_annotation_list` by fanning out to per-item
    /// inserts; this flag only states that the bulk path is worth timing.
    pub annotation_list_insert: bool,
    /// The backend can delete manifests, not just annotations.
    pub manifest_delete: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The contract every annotation-store adapter must satisfy.
///
/// Network timeouts and retries are the adapter's business; the runner only
/// sees success or failure per call. Implementations must be callable from
/// multiple worker threads at once.
pub trait AnnotationStore: Send + Sync {
    fn server_name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Insert one manifest. Returns the identifiers of the canvases it
    /// carries; an empty list means the insert did not take effect.
    fn insert_manifest(&self, manifest: &ManifestPayload) -> Result<Vec<CanvasId>, StoreError>;

    fn insert_annotation(&self, annotation: &AnnotationPayload) -> Result<(), StoreError>;

    fn insert_annotation_list(&self, list: &AnnotationListPayload) -> Result<(), StoreError>;

    /// Fetch the annotations attached to a canvas. A canvas that was never
    /// annotated yields an empty list, not an error.
    fn get_annotation_list(&self, canvas: &str) -> Result<Vec<AnnotationId>, StoreError>;

    /// Only required when [Capabilities::annotation_fetch] is set.
    fn get_annotation(&self, _annotation: &str) -> Result<serde_json::Value, StoreError> {
        Err(StoreError::Unsupported("get_annotation"))
    }

    /// Only required when [Capabilities::annotation_update] is set.
    fn update_annotation(&self, _annotation: &AnnotationPayload) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("update_annotation"))
    }

    fn delete_annotation(&self, annotation: &str) -> Result<(), StoreError>;

    fn delete_annotations_for_canvas(&self, _canvas: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("delete_annotations_for_canvas"))
    }

    fn delete_annotations_for_manifest(&self, _manifest: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("delete_annotations_for_manifest"))
    }

    /// Only required when [Capabilities::manifest_delete] is set.
    fn delete_manifest(&self, _manifest: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("delete_manifest"))
    }

    /// List every manifest currently held by the backend. Adapters without a
    /// native purge use this to walk the data they have to delete.
    fn list_manifest_ids(&self) -> Result<Vec<ManifestId>, StoreError>;

    /// Remove everything this benchmark created. Called between steps; the
    /// next step does not start until this returns. Best effort: adapters
    /// that cannot delete manifests delete what they can.
    fn purge(&self) -> Result<(), StoreError>;
}
