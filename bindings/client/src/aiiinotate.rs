use crate::http::{normalise_endpoint, HttpClient};
use iiif_bench_runner::prelude::{
    AnnotationId, AnnotationListPayload, AnnotationPayload, AnnotationStore, Capabilities,
    CanvasId, ManifestId, ManifestPayload, StoreError,
};
use serde_json::Value;

/// Adapter for the aiiinotate annotation server.
///
/// aiiinotate reports insert/update/delete outcomes as counts
/// (`insertedCount` and friends) and serves IIIF Presentation 2 documents
/// under versioned routes (`/manifests/2/...`, `/annotations/2/...`).
pub struct AiiinotateStore {
    endpoint: String,
    http: HttpClient,
}

impl AiiinotateStore {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: normalise_endpoint(endpoint)?,
            http: HttpClient::new()?,
        })
    }

    fn count(response: &Value, field: &str) -> u64 {
        response.get(field).and_then(Value::as_u64).unwrap_or(0)
    }

    fn resource_ids(response: &Value) -> Vec<AnnotationId> {
        response
            .get("resources")
            .and_then(Value::as_array)
            .map(|resources| {
                resources
                    .iter()
                    .filter_map(|resource| resource.get("@id"))
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl AnnotationStore for AiiinotateStore {
    fn server_name(&self) -> &str {
        "aiiinotate"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            annotation_fetch: true,
            annotation_update: true,
            annotation_list_insert: true,
            manifest_delete: true,
        }
    }

    fn insert_manifest(&self, manifest: &ManifestPayload) -> Result<Vec<CanvasId>, StoreError> {
        let response = self
            .http
            .post_json(&format!("{}/manifests/2/create", self.endpoint), &manifest.body)?;
        if Self::count(&response, "insertedCount") > 0 {
            Ok(manifest.canvas_ids.clone())
        } else {
            Err(StoreError::UnexpectedResponse(response.to_string()))
        }
    }

    fn insert_annotation(&self, annotation: &AnnotationPayload) -> Result<(), StoreError> {
        let response = self.http.post_json(
            &format!("{}/annotations/2/create", self.endpoint),
            &annotation.body,
        )?;
        if Self::count(&response, "insertedCount") > 0 {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(response.to_string()))
        }
    }

    fn insert_annotation_list(&self, list: &AnnotationListPayload) -> Result<(), StoreError> {
        // The create route accepts a whole sc:AnnotationList in one request.
        let response = self
            .http
            .post_json(&format!("{}/annotations/2/create", self.endpoint), &list.body)?;
        if Self::count(&response, "insertedCount") as usize >= list.annotations.len() {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(response.to_string()))
        }
    }

    fn get_annotation_list(&self, canvas: &str) -> Result<Vec<AnnotationId>, StoreError> {
        let response = self.http.get_json(
            &format!("{}/annotations/2/search", self.endpoint),
            &[("canvas", canvas)],
        )?;
        Ok(Self::resource_ids(&response))
    }

    fn get_annotation(&self, annotation: &str) -> Result<Value, StoreError> {
        let response = self.http.get_json(
            &format!("{}/annotations/2", self.endpoint),
            &[("uri", annotation)],
        )?;
        if response.get("@id").is_some() {
            Ok(response)
        } else {
            Err(StoreError::UnexpectedResponse(response.to_string()))
        }
    }

    fn update_annotation(&self, annotation: &AnnotationPayload) -> Result<(), StoreError> {
        let response = self.http.post_json(
            &format!("{}/annotations/2/update", self.endpoint),
            &annotation.body,
        )?;
        if Self::count(&response, "updatedCount") > 0 {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(response.to_string()))
        }
    }

    fn delete_annotation(&self, annotation: &str) -> Result<(), StoreError> {
        let status = self.http.delete(
            &format!("{}/annotations/2", self.endpoint),
            &[("uri", annotation)],
        )?;
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(format!(
                "delete returned {}",
                status
            )))
        }
    }

    fn delete_manifest(&self, manifest: &str) -> Result<(), StoreError> {
        let status = self.http.delete(
            &format!("{}/manifests/2", self.endpoint),
            &[("uri", manifest)],
        )?;
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(format!(
                "delete returned {}",
                status
            )))
        }
    }

    fn list_manifest_ids(&self) -> Result<Vec<ManifestId>, StoreError> {
        let response = self
            .http
            .get_json(&format!("{}/manifests/2", self.endpoint), &[])?;
        let ids = response
            .get("manifests")
            .and_then(Value::as_array)
            .map(|manifests| {
                manifests
                    .iter()
                    .filter_map(|manifest| manifest.get("@id"))
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .ok_or_else(|| StoreError::UnexpectedResponse(response.to_string()))?;
        Ok(ids)
    }

    fn purge(&self) -> Result<(), StoreError> {
        // Deleting a manifest drops its annotations with it, so walking the
        // collection is a full wipe.
        let manifests = self.list_manifest_ids()?;
        log::debug!("purging {} manifests", manifests.len());
        for manifest in manifests {
            self.delete_manifest(&manifest)?;
        }
        Ok(())
    }
}
