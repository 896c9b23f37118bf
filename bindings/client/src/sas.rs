use crate::http::{normalise_endpoint, HttpClient};
use anyhow::anyhow;
use iiif_bench_runner::prelude::{
    AnnotationId, AnnotationListPayload, AnnotationPayload, AnnotationStore, Capabilities,
    CanvasId, ManifestId, ManifestPayload, StoreError,
};
use serde_json::Value;

/// Adapter for SimpleAnnotationServer.
///
/// SAS has no bulk annotation route and cannot delete manifests, so list
/// inserts fan out to per-annotation creates and purge only removes
/// annotations, manifest by manifest. Deleting an annotation answers 204.
pub struct SasStore {
    endpoint: String,
    http: HttpClient,
}

impl SasStore {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: normalise_endpoint(endpoint)?,
            http: HttpClient::new()?,
        })
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

impl AnnotationStore for SasStore {
    fn server_name(&self) -> &str {
        "sas"
    }

    fn capabilities(&self) -> Capabilities {
        // insert_annotation_list works, but only by fanning out, so the bulk
        // path is not flagged as worth timing on its own.
        Capabilities::default()
    }

    fn insert_manifest(&self, manifest: &ManifestPayload) -> Result<Vec<CanvasId>, StoreError> {
        let response = self
            .http
            .post_json(&format!("{}/manifests", self.endpoint), &manifest.body)?;
        // SAS answers { "loaded": "<manifest id>" } on success.
        match response.get("loaded").and_then(Value::as_str) {
            Some(loaded) if loaded.len() > 1 => Ok(manifest.canvas_ids.clone()),
            _ => Err(StoreError::UnexpectedResponse(response.to_string())),
        }
    }

    fn insert_annotation(&self, annotation: &AnnotationPayload) -> Result<(), StoreError> {
        let response = self.http.post_json(
            &format!("{}/annotation/create", self.endpoint),
            &annotation.body,
        )?;
        if response.get("@id").is_some() {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(response.to_string()))
        }
    }

    fn insert_annotation_list(&self, list: &AnnotationListPayload) -> Result<(), StoreError> {
        // Annotation lists can only be loaded through an HTML page in SAS,
        // so every annotation goes through the create route on its own.
        for annotation in &list.annotations {
            self.insert_annotation(annotation)?;
        }
        Ok(())
    }

    fn get_annotation_list(&self, canvas: &str) -> Result<Vec<AnnotationId>, StoreError> {
        let response = self.http.get_json(
            &format!("{}/annotation/search", self.endpoint),
            &[("uri", canvas)],
        )?;
        Ok(Self::resource_ids(&response))
    }

    fn delete_annotation(&self, annotation: &str) -> Result<(), StoreError> {
        let status = self.http.delete(
            &format!("{}/annotation/destroy", self.endpoint),
            &[("uri", annotation)],
        )?;
        if status == reqwest::StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(StoreError::UnexpectedResponse(format!(
                "destroy returned {}",
                status
            )))
        }
    }

    fn delete_annotations_for_canvas(&self, canvas: &str) -> Result<(), StoreError> {
        for annotation in self.get_annotation_list(canvas)? {
            self.delete_annotation(&annotation)?;
        }
        Ok(())
    }

    fn delete_annotations_for_manifest(&self, manifest: &str) -> Result<(), StoreError> {
        let short_id = manifest_short_id(manifest)?;
        let response = self.http.get_json(
            &format!("{}/search-api/{}/search", self.endpoint, short_id),
            &[],
        )?;
        for annotation in Self::resource_ids(&response) {
            self.delete_annotation(&annotation)?;
        }
        Ok(())
    }

    fn list_manifest_ids(&self) -> Result<Vec<ManifestId>, StoreError> {
        let response = self
            .http
            .get_json(&format!("{}/manifests", self.endpoint), &[])?;
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
        // SAS cannot delete manifests. Removing every annotation is the
        // closest thing to a wipe it offers; stale manifests stay behind.
        let manifests = self.list_manifest_ids()?;
        log::debug!("purging annotations of {} manifests", manifests.len());
        for manifest in manifests {
            self.delete_annotations_for_manifest(&manifest)?;
        }
        Ok(())
    }
}

/// Extract the `{identifier}` segment from a IIIF Presentation 2 URI.
///
/// IIIF 2.x URIs follow `{scheme}://{host}/{prefix}/{identifier}/{kind}/...`
/// where `{kind}` is one of a fixed set of keywords; the identifier is the
/// segment right before the first keyword that appears in the path.
fn manifest_short_id(uri: &str) -> Result<String, StoreError> {
    const KEYWORDS: [&str; 9] = [
        "manifest",
        "manifest.json",
        "sequence",
        "canvas",
        "annotation",
        "list",
        "range",
        "layer",
        "res",
    ];

    let segments: Vec<&str> = uri.split('/').collect();
    for keyword in KEYWORDS {
        if let Some(position) = segments.iter().position(|segment| *segment == keyword) {
            if position > 0 {
                return Ok(segments[position - 1].to_string());
            }
        }
    }
    Err(StoreError::Other(anyhow!(
        "could not extract a manifest short id from '{}'",
        uri
    )))
}
