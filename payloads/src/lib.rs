use iiif_bench_runner::prelude::{
    AnnotationListPayload, AnnotationPayload, ManifestPayload, PayloadSource,
};
use nanoid::nanoid;
use serde_json::json;

/// Where generated identifiers and image URIs point.
///
/// Owned by whoever constructs the source and passed in explicitly; nothing
/// here is loaded from disk or shared process-wide.
#[derive(Debug, Clone)]
pub struct PayloadConfig {
    /// Base URI under which manifest, canvas and annotation ids are minted.
    pub presentation_base: String,
    /// Base URI for the fake image resources canvases point at.
    pub image_base: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            presentation_base: "https://iiif.example.org/iiif/v2".to_string(),
            image_base: "https://iiif.example.org/images".to_string(),
            canvas_width: 1824,
            canvas_height: 2161,
        }
    }
}

/// Generates IIIF Presentation 2 payloads with fresh identifiers on every
/// call.
///
/// The generated `@id`s are fake in the sense that nothing serves them; the
/// benchmark only needs them to be unique and well-formed.
pub struct IiifPayloads {
    config: PayloadConfig,
}

impl IiifPayloads {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    fn canvas(&self, manifest_short_id: &str, index: u64) -> (String, serde_json::Value) {
        let folio = format!("f_{}", nanoid!());
        let canvas_id = format!(
            "{}/{}/canvas/{}",
            self.config.presentation_base, manifest_short_id, folio
        );
        let image_id = format!(
            "{}/{}/{}/full/full/0/native.jpg",
            self.config.image_base,
            nanoid!(),
            folio
        );
        let body = json!({
            "@id": canvas_id,
            "@type": "sc:Canvas",
            "label": format!("f. {}", index + 1),
            "width": self.config.canvas_width,
            "height": self.config.canvas_height,
            "images": [{
                "@id": format!("{}/image", canvas_id),
                "@type": "oa:Annotation",
                "motivation": "sc:painting",
                "resource": {
                    "@id": image_id,
                    "@type": "dctypes:Image",
                    "format": "image/jpeg",
                    "width": self.config.canvas_width,
                    "height": self.config.canvas_height,
                    "service": {
                        "@context": "http://iiif.io/api/image/2/context.json",
                        "@id": canvas_id,
                        "profile": "http://iiif.io/api/image/2/level2.json",
                    },
                },
                "on": canvas_id,
            }],
        });
        (canvas_id, body)
    }
}

impl Default for IiifPayloads {
    fn default() -> Self {
        Self::new(PayloadConfig::default())
    }
}

impl PayloadSource for IiifPayloads {
    fn manifest(&self, canvas_count: u64) -> ManifestPayload {
        let short_id = nanoid!();
        let manifest_id = format!("{}/{}/manifest", self.config.presentation_base, short_id);

        let mut canvas_ids = Vec::with_capacity(canvas_count as usize);
        let mut canvases = Vec::with_capacity(canvas_count as usize);
        for index in 0..canvas_count {
            let (canvas_id, body) = self.canvas(&short_id, index);
            canvas_ids.push(canvas_id);
            canvases.push(body);
        }

        let body = json!({
            "@context": "http://iiif.io/api/presentation/2/context.json",
            "@id": manifest_id,
            "@type": "sc:Manifest",
            "label": format!("Benchmark manifest {}", short_id),
            "sequences": [{
                "@id": format!("{}/{}/sequence/normal", self.config.presentation_base, short_id),
                "@type": "sc:Sequence",
                "canvases": canvases,
            }],
        });

        ManifestPayload {
            manifest_id,
            canvas_ids,
            body,
        }
    }

    fn annotation(&self, canvas_id: &str) -> AnnotationPayload {
        let annotation_id = format!(
            "{}/annotation/id_{}",
            self.config.presentation_base,
            nanoid!()
        );
        let body = json!({
            "@context": "http://iiif.io/api/presentation/2/context.json",
            "@id": annotation_id,
            "@type": "oa:Annotation",
            "motivation": ["oa:commenting"],
            "resource": {
                "@type": "dctypes:Text",
                "format": "text/html",
                "chars": "<p>benchmark annotation</p>",
            },
            "on": format!(
                "{}#xywh=5,0,{},{}",
                canvas_id, self.config.canvas_width, self.config.canvas_height
            ),
        });
        AnnotationPayload {
            annotation_id,
            canvas_id: canvas_id.to_string(),
            body,
        }
    }

    fn annotation_list(&self, canvas_id: &str, annotation_count: u64) -> AnnotationListPayload {
        let annotations: Vec<AnnotationPayload> = (0..annotation_count)
            .map(|_| self.annotation(canvas_id))
            .collect();
        let body = json!({
            "@context": "http://iiif.io/api/presentation/2/context.json",
            "@id": format!(
                "{}/list/l_{}",
                self.config.presentation_base,
                nanoid!()
            ),
            "@type": "sc:AnnotationList",
            "resources": annotations
                .iter()
                .map(|annotation| annotation.body.clone())
                .collect::<Vec<_>>(),
        });
        AnnotationListPayload {
            canvas_id: canvas_id.to_string(),
            annotations,
            body,
        }
    }

    fn revised_annotation(&self, annotation: &AnnotationPayload) -> AnnotationPayload {
        let mut body = annotation.body.clone();
        body["resource"]["chars"] = json!("<p>benchmark annotation (revised)</p>");
        AnnotationPayload {
            annotation_id: annotation.annotation_id.clone(),
            canvas_id: annotation.canvas_id.clone(),
            body,
        }
    }
}
