use anyhow::bail;
use iiif_bench_runner::prelude::*;
use iiif_payloads::IiifPayloads;
use iiif_store_client::{AiiinotateStore, SasStore};

mod steps;

fn main() -> anyhow::Result<()> {
    let cli = init();

    let store: Box<dyn AnnotationStore> = match cli.server.as_str() {
        "aiiinotate" => Box::new(AiiinotateStore::new(&cli.endpoint)?),
        "sas" => Box::new(SasStore::new(&cli.endpoint)?),
        other => bail!(
            "unknown annotation server '{}', expected 'aiiinotate' or 'sas'",
            other
        ),
    };

    let steps = steps::flattened(cli.steps)?;
    let payloads = IiifPayloads::default();

    run(store.as_ref(), &payloads, &steps, &cli.to_config())?;

    Ok(())
}
