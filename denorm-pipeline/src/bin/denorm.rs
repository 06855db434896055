//! Reads JSON events from stdin and writes routed envelopes to stdout.
//! Log records go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use denorm_pipeline::{
    init_logging, run_lines, EnrichmentTask, JsonLinesSink, PipelineResult, PipelineSettings,
    PipelineStore,
};
use denorm_search::HttpSearchClient;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("denorm: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PipelineResult<()> {
    let settings = PipelineSettings::load()?;
    init_logging(&settings.logging)?;

    let store = Arc::new(PipelineStore::open(&settings.store)?);
    let search = Arc::new(HttpSearchClient::new(&settings.search)?);
    let task = EnrichmentTask::new(settings.denorm, store, search)?;

    let sink = JsonLinesSink::new(std::io::stdout());
    run_lines(&task, BufReader::new(tokio::io::stdin()), &sink).await?;
    Ok(())
}
