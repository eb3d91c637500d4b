//! `vdm metadata <url>` – print media metadata as JSON without downloading.

use anyhow::Result;

use vdm_core::orchestrator::Orchestrator;

pub async fn run_metadata(orch: &Orchestrator, url: &str) -> Result<()> {
    let info = orch.extract_metadata(url).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
