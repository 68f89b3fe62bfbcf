//! Batch matcher: reads `$BATCH_INPUT_PATH` (default `data/addresses.csv`), geocodes and
//! scores every address, writes `$BATCH_OUTPUT_PATH` (default `data/result.csv`).

use address_matcher::batch::{paths_from_env, run_batch};
use address_matcher::geocode::geocoder_from_env;
use address_matcher::{init_tracing, AddressMatcher, MatcherConfig, MatcherHandle, SimilarityEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = MatcherConfig::load_default()?;
    let engine = MatcherHandle::new(SimilarityEngine::default().with_config(config));
    let matcher = AddressMatcher::new(engine, geocoder_from_env()?);

    let (input, output) = paths_from_env();
    let summary = run_batch(&matcher, &input, &output).await?;
    println!(
        "processed {} rows ({} matched, {} blank, {} failed) -> {}",
        summary.rows,
        summary.matched,
        summary.blank,
        summary.failed,
        output.display()
    );
    Ok(())
}
