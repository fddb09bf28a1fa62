//! Generate static files

use anyhow::Result;
use std::time::Instant;
use tokio::sync::broadcast;

use crate::generator::{GenerateReport, Generator};
use crate::server;
use crate::Blog;

/// Generate the whole site
pub fn run(blog: &Blog) -> Result<GenerateReport> {
    let start = Instant::now();

    let generator = Generator::for_blog(blog)?;
    let report = generator.generate()?;

    if report.failed > 0 {
        tracing::warn!("{} paths failed to generate", report.failed);
    }
    tracing::info!(
        "Generated {} in {:.2}s",
        report,
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Watch for file changes and regenerate until interrupted
pub async fn watch(blog: &Blog) -> Result<()> {
    // Nobody listens for reloads without the server
    let (reload_tx, _) = broadcast::channel::<()>(1);
    let blog = blog.clone();

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");
    let handle = tokio::task::spawn_blocking(move || server::watch_and_reload(&blog, reload_tx, |_| {}));

    handle.await?
}
