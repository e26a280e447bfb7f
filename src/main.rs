use ineq_engine::{Dashboard, EngineConfig, Result};
use log::{info, warn};
use std::time::Instant;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::from_env()?;
    if !config.data_dir.exists() {
        warn!("Data directory not found: {}", config.data_dir.display());
        return Ok(());
    }

    info!("Loading inequality tables from: {}", config.data_dir.display());
    let start = Instant::now();
    let dashboard = Dashboard::load(&config).await?;
    info!("Dashboard ready in {:?}", start.elapsed());
    dashboard.log_summary();

    // Resolve the default view of every loaded domain
    for domain in dashboard.store().domains() {
        let session = match dashboard.session(domain) {
            Ok(session) => session,
            Err(e) => {
                warn!("Cannot start a {domain} session: {e}");
                continue;
            }
        };
        let selection = session.selection();
        match dashboard.map_view(domain, selection) {
            Ok(view) => info!(
                "{domain}: {} {} in {} maps {} municipalities, {} missing",
                selection.measure,
                selection.variable,
                view.year,
                view.mapped_count(),
                view.missing_count()
            ),
            Err(e) => warn!("Default {domain} view failed: {e}"),
        }
    }

    Ok(())
}
