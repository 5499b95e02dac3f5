use anyhow::Context;
use libris_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        data_path = %settings.storage.data_path.display(),
        "libris-app bootstrap starting"
    );

    libris_app::serve(settings).await?;

    tracing::info!("libris-app shut down");
    Ok(())
}
