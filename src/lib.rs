//! Libris application library
//!
//! The books catalog module and the bootstrap shared by the server binary
//! and the CLI.

pub mod modules;
pub mod utils;

use anyhow::Context;
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Build a registry holding every application module
pub fn registry(settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings);
    registry
}

/// Initialize modules, serve HTTP until shutdown, then stop modules
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let registry = registry(&settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .init_all(&ctx)
        .await
        .context("failed to initialize modules")?;
    registry
        .start_all(&ctx)
        .await
        .context("failed to start modules")?;

    let served = libris_http::start_server(&registry, &settings).await;

    registry
        .stop_all()
        .await
        .context("failed to stop modules")?;
    served
}
