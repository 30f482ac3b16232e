//! CLI command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use kiln_core::{DocumentFormat, render_document};
use kiln_reconciler::{
    ComponentKey, ComponentReconciler, LoopConfig, ReconcilerConfig, ReconciliationLoop,
};
use kiln_store::{
    ClusterStore, Component, InMemoryClusterStore, Object, ResourceKind, StoreExt,
    TracingClusterStore, apply_objects, load_manifest,
};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};

use crate::cli::{Commands, OutputFormat};

type Store = TracingClusterStore<InMemoryClusterStore>;

/// Objects printed by `apply`, readable back as a manifest.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList<'a> {
    api_version: &'static str,
    kind: &'static str,
    items: &'a [Object],
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Apply {
            file,
            config,
            passes,
            output,
        } => cmd_apply(file, config, passes, output).await,
        Commands::Serve { file, config } => cmd_serve(file, config).await,
        Commands::Config { config } => cmd_config(config),
    }
}

/// Load configuration from an optional file, then apply environment overrides.
fn load_config(path: Option<&Path>) -> Result<ReconcilerConfig> {
    let config = match path {
        Some(path) => ReconcilerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
            .with_env_overrides(),
        None => ReconcilerConfig::from_env(),
    };

    config.validate().context("Invalid reconciler configuration")?;
    Ok(config)
}

/// Create a store holding the objects of `manifest`.
async fn seed_store(manifest: &Path) -> Result<Arc<Store>> {
    let objects = load_manifest(manifest)
        .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;
    let store = Arc::new(TracingClusterStore::new(InMemoryClusterStore::new()));
    let seeded = apply_objects(store.as_ref(), objects)
        .await
        .context("Failed to seed store from manifest")?;
    info!(manifest = %manifest.display(), objects = seeded.len(), "Store seeded");
    Ok(store)
}

async fn component_keys(store: &dyn ClusterStore) -> Result<Vec<ComponentKey>> {
    let components = store.list_as::<Component>(None).await?;
    Ok(components.iter().map(ComponentKey::from).sorted().collect())
}

async fn cmd_apply(
    file: PathBuf,
    config: Option<PathBuf>,
    passes: u32,
    output: OutputFormat,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let store = seed_store(&file).await?;
    let reconciler = ComponentReconciler::new(store.clone(), config)?;
    let keys = component_keys(store.as_ref()).await?;

    let mut failed = Vec::new();
    for pass in 1..=passes.max(1) {
        failed.clear();
        for key in &keys {
            match reconciler.reconcile(key).await {
                Ok(outcome) => info!(pass, component = %key, outcome = %outcome, "Reconciled"),
                Err(e) => {
                    warn!(pass, component = %key, class = %e.class(), error = %e, "Reconcile failed");
                    failed.push(key.to_string());
                }
            }
        }
    }

    let mut objects = Vec::new();
    for kind in ResourceKind::ALL {
        objects.extend(store.list(kind, None).await?);
    }
    let list = ObjectList {
        api_version: "v1",
        kind: "List",
        items: &objects,
    };
    println!("{}", render_document(&list, DocumentFormat::from(output))?);

    if !failed.is_empty() {
        bail!("Components failed to converge: {}", failed.join(", "));
    }
    Ok(())
}

async fn cmd_serve(file: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let store = seed_store(&file).await?;
    let reconciler = Arc::new(ComponentReconciler::new(store.clone(), config)?);

    let loop_runner =
        ReconciliationLoop::new(reconciler, LoopConfig::default()).watch(store.subscribe());
    let stopper = loop_runner.stopper();
    let handle = tokio::spawn(loop_runner.run());

    info!("Kiln is running. Press Ctrl+C to stop.");
    wait_for_shutdown().await;
    stopper.stop();

    let stats = handle.await.context("Reconciliation loop task failed")?;
    info!(
        reconciled = stats.reconciled,
        failed = stats.failed,
        requeued = stats.requeued,
        dropped = stats.dropped,
        "Kiln stopped"
    );
    Ok(())
}

fn cmd_config(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    print!("{}", render_document(&config, DocumentFormat::Toml)?);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
