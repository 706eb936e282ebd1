//! # List Cache Snapshot Inspector
//!
//! Reports what the persisted list caches hold, and optionally prunes
//! expired pages from the snapshots.
//!
//! ```text
//! list-cache [CONFIG] [--prune]
//! ```
//!
//! Without a config file the defaults apply (plus `LIST_CACHE_*`
//! environment overrides); the snapshot directory is
//! `persistence.directory` either way.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use list_cache::caching::{Entity, FileSnapshotBackend, PersistentCache, SnapshotBackend};
use list_cache::observability::init_logging;
use list_cache::{CacheConfig, ListCaches};

struct Args {
    config: Option<PathBuf>,
    prune: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        prune: false,
    };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--prune" => args.prune = true,
            "-h" | "--help" => {
                println!("usage: list-cache [CONFIG] [--prune]");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown flag {}", flag),
            path => {
                if args.config.is_some() {
                    bail!("only one config file may be given");
                }
                args.config = Some(PathBuf::from(path));
            }
        }
    }

    Ok(args)
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CacheConfig> {
    match path {
        Some(path) => CacheConfig::load_from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display())),
        None => {
            let mut config = CacheConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }
}

async fn report<T>(cache: &PersistentCache<T>, prune: bool) -> anyhow::Result<()>
where
    T: Entity + serde::Serialize + serde::de::DeserializeOwned,
{
    let store = cache.store();
    let keys = store.keys();
    let fresh = keys.iter().filter(|key| store.contains_fresh(key)).count();
    let records: usize = store.snapshot().values().map(|entry| entry.items.len()).sum();

    info!(
        cache = cache.namespace(),
        entries = keys.len(),
        fresh,
        expired = keys.len() - fresh,
        records,
        "snapshot contents"
    );

    if prune {
        let purged = cache
            .prune()
            .await
            .with_context(|| format!("rewriting {} snapshot", cache.namespace()))?;
        info!(cache = cache.namespace(), purged, "pruned expired entries");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = load_config(args.config.as_ref()).await?;

    init_logging(&config.logging);
    info!("list-cache {}", env!("CARGO_PKG_VERSION"));

    let directory = config.persistence.directory.clone();
    if !config.persistence.enabled {
        info!(directory = %directory.display(), "persistence disabled in config, inspecting directory anyway");
    }

    let backend: Arc<dyn SnapshotBackend> = Arc::new(FileSnapshotBackend::new(directory));
    let caches = ListCaches::from_config(&config).open_persistent(backend).await;

    report(&caches.orders, args.prune).await?;
    report(&caches.leads, args.prune).await?;
    report(&caches.customers, args.prune).await?;

    Ok(())
}
