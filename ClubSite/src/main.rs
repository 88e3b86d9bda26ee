use anyhow::{Result, anyhow};
use clubanim::{Marquee, MarqueeConfigExt, Typewriter};
use clubconfig::get_config;
use clubmedia::MediaCacheConfigExt;
use clubstorage::StorageConfigExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Intervalle entre deux affichages de l'état des animations
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = get_config();
    init_tracing(&config.get_log_level()?);
    info!("Configuration loaded from {}", config.directory().display());

    // ========== PHASE 1 : Résolution des médias ==========

    let resolver = Arc::new(config.create_storage_resolver()?);
    let cache = config.create_media_cache(resolver)?;
    let lanes = config.get_marquee_lanes()?;

    for (index, lane) in lanes.iter().enumerate() {
        let resolved = cache.resolve_media(lane.items()).await;
        let placeholders = resolved.iter().filter(|m| m.is_placeholder()).count();
        info!(
            "Lane {} ({:?}): {} media resolved, {} placeholder(s)",
            index,
            lane.direction(),
            resolved.len() - placeholders,
            placeholders
        );
        for media in &resolved {
            tracing::debug!("  {} [{}] -> {}", media.media.key(), media.media.kind(), media.url);
        }
    }

    // ========== PHASE 2 : Animations ==========

    let clock = Arc::new(config.create_frame_clock()?);
    let marquee = Marquee::new(clock);
    let handle = marquee.start(lanes);
    let offsets = marquee
        .subscribe(handle)
        .ok_or_else(|| anyhow!("Marquee stopped before its first frame"))?;

    let mut typewriter = Typewriter::new(config.get_typewriter_config()?)?;
    let started = tokio::time::Instant::now();

    info!("ClubSite animations running, press Ctrl+C to stop...");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut report = tokio::time::interval(REPORT_INTERVAL);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!("Cannot listen for Ctrl+C: {}", e);
                }
                break;
            }
            _ = report.tick() => {
                let banner = typewriter.tick(started.elapsed().as_secs_f64() * 1000.0);
                let current = offsets.borrow().clone();
                info!(offsets = ?current, banner, "Animation state");
            }
        }
    }

    // ========== PHASE 3 : Arrêt ==========

    marquee.stop(handle);
    info!(stats = ?cache.stats(), "ClubSite stopped");

    Ok(())
}
