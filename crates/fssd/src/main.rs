//! fssd — FSS responder daemon.
//!
//! Binds a raw packet socket on one interface and answers every FSS
//! request with occurrence counts for the configured phrase. The protocol
//! serves one request at a time, so the whole daemon is a single blocking
//! loop on the main thread.

use anyhow::{bail, Context, Result};

use fss_core::config::FssConfig;
use fss_link::Responder;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = FssConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = FssConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FssConfig::default()
    });

    let interface = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.link.interface.clone());
    if interface.is_empty() {
        bail!("no interface: pass one as the first argument or set [link] interface in the config");
    }
    if config.search.phrase.is_empty() {
        bail!("[search] phrase is empty; the responder would never match anything");
    }

    tracing::info!(interface, phrase = %config.search.phrase, "fssd starting");

    let responder = Responder::open(&interface, config.search.phrase.as_bytes())
        .with_context(|| format!("failed to bring up responder on '{interface}'"))?;
    tracing::info!(mac = %responder.mac(), "listening; point clients at this address");

    responder.run()
}
