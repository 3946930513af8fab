//! TTL LRU Cache - demo binary
//!
//! Loads configuration from the environment, stores every `key=value`
//! argument in a cache, reads the values back and prints cache statistics.
//!
//! ```text
//! CACHE_CAPACITY=2 RUST_LOG=ttl_lru_cache=debug ttl_lru_cache a=1 b=true c=hello
//! ```

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_lru_cache::{Cache, CacheError, CacheValue, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_lru_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, log_level={}, sweep_interval={}s, default_ttl={}s",
        config.capacity, config.log_level, config.sweep_interval, config.default_ttl
    );

    let pairs = std::env::args()
        .skip(1)
        .map(|arg| parse_pair(&arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let options = config.options().with_eviction_hook(|key, value| {
        info!("Evicted {} (value: {:?})", key, value);
    });
    let cache = Cache::new(config.capacity, options).context("failed to create cache")?;

    for (key, value) in &pairs {
        cache
            .set(key.as_str(), value.clone(), config.default_ttl())
            .with_context(|| format!("failed to store {}", key))?;
    }

    for (key, _) in &pairs {
        match cache.get(key) {
            Ok(value) => println!("{} = {}", key, render(&value)),
            Err(CacheError::NotFound(_)) => println!("{} was evicted", key),
            Err(err) => return Err(err).with_context(|| format!("failed to read {}", key)),
        }
    }

    println!("{}", serde_json::to_string_pretty(&cache.stats())?);

    cache.shutdown().await;
    info!("Demo complete");
    Ok(())
}

/// Splits `key=value`, inferring the value's type from its text.
fn parse_pair(arg: &str) -> anyhow::Result<(String, CacheValue)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("expected key=value, got {:?}", arg);
    };
    if key.is_empty() {
        bail!("empty key in {:?}", arg);
    }
    Ok((key.to_string(), CacheValue::infer(value.as_bytes())))
}

fn render(value: &CacheValue) -> String {
    match value {
        CacheValue::Text(s) => format!("{:?} (text)", s),
        CacheValue::Bytes(b) => format!("{} bytes", b.len()),
        CacheValue::Integer(i) => format!("{} (integer)", i),
        CacheValue::Unsigned(u) => format!("{} (unsigned)", u),
        CacheValue::Float(f) => format!("{} (float)", f),
        CacheValue::Bool(b) => format!("{} (bool)", b),
        CacheValue::Structured(v) => format!("{} (structured)", v),
    }
}
