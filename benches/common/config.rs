use std::env;

/// Configuration for benchmarks, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Redis URL (from REDIS_URL env var). Redis-backed benchmarks are skipped when unset.
    pub redis_url: Option<String>,

    /// Simulated upstream API latency in milliseconds (from UPSTREAM_LATENCY_MS env var, defaults to 50)
    pub upstream_latency_ms: u64,

    /// Number of records in the simulated catalogue (from CATALOGUE_SIZE env var, defaults to 500)
    pub catalogue_size: usize,

    /// Sample size for benchmarks (from BENCH_SAMPLE_SIZE env var, defaults to 100)
    pub sample_size: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            upstream_latency_ms: env::var("UPSTREAM_LATENCY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            catalogue_size: env::var("CATALOGUE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
            sample_size: env::var("BENCH_SAMPLE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        let config = Self::default();
        eprintln!("Benchmark Configuration:");
        eprintln!(
            "  Redis URL: {}",
            config.redis_url.as_deref().unwrap_or("(disabled)")
        );
        eprintln!("  Upstream Latency: {}ms", config.upstream_latency_ms);
        eprintln!("  Catalogue Size: {}", config.catalogue_size);
        eprintln!("  Sample Size: {}", config.sample_size);
        config
    }
}
