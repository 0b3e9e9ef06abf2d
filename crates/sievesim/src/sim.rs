//! Read-through workload runner

use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Result};
use serde::Serialize;
use sievecache::{Cache, CacheConfig, EvictionPolicy, StatsSnapshot};
use tracing::{debug, info};

use crate::config::WorkloadConfig;
use crate::workload::KeyStream;

/// Outcome of one policy run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub policy: EvictionPolicy,
    pub capacity: usize,
    pub keys: u64,
    pub ops: usize,
    pub threads: usize,
    pub elapsed_ms: f64,
    pub ops_per_sec: f64,
    pub final_len: usize,
    pub stats: StatsSnapshot,
}

/// Drive `workload.ops` requests through a fresh cache built from `cache`.
///
/// Each request is a `get`; on a miss the key is inserted.
pub fn run(cache: &CacheConfig, workload: &WorkloadConfig) -> Result<RunReport> {
    info!(
        policy = %cache.policy,
        capacity = cache.capacity,
        keys = workload.keys,
        ops = workload.ops,
        threads = workload.threads,
        "Starting run"
    );

    let start = Instant::now();
    let (stats, final_len) = if workload.threads <= 1 {
        run_single(cache, workload)?
    } else {
        run_threaded(cache, workload)?
    };
    let elapsed = start.elapsed();

    let elapsed_secs = elapsed.as_secs_f64();
    let report = RunReport {
        policy: cache.policy,
        capacity: cache.capacity,
        keys: workload.keys,
        ops: workload.ops,
        threads: workload.threads.max(1),
        elapsed_ms: elapsed_secs * 1_000.0,
        ops_per_sec: if elapsed_secs > 0.0 {
            workload.ops as f64 / elapsed_secs
        } else {
            0.0
        },
        final_len,
        stats,
    };

    info!(
        policy = %report.policy,
        hit_ratio = report.stats.hit_ratio,
        evictions = report.stats.evictions,
        "Run finished in {:.1} ms",
        report.elapsed_ms
    );
    Ok(report)
}

fn run_single(config: &CacheConfig, workload: &WorkloadConfig) -> Result<(StatsSnapshot, usize)> {
    let mut cache: Cache<u64, u64> = config.build()?;
    let mut keys = KeyStream::new(workload.keys, workload.skew, workload.seed);

    for _ in 0..workload.ops {
        let key = keys.next_key();
        if cache.get(&key).is_none() {
            cache.insert(key, key)?;
        }
    }

    cache.check_invariants()?;
    Ok((cache.stats().snapshot(), cache.len()))
}

fn run_threaded(config: &CacheConfig, workload: &WorkloadConfig) -> Result<(StatsSnapshot, usize)> {
    let cache = config.build_shared::<u64, u64>()?;
    let threads = workload.threads;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let cache = cache.clone();
            // Spread the remainder over the first threads
            let ops = workload.ops / threads + usize::from(t < workload.ops % threads);
            let mut keys =
                KeyStream::new(workload.keys, workload.skew, workload.seed.wrapping_add(t as u64));

            thread::spawn(move || -> sievecache::Result<()> {
                for _ in 0..ops {
                    let key = keys.next_key();
                    if cache.get(&key).is_none() {
                        cache.insert(key, key)?;
                    }
                }
                debug!(thread = t, ops, "worker done");
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))??;
    }

    cache.check_invariants()?;
    Ok((cache.stats(), cache.len()))
}

/// Human-readable table of reports
pub fn render_table(reports: &[RunReport]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:>10} {:>10} {:>12} {:>12} {:>12} {:>10} {:>14}\n",
        "policy", "capacity", "hit_ratio", "hits", "misses", "evictions", "expired", "ops/sec"
    ));
    for r in reports {
        out.push_str(&format!(
            "{:<8} {:>10} {:>10.4} {:>12} {:>12} {:>12} {:>10} {:>14.0}\n",
            r.policy.to_string(),
            r.capacity,
            r.stats.hit_ratio,
            r.stats.hits,
            r.stats.misses,
            r.stats.evictions,
            r.stats.expirations,
            r.ops_per_sec
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(threads: usize) -> WorkloadConfig {
        WorkloadConfig {
            keys: 200,
            ops: 5_000,
            skew: 0.9,
            seed: 11,
            threads,
        }
    }

    #[test]
    fn test_single_thread_accounting() {
        for policy in [EvictionPolicy::LeastRecentlyUsed, EvictionPolicy::Sieve] {
            let report = run(&CacheConfig::new(20, policy), &workload(1)).unwrap();

            assert_eq!(report.stats.hits + report.stats.misses, 5_000);
            // Read-through: every miss inserts a fresh key
            assert_eq!(report.stats.inserts, report.stats.misses);
            assert_eq!(report.final_len, 20);
            assert!(report.stats.hit_ratio > 0.0);
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        let config = CacheConfig::new(20, EvictionPolicy::Sieve);

        let a = run(&config, &workload(1)).unwrap();
        let b = run(&config, &workload(1)).unwrap();

        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_threaded_accounting() {
        let report = run(&CacheConfig::new(20, EvictionPolicy::Sieve), &workload(3)).unwrap();

        assert_eq!(report.threads, 3);
        assert_eq!(report.stats.hits + report.stats.misses, 5_000);
        assert!(report.final_len <= 20);
    }

    #[test]
    fn test_render_table() {
        let report = run(&CacheConfig::new(5, EvictionPolicy::LeastRecentlyUsed), &workload(1))
            .unwrap();
        let table = render_table(&[report]);

        assert!(table.starts_with("policy"));
        assert!(table.contains("lru"));
        assert_eq!(table.lines().count(), 2);
    }
}
