use std::time::Instant;

use clap::Parser;
use hdrhistogram::Histogram;
use rand::Rng;
use tracing::info;
use ziplist_rs::{Result, ZipList, ZipListConfig};

#[derive(Parser, Clone)]
struct BenchmarkConfig {
    /// config file, falls back to ./ziplist.json and ./ziplist.toml
    #[arg(short, long)]
    pub config: Option<String>,
    /// entries in each list
    #[arg(short, long, default_value_t = 512)]
    pub entries: u32,
    /// operations per test
    #[arg(short, long, default_value_t = 100000)]
    pub requests: u32,
    #[arg(short, long, default_value_t = 3)]
    pub data_size: u32,
    #[arg(short, long, num_args = 1..)]
    pub tests: Vec<String>,
}

fn gen_benchmark_data(count: u32) -> String {
    let mut state: u32 = 1234;
    let mut data = String::with_capacity(count as usize);

    for _ in 0..count {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        let ch = b'0' + ((state >> 16) & 63) as u8;
        data.push(ch as char);
    }
    data
}

fn test_is_selected(tests: &[String], name: &str) -> bool {
    tests.is_empty() || tests.iter().any(|t| t == name)
}

fn build_list(config: &BenchmarkConfig, safety_limit: usize, data: &str) -> Result<ZipList> {
    let mut zl = ZipList::with_safety_limit(safety_limit);
    for i in 0..config.entries {
        if i % 2 == 0 {
            zl.append(data)?;
        } else {
            zl.append(i.to_string())?;
        }
    }
    Ok(zl)
}

/// Runs `op` `requests` times against a fresh list and prints the latency
/// distribution in nanoseconds.
fn benchmark<F>(name: &str, config: &BenchmarkConfig, safety_limit: usize, mut op: F) -> Result<()>
where
    F: FnMut(&mut ZipList, &str) -> Result<()>,
{
    println!("======{}======", name.to_uppercase());
    let mut hist = Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3)?;
    let data = gen_benchmark_data(config.data_size);
    let mut zl = build_list(config, safety_limit, &data)?;

    let st = Instant::now();
    for _ in 0..config.requests {
        let op_start = Instant::now();
        op(&mut zl, &data)?;
        hist.record((op_start.elapsed().as_nanos() as u64).max(1))?;
    }
    let elapsed = st.elapsed().as_secs_f64();

    info!(test = name, bytes = zl.blob_len(), "benchmark finished");
    println!(" {} requests completed in {:.3} seconds", config.requests, elapsed);
    println!(" {} entries, {} bytes per entry", config.entries, config.data_size);
    println!(" Summary:");
    println!(
        "     Throughput summary: {:.2} requests per second",
        config.requests as f64 / elapsed
    );
    println!("     Latency summary (nsec): ");
    println!("               avg  min   p50   p95  p99  max");
    println!(
        "               {:.0}  {}   {} {} {} {}",
        hist.mean(),
        hist.min(),
        hist.value_at_quantile(0.5),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.max()
    );
    Ok(())
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let config = BenchmarkConfig::parse();
    let zl_config = ZipListConfig::new(config.config.as_deref());
    let limit = zl_config.safety_limit;
    let tests = &config.tests;
    let entries = config.entries.max(1) as i64;

    if test_is_selected(tests, "push") {
        benchmark("push", &config, limit, |zl, data| {
            zl.push(data, true)?;
            zl.delete_range(-1, 1)?;
            Ok(())
        })?;
    }
    if test_is_selected(tests, "index") {
        benchmark("index", &config, limit, |zl, _| {
            let i = rand::rng().random_range(-entries..entries);
            zl.index(i)?;
            Ok(())
        })?;
    }
    if test_is_selected(tests, "find") {
        benchmark("find", &config, limit, |zl, _| {
            let target = rand::rng().random_range(0..entries * 2).to_string();
            zl.find(target, 1)?;
            Ok(())
        })?;
    }
    if test_is_selected(tests, "compare") {
        benchmark("compare", &config, limit, |zl, data| {
            let i = rand::rng().random_range(0..entries);
            if let Some(pos) = zl.index(i)? {
                zl.compare(pos, data)?;
            }
            Ok(())
        })?;
    }
    if test_is_selected(tests, "cascade") {
        // 250 byte entries sit just under the wide prev-length threshold, so a
        // 251 byte head insert widens every one of them. Timings include the copy.
        let mut base = ZipList::with_safety_limit(limit);
        for _ in 0..entries {
            base.append("c".repeat(250))?;
        }
        let wide = "c".repeat(251);
        benchmark("cascade", &config, limit, |zl, _| {
            *zl = base.clone();
            zl.push(&wide, true)?;
            Ok(())
        })?;
    }

    Ok(())
}
