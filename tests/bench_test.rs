//! Benchmark tests for the request hot path
//!
//! Run with: cargo test --release -- --nocapture bench

use std::time::Instant;

use serde_json::{json, Value};

use public_feed::mapper::{map_result, LinkConfig};
use public_feed::model::SearchResponse;
use public_feed::query::build;

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(),
{
    let start = Instant::now();

    for _ in 0..iterations {
        f();
    }

    let duration = start.elapsed();
    let avg_us = duration.as_micros() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.2}µs", avg_us);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

fn backend_page(hits: usize) -> Value {
    let hits: Vec<Value> = (0..hits)
        .map(|i| {
            json!({ "_source": {
                "uuid": format!("ad-{i}"),
                "created": "2018-01-01T10:00:00+01:00",
                "updated": "2018-01-02T10:00:00+01:00",
                "published": "2018-01-03T10:00:00+01:00",
                "expires": "2018-02-01T00:00:00+01:00",
                "title": "Systemutvikler",
                "source": "AMEDIA",
                "medium": "web",
                "reference": format!("REF-{i}"),
                "businessName": "Acme AS",
                "locationList": [{ "country": "NORGE", "city": "OSLO" }],
                "properties": { "adtext": "<p>".repeat(200), "sourceurl": "https://example.org" }
            }})
        })
        .collect();
    json!({ "hits": { "total": 4711, "hits": hits } })
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_build_query() {
    println!("\n=== Benchmark: Build query ===\n");

    let params: Vec<(String, String)> = [
        ("size", "50"),
        ("page", "3"),
        ("uuid", "a"),
        ("uuid", "b"),
        ("county", "OSLO"),
        ("published", "[2018-01-01,2018-12-31T23:59:59+01:00]"),
        ("unknown", "ignored"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    benchmark("Build and render query", 100_000, || {
        let query = build(&params).unwrap();
        std::hint::black_box(query.to_document());
    });
}

#[test]
#[ignore]
fn bench_map_result() {
    println!("\n=== Benchmark: Decode and map result ===\n");

    let links = LinkConfig {
        permalink_base: "https://ads.example.org/ad".to_string(),
        public_host: Some("feed.example.org".to_string()),
        public_scheme: "https".to_string(),
        context_path: String::new(),
    };

    for size in [20usize, 100] {
        let raw = serde_json::to_vec(&backend_page(size)).unwrap();
        benchmark(&format!("Decode + map page of {size}"), 2_000, || {
            let response: SearchResponse = serde_json::from_slice(&raw).unwrap();
            let page = map_result(response, 0, size as u32, "localhost", &links);
            std::hint::black_box(serde_json::to_vec(&page).unwrap());
        });
    }
}

#[test]
fn bench_summary() {
    println!("\n{}", "=".repeat(60));
    println!("Benchmark Test Suite");
    println!("{}", "=".repeat(60));
    println!("\nTo run benchmarks, use:");
    println!("  cargo test --release bench -- --ignored --nocapture");
    println!("\nAvailable benchmarks:");
    println!("  • bench_build_query  - Parameter validation and query rendering");
    println!("  • bench_map_result   - Backend decode, mapping and serialization");
    println!("\n{}\n", "=".repeat(60));
}
