//! Sends a small trace with one generation to a real collector.
//!
//! Expects `TRACEPOST_HOST`, `TRACEPOST_PUBLIC_KEY` and
//! `TRACEPOST_SECRET_KEY` in the environment.

use std::env;

use tracepost_client::{Client, Options};
use tracepost_event::{Generation, Trace, Usage};
use tracepost_http::{HttpCollector, HttpConfigBuilder};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let host = env::var("TRACEPOST_HOST")
        .unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let public_key = env::var("TRACEPOST_PUBLIC_KEY").expect("no public key");
    let secret_key = env::var("TRACEPOST_SECRET_KEY").expect("no secret key");

    let config = HttpConfigBuilder::new(host, public_key, secret_key).build();
    let client = Client::new(HttpCollector::new(config), Options::default());

    let trace_id = client.create_trace(Trace {
        name: Some("basic-example".to_owned()),
        input: Some("What is the capital of France?".to_owned()),
        output: Some("Paris.".to_owned()),
        ..Default::default()
    });

    let generation_id = client.create_generation(Generation {
        trace_id: Some(trace_id.clone()),
        name: Some("answer".to_owned()),
        model: Some("gpt-4o".to_owned()),
        input: Some("What is the capital of France?".to_owned()),
        ..Default::default()
    });
    client.end_generation(Generation {
        id: Some(generation_id),
        trace_id: Some(trace_id),
        output: Some("Paris.".to_owned()),
        usage: Some(Usage {
            prompt_tokens: 12,
            completion_tokens: 3,
            total_tokens: 15,
        }),
        ..Default::default()
    });

    client.shutdown().await;
    println!("sent");
}
