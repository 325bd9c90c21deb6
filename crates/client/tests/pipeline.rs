//! End-to-end tests driving the pipeline against a scripted collector.
//!
//! All tests run on paused virtual time, so flush intervals and backoff
//! delays elapse instantly.

use std::sync::Arc;

use tracepost_client::{Client, MaskFn, Options, OptionsBuilder};
use tracepost_event::{
    ChatMessage, ContentPart, EventBody, Generation, MessageContent, Score,
    Span, Trace,
};
use tracepost_test_collector::TestCollector;

fn client(collector: &TestCollector, options: Options) -> Client {
    Client::new(collector.clone(), options)
}

fn named_trace(name: &str) -> Trace {
    Trace {
        name: Some(name.to_owned()),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_flush_with_nothing_pending_returns_immediately() {
    let collector = TestCollector::new();
    let client = client(&collector, Options::default());
    client.flush().await;
    assert_eq!(collector.ingest_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_events_are_batched_at_the_flush_threshold() {
    let collector = TestCollector::new();
    let client = client(&collector, Options::default());

    for i in 0..20 {
        client.create_trace(named_trace(&format!("trace-{i}")));
    }
    client.flush().await;

    let batches = collector.batches();
    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![15, 5]);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_until_success() {
    let collector = TestCollector::new();
    collector.plan_ingest_status(503);
    collector.plan_ingest_status(503);

    let client = client(&collector, Options::default());
    client.create_trace(named_trace("retried"));
    client.flush().await;

    assert_eq!(collector.ingest_calls(), 3);
    assert_eq!(collector.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_batches_are_not_retried() {
    let collector = TestCollector::new();
    collector.plan_ingest_status(400);

    let client = client(&collector, Options::default());
    client.create_trace(named_trace("rejected"));
    client.flush().await;

    assert_eq!(collector.ingest_calls(), 1);
    assert!(collector.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_batch_is_dropped_after_exhausting_retries() {
    let collector = TestCollector::new();
    for _ in 0..5 {
        collector.plan_ingest_status(503);
    }

    let client = client(&collector, Options::default());
    client.create_trace(named_trace("doomed"));
    client.flush().await;

    // The first attempt plus the default three retries.
    assert_eq!(collector.ingest_calls(), 4);
    assert!(collector.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_oversized_batches_are_split_by_byte_size() {
    let collector = TestCollector::new();
    let client = client(&collector, Options::default());

    // Each span serializes to roughly 900 KB, so three of them cross
    // the batch byte ceiling while staying under the per-event one.
    for _ in 0..4 {
        client.create_span(Span {
            trace_id: Some("t".to_owned()),
            input: Some("x".repeat(900_000)),
            ..Default::default()
        });
    }
    client.flush().await;

    let sizes: Vec<usize> =
        collector.batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_oversized_events_have_their_largest_field_cleared() {
    let collector = TestCollector::new();
    let options = OptionsBuilder::new()
        .with_cleared_message("<gone>")
        .build();
    let client = client(&collector, options);

    client.create_trace(Trace {
        input: Some("x".repeat(2_000_000)),
        output: Some("short".to_owned()),
        ..Default::default()
    });
    client.flush().await;

    let batches = collector.batches();
    let body = &batches[0][0].body;
    assert_eq!(body.input(), Some("<gone>"));
    assert_eq!(body.output(), Some("short"));
}

#[tokio::test(start_paused = true)]
async fn test_mask_is_applied_before_upload() {
    let collector = TestCollector::new();
    let mask: MaskFn = Arc::new(|value| value.replace("secret", "***"));
    let options = OptionsBuilder::new().with_mask(mask).build();
    let client = client(&collector, options);

    client.create_trace(Trace {
        input: Some("the secret prompt".to_owned()),
        output: Some("no secrets here".to_owned()),
        ..Default::default()
    });
    client.flush().await;

    let batches = collector.batches();
    let body = &batches[0][0].body;
    assert_eq!(body.input(), Some("the *** prompt"));
    assert_eq!(body.output(), Some("no ***s here"));
}

#[tokio::test(start_paused = true)]
async fn test_inline_media_is_extracted_uploaded_and_reported() {
    let collector = TestCollector::new();
    collector.set_upload_url("https://blobs.test/put");
    let client = client(&collector, Options::default());

    client.create_generation(Generation {
        trace_id: Some("t".to_owned()),
        in_messages: vec![ChatMessage {
            role: "user".to_owned(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "what is this?".to_owned(),
                },
                ContentPart::Image {
                    // "hello" as a PNG-flavored data URI.
                    url: "data:image/png;base64,aGVsbG8=".to_owned(),
                },
            ]),
        }],
        ..Default::default()
    });
    client.flush().await;

    let requests = collector.media_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].trace_id.as_deref(), Some("t"));
    assert_eq!(requests[0].content_type, "image/png");
    assert_eq!(requests[0].content_length, 5);
    assert_eq!(requests[0].field, "input");

    let uploads = collector.media_uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].upload_url, "https://blobs.test/put");
    assert_eq!(uploads[0].content_length, 5);

    let patches = collector.media_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, "media-1");
    assert_eq!(patches[0].1.upload_http_status, 200);
    assert_eq!(patches[0].1.upload_http_error, None);

    // The uploaded event references the blob instead of inlining it.
    let batches = collector.batches();
    let input = batches[0][0].body.input().unwrap();
    assert!(input.contains(
        "@@@media:type=image/png|id=media-1|source=base64_data_uri@@@"
    ));
    assert!(!input.contains("base64,aGVsbG8="));
}

#[tokio::test(start_paused = true)]
async fn test_media_without_upload_url_is_only_referenced() {
    let collector = TestCollector::new();
    let client = client(&collector, Options::default());

    client.create_generation(Generation {
        in_messages: vec![ChatMessage {
            role: "user".to_owned(),
            content: MessageContent::Parts(vec![ContentPart::Image {
                url: "data:image/png;base64,aGVsbG8=".to_owned(),
            }]),
        }],
        ..Default::default()
    });
    client.flush().await;

    assert_eq!(collector.media_requests().len(), 1);
    assert!(collector.media_uploads().is_empty());
    assert!(collector.media_patches().is_empty());

    let batches = collector.batches();
    assert!(batches[0][0].body.input().unwrap().contains("id=media-1"));
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_sheds_new_events_without_blocking() {
    let collector = TestCollector::new();
    let options = OptionsBuilder::new().with_max_queue_size(2).build();
    let client = client(&collector, options);

    // No await between pushes, so the worker cannot drain in between.
    for i in 0..5 {
        client.create_trace(named_trace(&format!("trace-{i}")));
    }
    client.flush().await;

    let delivered: usize =
        collector.batches().iter().map(Vec::len).sum();
    assert_eq!(delivered, 2);
}

#[tokio::test(start_paused = true)]
async fn test_tiny_sample_rate_drops_traces_but_flush_still_returns() {
    let collector = TestCollector::new();
    let options = OptionsBuilder::new().with_sample_rate(1e-9).build();
    let client = client(&collector, options);

    for i in 0..5 {
        client.create_trace(named_trace(&format!("trace-{i}")));
    }
    client.flush().await;

    assert!(collector.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sampling_keeps_or_drops_whole_traces() {
    let collector = TestCollector::new();
    let options = OptionsBuilder::new().with_sample_rate(0.5).build();
    let client = client(&collector, options);

    for i in 0..10 {
        let trace_id = client.create_trace(Trace {
            id: Some(format!("trace-{i}")),
            ..Default::default()
        });
        for _ in 0..2 {
            client.create_span(Span {
                trace_id: Some(trace_id.clone()),
                ..Default::default()
            });
        }
    }
    client.flush().await;

    for i in 0..10 {
        let trace_id = format!("trace-{i}");
        let count = collector
            .batches()
            .iter()
            .flatten()
            .filter(|event| event.body.trace_id() == Some(trace_id.as_str()))
            .count();
        // Every event of a trace shares the same sampling fate.
        assert!(count == 0 || count == 3, "trace {i} delivered {count}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_scores_flow_through_the_pipeline() {
    let collector = TestCollector::new();
    let client = client(&collector, Options::default());

    let trace_id = client.create_trace(named_trace("scored"));
    client.create_score(Score {
        trace_id: Some(trace_id),
        name: Some("accuracy".to_owned()),
        value: 0.93,
        ..Default::default()
    });
    client.flush().await;

    let batches = collector.batches();
    assert_eq!(batches[0].len(), 2);
    let EventBody::Score(score) = &batches[0][1].body else {
        panic!("expected a score payload");
    };
    assert_eq!(score.value, 0.93);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_pending_events() {
    let collector = TestCollector::new();
    let client = client(&collector, Options::default());

    client.create_trace(named_trace("last-words"));
    client.shutdown().await;

    assert_eq!(collector.batches().len(), 1);
    // Flushing after shutdown must not hang even though the workers
    // are gone; the queue was already drained.
    client.flush().await;
}
