use serde_json::Value;
use tracepost_event::EventBody;

/// Hard ceiling on the serialized size of a single event. Part of the
/// wire contract, not configuration.
pub(crate) const MAX_EVENT_BYTES: usize = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Candidate {
    Input,
    Output,
    Metadata,
}

/// Enforces the per-event byte ceiling by clearing the largest of the
/// input/output/metadata fields, largest first, until the event fits.
///
/// Cleared fields are replaced with `cleared_message` so the collector
/// still shows why the data is missing. Greedy largest-first eviction
/// destroys as few fields as possible; calling this on an already
/// truncated event is a no-op. Returns the resulting size estimate.
pub(crate) fn truncate(body: &mut EventBody, cleared_message: &str) -> usize {
    let metadata_len = body
        .metadata()
        .and_then(|v| serde_json::to_string(v).ok())
        .map_or(0, |s| s.len());
    let input_len = body.input().map_or(0, str::len);
    let output_len = body.output().map_or(0, str::len);

    let mut total = metadata_len + input_len + output_len;
    if total <= MAX_EVENT_BYTES {
        return total;
    }

    let mut candidates = [
        (input_len, Candidate::Input),
        (output_len, Candidate::Output),
        (metadata_len, Candidate::Metadata),
    ];
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    for (len, candidate) in candidates {
        if total <= MAX_EVENT_BYTES {
            break;
        }
        if len == 0 {
            continue;
        }
        match candidate {
            Candidate::Input => {
                if let Some(slot) = body.input_mut() {
                    *slot = Some(cleared_message.to_owned());
                }
            }
            Candidate::Output => {
                if let Some(slot) = body.output_mut() {
                    *slot = Some(cleared_message.to_owned());
                }
            }
            Candidate::Metadata => {
                if let Some(slot) = body.metadata_mut() {
                    *slot = Some(Value::String(cleared_message.to_owned()));
                }
            }
        }
        warn!("cleared oversized {candidate:?} field ({len} bytes)");
        total -= len;
    }
    total
}
