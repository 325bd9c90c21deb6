use sha2::{Digest, Sha256};

/// Deterministic keep/drop decision for a trace.
///
/// This is a pure function of `(trace_id, rate)`, so every event of a
/// trace lands on the same side of the cut no matter which worker
/// evaluates it, or how often. A rate outside `(0, 1)` keeps everything;
/// sampling only ever filters, it never amplifies.
pub(crate) fn deterministic_sample(trace_id: &str, rate: f64) -> bool {
    if rate <= 0.0 || rate >= 1.0 || trace_id.is_empty() {
        return true;
    }
    let digest = Sha256::digest(trace_id.as_bytes());
    // The first four digest bytes, read big-endian, equal the first
    // eight hex characters of the hash.
    let bucket =
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (f64::from(bucket) / f64::from(u32::MAX)) < rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_function_of_inputs() {
        for trace_id in ["a", "trace-42", "00000000-0000-0000-0000-0"] {
            let first = deterministic_sample(trace_id, 0.5);
            for _ in 0..10 {
                assert_eq!(deterministic_sample(trace_id, 0.5), first);
            }
        }
    }

    #[test]
    fn test_rates_outside_open_interval_keep_everything() {
        for trace_id in ["a", "b", "c"] {
            assert!(deterministic_sample(trace_id, 0.0));
            assert!(deterministic_sample(trace_id, -1.0));
            assert!(deterministic_sample(trace_id, 1.0));
            assert!(deterministic_sample(trace_id, 2.0));
        }
    }

    #[test]
    fn test_empty_trace_id_is_kept() {
        assert!(deterministic_sample("", 0.0001));
    }

    #[test]
    fn test_rate_half_splits_trace_population() {
        let kept = (0..1000)
            .filter(|i| deterministic_sample(&format!("trace-{i}"), 0.5))
            .count();
        // SHA-256 buckets are uniform enough that a 50% rate cannot
        // keep everything or nothing over a thousand ids.
        assert!((300..700).contains(&kept), "kept {kept} of 1000");
    }

    #[test]
    fn test_keeping_is_monotone_in_rate() {
        for i in 0..100 {
            let trace_id = format!("trace-{i}");
            if deterministic_sample(&trace_id, 0.2) {
                assert!(deterministic_sample(&trace_id, 0.7));
            }
        }
    }
}
