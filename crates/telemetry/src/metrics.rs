use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ==== Face Relay Metrics ====
    pub static ref RELAY_LOGIN_ATTEMPTS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new("relay_login_attempts_total", "Total number of login attempts"),
            &["outcome"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref RELAY_ACTIVE_SESSIONS: IntGauge = {
        let metric = IntGauge::new("relay_active_sessions", "Number of issued session tokens")
            .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref RELAY_ANALYZE_REQUESTS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "relay_analyze_requests_total",
                "Total number of analyze requests by outcome",
            ),
            &["outcome"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref RELAY_REMOTE_CALLS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "relay_remote_calls_total",
                "Total number of calls to the remote face service",
            ),
            &["operation", "status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref RELAY_REMOTE_CALL_DURATION: HistogramVec = {
        let metric = HistogramVec::new(
            HistogramOpts::new(
                "relay_remote_call_duration_seconds",
                "Latency of calls to the remote face service",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };
}

/// Encode all registered metrics in Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_metrics_accessible() {
        RELAY_ACTIVE_SESSIONS.set(3);
        assert_eq!(RELAY_ACTIVE_SESSIONS.get(), 3);

        RELAY_REMOTE_CALLS
            .with_label_values(&["detect_faces", "success"])
            .inc();
        assert!(
            RELAY_REMOTE_CALLS
                .with_label_values(&["detect_faces", "success"])
                .get()
                >= 1
        );
    }

    #[test]
    fn test_encode_metrics_includes_relay_families() {
        RELAY_LOGIN_ATTEMPTS.with_label_values(&["granted"]).inc();
        let encoded = encode_metrics().unwrap();
        assert!(encoded.contains("relay_login_attempts_total"));
    }
}
