use prometheus::{
    register_counter_with_registry, register_gauge_with_registry, Counter, Gauge, Registry,
};
use std::sync::Arc;

pub struct RelayMetrics {
    pub active_connections: Gauge,
    pub registered_identifiers: Gauge,
    pub frames_forwarded: Counter,
    pub frames_dropped_unroutable: Counter,
    pub frames_dropped_queue_full: Counter,
    pub frame_errors: Counter,
    pub registry: Arc<Registry>,
}

impl RelayMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Arc::new(Registry::new());

        let active_connections = register_gauge_with_registry!(
            "amora_relay_active_connections",
            "Number of open WebSocket connections",
            registry
        )?;

        let registered_identifiers = register_gauge_with_registry!(
            "amora_relay_registered_identifiers",
            "Number of identifiers with a live connection",
            registry
        )?;

        let frames_forwarded = register_counter_with_registry!(
            "amora_relay_frames_forwarded_total",
            "Total number of frames forwarded to a recipient",
            registry
        )?;

        let frames_dropped_unroutable = register_counter_with_registry!(
            "amora_relay_frames_dropped_unroutable_total",
            "Total number of frames dropped because the recipient was not connected",
            registry
        )?;

        let frames_dropped_queue_full = register_counter_with_registry!(
            "amora_relay_frames_dropped_queue_full_total",
            "Total number of frames dropped because the recipient queue was full",
            registry
        )?;

        let frame_errors = register_counter_with_registry!(
            "amora_relay_frame_errors_total",
            "Total number of rejected frames (malformed, oversized, bad identifier)",
            registry
        )?;

        Ok(Self {
            active_connections,
            registered_identifiers,
            frames_forwarded,
            frames_dropped_unroutable,
            frames_dropped_queue_full,
            frame_errors,
            registry,
        })
    }

    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new().unwrap()
    }
}
