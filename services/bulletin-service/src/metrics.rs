//! Prometheus counters exposed on `/metrics`.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bulletins_rendered: IntCounter,
    pub imports_succeeded: IntCounter,
    pub imports_failed: IntCounter,
    pub layout_resolution_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> prometheus::Result<IntCounter> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let bulletins_rendered =
            counter("bulletins_rendered_total", "Report cards rendered from a template")?;
        let imports_succeeded =
            counter("bulletin_imports_succeeded_total", "Documents accepted by Yparéo")?;
        let imports_failed =
            counter("bulletin_imports_failed_total", "Documents that failed to import")?;
        let layout_resolution_failures = counter(
            "layout_resolution_failures_total",
            "Uploads that matched no known layout",
        )?;

        Ok(Self {
            registry,
            bulletins_rendered,
            imports_succeeded,
            imports_failed,
            layout_resolution_failures,
        })
    }

    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return "Error encoding metrics".to_string();
        }
        String::from_utf8(buffer).unwrap_or_else(|_| "Error encoding metrics".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_encoded() {
        let metrics = Metrics::new().unwrap();
        metrics.bulletins_rendered.inc_by(3);
        metrics.layout_resolution_failures.inc();

        let text = metrics.encode();
        assert!(text.contains("bulletins_rendered_total 3"));
        assert!(text.contains("layout_resolution_failures_total 1"));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.imports_failed.inc();
        assert_eq!(second.imports_failed.get(), 0);
    }
}
