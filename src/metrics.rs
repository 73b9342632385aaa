use std::net::SocketAddr;

/// Installs the Prometheus exporter. Without it the pipeline's counters are no-ops.
pub fn init_metrics() {
    let port: u16 = std::env::var("GOLD_RATES_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    tracing::info!("Installing Prometheus exporter on {}", addr);
    match builder.install() {
        Ok(()) => {
            tracing::info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            tracing::warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}
