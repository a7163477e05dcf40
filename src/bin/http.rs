#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use portfolio_audit::{AuditConfig, http_api, load_config_from_json};
    use portfolio_audit::http_api::{AppState, DEFAULT_BODY_LIMIT};

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_audit=info".into()),
        )
        .init();

    let addr: SocketAddr = std::env::var("PORTFOLIO_AUDIT_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = match std::env::var("PORTFOLIO_AUDIT_CONFIG") {
        Ok(path) => load_config_from_json(path)?,
        Err(_) => AuditConfig::default(),
    };

    let body_limit = match std::env::var("PORTFOLIO_AUDIT_MAX_BODY_BYTES") {
        Ok(raw) => raw.parse::<usize>()?,
        Err(_) => DEFAULT_BODY_LIMIT,
    };

    let state = AppState::new(config).with_body_limit(body_limit);
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
