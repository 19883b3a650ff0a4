/// Install the global subscriber. `RUST_LOG` wins when set; otherwise
/// the configured level applies to this crate's spans.
pub fn init(level: Option<&str>) {
    let directive = format!("askpdf={}", level.unwrap_or("info"));
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .init();
}
