//! Binary entrypoint for the formgate API server.
use formgate_api::{metrics::Metrics, run, ApiConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // FORMGATE_ADDR, FORMGATE_FORMS, FORMGATE_DATA, FORMGATE_MAX_UPLOAD
    let config = ApiConfig::from_env();
    let state = AppState::from_config(&config, Metrics::new()?)?;

    let anonymous = formgate_core::StaticIdentity::anonymous();
    for (id, hosted) in &state.forms {
        let collaborators = state.collaborators(hosted, &anonymous);
        let report = hosted.form.setup_report(&collaborators);
        if !report.is_empty() {
            tracing::warn!(form = %id, errors = report.len(), "form is not operable:\n{}", report);
        }
    }

    run(&config.addr, state).await?;
    Ok(())
}
