//! Service Runtime - Host Entry Point
//!
//! Wires the default services, starts them, publishes a first navigation
//! request and, when a URL is given as the first argument, fetches it through
//! the REST service and prints the normalized envelope.

use anyhow::Context;
use service_runtime::communication::Response;
use service_runtime::config::{LoggingConfig, RuntimeConfig};
use service_runtime::constants::service_keys::{NAVIGATION_SERVICE, REST_SERVICE};
use service_runtime::context::RuntimeContext;
use service_runtime::domain::{NavigationElement, NavigationRequest};
use service_runtime::helpers::resolve_log_path;
use service_runtime::i18n::{LocalizableText, LocalizationNamespace, Localizer, TableLocalizer};
use service_runtime::services::rest::ReqwestTransport;
use service_runtime::services::{NavigationService, RestService, ServiceProvider};
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Console output always, plus a plain-text file when `log_file` is set
fn init_tracing(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let path = resolve_log_path(path)?;
            let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path '{}' has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default().context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging)?;

    tracing::info!("Starting service runtime...");

    let context = RuntimeContext::init(config);
    let transport = Arc::new(ReqwestTransport::new(
        context.config().rest.request_timeout(),
    )?);

    let localizer = TableLocalizer::new();
    let provider = ServiceProvider::new(&context);
    provider.add_service(Arc::new(NavigationService::new(&context)), NAVIGATION_SERVICE);
    provider.add_service(Arc::new(RestService::new(&context, transport)), REST_SERVICE);

    if !provider.start_services().await {
        let text = LocalizableText::new(
            LocalizationNamespace::Notifications,
            "runtime.startfailed",
            "Not all services could be started.",
        );
        tracing::warn!("{}", localizer.localize(&text));
    }

    let navigation = provider
        .get_service_as::<NavigationService>(NAVIGATION_SERVICE)
        .context("Navigation service is not registered")?;
    navigation.on_navigation_request(
        "host",
        Arc::new(|request: &NavigationRequest| {
            tracing::info!("Navigate to '{}' ({})", request.key, request.navigation_type);
        }),
    );
    let home = NavigationElement::new(
        "home",
        LocalizableText::new(LocalizationNamespace::UiComponents, "views.home", "Home"),
        "./views/home",
    );
    tracing::info!("Opening '{}'", localizer.localize(&home.base.display));
    navigation.show(&home, None);

    if let Some(url) = std::env::args().nth(1) {
        let rest = provider
            .get_service_as::<RestService>(REST_SERVICE)
            .context("REST service is not registered")?;
        let response: Response<serde_json::Value> = rest.get(&url, None).await;
        for message in &response.message_stack {
            tracing::warn!("{}: {}", message.context, localizer.localize(&message.display));
        }
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    if !provider.stop_services().await {
        let text = LocalizableText::new(
            LocalizationNamespace::Notifications,
            "runtime.stopfailed",
            "Not all services could be stopped.",
        );
        tracing::warn!("{}", localizer.localize(&text));
    }
    context.teardown();

    tracing::info!("Service runtime stopped");
    Ok(())
}
