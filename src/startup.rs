use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    response::Response,
    routing::{delete, get, post, put},
    serve::Serve,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, info_span};
use uuid::Uuid;

use crate::{
    configuration::{InterfaceSettings, Settings},
    dispatch::DispatchClient,
    ingest::{CsvIngester, MAX_CSV_BYTES},
    routes::{
        add_recipient, add_recipients, advance, campaign_snapshot, health_check,
        import_recipients, remove_last_recipient, remove_recipient, select_method, set_content,
        step_back, submit_campaign,
    },
    session::CampaignSession,
};

pub struct AppState {
    /// The one operator session. The lock is only ever held for the
    /// synchronous store/wizard mutations, never across an await.
    pub session: Mutex<CampaignSession>,
    pub ingester: CsvIngester,
    pub dispatch_client: DispatchClient,
    /// Guards the single-in-flight submission rule.
    pub dispatch_in_flight: AtomicBool,
    pub interface: InterfaceSettings,
}

pub async fn run(
    listener: TcpListener,
    dispatch_client: DispatchClient,
    interface: InterfaceSettings,
) -> anyhow::Result<Serve<TcpListener, Router, Router>> {
    // Wrapped in an Arc pointer to allow cheap cloning of AppState across
    // handlers; the session mutex and the in-flight flag must be shared,
    // not cloned.
    let app_state = Arc::new(AppState {
        session: Mutex::new(CampaignSession::new()),
        ingester: CsvIngester::new(),
        dispatch_client,
        dispatch_in_flight: AtomicBool::new(false),
        interface,
    });
    let app = Router::new()
        .route("/health_check", get(health_check))
        .route("/api/campaign", get(campaign_snapshot))
        .route("/api/campaign/method", post(select_method))
        .route("/api/campaign/back", post(step_back))
        .route("/api/campaign/advance", post(advance))
        .route("/api/campaign/content", put(set_content))
        .route("/api/campaign/recipients", post(add_recipient))
        .route("/api/campaign/recipients/batch", post(add_recipients))
        .route("/api/campaign/recipients/last", delete(remove_last_recipient))
        .route("/api/campaign/recipients/{index}", delete(remove_recipient))
        .route("/api/campaign/recipients/import", post(import_recipients))
        .route("/api/campaign/submit", post(submit_campaign))
        .with_state(app_state)
        // Axum's default 2 MiB body cap would reject uploads before the
        // ingester's own 5 MiB rule gets a say. Leave headroom for the
        // multipart framing.
        .layer(DefaultBodyLimit::max(MAX_CSV_BYTES + 1024 * 1024))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = Uuid::new_v4();
                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        request_id = ?request_id,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    let status = response.status();
                    let headers = response.headers();
                    span.record("status", &status.as_u16());
                    info!(parent: span, ?status, ?headers, ?latency, "Response sent");
                }),
        );

    Ok(axum::serve(listener, app))
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    // build is the one that invokes the `run()` function
    // then any fn invokes `run_until_stopped`
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let timeout = configuration.dispatch.timeout();
        let dispatch_client = DispatchClient::new(
            configuration.dispatch.base_url,
            configuration.dispatch.authorization_token,
            timeout,
        );

        let listener = TcpListener::bind(format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        ))
        .await?;
        let port = listener.local_addr()?.port();

        let server = run(listener, dispatch_client, configuration.interface).await?;

        Ok(Self { server, port })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        Ok(self.server.await?)
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
