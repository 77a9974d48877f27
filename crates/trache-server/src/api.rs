use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use trache_shared::types::ServiceKind;
use trache_store::{
    ContentStore, FamilyInsuranceRow, IndividualInsuranceRow, MessageLog, MessageRecord,
    SearchResults, Service, SiteDocument, VisaRow,
};

use crate::admin;
use crate::auth::{bearer_token, AdminAuth};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, reported_client_ip, RateLimiter};
use crate::upload::UploadGateway;

/// Audit log target for admin logins and logouts.
pub const AUDIT_TARGET: &str = "admin_access";

#[derive(Clone)]
pub struct AppState {
    pub content: ContentStore,
    pub messages: MessageLog,
    pub uploads: Arc<UploadGateway>,
    pub auth: Arc<AdminAuth>,
    pub login_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub async fn load_document(&self) -> Result<SiteDocument, ServerError> {
        let content = self.content.clone();
        run_blocking(move || content.load()).await
    }

    /// Persist `document` and hand it back.
    pub async fn save_document(&self, document: SiteDocument) -> Result<SiteDocument, ServerError> {
        let content = self.content.clone();
        run_blocking(move || content.save(&document).map(|()| document)).await
    }

    pub async fn load_messages(&self) -> Result<Vec<MessageRecord>, ServerError> {
        let messages = self.messages.clone();
        run_blocking(move || messages.load_all()).await
    }

    pub async fn append_message(&self, record: MessageRecord) -> Result<MessageRecord, ServerError> {
        let messages = self.messages.clone();
        run_blocking(move || messages.append(&record).map(|()| record)).await
    }

    pub async fn delete_message(&self, ordinal: usize) -> Result<bool, ServerError> {
        let messages = self.messages.clone();
        run_blocking(move || messages.delete_at(ordinal)).await
    }
}

/// Run synchronous store I/O on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, ServerError>
where
    F: FnOnce() -> trache_store::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("store task failed: {e}")))?
        .map_err(ServerError::from)
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let login = Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.login_limiter.clone(),
            rate_limit_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/site", get(site))
        .route("/api/destinations", get(search_destinations))
        .route("/api/services/:name", get(service_detail))
        .route("/api/contact", post(contact))
        .route("/logout", post(logout))
        .merge(login)
        .merge(admin::routes())
        .nest_service("/uploads", ServeDir::new(state.uploads.upload_root()))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if state.config.force_https {
        router = router.layer(middleware::from_fn(force_https));
    }

    router.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn site(State(state): State<AppState>) -> Result<Json<SiteDocument>, ServerError> {
    Ok(Json(state.load_document().await?))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn search_destinations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ServerError> {
    let document = state.load_document().await?;
    Ok(Json(document.search(&params.query)))
}

/// Pricing shown on the insurance page.
#[derive(Serialize)]
struct InsurancePricing {
    individual: Vec<IndividualInsuranceRow>,
    family: Vec<FamilyInsuranceRow>,
    tables_html: String,
}

/// Pricing shown on the visa page.
#[derive(Serialize)]
struct VisaPricing {
    rows: Vec<VisaRow>,
    tables_html: String,
}

#[derive(Serialize)]
struct ServiceDetail {
    service: Service,
    kind: ServiceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    insurance: Option<InsurancePricing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visa: Option<VisaPricing>,
}

async fn service_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceDetail>, ServerError> {
    let document = state.load_document().await?;
    let service = document
        .find_service(&name)
        .cloned()
        .ok_or_else(|| ServerError::NotFound(format!("service '{name}'")))?;

    let kind = ServiceKind::classify(&service.name);
    let insurance = (kind == ServiceKind::Insurance).then(|| InsurancePricing {
        individual: document.insurance_individual.clone(),
        family: document.insurance_family.clone(),
        tables_html: document.insurance_tables_html.clone(),
    });
    let visa = (kind == ServiceKind::Visa).then(|| VisaPricing {
        rows: document.visa_rows.clone(),
        tables_html: document.visa_tables_html.clone(),
    });

    Ok(Json(ServiceDetail {
        service,
        kind,
        insurance,
        visa,
    }))
}

#[derive(Deserialize)]
struct ContactRequest {
    #[serde(default, alias = "nom")]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default, alias = "telephone")]
    phone: String,
    #[serde(default)]
    message: String,
}

async fn contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServerError> {
    let name = req.name.trim();
    let phone = req.phone.trim();
    let message = req.message.trim();
    if name.is_empty() || phone.is_empty() || message.is_empty() {
        return Err(ServerError::BadRequest(
            "name, phone and message are required".to_string(),
        ));
    }

    let record = MessageRecord::new(name, req.email.trim(), phone, message);
    let record = state.append_message(record).await?;

    info!(name = %record.name, "Contact message received");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "received": true, "date": record.date })),
    ))
}

// ─── Admin login ───

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let ip = reported_client_ip(&headers, peer.map(|ConnectInfo(addr)| addr))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = user_agent(&headers);

    let auth = state.auth.clone();
    let LoginRequest { username, password } = req;
    let checked_user = username.clone();
    let valid = tokio::task::spawn_blocking(move || auth.check_credentials(&checked_user, &password))
        .await
        .map_err(|e| ServerError::Internal(format!("credential check panicked: {e}")))?;

    if !valid {
        warn!(target: AUDIT_TARGET, user = %username, ip = %ip, ua = %user_agent, "login failed");
        return Err(ServerError::InvalidCredentials);
    }

    let token = state.auth.sessions.open().await;
    info!(target: AUDIT_TARGET, user = %username, ip = %ip, ua = %user_agent, "login success");
    Ok(Json(LoginResponse { token }))
}

async fn logout(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        if state.auth.sessions.close(token).await {
            let ip = reported_client_ip(&headers, peer.map(|ConnectInfo(addr)| addr))
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            info!(target: AUDIT_TARGET, ip = %ip, ua = %user_agent(&headers), "logout");
        }
    }
    StatusCode::NO_CONTENT
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

// ─── HTTPS redirect ───

/// Redirect requests that did not reach the proxy over HTTPS.
async fn force_https(req: Request<axum::body::Body>, next: Next) -> Response {
    let forwarded_https = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));
    if forwarded_https {
        return next.run(req).await;
    }

    let Some(host) = req.headers().get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return next.run(req).await;
    };
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{host}{path}");

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
