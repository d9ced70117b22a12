//! 인증 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 회원가입, 로그인, 로그아웃, 역할 보호 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::{middleware, routing::get, Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use auth_api::auth::{start_revocation_sweeper, TokenCodec};
use auth_api::metrics::setup_metrics_recorder;
use auth_api::middleware::metrics_layer;
use auth_api::repository::{AccountStore, MemoryAccountStore, PgAccountStore};
use auth_api::routes::create_api_router;
use auth_api::state::AppState;
use auth_core::{AppConfig, LogConfig, LogFormat};

/// JWT 서명 시크릿 로드.
///
/// `JWT_SECRET` 환경변수가 없으면 개발용 기본값으로 떨어집니다.
fn load_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        warn!("JWT_SECRET not set, using default (INSECURE for development only)");
        "dev-secret-key-change-in-production".to_string()
    })
}

/// 계정 저장소 초기화.
///
/// `DATABASE_URL`이 설정되어 있으면 PostgreSQL에 연결하고, 없거나
/// 연결에 실패하면 인메모리 저장소로 떨어집니다 (재시작 시 초기화).
async fn create_store(config: &AppConfig) -> (Arc<dyn AccountStore>, Option<sqlx::PgPool>) {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        warn!("DATABASE_URL not set, using in-memory account store");
        return (Arc::new(MemoryAccountStore::new()), None);
    };

    match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
        .connect(&database_url)
        .await
    {
        Ok(pool) => {
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                info!("Connected to PostgreSQL successfully");
                let store = PgAccountStore::new(
                    pool.clone(),
                    Duration::from_secs(config.database.query_timeout_secs),
                );
                (Arc::new(store), Some(pool))
            } else {
                error!("Failed to verify database connection, using in-memory store");
                (Arc::new(MemoryAccountStore::new()), None)
            }
        }
        Err(e) => {
            error!("Failed to connect to database: {}, using in-memory store", e);
            (Arc::new(MemoryAccountStore::new()), None)
        }
    }
}

/// CORS 미들웨어 구성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(std::env::var("CORS_ORIGINS").is_ok())
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let auth_context = state.auth_context();

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        // 인가 extractor가 읽는 컨텍스트
        .layer(Extension(auth_context))
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
}

/// 스로틀 윈도우 정리 백그라운드 태스크 시작.
fn start_throttle_cleanup(
    throttle: Arc<auth_api::auth::LoginThrottle>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    throttle.cleanup().await;
                    auth_api::metrics::set_throttled_identifiers(
                        throttle.tracked_identifiers().await as f64,
                    );
                }
                _ = shutdown.cancelled() => {
                    info!("Throttle cleanup task stopped");
                    break;
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드 (기본값 → config/default.toml → AUTH__* 환경변수)
    let config = AppConfig::load_default()?;

    // tracing 초기화
    let log_format: LogFormat = config.logging.format.parse().unwrap_or_default();
    auth_core::logging::init_logging(LogConfig::new(&config.logging.level).with_format(log_format))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    info!("Starting auth API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder();
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                "소켓 주소 설정이 유효하지 않습니다. AUTH__SERVER__HOST, AUTH__SERVER__PORT를 확인하세요."
            );
            e
        })?;

    // 토큰 코덱 생성
    let jwt_secret = load_jwt_secret();
    let codec = Arc::new(TokenCodec::new(&jwt_secret, config.auth.token_ttl_minutes));

    // 계정 저장소 초기화 (PostgreSQL 또는 인메모리)
    let (store, db_pool) = create_store(&config).await;

    // AppState 생성
    let mut state = AppState::new(store, codec, &config.auth)?;
    if let Some(pool) = db_pool {
        state = state.with_db_pool(pool);
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        "Application state initialized"
    );

    // 전역 종료 토큰 생성 (백그라운드 태스크에 종료 전파)
    let shutdown_token = CancellationToken::new();

    // 무효화 레지스트리 sweep 태스크 시작
    let _sweeper = start_revocation_sweeper(
        Arc::clone(&state.revocations),
        Duration::from_secs(config.auth.revocation_sweep_interval_secs),
        Duration::from_secs(config.auth.token_ttl_minutes.unsigned_abs() * 60),
        shutdown_token.clone(),
    );

    // 스로틀 윈도우 정리 태스크 시작
    let _cleanup = start_throttle_cleanup(
        state.gate.throttle(),
        Duration::from_secs(config.auth.throttle_window_secs),
        shutdown_token.clone(),
    );

    // 라우터 생성
    let app = create_router(
        Arc::clone(&state),
        metrics_handle,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");

    // 종료 토큰 취소 (백그라운드 태스크에 종료 시그널 전파)
    shutdown_token.cancel();

    // 정리 작업에 최대 10초 대기
    let cleanup_timeout = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        info!("Cleanup completed");
    })
    .await;

    if cleanup_timeout.is_err() {
        warn!("Cleanup timeout, forcing shutdown");
    }

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
