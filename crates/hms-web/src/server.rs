//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use hms_core::{HmsError, Result};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{auth_middleware, login_handler, logout_handler, register_handler};
use crate::handlers::{
    add_doctor, admin_dashboard, api_root, book_appointment, doctor_dashboard, health,
    patient_dashboard, update_treatment,
};
use crate::AppState;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        let app = Self::create_app(state);
        Self { addr, app }
    }

    fn create_app(state: AppState) -> Router {
        // 需要认证的路由，账户由中间件注入
        let protected = Router::new()
            .route("/admin", get(admin_dashboard))
            .route("/add_doctor", post(add_doctor))
            .route("/patient", get(patient_dashboard))
            .route("/book_appointment/:doctor_id", post(book_appointment))
            .route("/doctor", get(doctor_dashboard))
            .route("/update_treatment/:appointment_id", post(update_treatment))
            .route("/logout", get(logout_handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));

        Router::new()
            // 无需认证的路由
            .route("/", get(api_root))
            .route("/health", get(health))
            .route("/login", post(login_handler))
            .route("/register", post(register_handler))
            .merge(protected)
            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
            .with_state(state)
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| HmsError::Internal(format!("web server error: {}", e)))?;

        Ok(())
    }
}
