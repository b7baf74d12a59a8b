//! # HMS Web模块
//!
//! 提供预约系统的HTTP接口：认证与会话、角色授权中间件、
//! 按角色划分的看板与预约操作。

pub mod auth;
pub mod handlers;
pub mod server;

use hms_database::HospitalStore;
use hms_scheduling::{BookingService, TreatmentService};
use std::sync::Arc;

use crate::auth::AuthService;

/// Web层共享状态
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HospitalStore>,
    pub auth: Arc<AuthService>,
    pub booking: Arc<BookingService>,
    pub treatment: Arc<TreatmentService>,
}

impl AppState {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store.clone())),
            booking: Arc::new(BookingService::new(store.clone())),
            treatment: Arc::new(TreatmentService::new(store.clone())),
            store,
        }
    }
}

pub use server::WebServer;
