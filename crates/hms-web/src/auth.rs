//! 用户认证和授权系统
//!
//! 密码使用argon2id加盐哈希存储，会话为服务端持有的不透明令牌，
//! 客户端通过 `Authorization: Bearer <token>` 携带。

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use hms_core::utils::is_valid_username;
use hms_core::{Account, DoctorProfile, HmsError, Result, UserRole};
use hms_database::{AccountStore, HospitalStore, NewAccount, NewDoctorProfile, NewPatientProfile};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::handlers::{ApiError, ApiResult};
use crate::AppState;

/// 账户信息（不包含敏感数据）
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        AccountInfo {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
        }
    }
}

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub account: AccountInfo,
    /// 角色对应的看板路径，客户端据此跳转
    pub dashboard: String,
    pub expires_at: DateTime<Utc>,
}

/// 患者自助注册请求
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub age: Option<i32>,
    pub contact: Option<String>,
}

/// 管理员录入医生请求
#[derive(Debug, Deserialize)]
pub struct AddDoctorRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub specialization: String,
}

/// 服务端会话
#[derive(Debug, Clone)]
struct Session {
    account_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// 请求中携带的会话令牌，由认证中间件注入
#[derive(Debug, Clone)]
pub struct AuthToken(pub Uuid);

/// 哈希明文密码为argon2id PHC字符串
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HmsError::Internal(format!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// 校验明文密码与存储的哈希是否一致，比较由argon2以常数时间完成
fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// 认证服务
pub struct AuthService {
    store: Arc<dyn HospitalStore>,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self::with_ttl(store, 24)
    }

    fn with_ttl(store: Arc<dyn HospitalStore>, session_ttl_hours: i64) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl_hours,
        }
    }

    /// 患者自助注册
    ///
    /// 账户与患者档案在同一事务内创建，不会留下没有档案的账户。
    pub async fn register(&self, request: RegisterRequest) -> Result<Account> {
        if !is_valid_username(&request.username) {
            return Err(HmsError::Validation(format!(
                "invalid username: {}",
                request.username
            )));
        }
        if request.password.is_empty() {
            return Err(HmsError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        if self
            .store
            .find_account_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(HmsError::DuplicateUsername(request.username));
        }

        let account = NewAccount {
            id: Uuid::new_v4(),
            username: request.username,
            password_hash: hash_password(&request.password)?,
            role: UserRole::Patient,
        };
        let profile = NewPatientProfile {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            age: request.age,
            contact: request.contact,
        };

        let created = self.store.create_patient_account(&account, &profile).await?;
        info!("Registered new patient account: {}", created.username);
        Ok(created)
    }

    /// 管理员录入医生账户（显式传入操作者）
    pub async fn add_doctor(
        &self,
        actor: &Account,
        request: AddDoctorRequest,
    ) -> Result<DoctorProfile> {
        actor.require_role(UserRole::Admin)?;

        if !is_valid_username(&request.username) {
            return Err(HmsError::Validation(format!(
                "invalid username: {}",
                request.username
            )));
        }
        if request.password.is_empty() {
            return Err(HmsError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        if self
            .store
            .find_account_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(HmsError::DuplicateUsername(request.username));
        }

        let account = NewAccount {
            id: Uuid::new_v4(),
            username: request.username,
            password_hash: hash_password(&request.password)?,
            role: UserRole::Doctor,
        };
        let profile = NewDoctorProfile {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            specialization: request.specialization,
        };

        let created = self.store.create_doctor_account(&account, &profile).await?;
        info!(
            "Provisioned doctor account: {} ({})",
            created.full_name, created.specialization
        );
        Ok(created)
    }

    /// 校验用户名与密码
    ///
    /// 账户不存在与密码错误统一返回InvalidCredentials，不泄露二者的区别。
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        let account = self.store.find_account_by_username(username).await?;

        match account {
            Some(account) if verify_password(&account.password_hash, password) => Ok(account),
            _ => Err(HmsError::InvalidCredentials),
        }
    }

    /// 用户登录，颁发会话令牌
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let account = self
            .authenticate(&request.username, &request.password)
            .await?;

        let token = Uuid::new_v4();
        let expires_at = Utc::now() + chrono::Duration::hours(self.session_ttl_hours);
        self.sessions.write().await.insert(
            token,
            Session {
                account_id: account.id,
                expires_at,
            },
        );

        Ok(LoginResponse {
            token,
            dashboard: account.role.dashboard_path().to_string(),
            account: AccountInfo::from(&account),
            expires_at,
        })
    }

    /// 清除会话
    pub async fn logout(&self, token: &Uuid) {
        self.sessions.write().await.remove(token);
    }

    /// 验证会话令牌并加载对应账户
    pub async fn verify_token(&self, token: &Uuid) -> Result<Account> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(token).cloned()
        };

        let session = session.ok_or(HmsError::Unauthenticated)?;
        if session.expires_at < Utc::now() {
            self.sessions.write().await.remove(token);
            return Err(HmsError::Unauthenticated);
        }

        self.store
            .find_account_by_id(&session.account_id)
            .await?
            .ok_or(HmsError::Unauthenticated)
    }

    /// 首次启动引导：不存在管理员账户时用配置的默认凭据创建一个
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<()> {
        if self.store.admin_exists().await? {
            return Ok(());
        }

        let account = NewAccount {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role: UserRole::Admin,
        };
        self.store.create_account(&account).await?;

        info!("Default admin account created: {}", username);
        warn!("Rotate the default admin credential before any real deployment");
        Ok(())
    }
}

/// 认证中间件
///
/// 从请求头解析会话令牌，将账户作为显式操作者注入请求扩展。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(HmsError::Unauthenticated.into()),
    };
    let token = Uuid::parse_str(token).map_err(|_| HmsError::Unauthenticated)?;

    let account = state.auth.verify_token(&token).await?;
    request.extensions_mut().insert(account);
    request.extensions_mut().insert(AuthToken(token));
    Ok(next.run(request).await)
}

/// 登录处理器
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    info!("Login attempt for user: {}", request.username);

    match state.auth.login(request).await {
        Ok(response) => {
            info!("User logged in successfully: {}", response.account.username);
            Ok(Json(response))
        }
        Err(e) => {
            warn!("Login failed: {}", e);
            Err(e.into())
        }
    }
}

/// 患者自助注册处理器
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(AccountInfo::from(&account))))
}

/// 登出处理器
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> ApiResult<Json<serde_json::Value>> {
    state.auth.logout(&token.0).await;
    Ok(Json(json!({
        "message": "logged out",
        "redirect": "/login"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_database::MemoryStore;

    fn memory_store() -> Arc<dyn HospitalStore> {
        Arc::new(MemoryStore::new())
    }

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            full_name: "Alice A".to_string(),
            age: Some(30),
            contact: Some("555-0100".to_string()),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("pw1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "pw1"));
        assert!(!verify_password(&hash, "pw2"));
        assert!(!verify_password("not-a-phc-string", "pw1"));
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let auth = AuthService::new(memory_store());

        let account = auth.register(register_request("alice", "pw1")).await.unwrap();
        assert_eq!(account.role, UserRole::Patient);

        let authed = auth.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(authed.id, account.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let auth = AuthService::new(memory_store());

        auth.register(register_request("alice", "pw1")).await.unwrap();
        let second = auth.register(register_request("alice", "pw2")).await;
        assert!(matches!(second, Err(HmsError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_authenticate_does_not_distinguish_failures() {
        let auth = AuthService::new(memory_store());
        auth.register(register_request("alice", "pw1")).await.unwrap();

        let wrong_password = auth.authenticate("alice", "bad").await;
        let unknown_user = auth.authenticate("nobody", "pw1").await;
        assert!(matches!(wrong_password, Err(HmsError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(HmsError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_logout_session_cycle() {
        let auth = AuthService::new(memory_store());
        auth.register(register_request("alice", "pw1")).await.unwrap();

        let response = auth
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "pw1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.dashboard, "/patient");

        let account = auth.verify_token(&response.token).await.unwrap();
        assert_eq!(account.username, "alice");

        auth.logout(&response.token).await;
        let after_logout = auth.verify_token(&response.token).await;
        assert!(matches!(after_logout, Err(HmsError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let auth = AuthService::with_ttl(memory_store(), -1);
        auth.register(register_request("alice", "pw1")).await.unwrap();

        let response = auth
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "pw1".to_string(),
            })
            .await
            .unwrap();

        let result = auth.verify_token(&response.token).await;
        assert!(matches!(result, Err(HmsError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_add_doctor_requires_admin() {
        let store = memory_store();
        let auth = AuthService::new(store.clone());
        auth.bootstrap_admin("admin", "admin123").await.unwrap();
        auth.register(register_request("alice", "pw1")).await.unwrap();

        let admin = store.find_account_by_username("admin").await.unwrap().unwrap();
        let patient = store.find_account_by_username("alice").await.unwrap().unwrap();

        let request = AddDoctorRequest {
            username: "drbob".to_string(),
            password: "pw2".to_string(),
            full_name: "Bob B".to_string(),
            specialization: "Cardiology".to_string(),
        };
        let denied = auth
            .add_doctor(
                &patient,
                AddDoctorRequest {
                    username: "drbob".to_string(),
                    password: "pw2".to_string(),
                    full_name: "Bob B".to_string(),
                    specialization: "Cardiology".to_string(),
                },
            )
            .await;
        assert!(matches!(denied, Err(HmsError::Unauthorized(_))));

        let profile = auth.add_doctor(&admin, request).await.unwrap();
        assert_eq!(profile.specialization, "Cardiology");
        assert!(profile.is_available);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let store = memory_store();
        let auth = AuthService::new(store.clone());

        auth.bootstrap_admin("admin", "admin123").await.unwrap();
        auth.bootstrap_admin("admin", "admin123").await.unwrap();

        assert!(store.admin_exists().await.unwrap());
        let admin = store.find_account_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
    }
}
