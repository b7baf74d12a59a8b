//! HTTP处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use hms_core::{
    Account, Appointment, DoctorProfile, HmsError, PatientProfile, UserRole,
};
use hms_database::{AppointmentStore, ProfileStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AddDoctorRequest;
use crate::AppState;

/// HTTP层错误包装，将领域错误映射为带状态码的JSON响应
#[derive(Debug)]
pub struct ApiError(pub HmsError);

impl From<HmsError> for ApiError {
    fn from(e: HmsError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            HmsError::DuplicateUsername(_) => StatusCode::CONFLICT,
            HmsError::SlotTaken { .. } => StatusCode::CONFLICT,
            HmsError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            HmsError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            HmsError::Unauthenticated => StatusCode::UNAUTHORIZED,
            HmsError::Unauthorized(_) => StatusCode::FORBIDDEN,
            HmsError::NotFound(_) => StatusCode::NOT_FOUND,
            HmsError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// HTTP层统一结果类型
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Hospital Appointment API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "login": "/login",
            "register": "/register",
            "admin_dashboard": "/admin",
            "patient_dashboard": "/patient",
            "doctor_dashboard": "/doctor"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

/// 管理员看板响应
#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub doctors: Vec<DoctorProfile>,
    pub patients: Vec<PatientProfile>,
    pub appointments: Vec<Appointment>,
}

/// 患者看板响应
#[derive(Debug, Serialize)]
pub struct PatientDashboard {
    pub profile: PatientProfile,
    /// 可预约的医生列表
    pub doctors: Vec<DoctorProfile>,
    pub appointments: Vec<Appointment>,
}

/// 医生看板响应
#[derive(Debug, Serialize)]
pub struct DoctorDashboard {
    pub profile: DoctorProfile,
    pub appointments: Vec<Appointment>,
}

/// 预约请求
#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub date: String,
    pub time: String,
}

/// 诊疗登记请求
#[derive(Debug, Deserialize)]
pub struct UpdateTreatmentRequest {
    pub diagnosis: String,
    pub prescription: String,
}

/// 管理员看板：全部医生、患者与预约
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
) -> ApiResult<Json<AdminDashboard>> {
    account.require_role(UserRole::Admin)?;

    let doctors = state.store.list_doctors().await?;
    let patients = state.store.list_patients().await?;
    let appointments = state.store.list_appointments().await?;

    Ok(Json(AdminDashboard {
        doctors,
        patients,
        appointments,
    }))
}

/// 管理员录入医生
pub async fn add_doctor(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    Json(request): Json<AddDoctorRequest>,
) -> ApiResult<Json<DoctorProfile>> {
    let profile = state.auth.add_doctor(&account, request).await?;
    Ok(Json(profile))
}

/// 患者看板：可预约的医生与本人预约
pub async fn patient_dashboard(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
) -> ApiResult<Json<PatientDashboard>> {
    account.require_role(UserRole::Patient)?;

    let profile = state
        .store
        .find_patient_by_account_id(&account.id)
        .await?
        .ok_or_else(|| HmsError::NotFound(format!("patient profile for account {}", account.id)))?;
    let doctors = state.store.list_doctors().await?;
    let appointments = state.store.list_appointments_by_patient(&profile.id).await?;

    Ok(Json(PatientDashboard {
        profile,
        doctors,
        appointments,
    }))
}

/// 患者预约医生时段
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<BookAppointmentRequest>,
) -> ApiResult<Json<Appointment>> {
    let appointment = state
        .booking
        .book_appointment(&account, doctor_id, &request.date, &request.time)
        .await?;
    Ok(Json(appointment))
}

/// 医生看板：本人名下预约
pub async fn doctor_dashboard(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
) -> ApiResult<Json<DoctorDashboard>> {
    account.require_role(UserRole::Doctor)?;

    let profile = state
        .store
        .find_doctor_by_account_id(&account.id)
        .await?
        .ok_or_else(|| HmsError::NotFound(format!("doctor profile for account {}", account.id)))?;
    let appointments = state.store.list_appointments_by_doctor(&profile.id).await?;

    Ok(Json(DoctorDashboard {
        profile,
        appointments,
    }))
}

/// 医生登记诊疗结果
pub async fn update_treatment(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateTreatmentRequest>,
) -> ApiResult<Json<Appointment>> {
    let appointment = state
        .treatment
        .update_treatment(
            &account,
            appointment_id,
            &request.diagnosis,
            &request.prescription,
        )
        .await?;
    Ok(Json(appointment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AddDoctorRequest, LoginRequest, RegisterRequest};
    use hms_core::AppointmentStatus;
    use hms_database::{AccountStore, MemoryStore};
    use std::sync::Arc;

    /// 完整业务流程：注册 -> 登录 -> 录入医生 -> 预约 -> 重复预约被拒 -> 诊疗登记
    #[tokio::test]
    async fn test_full_appointment_flow() {
        let state = crate::AppState::new(Arc::new(MemoryStore::new()));
        state.auth.bootstrap_admin("admin", "admin123").await.unwrap();

        // 患者注册并登录
        state
            .auth
            .register(RegisterRequest {
                username: "alice".to_string(),
                password: "pw1".to_string(),
                full_name: "Alice A".to_string(),
                age: None,
                contact: None,
            })
            .await
            .unwrap();
        let login = state
            .auth
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "pw1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.dashboard, "/patient");

        let alice = state.auth.verify_token(&login.token).await.unwrap();
        let alice_profile = state
            .store
            .find_patient_by_account_id(&alice.id)
            .await
            .unwrap()
            .unwrap();
        assert!(state
            .store
            .list_appointments_by_patient(&alice_profile.id)
            .await
            .unwrap()
            .is_empty());

        // 管理员录入医生
        let admin = state
            .store
            .find_account_by_username("admin")
            .await
            .unwrap()
            .unwrap();
        let doctor = state
            .auth
            .add_doctor(
                &admin,
                AddDoctorRequest {
                    username: "drbob".to_string(),
                    password: "pw2".to_string(),
                    full_name: "Bob B".to_string(),
                    specialization: "Cardiology".to_string(),
                },
            )
            .await
            .unwrap();

        // 患者预约，预约同时出现在患者与医生的列表中
        let appointment = state
            .booking
            .book_appointment(&alice, doctor.id, "2024-05-01", "10:00")
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Booked);

        let patient_view = state
            .store
            .list_appointments_by_patient(&alice_profile.id)
            .await
            .unwrap();
        let doctor_view = state
            .store
            .list_appointments_by_doctor(&doctor.id)
            .await
            .unwrap();
        assert_eq!(patient_view.len(), 1);
        assert_eq!(doctor_view.len(), 1);
        assert_eq!(patient_view[0].id, doctor_view[0].id);

        // 同一时段的第二次预约被拒绝
        let second = state
            .booking
            .book_appointment(&alice, doctor.id, "2024-05-01", "10:00")
            .await;
        assert!(matches!(second, Err(HmsError::SlotTaken { .. })));

        // 医生登记诊疗结果
        let drbob = state
            .store
            .find_account_by_username("drbob")
            .await
            .unwrap()
            .unwrap();
        let completed = state
            .treatment
            .update_treatment(&drbob, appointment.id, "Flu", "Rest")
            .await
            .unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert_eq!(completed.diagnosis.as_deref(), Some("Flu"));
        assert_eq!(completed.prescription.as_deref(), Some("Rest"));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = vec![
            (
                ApiError(HmsError::DuplicateUsername("alice".to_string())),
                StatusCode::CONFLICT,
            ),
            (ApiError(HmsError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ApiError(HmsError::Unauthenticated), StatusCode::UNAUTHORIZED),
            (
                ApiError(HmsError::Unauthorized("role mismatch".to_string())),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError(HmsError::SlotTaken {
                    doctor_id: Uuid::new_v4(),
                    date: "2024-05-01".to_string(),
                    time: "10:00".to_string(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError(HmsError::NotFound("appointment".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError(HmsError::Validation("empty".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError(HmsError::Database("connection refused".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
