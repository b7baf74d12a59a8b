//! 诊疗登记服务
//!
//! 医生为本人名下的预约写入诊断与处方，预约随之进入已完成状态。

use crate::state_machine::{AppointmentEvent, AppointmentStateMachine};
use hms_core::{Account, Appointment, HmsError, Result, UserRole};
use hms_database::{AppointmentStore, HospitalStore, ProfileStore};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 诊疗登记服务
pub struct TreatmentService {
    store: Arc<dyn HospitalStore>,
    state_machine: AppointmentStateMachine,
}

impl TreatmentService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self {
            store,
            state_machine: AppointmentStateMachine::new(),
        }
    }

    /// 医生登记诊疗结果
    ///
    /// 预约必须存在且属于请求医生本人，否则分别返回NotFound与Unauthorized，
    /// 拒绝时不做任何写入。
    pub async fn update_treatment(
        &self,
        actor: &Account,
        appointment_id: Uuid,
        diagnosis: &str,
        prescription: &str,
    ) -> Result<Appointment> {
        actor.require_role(UserRole::Doctor)?;

        let doctor = self
            .store
            .find_doctor_by_account_id(&actor.id)
            .await?
            .ok_or_else(|| {
                HmsError::NotFound(format!("doctor profile for account {}", actor.id))
            })?;

        let appointment = self
            .store
            .find_appointment_by_id(&appointment_id)
            .await?
            .ok_or_else(|| HmsError::NotFound(format!("appointment {}", appointment_id)))?;

        if appointment.doctor_id != doctor.id {
            return Err(HmsError::Unauthorized(
                "appointment belongs to another doctor".to_string(),
            ));
        }

        let next = self
            .state_machine
            .transition(&appointment.status, &AppointmentEvent::TreatmentRecorded)?;

        let updated = self
            .store
            .update_treatment(&appointment_id, diagnosis, prescription, next)
            .await?;

        info!(
            "Treatment recorded: appointment={} doctor={}",
            updated.id, doctor.id
        );
        Ok(updated)
    }
}
