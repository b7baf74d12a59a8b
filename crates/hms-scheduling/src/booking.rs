//! 预约服务
//!
//! 实现唯一的业务不变量：同一 (医生, 日期, 时间) 时段至多存在一条预约。
//! 服务层先做存在性预检查，存储层的唯一约束在并发写入下再次拦截重复时段。

use hms_core::utils::normalize_slot_value;
use hms_core::{Account, Appointment, HmsError, Result, Slot, UserRole};
use hms_database::{AppointmentStore, HospitalStore, NewAppointment, ProfileStore};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 预约服务
pub struct BookingService {
    store: Arc<dyn HospitalStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self { store }
    }

    /// 患者预约医生时段
    ///
    /// 时段为不透明点值，按规整后的字符串精确比较，不做区间推理。
    /// 已存在的预约不论状态如何都使时段视为占用。
    pub async fn book_appointment(
        &self,
        actor: &Account,
        doctor_id: Uuid,
        date: &str,
        time: &str,
    ) -> Result<Appointment> {
        actor.require_role(UserRole::Patient)?;

        let patient = self
            .store
            .find_patient_by_account_id(&actor.id)
            .await?
            .ok_or_else(|| {
                HmsError::NotFound(format!("patient profile for account {}", actor.id))
            })?;
        let doctor = self
            .store
            .find_doctor_by_id(&doctor_id)
            .await?
            .ok_or_else(|| HmsError::NotFound(format!("doctor {}", doctor_id)))?;

        let slot = Slot {
            doctor_id: doctor.id,
            date: normalize_slot_value(date),
            time: normalize_slot_value(time),
        };
        if slot.date.is_empty() || slot.time.is_empty() {
            return Err(HmsError::Validation(
                "date and time must not be empty".to_string(),
            ));
        }

        if self.store.find_appointment_by_slot(&slot).await?.is_some() {
            warn!(
                "Slot already taken: doctor={} date={} time={}",
                slot.doctor_id, slot.date, slot.time
            );
            return Err(HmsError::SlotTaken {
                doctor_id: slot.doctor_id,
                date: slot.date,
                time: slot.time,
            });
        }

        let appointment = self
            .store
            .create_appointment(&NewAppointment {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                doctor_id: doctor.id,
                date: slot.date,
                time: slot.time,
            })
            .await?;

        info!(
            "Appointment booked: patient={} doctor={} {} {}",
            patient.id, doctor.id, appointment.date, appointment.time
        );
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_core::AppointmentStatus;
    use hms_database::{AccountStore, MemoryStore, NewAccount, NewDoctorProfile, NewPatientProfile};

    async fn setup() -> (Arc<dyn HospitalStore>, Account, Uuid) {
        let store: Arc<dyn HospitalStore> = Arc::new(MemoryStore::new());

        let patient_account = store
            .create_patient_account(
                &NewAccount {
                    id: Uuid::new_v4(),
                    username: "alice".to_string(),
                    password_hash: "$argon2id$fake".to_string(),
                    role: UserRole::Patient,
                },
                &NewPatientProfile {
                    id: Uuid::new_v4(),
                    full_name: "Alice A".to_string(),
                    age: Some(30),
                    contact: None,
                },
            )
            .await
            .unwrap();

        let doctor = store
            .create_doctor_account(
                &NewAccount {
                    id: Uuid::new_v4(),
                    username: "drbob".to_string(),
                    password_hash: "$argon2id$fake".to_string(),
                    role: UserRole::Doctor,
                },
                &NewDoctorProfile {
                    id: Uuid::new_v4(),
                    full_name: "Bob B".to_string(),
                    specialization: "Cardiology".to_string(),
                },
            )
            .await
            .unwrap();

        (store, patient_account, doctor.id)
    }

    #[tokio::test]
    async fn test_book_appointment() {
        let (store, patient, doctor_id) = setup().await;
        let service = BookingService::new(store);

        let appointment = service
            .book_appointment(&patient, doctor_id, "2024-05-01", "10:00")
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Booked);
        assert_eq!(appointment.date, "2024-05-01");
        assert!(appointment.diagnosis.is_none());
    }

    #[tokio::test]
    async fn test_double_booking_rejected() {
        let (store, patient, doctor_id) = setup().await;
        let service = BookingService::new(store);

        service
            .book_appointment(&patient, doctor_id, "2024-05-01", "10:00")
            .await
            .unwrap();

        let second = service
            .book_appointment(&patient, doctor_id, "2024-05-01", "10:00")
            .await;
        assert!(matches!(second, Err(HmsError::SlotTaken { .. })));

        // 其他时段不受影响
        let other = service
            .book_appointment(&patient, doctor_id, "2024-05-01", "11:00")
            .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_slot_values_are_normalized() {
        let (store, patient, doctor_id) = setup().await;
        let service = BookingService::new(store);

        service
            .book_appointment(&patient, doctor_id, "2024-05-01", "10:00")
            .await
            .unwrap();

        let padded = service
            .book_appointment(&patient, doctor_id, " 2024-05-01 ", " 10:00 ")
            .await;
        assert!(matches!(padded, Err(HmsError::SlotTaken { .. })));
    }

    #[tokio::test]
    async fn test_booking_requires_patient_role() {
        let (store, _patient, doctor_id) = setup().await;
        let doctor_account = store.find_account_by_username("drbob").await.unwrap().unwrap();
        let service = BookingService::new(store);

        let result = service
            .book_appointment(&doctor_account, doctor_id, "2024-05-01", "10:00")
            .await;
        assert!(matches!(result, Err(HmsError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_booking_unknown_doctor() {
        let (store, patient, _doctor_id) = setup().await;
        let service = BookingService::new(store);

        let result = service
            .book_appointment(&patient, Uuid::new_v4(), "2024-05-01", "10:00")
            .await;
        assert!(matches!(result, Err(HmsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_booking_empty_slot_values() {
        let (store, patient, doctor_id) = setup().await;
        let service = BookingService::new(store);

        let result = service
            .book_appointment(&patient, doctor_id, "  ", "10:00")
            .await;
        assert!(matches!(result, Err(HmsError::Validation(_))));
    }
}
