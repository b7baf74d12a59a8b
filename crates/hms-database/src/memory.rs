//! 内存存储实现
//!
//! 基于进程内HashMap的存储实现，用于测试与演示环境。
//! 与PostgreSQL实现遵守同一套接口契约：用户名唯一、时段唯一、
//! 账户与档案的创建不可分割。

use crate::store::{
    AccountStore, AppointmentStore, NewAccount, NewAppointment, NewDoctorProfile,
    NewPatientProfile, ProfileStore,
};
use async_trait::async_trait;
use chrono::Utc;
use hms_core::{
    Account, Appointment, AppointmentStatus, DoctorProfile, HmsError, PatientProfile, Result,
    Slot, UserRole,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    doctors: HashMap<Uuid, DoctorProfile>,
    patients: HashMap<Uuid, PatientProfile>,
    appointments: HashMap<Uuid, Appointment>,
}

/// 内存存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation<T, F>(items: impl Iterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<Utc>, Uuid),
{
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_id(&self, id: &Uuid) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(id).cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn admin_exists(&self) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .any(|a| a.role == UserRole::Admin))
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let mut state = self.state.write().await;
        if state
            .accounts
            .values()
            .any(|a| a.username == account.username)
        {
            return Err(HmsError::DuplicateUsername(account.username.clone()));
        }

        let created = Account {
            id: account.id,
            username: account.username.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            created_at: Utc::now(),
        };
        state.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_patient_account(
        &self,
        account: &NewAccount,
        profile: &NewPatientProfile,
    ) -> Result<Account> {
        // 单次写锁内完成账户与档案两步写入
        let mut state = self.state.write().await;
        if state
            .accounts
            .values()
            .any(|a| a.username == account.username)
        {
            return Err(HmsError::DuplicateUsername(account.username.clone()));
        }

        let now = Utc::now();
        let created = Account {
            id: account.id,
            username: account.username.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            created_at: now,
        };
        let patient = PatientProfile {
            id: profile.id,
            account_id: account.id,
            full_name: profile.full_name.clone(),
            age: profile.age,
            contact: profile.contact.clone(),
            created_at: now,
        };
        state.accounts.insert(created.id, created.clone());
        state.patients.insert(patient.id, patient);
        Ok(created)
    }

    async fn create_doctor_account(
        &self,
        account: &NewAccount,
        profile: &NewDoctorProfile,
    ) -> Result<DoctorProfile> {
        let mut state = self.state.write().await;
        if state
            .accounts
            .values()
            .any(|a| a.username == account.username)
        {
            return Err(HmsError::DuplicateUsername(account.username.clone()));
        }

        let now = Utc::now();
        let created = Account {
            id: account.id,
            username: account.username.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role,
            created_at: now,
        };
        let doctor = DoctorProfile {
            id: profile.id,
            account_id: account.id,
            full_name: profile.full_name.clone(),
            specialization: profile.specialization.clone(),
            is_available: true,
            created_at: now,
        };
        state.accounts.insert(created.id, created);
        state.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn list_doctors(&self) -> Result<Vec<DoctorProfile>> {
        let state = self.state.read().await;
        Ok(sorted_by_creation(
            state.doctors.values().cloned(),
            |d: &DoctorProfile| (d.created_at, d.id),
        ))
    }

    async fn list_patients(&self) -> Result<Vec<PatientProfile>> {
        let state = self.state.read().await;
        Ok(sorted_by_creation(
            state.patients.values().cloned(),
            |p: &PatientProfile| (p.created_at, p.id),
        ))
    }

    async fn find_doctor_by_id(&self, id: &Uuid) -> Result<Option<DoctorProfile>> {
        let state = self.state.read().await;
        Ok(state.doctors.get(id).cloned())
    }

    async fn find_doctor_by_account_id(&self, account_id: &Uuid) -> Result<Option<DoctorProfile>> {
        let state = self.state.read().await;
        Ok(state
            .doctors
            .values()
            .find(|d| d.account_id == *account_id)
            .cloned())
    }

    async fn find_patient_by_account_id(
        &self,
        account_id: &Uuid,
    ) -> Result<Option<PatientProfile>> {
        let state = self.state.read().await;
        Ok(state
            .patients
            .values()
            .find(|p| p.account_id == *account_id)
            .cloned())
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn find_appointment_by_id(&self, id: &Uuid) -> Result<Option<Appointment>> {
        let state = self.state.read().await;
        Ok(state.appointments.get(id).cloned())
    }

    async fn find_appointment_by_slot(&self, slot: &Slot) -> Result<Option<Appointment>> {
        let state = self.state.read().await;
        Ok(state
            .appointments
            .values()
            .find(|a| a.doctor_id == slot.doctor_id && a.date == slot.date && a.time == slot.time)
            .cloned())
    }

    async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Appointment> {
        // 检查与插入在同一把写锁内完成，时段唯一性不受并发影响
        let mut state = self.state.write().await;
        let taken = state.appointments.values().any(|a| {
            a.doctor_id == appointment.doctor_id
                && a.date == appointment.date
                && a.time == appointment.time
        });
        if taken {
            return Err(HmsError::SlotTaken {
                doctor_id: appointment.doctor_id,
                date: appointment.date.clone(),
                time: appointment.time.clone(),
            });
        }

        let now = Utc::now();
        let created = Appointment {
            id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date.clone(),
            time: appointment.time.clone(),
            status: AppointmentStatus::Booked,
            diagnosis: None,
            prescription: None,
            created_at: now,
            updated_at: now,
        };
        state.appointments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(sorted_by_creation(
            state.appointments.values().cloned(),
            |a: &Appointment| (a.created_at, a.id),
        ))
    }

    async fn list_appointments_by_patient(&self, patient_id: &Uuid) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(sorted_by_creation(
            state
                .appointments
                .values()
                .filter(|a| a.patient_id == *patient_id)
                .cloned(),
            |a: &Appointment| (a.created_at, a.id),
        ))
    }

    async fn list_appointments_by_doctor(&self, doctor_id: &Uuid) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(sorted_by_creation(
            state
                .appointments
                .values()
                .filter(|a| a.doctor_id == *doctor_id)
                .cloned(),
            |a: &Appointment| (a.created_at, a.id),
        ))
    }

    async fn update_treatment(
        &self,
        id: &Uuid,
        diagnosis: &str,
        prescription: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut state = self.state.write().await;
        let appointment = state
            .appointments
            .get_mut(id)
            .ok_or_else(|| HmsError::NotFound(format!("appointment {}", id)))?;

        appointment.diagnosis = Some(diagnosis.to_string());
        appointment.prescription = Some(prescription.to_string());
        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }
}
