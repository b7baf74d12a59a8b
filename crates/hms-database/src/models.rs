//! 数据库模型

use chrono::{DateTime, Utc};
use hms_core::models::*;
use sqlx::FromRow;
use uuid::Uuid;

// 数据库表模型 - 使用FromRow trait用于SQL查询

/// 数据库账户表
#[derive(Debug, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String, // 存储为字符串，转换为UserRole枚举
    pub created_at: DateTime<Utc>,
}

impl From<DbAccount> for Account {
    fn from(db_account: DbAccount) -> Self {
        Account {
            id: db_account.id,
            username: db_account.username,
            password_hash: db_account.password_hash,
            role: match db_account.role.as_str() {
                "admin" => UserRole::Admin,
                "doctor" => UserRole::Doctor,
                _ => UserRole::Patient, // 默认角色
            },
            created_at: db_account.created_at,
        }
    }
}

/// 数据库医生档案表
#[derive(Debug, FromRow)]
pub struct DbDoctorProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub full_name: String,
    pub specialization: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbDoctorProfile> for DoctorProfile {
    fn from(db_doctor: DbDoctorProfile) -> Self {
        DoctorProfile {
            id: db_doctor.id,
            account_id: db_doctor.account_id,
            full_name: db_doctor.full_name,
            specialization: db_doctor.specialization,
            is_available: db_doctor.is_available,
            created_at: db_doctor.created_at,
        }
    }
}

/// 数据库患者档案表
#[derive(Debug, FromRow)]
pub struct DbPatientProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub full_name: String,
    pub age: Option<i32>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbPatientProfile> for PatientProfile {
    fn from(db_patient: DbPatientProfile) -> Self {
        PatientProfile {
            id: db_patient.id,
            account_id: db_patient.account_id,
            full_name: db_patient.full_name,
            age: db_patient.age,
            contact: db_patient.contact,
            created_at: db_patient.created_at,
        }
    }
}

/// 数据库预约表
#[derive(Debug, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
    pub status: String, // 存储为字符串，转换为AppointmentStatus枚举
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAppointment> for Appointment {
    fn from(db_appointment: DbAppointment) -> Self {
        Appointment {
            id: db_appointment.id,
            patient_id: db_appointment.patient_id,
            doctor_id: db_appointment.doctor_id,
            date: db_appointment.date,
            time: db_appointment.time,
            status: match db_appointment.status.as_str() {
                "COMPLETED" => AppointmentStatus::Completed,
                "CANCELLED" => AppointmentStatus::Cancelled,
                _ => AppointmentStatus::Booked, // 默认状态
            },
            diagnosis: db_appointment.diagnosis,
            prescription: db_appointment.prescription,
            created_at: db_appointment.created_at,
            updated_at: db_appointment.updated_at,
        }
    }
}
