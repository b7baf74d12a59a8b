//! 数据库查询操作

use crate::connection::DatabasePool;
use crate::models::*;
use crate::store::{
    AccountStore, AppointmentStore, NewAccount, NewAppointment, NewDoctorProfile,
    NewPatientProfile, ProfileStore,
};
use async_trait::async_trait;
use hms_core::{
    Account, Appointment, AppointmentStatus, DoctorProfile, HmsError, PatientProfile, Result, Slot,
};
use uuid::Uuid;

/// PostgreSQL唯一约束冲突的错误码
const PG_UNIQUE_VIOLATION: &str = "23505";

/// 将唯一约束冲突映射为领域错误，其余情况归入数据库错误
fn map_unique_violation<F>(e: sqlx::Error, conflict: F) -> HmsError
where
    F: FnOnce() -> HmsError,
{
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(PG_UNIQUE_VIOLATION) => {
            conflict()
        }
        _ => HmsError::Database(e.to_string()),
    }
}

/// PostgreSQL存储实现
#[derive(Debug, Clone)]
pub struct PgHospitalStore {
    pool: DatabasePool,
}

impl PgHospitalStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 创建账户表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY,
                username VARCHAR(150) UNIQUE NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| HmsError::Database(e.to_string()))?;

        // 创建医生档案表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS doctors (
                id UUID PRIMARY KEY,
                account_id UUID UNIQUE NOT NULL REFERENCES accounts(id),
                full_name VARCHAR(150) NOT NULL,
                specialization VARCHAR(100) NOT NULL,
                is_available BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| HmsError::Database(e.to_string()))?;

        // 创建患者档案表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS patients (
                id UUID PRIMARY KEY,
                account_id UUID UNIQUE NOT NULL REFERENCES accounts(id),
                full_name VARCHAR(150) NOT NULL,
                age INTEGER,
                contact VARCHAR(50),
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| HmsError::Database(e.to_string()))?;

        // 创建预约表，(doctor_id, date, time) 唯一约束保证并发预约下时段不重复
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id UUID PRIMARY KEY,
                patient_id UUID NOT NULL REFERENCES patients(id),
                doctor_id UUID NOT NULL REFERENCES doctors(id),
                date VARCHAR(50) NOT NULL,
                time VARCHAR(50) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'BOOKED',
                diagnosis TEXT,
                prescription TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                UNIQUE (doctor_id, date, time)
            )
        "#).execute(pool).await.map_err(|e| HmsError::Database(e.to_string()))?;

        // 创建索引以优化查询性能
        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        let indexes = vec![
            "CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username)",
            "CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts(role)",
            "CREATE INDEX IF NOT EXISTS idx_doctors_account_id ON doctors(account_id)",
            "CREATE INDEX IF NOT EXISTS idx_patients_account_id ON patients(account_id)",
            "CREATE INDEX IF NOT EXISTS idx_appointments_patient_id ON appointments(patient_id)",
            "CREATE INDEX IF NOT EXISTS idx_appointments_doctor_id ON appointments(doctor_id)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| HmsError::Database(e.to_string()))?;
        }

        tracing::info!("Database indexes created successfully");
        Ok(())
    }
}

// ========== 账户相关操作 ==========

#[async_trait]
impl AccountStore for PgHospitalStore {
    async fn find_account_by_id(&self, id: &Uuid) -> Result<Option<Account>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbAccount>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(Account::from))
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbAccount>("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(Account::from))
    }

    async fn admin_exists(&self) -> Result<bool> {
        let pool = self.pool.pool();

        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE role = 'admin')",
        )
        .fetch_one(pool)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let pool = self.pool.pool();
        let username = account.username.clone();

        let result = sqlx::query_as::<_, DbAccount>(r#"
            INSERT INTO accounts (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#)
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.to_string())
        .fetch_one(pool)
        .await
        .map_err(|e| map_unique_violation(e, || HmsError::DuplicateUsername(username)))?;

        Ok(result.into())
    }

    async fn create_patient_account(
        &self,
        account: &NewAccount,
        profile: &NewPatientProfile,
    ) -> Result<Account> {
        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;
        let username = account.username.clone();

        let db_account = sqlx::query_as::<_, DbAccount>(r#"
            INSERT INTO accounts (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#)
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || HmsError::DuplicateUsername(username)))?;

        sqlx::query(r#"
            INSERT INTO patients (id, account_id, full_name, age, contact)
            VALUES ($1, $2, $3, $4, $5)
        "#)
        .bind(profile.id)
        .bind(account.id)
        .bind(&profile.full_name)
        .bind(profile.age)
        .bind(&profile.contact)
        .execute(&mut *tx)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(db_account.into())
    }

    async fn create_doctor_account(
        &self,
        account: &NewAccount,
        profile: &NewDoctorProfile,
    ) -> Result<DoctorProfile> {
        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;
        let username = account.username.clone();

        sqlx::query(r#"
            INSERT INTO accounts (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
        "#)
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || HmsError::DuplicateUsername(username)))?;

        let db_doctor = sqlx::query_as::<_, DbDoctorProfile>(r#"
            INSERT INTO doctors (id, account_id, full_name, specialization)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#)
        .bind(profile.id)
        .bind(account.id)
        .bind(&profile.full_name)
        .bind(&profile.specialization)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(db_doctor.into())
    }
}

// ========== 档案相关操作 ==========

#[async_trait]
impl ProfileStore for PgHospitalStore {
    async fn list_doctors(&self) -> Result<Vec<DoctorProfile>> {
        let pool = self.pool.pool();

        let results =
            sqlx::query_as::<_, DbDoctorProfile>("SELECT * FROM doctors ORDER BY created_at, id")
                .fetch_all(pool)
                .await
                .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(DoctorProfile::from).collect())
    }

    async fn list_patients(&self) -> Result<Vec<PatientProfile>> {
        let pool = self.pool.pool();

        let results =
            sqlx::query_as::<_, DbPatientProfile>("SELECT * FROM patients ORDER BY created_at, id")
                .fetch_all(pool)
                .await
                .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(PatientProfile::from).collect())
    }

    async fn find_doctor_by_id(&self, id: &Uuid) -> Result<Option<DoctorProfile>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbDoctorProfile>("SELECT * FROM doctors WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(DoctorProfile::from))
    }

    async fn find_doctor_by_account_id(&self, account_id: &Uuid) -> Result<Option<DoctorProfile>> {
        let pool = self.pool.pool();

        let result =
            sqlx::query_as::<_, DbDoctorProfile>("SELECT * FROM doctors WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(pool)
                .await
                .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(DoctorProfile::from))
    }

    async fn find_patient_by_account_id(
        &self,
        account_id: &Uuid,
    ) -> Result<Option<PatientProfile>> {
        let pool = self.pool.pool();

        let result =
            sqlx::query_as::<_, DbPatientProfile>("SELECT * FROM patients WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(pool)
                .await
                .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(PatientProfile::from))
    }
}

// ========== 预约相关操作 ==========

#[async_trait]
impl AppointmentStore for PgHospitalStore {
    async fn find_appointment_by_id(&self, id: &Uuid) -> Result<Option<Appointment>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbAppointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(Appointment::from))
    }

    async fn find_appointment_by_slot(&self, slot: &Slot) -> Result<Option<Appointment>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbAppointment>(
            "SELECT * FROM appointments WHERE doctor_id = $1 AND date = $2 AND time = $3",
        )
        .bind(slot.doctor_id)
        .bind(&slot.date)
        .bind(&slot.time)
        .fetch_optional(pool)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(result.map(Appointment::from))
    }

    async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Appointment> {
        let pool = self.pool.pool();
        let slot = Slot {
            doctor_id: appointment.doctor_id,
            date: appointment.date.clone(),
            time: appointment.time.clone(),
        };

        let result = sqlx::query_as::<_, DbAppointment>(r#"
            INSERT INTO appointments (id, patient_id, doctor_id, date, time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        "#)
        .bind(appointment.id)
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(&appointment.date)
        .bind(&appointment.time)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || HmsError::SlotTaken {
                doctor_id: slot.doctor_id,
                date: slot.date,
                time: slot.time,
            })
        })?;

        Ok(result.into())
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let pool = self.pool.pool();

        let results = sqlx::query_as::<_, DbAppointment>(
            "SELECT * FROM appointments ORDER BY created_at, id",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Appointment::from).collect())
    }

    async fn list_appointments_by_patient(&self, patient_id: &Uuid) -> Result<Vec<Appointment>> {
        let pool = self.pool.pool();

        let results = sqlx::query_as::<_, DbAppointment>(
            "SELECT * FROM appointments WHERE patient_id = $1 ORDER BY created_at, id",
        )
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Appointment::from).collect())
    }

    async fn list_appointments_by_doctor(&self, doctor_id: &Uuid) -> Result<Vec<Appointment>> {
        let pool = self.pool.pool();

        let results = sqlx::query_as::<_, DbAppointment>(
            "SELECT * FROM appointments WHERE doctor_id = $1 ORDER BY created_at, id",
        )
        .bind(doctor_id)
        .fetch_all(pool)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Appointment::from).collect())
    }

    async fn update_treatment(
        &self,
        id: &Uuid,
        diagnosis: &str,
        prescription: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let pool = self.pool.pool();

        let status_str = match status {
            AppointmentStatus::Booked => "BOOKED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        };

        let result = sqlx::query_as::<_, DbAppointment>(r#"
            UPDATE appointments
            SET diagnosis = $1, prescription = $2, status = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
        "#)
        .bind(diagnosis)
        .bind(prescription)
        .bind(status_str)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| HmsError::Database(e.to_string()))?;

        result
            .map(Appointment::from)
            .ok_or_else(|| HmsError::NotFound(format!("appointment {}", id)))
    }
}
