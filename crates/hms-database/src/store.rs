//! 存储接口定义
//!
//! 按实体划分的仓储接口。账户与档案的创建要求在单个事务内完成，
//! 预约创建要求存储层自身保证时段唯一。

use async_trait::async_trait;
use hms_core::{
    Account, Appointment, AppointmentStatus, DoctorProfile, PatientProfile, Result, Slot, UserRole,
};
use uuid::Uuid;

/// 新建账户参数
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// 新建医生档案参数
#[derive(Debug, Clone)]
pub struct NewDoctorProfile {
    pub id: Uuid,
    pub full_name: String,
    pub specialization: String,
}

/// 新建患者档案参数
#[derive(Debug, Clone)]
pub struct NewPatientProfile {
    pub id: Uuid,
    pub full_name: String,
    pub age: Option<i32>,
    pub contact: Option<String>,
}

/// 新建预约参数
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
}

/// 账户存储接口
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account_by_id(&self, id: &Uuid) -> Result<Option<Account>>;

    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// 是否已存在管理员账户（启动引导用）
    async fn admin_exists(&self) -> Result<bool>;

    /// 创建不带档案的账户（仅用于管理员引导）
    async fn create_account(&self, account: &NewAccount) -> Result<Account>;

    /// 在单个事务中创建患者账户与患者档案
    async fn create_patient_account(
        &self,
        account: &NewAccount,
        profile: &NewPatientProfile,
    ) -> Result<Account>;

    /// 在单个事务中创建医生账户与医生档案
    async fn create_doctor_account(
        &self,
        account: &NewAccount,
        profile: &NewDoctorProfile,
    ) -> Result<DoctorProfile>;
}

/// 档案存储接口
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_doctors(&self) -> Result<Vec<DoctorProfile>>;

    async fn list_patients(&self) -> Result<Vec<PatientProfile>>;

    async fn find_doctor_by_id(&self, id: &Uuid) -> Result<Option<DoctorProfile>>;

    async fn find_doctor_by_account_id(&self, account_id: &Uuid) -> Result<Option<DoctorProfile>>;

    async fn find_patient_by_account_id(&self, account_id: &Uuid)
        -> Result<Option<PatientProfile>>;
}

/// 预约存储接口
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_appointment_by_id(&self, id: &Uuid) -> Result<Option<Appointment>>;

    /// 按 (医生, 日期, 时间) 精确匹配查找预约，不论其状态
    async fn find_appointment_by_slot(&self, slot: &Slot) -> Result<Option<Appointment>>;

    /// 创建预约；时段已被占用时返回SlotTaken
    async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Appointment>;

    async fn list_appointments(&self) -> Result<Vec<Appointment>>;

    async fn list_appointments_by_patient(&self, patient_id: &Uuid) -> Result<Vec<Appointment>>;

    async fn list_appointments_by_doctor(&self, doctor_id: &Uuid) -> Result<Vec<Appointment>>;

    /// 写入诊疗结果与新状态，返回更新后的预约
    async fn update_treatment(
        &self,
        id: &Uuid,
        diagnosis: &str,
        prescription: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment>;
}

/// 聚合存储接口，服务层统一依赖此trait对象
pub trait HospitalStore: AccountStore + ProfileStore + AppointmentStore {}

impl<T: AccountStore + ProfileStore + AppointmentStore> HospitalStore for T {}
