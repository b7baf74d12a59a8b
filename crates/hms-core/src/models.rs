//! 核心数据模型定义

use crate::error::{HmsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// 管理员 - 录入医生账户、查看全部数据
    Admin,
    /// 医生 - 查看本人预约、登记诊疗结果
    Doctor,
    /// 患者 - 自助注册、预约医生时段
    Patient,
}

impl ToString for UserRole {
    fn to_string(&self) -> String {
        match self {
            UserRole::Admin => "admin".to_string(),
            UserRole::Doctor => "doctor".to_string(),
            UserRole::Patient => "patient".to_string(),
        }
    }
}

impl UserRole {
    /// 角色登录后对应的看板路径
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            UserRole::Admin => "/admin",
            UserRole::Doctor => "/doctor",
            UserRole::Patient => "/patient",
        }
    }
}

/// 登录账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2id PHC字符串
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// 统一的角色授权检查
    ///
    /// 所有按角色限定的操作在执行任何写入前调用此检查。
    pub fn require_role(&self, required: UserRole) -> Result<&Account> {
        if self.role == required {
            Ok(self)
        } else {
            Err(HmsError::Unauthorized(format!(
                "account {} has role {}, operation requires {}",
                self.username,
                self.role.to_string(),
                required.to_string()
            )))
        }
    }
}

/// 医生档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub account_id: Uuid, // 与账户一对一
    pub full_name: String,
    pub specialization: String, // 专科方向
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// 患者档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub account_id: Uuid, // 与账户一对一
    pub full_name: String,
    pub age: Option<i32>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 预约状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Booked,    // 已预约
    Completed, // 已完成
    Cancelled, // 已取消
}

/// 预约记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid, // 患者档案ID
    pub doctor_id: Uuid,  // 医生档案ID
    pub date: String,     // 不透明时段值，按字符串精确比较
    pub time: String,
    pub status: AppointmentStatus,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 预约时段，(医生, 日期, 时间) 三元组构成唯一键
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_with_role(role: UserRole) -> Account {
        Account {
            id: Uuid::new_v4(),
            username: "tester".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_role_match() {
        let account = account_with_role(UserRole::Admin);
        assert!(account.require_role(UserRole::Admin).is_ok());
    }

    #[test]
    fn test_require_role_mismatch() {
        let account = account_with_role(UserRole::Patient);
        let result = account.require_role(UserRole::Admin);
        assert!(matches!(result, Err(HmsError::Unauthorized(_))));
    }

    #[test]
    fn test_dashboard_path() {
        assert_eq!(UserRole::Admin.dashboard_path(), "/admin");
        assert_eq!(UserRole::Doctor.dashboard_path(), "/doctor");
        assert_eq!(UserRole::Patient.dashboard_path(), "/patient");
    }
}
