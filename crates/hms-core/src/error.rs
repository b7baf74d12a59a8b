//! 错误定义模块

use thiserror::Error;
use uuid::Uuid;

/// 预约系统统一错误类型
#[derive(Error, Debug)]
pub enum HmsError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("用户名已被占用: {0}")]
    DuplicateUsername(String),

    #[error("用户名或密码错误")]
    InvalidCredentials,

    #[error("未认证或会话已过期")]
    Unauthenticated,

    #[error("权限不足: {0}")]
    Unauthorized(String),

    #[error("该时段已被预约: 医生 {doctor_id} {date} {time}")]
    SlotTaken {
        doctor_id: Uuid,
        date: String,
        time: String,
    },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },
}

/// 预约系统统一结果类型
pub type Result<T> = std::result::Result<T, HmsError>;
