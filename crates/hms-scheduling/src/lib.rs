//! # HMS调度模块
//!
//! 提供预约时段管理功能，包括：
//! - 预约服务：时段唯一性检查与预约创建
//! - 诊疗登记：医生写入诊断与处方
//! - 预约状态机：管理预约记录的生命周期状态转换

pub mod booking;
pub mod state_machine;
pub mod treatment;

// 重新导出主要类型
pub use booking::BookingService;
pub use state_machine::{AppointmentEvent, AppointmentStateMachine};
pub use treatment::TreatmentService;
