//! # HMS数据库模块
//!
//! 负责预约系统数据的持久化，提供PostgreSQL连接池、按实体划分的存储接口，
//! 以及PostgreSQL和内存两种存储实现。

pub mod connection;
pub mod memory;
pub mod models;
pub mod queries;
pub mod store;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use queries::PgHospitalStore;
pub use store::{
    AccountStore, AppointmentStore, HospitalStore, NewAccount, NewAppointment, NewDoctorProfile,
    NewPatientProfile, ProfileStore,
};
