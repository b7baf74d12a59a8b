//! 预约状态机
//!
//! 管理预约记录的生命周期状态转换

use hms_core::{AppointmentStatus, HmsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 预约状态转换事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentEvent {
    /// 医生登记诊疗结果
    TreatmentRecorded,
    /// 预约取消（声明的状态，当前没有触发它的对外操作）
    Cancelled,
}

/// 预约状态机
#[derive(Debug)]
pub struct AppointmentStateMachine {
    transitions: HashMap<(AppointmentStatus, AppointmentEvent), AppointmentStatus>,
}

impl AppointmentStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 定义状态转换规则
        transitions.insert(
            (AppointmentStatus::Booked, AppointmentEvent::TreatmentRecorded),
            AppointmentStatus::Completed,
        );
        // 已完成的预约允许医生修订诊疗记录
        transitions.insert(
            (AppointmentStatus::Completed, AppointmentEvent::TreatmentRecorded),
            AppointmentStatus::Completed,
        );
        transitions.insert(
            (AppointmentStatus::Booked, AppointmentEvent::Cancelled),
            AppointmentStatus::Cancelled,
        );

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &AppointmentStatus, event: &AppointmentEvent) -> bool {
        self.transitions.contains_key(&(from.clone(), event.clone()))
    }

    /// 执行状态转换
    pub fn transition(
        &self,
        from: &AppointmentStatus,
        event: &AppointmentEvent,
    ) -> Result<AppointmentStatus> {
        match self.transitions.get(&(from.clone(), event.clone())) {
            Some(to) => Ok(to.clone()),
            None => Err(HmsError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }
}

impl Default for AppointmentStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let sm = AppointmentStateMachine::new();

        // 测试有效转换
        assert!(sm.can_transition(&AppointmentStatus::Booked, &AppointmentEvent::TreatmentRecorded));
        assert!(sm.can_transition(
            &AppointmentStatus::Completed,
            &AppointmentEvent::TreatmentRecorded
        ));
        assert!(sm.can_transition(&AppointmentStatus::Booked, &AppointmentEvent::Cancelled));
    }

    #[test]
    fn test_invalid_transitions() {
        let sm = AppointmentStateMachine::new();

        // 测试无效转换
        assert!(!sm.can_transition(
            &AppointmentStatus::Cancelled,
            &AppointmentEvent::TreatmentRecorded
        ));
        assert!(!sm.can_transition(&AppointmentStatus::Completed, &AppointmentEvent::Cancelled));
    }

    #[test]
    fn test_state_execution() {
        let sm = AppointmentStateMachine::new();

        let result = sm.transition(
            &AppointmentStatus::Booked,
            &AppointmentEvent::TreatmentRecorded,
        );
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), AppointmentStatus::Completed);

        let result = sm.transition(
            &AppointmentStatus::Cancelled,
            &AppointmentEvent::TreatmentRecorded,
        );
        assert!(result.is_err());
    }
}
