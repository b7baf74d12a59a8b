//! 通用工具函数

/// 验证用户名格式
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 150
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-')
}

/// 规整时段值，预约的日期和时间按规整后的字符串精确比较
pub fn normalize_slot_value(value: &str) -> String {
    value.trim().to_string()
}
