//! 金额换算
//!
//! 账本内部一律使用最小货币单位（分）的整数，只有在系统边界才与小数互转。

/// 每个货币单位包含的最小单位数
pub const MINOR_UNITS_PER_UNIT: i64 = 100;

/// 小数金额转换为最小单位（四舍五入）
///
/// 非有限值或超出 i64 范围时返回 `None`。
pub fn to_minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() {
        return None;
    }
    let scaled = (amount * MINOR_UNITS_PER_UNIT as f64).round();
    if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
        return None;
    }
    Some(scaled as i64)
}

/// 最小单位转换为小数金额
pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / MINOR_UNITS_PER_UNIT as f64
}

/// serde 适配：最小单位 <-> JSON 小数
pub mod decimal {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(minor: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(super::from_minor_units(*minor))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        super::to_minor_units(amount).ok_or_else(|| D::Error::custom("金额超出范围"))
    }
}

/// serde 适配：可选金额，`None` 时省略或为 null
pub mod decimal_option {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(minor: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match minor {
            Some(value) => serializer.serialize_some(&super::from_minor_units(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(amount) => super::to_minor_units(amount)
                .map(Some)
                .ok_or_else(|| D::Error::custom("金额超出范围")),
            None => Ok(None),
        }
    }
}
