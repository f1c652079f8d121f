//! 订单号校验
//!
//! 订单号为纯数字串，并满足 Luhn 校验和。

/// 规范化并校验订单号
///
/// 去除首尾空白后，非空、全为 ASCII 数字且通过 Luhn 校验才返回 `Some`。
pub fn normalize_order_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if luhn_valid(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Luhn 校验
///
/// 从最右一位开始，每隔一位乘 2，乘积大于 9 时减 9，总和能被 10 整除即有效。
/// 空串或包含非数字字符时无效。
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, ch) in digits.bytes().rev().enumerate() {
        if !ch.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(ch - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }

    sum % 10 == 0
}
