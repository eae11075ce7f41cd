//! 价格与折扣计算

/// 折扣百分比，四舍五入；原价不大于 0 时为 0
pub fn calculate_discount(original: f64, current: f64) -> i32 {
    if original <= 0.0 {
        return 0;
    }
    (((original - current) / original) * 100.0).round() as i32
}

/// 货币符号 + 两位小数以内的价格
pub fn format_price(amount: f64, currency: &str) -> String {
    let symbol = match currency.to_ascii_uppercase().as_str() {
        "INR" => "₹",
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        _ => "",
    };
    let rounded = (amount * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", symbol, rounded as i64)
    } else {
        format!("{}{:.2}", symbol, rounded)
    }
}

/// 价格变化百分比（旧价为 0 时视为 100%）
pub fn change_percent(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        return if new == 0.0 { 0.0 } else { 100.0 };
    }
    ((new - old) / old * 100.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_discount() {
        assert_eq!(calculate_discount(1000.0, 750.0), 25);
        assert_eq!(calculate_discount(999.0, 666.0), 33);
        assert_eq!(calculate_discount(0.0, 10.0), 0);
        assert_eq!(calculate_discount(-5.0, 10.0), 0);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(499.0, "INR"), "₹499");
        assert_eq!(format_price(19.5, "usd"), "$19.50");
        assert_eq!(format_price(7.0, "JPY"), "7");
    }

    #[test]
    fn test_change_percent() {
        assert_eq!(change_percent(100.0, 90.0), 10.0);
        assert_eq!(change_percent(0.0, 5.0), 100.0);
        assert_eq!(change_percent(0.0, 0.0), 0.0);
    }
}
