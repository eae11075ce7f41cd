pub mod ip;
pub mod pricing;
pub mod slug;
pub mod url_validator;

pub use ip::client_key;
pub use pricing::{calculate_discount, format_price};
pub use slug::slugify;
pub use url_validator::validate_redirect_url;

/// 截取前 `max_chars` 个字符（按 char 边界）
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
