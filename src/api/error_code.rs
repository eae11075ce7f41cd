//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::DealError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证与限流
/// - 3000-3099: 优惠与跳转
/// - 4000-4099: 外部集成
/// - 5000-5099: 定时任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 认证与限流 2000-2099
    AuthFailed = 2000,
    RateLimitExceeded = 2004,

    // 优惠与跳转 3000-3099
    DealNotFound = 3000,
    InvalidRedirectUrl = 3002,

    // 外部集成 4000-4099
    UpstreamError = 4000,

    // 定时任务 5000-5099
    InvalidJobAction = 5000,
    JobFailed = 5001,
}

impl From<&DealError> for ErrorCode {
    fn from(err: &DealError) -> Self {
        match err {
            DealError::Validation(_) => ErrorCode::BadRequest,
            DealError::NotFound(_) => ErrorCode::NotFound,
            DealError::Unauthorized(_) => ErrorCode::Unauthorized,
            DealError::Forbidden(_) => ErrorCode::Forbidden,
            DealError::RateLimited(_) => ErrorCode::RateLimitExceeded,
            DealError::Upstream(_) => ErrorCode::UpstreamError,
            DealError::DatabaseConfig(_)
            | DealError::DatabaseConnection(_)
            | DealError::DatabaseOperation(_)
            | DealError::Serialization(_)
            | DealError::Config(_)
            | DealError::FileOperation(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::DealNotFound).unwrap(), "3000");
        assert_eq!(
            serde_json::from_str::<ErrorCode>("2004").unwrap(),
            ErrorCode::RateLimitExceeded
        );
    }

    #[test]
    fn test_error_code_from_deal_error() {
        assert_eq!(
            ErrorCode::from(&DealError::validation("x")),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ErrorCode::from(&DealError::upstream("x")),
            ErrorCode::UpstreamError
        );
        assert_eq!(
            ErrorCode::from(&DealError::database_operation("x")),
            ErrorCode::InternalServerError
        );
    }
}
