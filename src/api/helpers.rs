//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use super::error_code::ErrorCode;
use crate::errors::DealError;

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub code: ErrorCode,
}

/// 构建错误响应
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ErrorBody {
            error: message,
            code,
        })
}

/// 从 DealError 构建错误响应
///
/// 4xx 原样返回 message；5xx 只返回通用描述，详情写日志
pub fn error_from_deal(err: &DealError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = ErrorCode::from(err);

    if err.is_client_error() {
        return error_response(status, code, err.message());
    }

    error!("{}", err.format_simple());
    let message = match err {
        DealError::Upstream(_) => "Upstream service error",
        _ => "Internal server error",
    };
    error_response(status, code, message)
}

/// 成功时 200 + JSON，失败时映射 DealError
pub fn api_result<T: Serialize>(result: Result<T, DealError>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(data),
        Err(e) => error_from_deal(&e),
    }
}
