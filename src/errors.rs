use std::fmt;

#[derive(Debug, Clone)]
pub enum DealError {
    Validation(String),
    NotFound(String),
    Upstream(String),
    Unauthorized(String),
    Forbidden(String),
    RateLimited(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    Config(String),
    FileOperation(String),
}

impl DealError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            DealError::Validation(_) => "E001",
            DealError::NotFound(_) => "E002",
            DealError::Upstream(_) => "E003",
            DealError::Unauthorized(_) => "E004",
            DealError::Forbidden(_) => "E005",
            DealError::RateLimited(_) => "E006",
            DealError::DatabaseConfig(_) => "E007",
            DealError::DatabaseConnection(_) => "E008",
            DealError::DatabaseOperation(_) => "E009",
            DealError::Serialization(_) => "E010",
            DealError::Config(_) => "E011",
            DealError::FileOperation(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            DealError::Validation(_) => "Validation Error",
            DealError::NotFound(_) => "Resource Not Found",
            DealError::Upstream(_) => "Upstream Error",
            DealError::Unauthorized(_) => "Unauthorized",
            DealError::Forbidden(_) => "Forbidden",
            DealError::RateLimited(_) => "Rate Limited",
            DealError::DatabaseConfig(_) => "Database Configuration Error",
            DealError::DatabaseConnection(_) => "Database Connection Error",
            DealError::DatabaseOperation(_) => "Database Operation Error",
            DealError::Serialization(_) => "Serialization Error",
            DealError::Config(_) => "Configuration Error",
            DealError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            DealError::Validation(msg)
            | DealError::NotFound(msg)
            | DealError::Upstream(msg)
            | DealError::Unauthorized(msg)
            | DealError::Forbidden(msg)
            | DealError::RateLimited(msg)
            | DealError::DatabaseConfig(msg)
            | DealError::DatabaseConnection(msg)
            | DealError::DatabaseOperation(msg)
            | DealError::Serialization(msg)
            | DealError::Config(msg)
            | DealError::FileOperation(msg) => msg,
        }
    }

    /// HTTP 状态码
    ///
    /// 上游与内部错误统一返回 500，详情只写日志
    pub fn http_status(&self) -> u16 {
        match self {
            DealError::Validation(_) => 400,
            DealError::Unauthorized(_) => 401,
            DealError::Forbidden(_) => 403,
            DealError::NotFound(_) => 404,
            DealError::RateLimited(_) => 429,
            _ => 500,
        }
    }

    /// 是否可以把 message 原样返回给客户端
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for DealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for DealError {}

// 便捷的构造函数
impl DealError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        DealError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        DealError::NotFound(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        DealError::Upstream(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        DealError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        DealError::Forbidden(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        DealError::RateLimited(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        DealError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        DealError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        DealError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        DealError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        DealError::Config(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        DealError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for DealError {
    fn from(err: sea_orm::DbErr) -> Self {
        DealError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for DealError {
    fn from(err: std::io::Error) -> Self {
        DealError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for DealError {
    fn from(err: serde_json::Error) -> Self {
        DealError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for DealError {
    fn from(err: url::ParseError) -> Self {
        DealError::Validation(format!("Invalid URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(DealError::validation("x").http_status(), 400);
        assert_eq!(DealError::unauthorized("x").http_status(), 401);
        assert_eq!(DealError::not_found("x").http_status(), 404);
        assert_eq!(DealError::rate_limited("x").http_status(), 429);
        assert_eq!(DealError::upstream("x").http_status(), 500);
        assert_eq!(DealError::database_operation("x").http_status(), 500);
    }

    #[test]
    fn test_upstream_is_not_client_error() {
        assert!(!DealError::upstream("boom").is_client_error());
        assert!(DealError::not_found("deal").is_client_error());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = DealError::not_found("Deal not found");
        assert_eq!(err.to_string(), "Resource Not Found: Deal not found");
    }

    #[test]
    fn test_from_db_err() {
        let err: DealError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, DealError::DatabaseOperation(_)));
        assert_eq!(err.code(), "E009");
    }
}
