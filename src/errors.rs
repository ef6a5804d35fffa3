use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum TokenlinkError {
    Validation(String),
    MissingAuthorization(String),
    InvalidAuthorizationHeader(String),
    InvalidToken(String),
    LinkAlreadyExists(String),
    NotFound(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
}

impl TokenlinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TokenlinkError::Validation(_) => "E001",
            TokenlinkError::MissingAuthorization(_) => "E002",
            TokenlinkError::InvalidAuthorizationHeader(_) => "E003",
            TokenlinkError::InvalidToken(_) => "E004",
            TokenlinkError::LinkAlreadyExists(_) => "E005",
            TokenlinkError::NotFound(_) => "E006",
            TokenlinkError::DatabaseConfig(_) => "E007",
            TokenlinkError::DatabaseConnection(_) => "E008",
            TokenlinkError::DatabaseOperation(_) => "E009",
            TokenlinkError::FileOperation(_) => "E010",
            TokenlinkError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TokenlinkError::Validation(_) => "Validation Error",
            TokenlinkError::MissingAuthorization(_) => "Missing Authorization",
            TokenlinkError::InvalidAuthorizationHeader(_) => "Invalid Authorization Header",
            TokenlinkError::InvalidToken(_) => "Invalid Token",
            TokenlinkError::LinkAlreadyExists(_) => "Link Already Exists",
            TokenlinkError::NotFound(_) => "Resource Not Found",
            TokenlinkError::DatabaseConfig(_) => "Database Configuration Error",
            TokenlinkError::DatabaseConnection(_) => "Database Connection Error",
            TokenlinkError::DatabaseOperation(_) => "Database Operation Error",
            TokenlinkError::FileOperation(_) => "File Operation Error",
            TokenlinkError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TokenlinkError::Validation(msg)
            | TokenlinkError::MissingAuthorization(msg)
            | TokenlinkError::InvalidAuthorizationHeader(msg)
            | TokenlinkError::InvalidToken(msg)
            | TokenlinkError::LinkAlreadyExists(msg)
            | TokenlinkError::NotFound(msg)
            | TokenlinkError::DatabaseConfig(msg)
            | TokenlinkError::DatabaseConnection(msg)
            | TokenlinkError::DatabaseOperation(msg)
            | TokenlinkError::FileOperation(msg)
            | TokenlinkError::Serialization(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            TokenlinkError::Validation(_) | TokenlinkError::InvalidAuthorizationHeader(_) => {
                StatusCode::BAD_REQUEST
            }
            TokenlinkError::MissingAuthorization(_) | TokenlinkError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            TokenlinkError::LinkAlreadyExists(_) => StatusCode::CONFLICT,
            TokenlinkError::NotFound(_) => StatusCode::NOT_FOUND,
            TokenlinkError::DatabaseConfig(_)
            | TokenlinkError::DatabaseConnection(_)
            | TokenlinkError::DatabaseOperation(_)
            | TokenlinkError::FileOperation(_)
            | TokenlinkError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为存储层/内部错误（详情只写日志，不返回给调用方）
    pub fn is_internal(&self) -> bool {
        self.http_status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// 格式化为彩色输出（用于启动失败提示）
    #[cfg(feature = "server")]
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

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TokenlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TokenlinkError {}

// 便捷的构造函数
impl TokenlinkError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::Validation(msg.into())
    }

    pub fn missing_authorization<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::MissingAuthorization(msg.into())
    }

    pub fn invalid_authorization_header<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::InvalidAuthorizationHeader(msg.into())
    }

    pub fn invalid_token<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::InvalidToken(msg.into())
    }

    pub fn link_already_exists<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::LinkAlreadyExists(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::NotFound(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TokenlinkError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for TokenlinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        TokenlinkError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for TokenlinkError {
    fn from(err: std::io::Error) -> Self {
        TokenlinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TokenlinkError {
    fn from(err: serde_json::Error) -> Self {
        TokenlinkError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TokenlinkError>;
