use std::fmt;

#[derive(Debug, Clone)]
pub enum MflixError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    Conflict(String),
    Unauthorized(String),
    Import(String),
    Gate(String),
    SignalOperation(String),
}

impl MflixError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            MflixError::DatabaseConfig(_) => "E001",
            MflixError::DatabaseConnection(_) => "E002",
            MflixError::DatabaseOperation(_) => "E003",
            MflixError::FileOperation(_) => "E004",
            MflixError::Validation(_) => "E005",
            MflixError::NotFound(_) => "E006",
            MflixError::Serialization(_) => "E007",
            MflixError::Conflict(_) => "E008",
            MflixError::Unauthorized(_) => "E009",
            MflixError::Import(_) => "E010",
            MflixError::Gate(_) => "E011",
            MflixError::SignalOperation(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            MflixError::DatabaseConfig(_) => "Database Configuration Error",
            MflixError::DatabaseConnection(_) => "Database Connection Error",
            MflixError::DatabaseOperation(_) => "Database Operation Error",
            MflixError::FileOperation(_) => "File Operation Error",
            MflixError::Validation(_) => "Validation Error",
            MflixError::NotFound(_) => "Resource Not Found",
            MflixError::Serialization(_) => "Serialization Error",
            MflixError::Conflict(_) => "Conflict",
            MflixError::Unauthorized(_) => "Unauthorized",
            MflixError::Import(_) => "Import Error",
            MflixError::Gate(_) => "Gate Error",
            MflixError::SignalOperation(_) => "Signal Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            MflixError::DatabaseConfig(msg)
            | MflixError::DatabaseConnection(msg)
            | MflixError::DatabaseOperation(msg)
            | MflixError::FileOperation(msg)
            | MflixError::Validation(msg)
            | MflixError::NotFound(msg)
            | MflixError::Serialization(msg)
            | MflixError::Conflict(msg)
            | MflixError::Unauthorized(msg)
            | MflixError::Import(msg)
            | MflixError::Gate(msg)
            | MflixError::SignalOperation(msg) => msg,
        }
    }

    /// HTTP status used when the error reaches an API handler
    pub fn http_status(&self) -> u16 {
        match self {
            MflixError::Validation(_) | MflixError::Import(_) => 400,
            MflixError::Unauthorized(_) => 401,
            MflixError::NotFound(_) => 404,
            MflixError::Conflict(_) | MflixError::Gate(_) => 409,
            _ => 500,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for MflixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for MflixError {}

// 便捷的构造函数
impl MflixError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        MflixError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        MflixError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        MflixError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        MflixError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        MflixError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        MflixError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        MflixError::Serialization(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        MflixError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        MflixError::Unauthorized(msg.into())
    }

    pub fn import<T: Into<String>>(msg: T) -> Self {
        MflixError::Import(msg.into())
    }

    pub fn gate<T: Into<String>>(msg: T) -> Self {
        MflixError::Gate(msg.into())
    }

    pub fn signal_operation<T: Into<String>>(msg: T) -> Self {
        MflixError::SignalOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for MflixError {
    fn from(err: sea_orm::DbErr) -> Self {
        MflixError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for MflixError {
    fn from(err: std::io::Error) -> Self {
        MflixError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for MflixError {
    fn from(err: serde_json::Error) -> Self {
        MflixError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for MflixError {
    fn from(err: csv::Error) -> Self {
        MflixError::Import(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for MflixError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        MflixError::Unauthorized(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MflixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(MflixError::validation("x").code(), "E005");
        assert_eq!(MflixError::not_found("x").code(), "E006");
        assert_eq!(MflixError::import("x").code(), "E010");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(MflixError::validation("bad").http_status(), 400);
        assert_eq!(MflixError::unauthorized("no").http_status(), 401);
        assert_eq!(MflixError::not_found("gone").http_status(), 404);
        assert_eq!(MflixError::conflict("dup").http_status(), 409);
        assert_eq!(MflixError::database_operation("boom").http_status(), 500);
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = MflixError::not_found("content 7");
        assert_eq!(err.to_string(), "Resource Not Found: content 7");
    }

    #[test]
    fn test_from_db_err() {
        let err: MflixError = sea_orm::DbErr::Custom("broken".into()).into();
        assert_eq!(err.code(), "E003");
        assert!(err.message().contains("broken"));
    }
}
