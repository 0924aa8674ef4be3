//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::MflixError;

/// API 错误码
///
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 内容错误
/// - 4000-4099: 导入错误
/// - 5000-5099: 广告 / 跳转链接错误
/// - 6000-6099: 下载门 / 问答门错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    FileTooLarge = 1011,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,

    // 内容错误 3000-3099
    ContentNotFound = 3000,
    ContentInvalid = 3001,
    EpisodeNotFound = 3002,
    ReferenceConflict = 3003,

    // 导入错误 4000-4099
    ImportFailed = 4000,
    InvalidMultipartData = 4002,
    FileReadError = 4003,
    CsvFileMissing = 4004,

    // 广告错误 5000-5099
    AdNotFound = 5000,
    AdInvalid = 5001,
    RedirectLimitReached = 5002,

    // 门控错误 6000-6099
    GateLocked = 6000,
    QualityUnavailable = 6001,
    SourceNotFound = 6002,
    QuizInvalidState = 6003,
    QuizNotStarted = 6004,
    InvalidRedirectTarget = 6005,
}

/// Which endpoint family an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    Generic,
    Content,
    Episode,
    Reference,
    Import,
    Ads,
    Gate,
}

impl ErrorCode {
    pub fn for_error(err: &MflixError, scope: ErrorScope) -> Self {
        match (err, scope) {
            (MflixError::NotFound(_), ErrorScope::Content) => ErrorCode::ContentNotFound,
            (MflixError::NotFound(_), ErrorScope::Episode) => ErrorCode::EpisodeNotFound,
            (MflixError::NotFound(_), ErrorScope::Ads) => ErrorCode::AdNotFound,
            (MflixError::NotFound(_), ErrorScope::Gate) => ErrorCode::ContentNotFound,
            (MflixError::NotFound(_), _) => ErrorCode::NotFound,

            (MflixError::Validation(_), ErrorScope::Content | ErrorScope::Episode) => {
                ErrorCode::ContentInvalid
            }
            (MflixError::Validation(_), ErrorScope::Ads) => ErrorCode::AdInvalid,
            (MflixError::Validation(_), _) => ErrorCode::BadRequest,

            (MflixError::Conflict(_), ErrorScope::Ads) => ErrorCode::RedirectLimitReached,
            (MflixError::Conflict(_), ErrorScope::Reference) => ErrorCode::ReferenceConflict,
            (MflixError::Conflict(_), _) => ErrorCode::Conflict,

            (MflixError::Unauthorized(_), _) => ErrorCode::Unauthorized,
            (MflixError::Import(_), _) => ErrorCode::ImportFailed,
            (MflixError::Gate(_), _) => ErrorCode::GateLocked,
            (MflixError::DatabaseConnection(_), _) => ErrorCode::ServiceUnavailable,
            _ => ErrorCode::InternalServerError,
        }
    }
}

impl From<&MflixError> for ErrorCode {
    fn from(err: &MflixError) -> Self {
        ErrorCode::for_error(err, ErrorScope::Generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::RedirectLimitReached).unwrap(),
            "5002"
        );
    }

    #[test]
    fn test_scoped_mapping() {
        let missing = MflixError::not_found("x");
        assert_eq!(
            ErrorCode::for_error(&missing, ErrorScope::Content),
            ErrorCode::ContentNotFound
        );
        assert_eq!(ErrorCode::from(&missing), ErrorCode::NotFound);

        let full = MflixError::conflict("too many");
        assert_eq!(
            ErrorCode::for_error(&full, ErrorScope::Ads),
            ErrorCode::RedirectLimitReached
        );
        assert_eq!(
            ErrorCode::from(&MflixError::database_operation("boom")),
            ErrorCode::InternalServerError
        );
    }
}
