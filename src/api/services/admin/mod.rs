//! Admin API 服务模块
//!
//! 该模块包含管理 API 的所有端点，包括：
//! - 认证（登录、登出、token 校验）
//! - 内容 / 剧集 CRUD 与 CSV 批量导入
//! - 广告与跳转链接
//! - 类型、国家、站点设置与统计

pub mod ads_crud;
pub mod auth;
mod bulk_upload;
mod content_crud;
pub mod error_code;
mod helpers;
mod reference;
pub mod routes;
mod types;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{
    CookieBuilder, api_result, api_result_in, created_response, error_from_mflix, error_response,
    success_response,
};

// 重新导出错误码
pub use error_code::{ErrorCode, ErrorScope};

pub use auth::{login, logout, verify_token};
pub use bulk_upload::import_contents;
pub use content_crud::{
    create_content, create_episode, delete_content, delete_episode, get_content, list_contents,
    list_episodes, update_content,
};
pub use reference::{
    create_country, create_genre, delete_country, delete_genre, get_stats, list_countries,
    list_genres, put_setting,
};
