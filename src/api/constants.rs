//! API 模块常量定义

/// Admin access token cookie
pub const ACCESS_COOKIE_NAME: &str = "mflix_admin_access";

/// Redirect position used when a download source opens externally
pub const DOWNLOAD_CTA_POSITION: &str = "download_cta_1";

/// Ad position rendered on the interstitial page
pub const INTERSTITIAL_AD_POSITION: &str = "interstitial";
