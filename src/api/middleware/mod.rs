pub mod auth;
pub mod request_id;
pub mod return_tracker;
pub mod session;

pub use auth::AdminAuth;
pub use request_id::{RequestId, RequestIdMiddleware};
pub use return_tracker::ReturnTracker;
pub use session::SessionMiddleware;
