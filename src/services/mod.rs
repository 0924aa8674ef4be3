//! Service layer for business logic
//!
//! HTTP handlers stay thin; gates, the redirect loop and admin validation
//! live here so they can be exercised without a server.

pub mod admin;
pub mod bulk_upload;
pub mod catalog;
pub mod clock;
pub mod download_gate;
pub mod quiz_gate;
pub mod redirect_loop;

pub use admin::AdminService;
pub use bulk_upload::{BulkUploadReport, BulkUploadService};
pub use catalog::{CatalogService, ContentDetail, ContentPage, QualityGroup};
pub use clock::{Clock, SystemClock};
pub use download_gate::{DownloadGate, DownloadGateService, GateAction, GateError, GateState};
pub use quiz_gate::{QuizGate, QuizGateService, QuizLedger, QuizState};
pub use redirect_loop::{BackNavigation, RedirectLinkSource, RedirectLoopManager};
