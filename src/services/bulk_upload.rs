//! CSV bulk import of catalog content
//!
//! Each valid row (content plus optional download link) is written in its
//! own transaction; an invalid row is reported and writes nothing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{MflixError, Result};
use crate::storage::SeaOrmStorage;
use crate::utils::csv_handler::parse_content_csv;

/// 上传文件大小上限（10MB）
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkUploadReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

pub struct BulkUploadService {
    storage: Arc<SeaOrmStorage>,
}

impl BulkUploadService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn import_csv(&self, data: &[u8]) -> Result<BulkUploadReport> {
        if data.len() > MAX_IMPORT_BYTES {
            return Err(MflixError::import(format!(
                "File too large: {} bytes (max {} bytes)",
                data.len(),
                MAX_IMPORT_BYTES
            )));
        }

        let rows = parse_content_csv(data)?;
        let mut report = BulkUploadReport {
            total: rows.len(),
            ..Default::default()
        };

        for row in rows {
            let valid = match row.result {
                Ok(valid) => valid,
                Err(message) => {
                    report.failed += 1;
                    report.errors.push(message);
                    continue;
                }
            };

            let links = valid.link.as_slice();
            match self
                .storage
                .create_content(&valid.content, links, None)
                .await
            {
                Ok(_) => report.success += 1,
                Err(e) => {
                    warn!("CSV row {} failed to insert: {}", row.row_num, e);
                    report.failed += 1;
                    report
                        .errors
                        .push(format!("Row {}: {}", row.row_num, e.message()));
                }
            }
        }

        info!(
            "CSV import finished: total={}, success={}, failed={}",
            report.total, report.success, report.failed
        );
        Ok(report)
    }
}
