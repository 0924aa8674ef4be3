//! Admin API CSV 批量导入

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{Responder, Result as ActixResult, web};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

use crate::services::BulkUploadService;
use crate::services::bulk_upload::MAX_IMPORT_BYTES;

use super::error_code::{ErrorCode, ErrorScope};
use super::helpers::{api_result_in, error_response};

/// POST /contents/import，multipart 字段 `file`
pub async fn import_contents(
    mut payload: Multipart,
    uploader: web::Data<Arc<BulkUploadService>>,
) -> ActixResult<impl Responder> {
    info!("Admin API: bulk content import request");

    let mut csv_data: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    &format!("Invalid multipart data: {}", e),
                ));
            }
        };

        if field.name() != Some("file") {
            // 忽略未知字段
            while let Some(_chunk) = field.next().await {}
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => {
                    if data.len() + bytes.len() > MAX_IMPORT_BYTES {
                        return Ok(error_response(
                            StatusCode::PAYLOAD_TOO_LARGE,
                            ErrorCode::FileTooLarge,
                            &format!(
                                "File size exceeds maximum {} MB",
                                MAX_IMPORT_BYTES / 1024 / 1024
                            ),
                        ));
                    }
                    data.extend_from_slice(&bytes);
                }
                Err(e) => {
                    error!("Failed to read file chunk: {}", e);
                    return Ok(error_response(
                        StatusCode::BAD_REQUEST,
                        ErrorCode::FileReadError,
                        &format!("Failed to read file: {}", e),
                    ));
                }
            }
        }
        csv_data = Some(data);
    }

    let csv_data = match csv_data {
        Some(data) if !data.is_empty() => data,
        _ => {
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::CsvFileMissing,
                "No CSV file provided",
            ));
        }
    };

    info!("Admin API: importing CSV of {} bytes", csv_data.len());
    Ok(api_result_in(
        uploader.import_csv(&csv_data).await,
        ErrorScope::Import,
    ))
}
