//! CSV 批量导入解析
//!
//! Turns an uploaded CSV (header on line 1) into validated content rows.
//! Row numbers are 1-based file line numbers, so the first data row is
//! `Row 2`.

use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;

use crate::errors::{MflixError, Result};
use crate::storage::{ContentType, NewContent, NewDownloadLink};
use crate::utils::url_validator::validate_url;

/// Column layout of the import template
pub const CSV_COLUMNS: &[&str] = &[
    "title",
    "content_type",
    "description",
    "release_year",
    "rating",
    "genre",
    "country",
    "poster_url",
    "backdrop_url",
    "duration_minutes",
    "is_featured",
    "download_quality",
    "download_url",
    "download_size",
];

/// One raw line; every column is optional text until validated
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvContentRow {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub release_year: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<String>,
    #[serde(default)]
    pub is_featured: Option<String>,
    #[serde(default)]
    pub download_quality: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub download_size: Option<String>,
}

/// A row ready to be written: the content plus its optional download link
#[derive(Debug, Clone)]
pub struct ValidContentRow {
    pub content: NewContent,
    pub link: Option<NewDownloadLink>,
}

/// Outcome of parsing one data line
#[derive(Debug, Clone)]
pub struct ParsedCsvRow {
    pub row_num: usize,
    pub result: std::result::Result<ValidContentRow, String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number<T: FromStr>(
    row_num: usize,
    column: &str,
    value: &Option<String>,
) -> std::result::Result<Option<T>, String> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Row {}: Invalid {} '{}'", row_num, column, raw)),
    }
}

fn parse_flag(value: &Option<String>) -> bool {
    matches!(
        non_empty(value).map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "yes" | "y")
    )
}

impl CsvContentRow {
    /// 校验单行，错误信息带行号
    pub fn validate(&self, row_num: usize) -> std::result::Result<ValidContentRow, String> {
        let (Some(title), Some(raw_type)) = (non_empty(&self.title), non_empty(&self.content_type))
        else {
            return Err(format!(
                "Row {}: Title and content_type are required",
                row_num
            ));
        };

        let content_type = ContentType::from_str(raw_type)
            .map_err(|_| format!("Row {}: Invalid content_type '{}'", row_num, raw_type))?;

        let rating: Option<f64> = parse_number(row_num, "rating", &self.rating)?;
        if let Some(r) = rating
            && !(0.0..=10.0).contains(&r)
        {
            return Err(format!("Row {}: rating must be between 0 and 10", row_num));
        }

        let content = NewContent {
            title: title.to_string(),
            description: non_empty(&self.description).map(String::from),
            content_type,
            release_year: parse_number(row_num, "release_year", &self.release_year)?,
            rating,
            genre: non_empty(&self.genre).map(String::from),
            country: non_empty(&self.country).map(String::from),
            poster_url: non_empty(&self.poster_url).map(String::from),
            backdrop_url: non_empty(&self.backdrop_url).map(String::from),
            duration_minutes: parse_number(row_num, "duration_minutes", &self.duration_minutes)?,
            is_featured: parse_flag(&self.is_featured),
        };

        let link = match non_empty(&self.download_url) {
            None => None,
            Some(url) => {
                validate_url(url)
                    .map_err(|e| format!("Row {}: Invalid download_url: {}", row_num, e))?;
                let quality = non_empty(&self.download_quality).ok_or_else(|| {
                    format!(
                        "Row {}: download_quality is required with download_url",
                        row_num
                    )
                })?;
                Some(NewDownloadLink {
                    quality: quality.to_string(),
                    file_size: non_empty(&self.download_size).map(String::from),
                    source_type: Default::default(),
                    url: url.to_string(),
                    mirrors: Vec::new(),
                })
            }
        };

        Ok(ValidContentRow { content, link })
    }
}

/// 解析整个 CSV 文件；只有表头本身损坏才返回 Err
pub fn parse_content_csv(data: &[u8]) -> Result<Vec<ParsedCsvRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| MflixError::import(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
        .collect();

    if !headers.iter().any(|h| h == "title") || !headers.iter().any(|h| h == "content_type") {
        return Err(MflixError::import(
            "CSV header must contain 'title' and 'content_type' columns",
        ));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let fallback_row = idx + 2;
        let parsed = match record {
            Ok(record) => {
                let row_num = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_row);
                let result = record
                    .deserialize::<CsvContentRow>(Some(&headers))
                    .map_err(|e| format!("Row {}: CSV parse error: {}", row_num, e))
                    .and_then(|row| row.validate(row_num));
                ParsedCsvRow { row_num, result }
            }
            Err(e) => {
                let row_num = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_row);
                ParsedCsvRow {
                    row_num,
                    result: Err(format!("Row {}: CSV parse error: {}", row_num, e)),
                }
            }
        };
        rows.push(parsed);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "title,content_type,description,release_year,rating,genre,country,poster_url,backdrop_url,duration_minutes,is_featured,download_quality,download_url,download_size";

    #[test]
    fn test_missing_title_or_type_message() {
        let csv = format!(
            "{}\n,movie,,,,,,,,,,,,\nInception,,,,,,,,,,,,,\n",
            HEADER
        );
        let rows = parse_content_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].result.as_ref().unwrap_err(),
            "Row 2: Title and content_type are required"
        );
        assert_eq!(
            rows[1].result.as_ref().unwrap_err(),
            "Row 3: Title and content_type are required"
        );
    }

    #[test]
    fn test_valid_row_with_link() {
        let csv = format!(
            "{}\nInception,Movie,Dreams,2010,8.8,\"Sci-Fi,Action\",USA,,,148,yes,1080p,https://cdn.example.com/inception.mkv,2.1 GB\n",
            HEADER
        );
        let rows = parse_content_csv(csv.as_bytes()).unwrap();
        let row = rows[0].result.as_ref().unwrap();
        assert_eq!(row.content.title, "Inception");
        assert_eq!(row.content.content_type, ContentType::Movie);
        assert_eq!(row.content.release_year, Some(2010));
        assert_eq!(row.content.genre.as_deref(), Some("Sci-Fi,Action"));
        assert!(row.content.is_featured);
        let link = row.link.as_ref().unwrap();
        assert_eq!(link.quality, "1080p");
        assert_eq!(link.file_size.as_deref(), Some("2.1 GB"));
    }

    #[test]
    fn test_invalid_values() {
        let csv = format!(
            "{}\nX,documentary,,,,,,,,,,,,\nY,movie,,soon,,,,,,,,,,\nZ,anime,,,,,,,,,,720p,ftp://bad,\n",
            HEADER
        );
        let rows = parse_content_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            rows[0].result.as_ref().unwrap_err(),
            "Row 2: Invalid content_type 'documentary'"
        );
        assert_eq!(
            rows[1].result.as_ref().unwrap_err(),
            "Row 3: Invalid release_year 'soon'"
        );
        assert!(
            rows[2]
                .result
                .as_ref()
                .unwrap_err()
                .starts_with("Row 4: Invalid download_url")
        );
    }

    #[test]
    fn test_short_rows_and_header_case() {
        let csv = "Title,Content_Type\nDune,series\n";
        let rows = parse_content_csv(csv.as_bytes()).unwrap();
        let row = rows[0].result.as_ref().unwrap();
        assert_eq!(row.content.content_type, ContentType::Series);
        assert!(row.link.is_none());
    }

    #[test]
    fn test_header_without_required_columns() {
        assert!(parse_content_csv(b"name,kind\nx,y\n").is_err());
    }
}
