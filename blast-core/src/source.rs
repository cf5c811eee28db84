//! Record sources: delimited-text uploads and the JSON feed.
//!
//! # Formats
//!
//! - **Upload** (has headers): first line names the columns, lower-cased and
//!   trimmed before matching. Quoting is not supported, so a literal comma
//!   inside a cell shifts the remaining columns.
//! - **JSON feed**: `{ "data": [ { "mine_name": "...", "date": "..." }, ... ] }`

use crate::error::{Result, SourceError};
use crate::record::{BlastRecord, Field};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[cfg(feature = "api")]
use log::warn;
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};

#[derive(Debug, Deserialize)]
struct RecordDocument {
    data: Vec<Map<String, Value>>,
}

/// Parse an uploaded comma-separated text into records.
///
/// Rejects the whole upload with [`SourceError::NoDataRows`] when there is no
/// line after the header.
///
/// # Example CSV
/// ```text
/// date,mine_name,pit_name,total_cost,cost_per_ton
/// 03/15/2024,North,P1,1200,4.5
/// ```
pub fn parse_upload(text: &str) -> Result<Vec<BlastRecord>> {
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    if lines < 2 {
        return Err(SourceError::NoDataRows { lines });
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let columns: Vec<Option<Field>> = rdr
        .headers()?
        .iter()
        .map(|h| Field::from_key(&h.trim().to_lowercase()))
        .collect();
    debug!(
        "upload: {} of {} columns recognised",
        columns.iter().filter(|c| c.is_some()).count(),
        columns.len()
    );

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        records.push(row_to_record(&columns, &row));
    }
    info!("upload: parsed {} records", records.len());
    Ok(records)
}

/// Read and parse an upload from disk.
pub fn read_upload(path: impl AsRef<Path>) -> Result<Vec<BlastRecord>> {
    let text = std::fs::read_to_string(path)?;
    parse_upload(&text)
}

/// When several columns alias one field, the first non-empty cell wins.
fn row_to_record(columns: &[Option<Field>], row: &StringRecord) -> BlastRecord {
    let mut record = BlastRecord::default();
    for (field, cell) in columns.iter().zip(row.iter()) {
        let Some(field) = field else { continue };
        if record.is_set(*field) {
            if !cell.trim().is_empty() {
                debug!("upload: ignoring duplicate value {:?} for {:?}", cell, field);
            }
            continue;
        }
        record.set_text(*field, cell);
    }
    record
}

/// Parse the JSON feed document into records.
pub fn parse_json_document(body: &str) -> Result<Vec<BlastRecord>> {
    let document: RecordDocument = serde_json::from_str(body)?;
    let records = document
        .data
        .iter()
        .map(|object| {
            let mut record = BlastRecord::default();
            for (key, value) in object {
                if let Some(field) = Field::from_key(key) {
                    record.set_json(field, value);
                }
            }
            record
        })
        .collect::<Vec<BlastRecord>>();
    info!("json: parsed {} records", records.len());
    Ok(records)
}

/// Fetch records from the JSON feed.
///
/// A single attempt is made. Any failure (transport, status, body, parse) is
/// logged and yields an empty data set; the caller decides whether to retry.
#[cfg(feature = "api")]
pub async fn fetch_records(client: &Client, url: &str) -> Vec<BlastRecord> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Request to {} failed: {}", url, e);
            return Vec::new();
        }
    };
    if response.status() != StatusCode::OK {
        warn!("Bad response status from {}: {}", url, response.status());
        return Vec::new();
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read response body from {}: {}", url, e);
            return Vec::new();
        }
    };
    match parse_json_document(&body) {
        Ok(records) => records,
        Err(e) => {
            warn!("Failed to parse records from {}: {}", url, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Measure;

    const UPLOAD: &str = "\
Date , Mine_Name,PIT_NAME,zone_name,bench_name,rock_name,Total_Cost,cost_per_ton,fly_rock,operator
03/15/2024,North,P1,Z1,B10,Granite,1200,4.5,30,alice
15-03-2024,South,P3,Z2,B20,Basalt,,3.2,,bob
";

    #[test]
    fn test_parse_upload() {
        let records = parse_upload(UPLOAD).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date.as_deref(), Some("03/15/2024"));
        assert_eq!(records[0].mine_name.as_deref(), Some("North"));
        assert_eq!(records[0].rock_name.as_deref(), Some("Granite"));
        assert_eq!(records[0].total_cost, Some(1200.0));
        assert_eq!(records[0].measure(Measure::FlyRock), Some(30.0));
        assert_eq!(records[1].total_cost, None);
        assert_eq!(records[1].fly_rock, None);
        assert_eq!(records[1].parsed_date(), records[0].parsed_date());
    }

    #[test]
    fn test_upload_without_rows_is_rejected() {
        let err = parse_upload("date,mine_name,total_cost\n").unwrap_err();
        assert!(matches!(err, SourceError::NoDataRows { lines: 1 }));
        let err = parse_upload("").unwrap_err();
        assert!(matches!(err, SourceError::NoDataRows { lines: 0 }));
    }

    #[test]
    fn test_upload_short_rows() {
        let records = parse_upload("date,mine_name,pit_name\n01/02/2024,North\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mine_name.as_deref(), Some("North"));
        assert_eq!(records[0].pit_name, None);
    }

    #[test]
    fn test_upload_comma_in_cell_misaligns() {
        // No quoting support: the quoted comma splits the cell.
        let records =
            parse_upload("mine_name,pit_name\n\"North, East\",P1\n").unwrap();
        assert_eq!(records[0].mine_name.as_deref(), Some("\"North"));
        assert_eq!(records[0].pit_name.as_deref(), Some("East\""));
    }

    #[test]
    fn test_upload_aliased_columns_keep_first_value() {
        let records = parse_upload("cost,total_cost,mine,mine_name\n100,,,North\n250,300, ,\n").unwrap();
        assert_eq!(records[0].total_cost, Some(100.0));
        assert_eq!(records[0].mine_name.as_deref(), Some("North"));
        assert_eq!(records[1].total_cost, Some(250.0));
        assert_eq!(records[1].mine_name, None);
    }

    #[test]
    fn test_upload_trims_cells() {
        let records = parse_upload("mine_name,pit_name\n North ,  \n").unwrap();
        assert_eq!(records[0].mine_name.as_deref(), Some("North"));
        assert_eq!(records[0].pit_name, None);
    }

    #[cfg(feature = "api")]
    mod fetch {
        use super::super::fetch_records;
        use reqwest::Client;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        fn client() -> Client {
            Client::builder().no_proxy().build().unwrap()
        }

        /// Serve one canned HTTP response on a local port and return its URL.
        async fn serve_once(status: &'static str, body: &'static str) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
            format!("http://{}/", addr)
        }

        #[tokio::test]
        async fn test_fetch_unreachable_host_is_empty() {
            let records = fetch_records(&client(), "http://127.0.0.1:1/").await;
            assert!(records.is_empty());
        }

        #[tokio::test]
        async fn test_fetch_bad_status_is_empty() {
            let url = serve_once("500 Internal Server Error", r#"{"data": []}"#).await;
            let records = fetch_records(&client(), &url).await;
            assert!(records.is_empty());
        }

        #[tokio::test]
        async fn test_fetch_malformed_body_is_empty() {
            let url = serve_once("200 OK", "<html>maintenance</html>").await;
            let records = fetch_records(&client(), &url).await;
            assert!(records.is_empty());
        }

        #[tokio::test]
        async fn test_fetch_records() {
            let url = serve_once(
                "200 OK",
                r#"{"data": [{"date": "15-01-2024", "mine_name": "North", "total_cost": 200}]}"#,
            )
            .await;
            let records = fetch_records(&client(), &url).await;
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].mine_name.as_deref(), Some("North"));
        }
    }

    #[test]
    fn test_parse_json_document() {
        let body = r#"{"data": [
            {"date": "15-01-2024", "mine_name": "North", "total_cost": 200, "powder_factor": "0.8"},
            {"date": "01/20/2024", "mine_name": "South", "total_cost": "150.5", "unknown": true}
        ]}"#;
        let records = parse_json_document(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_cost, Some(200.0));
        assert_eq!(records[0].powder_factor, Some(0.8));
        assert_eq!(records[1].total_cost, Some(150.5));
        assert_eq!(records[1].mine_name.as_deref(), Some("South"));
    }

    #[test]
    fn test_parse_json_document_errors() {
        assert!(matches!(
            parse_json_document("not json"),
            Err(SourceError::JsonParse(_))
        ));
        assert!(parse_json_document(r#"{"rows": []}"#).is_err());
        assert!(parse_json_document(r#"{"data": []}"#).unwrap().is_empty());
    }
}
