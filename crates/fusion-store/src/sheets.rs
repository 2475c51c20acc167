//! HTTP client for a Sheets-v4-shaped REST API
//!
//! Holds an already acquired bearer token; obtaining and refreshing the
//! token happens elsewhere.

use crate::config::SheetsSettings;
use crate::error::StoreError;
use crate::remote::{descending_rows, CellUpdate, ColumnRange, RemoteStore};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Remote store reached over HTTP
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    api_base: Url,
    token: String,
}

impl SheetsClient {
    /// Create client for `api_base` authenticated with `token`
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidEndpoint`] if `api_base` is not a base URL.
    pub fn new(api_base: &str, token: impl Into<String>) -> Result<Self, StoreError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| StoreError::InvalidEndpoint(format!("{api_base}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(StoreError::InvalidEndpoint(api_base.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_base,
            token: token.into(),
        })
    }

    /// Create client from config, reading the token from the environment
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the token is missing or the endpoint is invalid.
    pub fn from_settings(settings: &SheetsSettings) -> Result<Self, ConfigError> {
        let token = settings.token()?;
        Self::new(&settings.api_base, token).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidEndpoint(self.api_base.to_string()))?
            .pop_if_empty()
            .push("v4")
            .push("spreadsheets")
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// `deleteDimension` requests, highest row first
fn delete_request_body(sheet_id: u64, rows: &[u32]) -> Value {
    let requests: Vec<Value> = descending_rows(rows)
        .into_iter()
        .map(|row| {
            json!({
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            })
        })
        .collect();
    json!({ "requests": requests })
}

fn update_request_body(updates: &[CellUpdate]) -> Value {
    let data: Vec<Value> = updates
        .iter()
        .map(|u| {
            json!({
                "range": u.cell.to_string(),
                "majorDimension": "COLUMNS",
                "values": [[u.value]],
            })
        })
        .collect();
    json!({ "valueInputOption": "USER_ENTERED", "data": data })
}

#[async_trait]
impl RemoteStore for SheetsClient {
    async fn read_column(
        &self,
        spreadsheet: &str,
        range: &ColumnRange,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        let range = range.to_string();
        let url = self.endpoint(&[spreadsheet, "values", &range])?;
        let response = self.send(self.http.get(url)).await?;
        let body: ValueRange = response.json().await?;
        tracing::debug!(spreadsheet, %range, rows = body.values.len(), "read range");
        Ok(body.values)
    }

    async fn delete_rows(
        &self,
        spreadsheet: &str,
        sheet_id: u64,
        rows: &[u32],
    ) -> Result<(), StoreError> {
        if rows.contains(&0) {
            return Err(StoreError::RowOutOfRange {
                sheet: sheet_id.to_string(),
                row: 0,
            });
        }
        let url = self.endpoint(&[&format!("{spreadsheet}:batchUpdate")])?;
        self.send(self.http.post(url).json(&delete_request_body(sheet_id, rows)))
            .await?;
        tracing::debug!(spreadsheet, sheet_id, ?rows, "deleted rows");
        Ok(())
    }

    async fn update_cells(
        &self,
        spreadsheet: &str,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&[spreadsheet, "values:batchUpdate"])?;
        self.send(self.http.post(url).json(&update_request_body(updates)))
            .await?;
        tracing::debug!(spreadsheet, cells = updates.len(), "updated cells");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CellRef;

    #[test]
    fn endpoints_are_built_under_v4() {
        let client = SheetsClient::new("https://sheets.example.com", "t").unwrap();
        let url = client.endpoint(&["abc", "values", "RESPONSES!D3:D"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/abc/values/RESPONSES!D3:D"
        );

        let url = client.endpoint(&["abc:batchUpdate"]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.example.com/v4/spreadsheets/abc:batchUpdate");
    }

    #[test]
    fn sheet_names_with_spaces_are_encoded() {
        let client = SheetsClient::new("https://sheets.example.com/", "t").unwrap();
        let url = client.endpoint(&["abc", "values", "My Sheet!D2:D"]).unwrap();
        assert!(url.as_str().ends_with("/values/My%20Sheet!D2:D"));
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(matches!(
            SheetsClient::new("mailto:someone", "t"),
            Err(StoreError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn delete_body_lists_rows_descending() {
        let body = delete_request_body(12, &[3, 9, 5]);
        let starts: Vec<u64> = body["requests"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["deleteDimension"]["range"]["startIndex"].as_u64().unwrap())
            .collect();
        assert_eq!(starts, vec![8, 4, 2]);
        assert_eq!(body["requests"][0]["deleteDimension"]["range"]["sheetId"], 12);
        assert_eq!(body["requests"][0]["deleteDimension"]["range"]["endIndex"], 9);
    }

    #[test]
    fn update_body_is_user_entered() {
        let body = update_request_body(&[CellUpdate {
            cell: CellRef {
                sheet: "RESPONSES".to_string(),
                column: "D".to_string(),
                row: 4,
            },
            value: "1.59a.png".to_string(),
        }]);
        assert_eq!(body["valueInputOption"], "USER_ENTERED");
        assert_eq!(body["data"][0]["range"], "RESPONSES!D4");
        assert_eq!(body["data"][0]["values"][0][0], "1.59a.png");
    }

    #[test]
    fn empty_range_deserializes_to_no_rows() {
        let body: ValueRange = serde_json::from_str(r#"{"range":"RESPONSES!D3:D"}"#).unwrap();
        assert!(body.values.is_empty());
    }
}
