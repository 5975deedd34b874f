//! Tautulli API v2 client.
//!
//! Tautulli answers every command with the same envelope,
//! `{"response": {"result": "success", "message": null, "data": ...}}`, and
//! is loose about numeric fields: ids, sizes and timestamps arrive as either
//! JSON numbers or strings.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use super::Inventory;
use crate::config::ServiceConfig;
use crate::error::Error;
use crate::model::{parse_rating, CatalogEntry, MediaDetail};

const SERVICE: &str = "tautulli";

pub struct TautulliClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl TautulliClient {
    pub fn new(config: &ServiceConfig, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base = config.url.trim_end_matches('/');
        let api_url = if base.ends_with("/api/v2") {
            base.to_string()
        } else {
            format!("{base}/api/v2")
        };

        Ok(Self {
            client,
            api_url,
            api_key: config.api_key.clone(),
        })
    }

    fn command(&self, cmd: &str, params: &[(&str, String)]) -> Result<Value, Error> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str()), ("cmd", cmd)])
            .query(params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json()?;
        unwrap_envelope(body)
    }
}

impl Inventory for TautulliClient {
    fn list_libraries(&self) -> Result<BTreeMap<String, String>, Error> {
        let data = self
            .command("get_libraries", &[])
            .map_err(|e| Error::SourceUnavailable(e.to_string()))?;
        decode_libraries(&data)
    }

    fn fetch_page(
        &self,
        section_id: &str,
        start: usize,
        length: usize,
        refresh: bool,
    ) -> Result<Vec<CatalogEntry>, Error> {
        let mut params = vec![
            ("section_id", section_id.to_string()),
            ("start", start.to_string()),
            ("length", length.to_string()),
            ("order_column", "sort_title".to_string()),
            ("order_dir", "asc".to_string()),
        ];
        if refresh {
            params.push(("refresh", "true".to_string()));
        }
        let data = self.command("get_library_media_info", &params)?;
        decode_media_page(&data)
    }

    fn fetch_detail(&self, rating_key: &str) -> Result<Option<MediaDetail>, Error> {
        debug!("Fetching metadata for rating_key {}", rating_key);
        let data = self.command("get_metadata", &[("rating_key", rating_key.to_string())])?;
        Ok(decode_metadata(&data))
    }
}

fn unwrap_envelope(mut body: Value) -> Result<Value, Error> {
    let response = body
        .get_mut("response")
        .map(Value::take)
        .ok_or_else(|| Error::Other("Tautulli response is missing the envelope".into()))?;

    let result = response.get("result").and_then(Value::as_str).unwrap_or("");
    if result != "success" {
        let message = response
            .get("message")
            .and_then(as_string)
            .unwrap_or_else(|| format!("result '{result}'"));
        return Err(Error::Api {
            service: SERVICE,
            status: 200,
            body: message,
        });
    }

    Ok(response.get("data").cloned().unwrap_or(Value::Null))
}

pub(crate) fn decode_libraries(data: &Value) -> Result<BTreeMap<String, String>, Error> {
    let rows = data
        .as_array()
        .ok_or_else(|| Error::Other("get_libraries data is not a list".into()))?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = row.get("section_name").and_then(as_string)?;
            let id = row.get("section_id").and_then(as_string)?;
            Some((name, id))
        })
        .collect())
}

pub(crate) fn decode_media_page(data: &Value) -> Result<Vec<CatalogEntry>, Error> {
    let rows = match data.get("data") {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => return Err(Error::Other("media info data is not a list".into())),
    };

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        match decode_media_row(row) {
            Some(entry) => entries.push(entry),
            None => warn!("Skipping catalog row without rating_key or added_at: {}", row),
        }
    }
    Ok(entries)
}

fn decode_media_row(row: &Value) -> Option<CatalogEntry> {
    let rating_key = row.get("rating_key").and_then(as_string)?;
    let added_at = row.get("added_at").and_then(as_timestamp)?;
    let title = row.get("title").and_then(as_string).unwrap_or_default();
    let sort_title = row
        .get("sort_title")
        .and_then(as_string)
        .unwrap_or_else(|| title.clone());

    Some(CatalogEntry {
        rating_key,
        title,
        sort_title,
        added_at,
        play_count: row.get("play_count").and_then(as_u64).unwrap_or(0),
        last_played: row.get("last_played").and_then(as_timestamp),
        file_size: row.get("file_size").and_then(as_u64).unwrap_or(0),
    })
}

/// `None` when Tautulli returns an empty document for an unknown item.
pub(crate) fn decode_metadata(data: &Value) -> Option<MediaDetail> {
    let object = data.as_object().filter(|o| !o.is_empty())?;

    let external_id = object
        .get("guids")
        .and_then(Value::as_array)
        .and_then(|guids| {
            guids
                .iter()
                .filter_map(Value::as_str)
                .find_map(|guid| guid.strip_prefix("tmdb://"))
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let part = object
        .get("media_info")
        .and_then(|m| m.get(0))
        .and_then(|m| m.get("parts"))
        .and_then(|p| p.get(0));

    Some(MediaDetail {
        critic_rating: parse_rating(object.get("rating").and_then(as_string).as_deref()),
        audience_rating: parse_rating(
            object.get("audience_rating").and_then(as_string).as_deref(),
        ),
        external_id,
        file_path: part
            .and_then(|p| p.get("file"))
            .and_then(as_string)
            .map(PathBuf::from),
        file_size: part.and_then(|p| p.get("file_size")).and_then(as_u64),
    })
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    as_i64(value).and_then(|n| u64::try_from(n).ok())
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    as_i64(value)
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
