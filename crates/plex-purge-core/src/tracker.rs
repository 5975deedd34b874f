//! Request tracker (Overseerr) client.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::Error;

const SERVICE: &str = "overseerr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRecord {
    pub id: i64,
    pub external_id: String,
}

pub trait RequestTracker {
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<TrackerRecord>, Error>;
    fn delete(&self, record_id: i64) -> Result<(), Error>;
}

pub struct OverseerrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieDetails {
    media_info: Option<MediaInfo>,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    id: i64,
}

impl OverseerrClient {
    pub fn new(config: &ServiceConfig, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

impl RequestTracker for OverseerrClient {
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<TrackerRecord>, Error> {
        let url = format!("{}/api/v1/movie/{external_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        decode_movie(&body, external_id)
    }

    fn delete(&self, record_id: i64) -> Result<(), Error> {
        let url = format!("{}/api/v1/media/{record_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header("X-Api-Key", &self.api_key)
            .send()?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().unwrap_or_default();
            Err(Error::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// A movie Overseerr knows from TMDB but never tracked has no `mediaInfo`.
fn decode_movie(body: &str, external_id: &str) -> Result<Option<TrackerRecord>, Error> {
    let details: MovieDetails = serde_json::from_str(body)?;
    Ok(details.media_info.map(|info| TrackerRecord {
        id: info.id,
        external_id: external_id.to_string(),
    }))
}
