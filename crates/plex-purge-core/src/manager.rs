//! Acquisition manager (Radarr v3) client.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::Error;

const SERVICE: &str = "radarr";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerRecord {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size_on_disk: u64,
}

pub trait AcquisitionManager {
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<ManagerRecord>, Error>;

    /// Remove several records in one call. The call succeeds or fails as a
    /// whole.
    fn batch_delete(&self, ids: &[i64], delete_files: bool) -> Result<(), Error>;

    fn delete(&self, id: i64, delete_files: bool) -> Result<(), Error> {
        self.batch_delete(&[id], delete_files)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MovieEditorRequest<'a> {
    movie_ids: &'a [i64],
    delete_files: bool,
    add_import_exclusion: bool,
}

pub struct RadarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RadarrClient {
    pub fn new(config: &ServiceConfig, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, Error> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
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

impl AcquisitionManager for RadarrClient {
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<ManagerRecord>, Error> {
        let url = format!("{}/api/v3/movie", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("tmdbId", external_id)])
            .send()?;

        let body = Self::check(response)?.text()?;
        decode_movies(&body)
    }

    fn batch_delete(&self, ids: &[i64], delete_files: bool) -> Result<(), Error> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = format!("{}/api/v3/movie/editor", self.base_url);
        let request = MovieEditorRequest {
            movie_ids: ids,
            delete_files,
            add_import_exclusion: false,
        };
        let response = self
            .client
            .delete(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&request)
            .send()?;

        Self::check(response).map(|_| ())
    }

    fn delete(&self, id: i64, delete_files: bool) -> Result<(), Error> {
        let url = format!("{}/api/v3/movie/{id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("deleteFiles", delete_files.to_string())])
            .send()?;

        Self::check(response).map(|_| ())
    }
}

/// `GET /movie?tmdbId=` returns a list; an empty list means not managed.
fn decode_movies(body: &str) -> Result<Option<ManagerRecord>, Error> {
    let movies: Vec<ManagerRecord> = serde_json::from_str(body)?;
    Ok(movies.into_iter().next())
}
