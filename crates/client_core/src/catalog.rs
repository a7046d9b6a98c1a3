use anyhow::{Context, Result};
use reqwest::Client;
use shared::{domain::Track, protocol::tracks_route};
use tracing::info;

/// Loads the playlist served by the backend's track resource.
pub struct TrackCatalogClient {
    http: Client,
    server_url: String,
}

impl TrackCatalogClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_tracks(&self) -> Result<Vec<Track>> {
        let url = format!("{}{}", self.server_url, tracks_route());
        let tracks: Vec<Track> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("invalid track payload from {url}"))?;
        info!(count = tracks.len(), "catalog: tracks fetched");
        Ok(tracks)
    }
}
