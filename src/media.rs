//! Media catalog: captured photos and audio recordings stored on the server.
//!
//! The catalog holds two independently refreshed listings. Each refresh
//! replaces its listing wholesale; there is no diffing and no merge.
//! Listings are fetched through the [`MediaApi`] trait so the session can be
//! driven by an in-memory implementation in tests.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::address::ServerAddress;
use crate::display::parse_timestamp;
use crate::error::{DashboardError, Result};

/// Which listing a media item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Camera captures
    Photos,
    /// Microphone recordings
    Recordings,
}

impl MediaKind {
    /// Both listings, in display order.
    pub const ALL: [Self; 2] = [Self::Photos, Self::Recordings];

    /// Listing endpoint, relative to the server's HTTP base.
    #[must_use]
    pub fn list_path(self) -> &'static str {
        match self {
            Self::Photos => "api/captures",
            Self::Recordings => "api/recordings",
        }
    }

    /// Deletion endpoint, relative to the server's HTTP base.
    #[must_use]
    pub fn delete_path(self) -> &'static str {
        match self {
            Self::Photos => "api/delete_capture",
            Self::Recordings => "api/delete_recording",
        }
    }

    /// Singular noun used in notifications.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Photos => "photo",
            Self::Recordings => "recording",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photos => f.write_str("photos"),
            Self::Recordings => f.write_str("recordings"),
        }
    }
}

/// One stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// File name on the server; also the deletion key
    pub filename: String,
    /// ISO-8601 creation time, as sent
    #[serde(default)]
    pub created: String,
    /// File size in bytes, when reported
    #[serde(default)]
    pub size: Option<u64>,
}

impl MediaItem {
    /// Parsed creation time, if the server sent a readable one.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created)
    }

    /// Whether `needle` (already lowercased) appears in the creation time,
    /// as sent or as shown in local time.
    fn matches_created(&self, needle: &str) -> bool {
        if needle.is_empty() || self.created.is_empty() {
            return false;
        }
        if self.created.to_lowercase().contains(needle) {
            return true;
        }
        self.created_at().is_some_and(|at| {
            at.with_timezone(&Local)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string()
                .contains(needle)
        })
    }
}

/// Photos and recordings, each replaced on refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaCatalog {
    photos: Vec<MediaItem>,
    recordings: Vec<MediaItem>,
}

impl MediaCatalog {
    /// Replace one listing with a freshly fetched one.
    pub fn replace(&mut self, kind: MediaKind, items: Vec<MediaItem>) {
        match kind {
            MediaKind::Photos => self.photos = items,
            MediaKind::Recordings => self.recordings = items,
        }
    }

    /// Current listing, in server order.
    #[must_use]
    pub fn items(&self, kind: MediaKind) -> &[MediaItem] {
        match kind {
            MediaKind::Photos => &self.photos,
            MediaKind::Recordings => &self.recordings,
        }
    }

    /// Items whose filename or creation time contains `search`
    /// (case-insensitive) and, when given, whose filename starts with
    /// `prefix`. An empty search matches everything.
    #[must_use]
    pub fn filter(
        &self,
        kind: MediaKind,
        search: &str,
        prefix: Option<&str>,
    ) -> Vec<&MediaItem> {
        let needle = search.trim().to_lowercase();
        let prefix = prefix.map(str::to_lowercase);
        self.items(kind)
            .iter()
            .filter(|item| {
                let name = item.filename.to_lowercase();
                let searched = name.contains(&needle) || item.matches_created(&needle);
                searched && prefix.as_deref().map_or(true, |p| name.starts_with(p))
            })
            .collect()
    }
}

/// Server reply to a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    /// Whether the file was removed
    pub success: bool,
    /// Reason for a failure
    #[serde(default)]
    pub message: Option<String>,
}

impl DeleteResponse {
    /// Turn the reply into a result, filling in a generic reason when the
    /// server gave none.
    pub fn into_result(self, kind: MediaKind) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(DashboardError::MediaRejected(
                self.message
                    .unwrap_or_else(|| format!("Failed to delete {}", kind.noun())),
            ))
        }
    }
}

/// Access to the server's media endpoints.
#[async_trait]
pub trait MediaApi: Send + Sync {
    /// Fetch the full listing for `kind`.
    async fn list(&self, kind: MediaKind) -> Result<Vec<MediaItem>>;

    /// Delete one file. `Ok` only when the server confirmed the deletion.
    async fn delete(&self, kind: MediaKind, filename: &str) -> Result<()>;
}

/// [`MediaApi`] over HTTP using reqwest.
#[derive(Debug, Clone)]
pub struct HttpMediaApi {
    client: reqwest::Client,
    base: Url,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    filename: &'a str,
}

impl HttpMediaApi {
    /// Build a client for the server at `address`.
    #[must_use]
    pub fn new(address: &ServerAddress) -> Self {
        Self::with_base(address.http_base())
    }

    /// Build a client for an explicit HTTP base URL.
    #[must_use]
    pub fn with_base(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| DashboardError::Transport(format!("bad media endpoint {path}: {e}")))
    }
}

#[async_trait]
impl MediaApi for HttpMediaApi {
    async fn list(&self, kind: MediaKind) -> Result<Vec<MediaItem>> {
        let url = self.endpoint(kind.list_path())?;
        tracing::debug!("Fetching {} from {}", kind, url);
        let items = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<MediaItem>>()
            .await?;
        Ok(items)
    }

    async fn delete(&self, kind: MediaKind, filename: &str) -> Result<()> {
        let url = self.endpoint(kind.delete_path())?;
        tracing::debug!("Deleting {} {}", kind.noun(), filename);
        let response = self
            .client
            .post(url)
            .json(&DeleteRequest { filename })
            .send()
            .await?
            .json::<DeleteResponse>()
            .await?;
        response.into_result(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> MediaItem {
        MediaItem {
            filename: name.to_string(),
            created: "2026-03-01T10:00:00".to_string(),
            size: None,
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut catalog = MediaCatalog::default();
        catalog.replace(MediaKind::Photos, vec![item("a.jpg"), item("b.jpg")]);
        catalog.replace(MediaKind::Photos, vec![item("c.jpg")]);

        let names: Vec<&str> = catalog
            .items(MediaKind::Photos)
            .iter()
            .map(|i| i.filename.as_str())
            .collect();
        assert_eq!(names, vec!["c.jpg"]);
        assert!(catalog.items(MediaKind::Recordings).is_empty());
    }

    #[test]
    fn test_filter_by_search_and_prefix() {
        let mut catalog = MediaCatalog::default();
        catalog.replace(
            MediaKind::Photos,
            vec![
                item("motion_20260301_1000.jpg"),
                item("manual_20260301_1100.jpg"),
                item("Motion_20260302_0900.jpg"),
            ],
        );

        assert_eq!(catalog.filter(MediaKind::Photos, "", None).len(), 3);
        assert_eq!(catalog.filter(MediaKind::Photos, "0301", None).len(), 2);
        assert_eq!(catalog.filter(MediaKind::Photos, "", Some("motion")).len(), 2);
        assert_eq!(catalog.filter(MediaKind::Photos, "0302", Some("motion")).len(), 1);
        assert!(catalog.filter(MediaKind::Photos, "xyz", None).is_empty());
    }

    #[test]
    fn test_filter_matches_creation_time() {
        let mut catalog = MediaCatalog::default();
        let mut later = item("motion_a.jpg");
        later.created = "2026-03-02T08:15:00".to_string();
        catalog.replace(
            MediaKind::Photos,
            vec![item("motion_b.jpg"), later, item("manual_c.jpg")],
        );

        let names = |hits: Vec<&MediaItem>| -> Vec<String> {
            hits.into_iter().map(|i| i.filename.clone()).collect()
        };
        assert_eq!(
            names(catalog.filter(MediaKind::Photos, "2026-03-02", None)),
            vec!["motion_a.jpg"]
        );
        assert_eq!(
            names(catalog.filter(MediaKind::Photos, "02/03/2026", None)),
            vec!["motion_a.jpg"]
        );
        assert_eq!(
            names(catalog.filter(MediaKind::Photos, "10:00", Some("motion"))),
            vec!["motion_b.jpg"]
        );
    }

    #[test]
    fn test_media_item_deserializes_without_optional_fields() {
        let raw = r#"[
            {"filename": "rec.wav", "created": "2026-03-01T10:00:00", "size": 2048},
            {"filename": "x.wav"}
        ]"#;
        let items: Vec<MediaItem> = serde_json::from_str(raw).unwrap();
        assert_eq!(items[0].size, Some(2048));
        assert!(items[0].created_at().is_some());
        assert_eq!(items[1].created, "");
        assert!(items[1].created_at().is_none());
    }

    #[test]
    fn test_delete_response() {
        let ok: DeleteResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ok.into_result(MediaKind::Photos).is_ok());

        let rejected: DeleteResponse =
            serde_json::from_str(r#"{"success":false,"message":"File not found"}"#).unwrap();
        let err = rejected.into_result(MediaKind::Photos).unwrap_err();
        assert!(matches!(err, DashboardError::MediaRejected(ref m) if m == "File not found"));

        let bare: DeleteResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        let err = bare.into_result(MediaKind::Recordings).unwrap_err();
        assert_eq!(err.to_string(), "Media request rejected: Failed to delete recording");
    }

    #[test]
    fn test_endpoints_resolve_against_base() {
        let api = HttpMediaApi::with_base(Url::parse("http://camera.local:8000/").unwrap());
        assert_eq!(
            api.endpoint(MediaKind::Photos.list_path()).unwrap().as_str(),
            "http://camera.local:8000/api/captures"
        );
        assert_eq!(
            api.endpoint(MediaKind::Recordings.delete_path()).unwrap().as_str(),
            "http://camera.local:8000/api/delete_recording"
        );
    }
}
