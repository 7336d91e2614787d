//! Domain types returned by the client.
//!
//! # Design
//! These are the decoded, typed shapes of the API's XML payloads. The wire
//! layout lives in `wire.rs`; conversion into these types happens once, at
//! decode time, which is also where derived values such as `Photo::ratio`
//! are computed.
//!
//! Date fields stay as the strings the service sent. Conversion to a
//! timestamp is an explicit, fallible call on `Dates`.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DateError;

/// Permission level requested in the authorization URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perms {
    Read,
    Write,
    Delete,
}

impl Perms {
    pub fn as_str(self) -> &'static str {
        match self {
            Perms::Read => "read",
            Perms::Write => "write",
            Perms::Delete => "delete",
        }
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Flickr user as reported by the token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub nsid: String,
    pub username: String,
    pub fullname: Option<String>,
}

/// Result of exchanging a frob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub perms: String,
    pub user: User,
}

/// Image sizes served by the static photo hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    SmallSquare,
    Thumbnail,
    Small,
    Medium500,
    Medium640,
    Large,
    Original,
}

impl ImageSize {
    /// URL suffix for this size; `None` for the unsuffixed 500px medium.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            ImageSize::SmallSquare => Some("s"),
            ImageSize::Thumbnail => Some("t"),
            ImageSize::Small => Some("m"),
            ImageSize::Medium500 => None,
            ImageSize::Medium640 => Some("z"),
            ImageSize::Large => Some("b"),
            ImageSize::Original => Some("o"),
        }
    }
}

/// A photo entry from a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub farm: String,
    pub title: String,
    pub is_public: bool,
    pub is_friend: bool,
    pub is_family: bool,
    pub width_t: Option<u32>,
    pub height_t: Option<u32>,
    /// Thumbnail width divided by height, computed when decoded.
    pub ratio: Option<f64>,
}

impl Photo {
    pub fn url(&self, size: ImageSize) -> String {
        photo_url(&self.farm, &self.server, &self.id, &self.secret, size)
    }
}

pub(crate) fn photo_url(farm: &str, server: &str, id: &str, secret: &str, size: ImageSize) -> String {
    match size.suffix() {
        None => format!("http://farm{farm}.static.flickr.com/{server}/{id}_{secret}.jpg"),
        Some(suffix) => {
            format!("http://farm{farm}.static.flickr.com/{server}/{id}_{secret}_{suffix}.jpg")
        }
    }
}

/// One page of `flickr.photos.search` results. Counts are the server's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u32,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub nsid: String,
    pub username: String,
    pub realname: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub is_public: bool,
    pub is_friend: bool,
    pub is_family: bool,
}

/// Photo dates exactly as the service reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dates {
    /// Unix seconds.
    pub posted: String,
    /// `YYYY-MM-DD HH:MM:SS` in the photo's local time.
    pub taken: String,
    pub taken_granularity: u32,
    /// Unix seconds.
    pub last_update: String,
}

impl Dates {
    pub fn posted_at(&self) -> Result<DateTime<Utc>, DateError> {
        unix_seconds("posted", &self.posted)
    }

    pub fn taken_at(&self) -> Result<NaiveDateTime, DateError> {
        if self.taken.is_empty() {
            return Err(DateError::Missing { field: "taken" });
        }
        NaiveDateTime::parse_from_str(&self.taken, "%Y-%m-%d %H:%M:%S").map_err(|source| {
            DateError::Format {
                field: "taken",
                value: self.taken.clone(),
                source,
            }
        })
    }

    pub fn last_update_at(&self) -> Result<DateTime<Utc>, DateError> {
        unix_seconds("lastupdate", &self.last_update)
    }
}

fn unix_seconds(field: &'static str, value: &str) -> Result<DateTime<Utc>, DateError> {
    if value.is_empty() {
        return Err(DateError::Missing { field });
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| DateError::Timestamp {
            field,
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub author: String,
    pub raw: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub author: String,
    pub author_name: String,
    pub text: String,
}

/// A URL attached to a photo, e.g. its `photopage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrl {
    pub kind: String,
    pub url: String,
}

/// Detail returned by `flickr.photos.getInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResult {
    pub id: String,
    pub secret: String,
    pub server: String,
    pub farm: Option<String>,
    pub license: String,
    pub rotation: String,
    pub is_favorite: bool,
    pub original_secret: Option<String>,
    pub original_format: Option<String>,
    pub owner: Option<Owner>,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub dates: Dates,
    pub comments: u32,
    pub notes: Vec<Note>,
    pub tags: Vec<Tag>,
    pub urls: Vec<PhotoUrl>,
}

impl InfoResult {
    /// First URL of the given type, e.g. `"photopage"`.
    pub fn url_of(&self, kind: &str) -> Option<&str> {
        self.urls.iter().find(|u| u.kind == kind).map(|u| u.url.as_str())
    }

    /// Static image URL; needs the `farm` attribute, which older responses omit.
    pub fn image_url(&self, size: ImageSize) -> Option<String> {
        let farm = self.farm.as_deref()?;
        Some(photo_url(farm, &self.server, &self.id, &self.secret, size))
    }
}

/// One rendition of a photo from `flickr.photos.getSizes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub source: String,
    pub url: String,
    pub media: Option<String>,
}

/// Sizes in the order the server listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizesResult {
    pub can_blog: bool,
    pub can_print: bool,
    pub can_download: bool,
    pub sizes: Vec<Size>,
}

impl SizesResult {
    pub fn by_label(&self, label: &str) -> Option<&Size> {
        self.sizes.iter().find(|s| s.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSet {
    pub id: String,
    pub title: String,
    pub description: String,
    pub photos: u32,
    pub videos: u32,
}

/// Processing status of one asynchronous upload ticket.
///
/// Missing attributes decode as `false` / `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStatus {
    pub id: String,
    pub complete: bool,
    pub invalid: bool,
    pub photo_id: Option<String>,
}
