//! XML layout of the API's `<rsp>` envelope.
//!
//! Attribute names carry quick-xml's `@` prefix and element text is `$text`.
//! Flags arrive as `"0"`/`"1"` attributes that may be missing entirely, so
//! they are read as optional strings and folded to `bool` during conversion.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::types::{
    AuthToken, Dates, InfoResult, Note, Owner, Photo, PhotoSet, PhotoUrl, SearchResult, Size,
    SizesResult, Tag, TicketStatus, User, Visibility,
};

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("1")
}

/// Pixel dimension attribute; empty or non-numeric values read as absent.
fn dimension(value: &Option<String>) -> Option<u32> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

/// The parts of `<rsp>` shared by every response.
#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    #[serde(rename = "@stat")]
    pub stat: String,
    pub err: Option<ErrorElement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorElement {
    #[serde(rename = "@code")]
    pub code: String,
    #[serde(rename = "@msg", default)]
    pub msg: String,
}

/// A success payload: the `<rsp>` children for one API method.
pub(crate) trait Payload: DeserializeOwned {
    type Output;

    /// What is being decoded, for error messages.
    const CONTEXT: &'static str;

    fn into_output(self) -> Self::Output;
}

// ---------------------------------------------------------------------------
// flickr.auth.getToken
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct AuthRsp {
    auth: AuthElement,
}

#[derive(Debug, Deserialize)]
struct AuthElement {
    token: String,
    #[serde(default)]
    perms: String,
    user: UserElement,
}

#[derive(Debug, Deserialize)]
struct UserElement {
    #[serde(rename = "@nsid")]
    nsid: String,
    #[serde(rename = "@username", default)]
    username: String,
    #[serde(rename = "@fullname")]
    fullname: Option<String>,
}

impl Payload for AuthRsp {
    type Output = AuthToken;
    const CONTEXT: &'static str = "auth token";

    fn into_output(self) -> AuthToken {
        let AuthElement { token, perms, user } = self.auth;
        AuthToken {
            token,
            perms,
            user: User {
                nsid: user.nsid,
                username: user.username,
                fullname: user.fullname,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// flickr.photos.search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRsp {
    photos: PhotosElement,
}

#[derive(Debug, Deserialize)]
struct PhotosElement {
    #[serde(rename = "@page")]
    page: u32,
    #[serde(rename = "@pages")]
    pages: u32,
    #[serde(rename = "@perpage")]
    per_page: u32,
    #[serde(rename = "@total")]
    total: u32,
    #[serde(rename = "photo", default)]
    photos: Vec<PhotoElement>,
}

#[derive(Debug, Deserialize)]
struct PhotoElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@owner", default)]
    owner: String,
    #[serde(rename = "@secret", default)]
    secret: String,
    #[serde(rename = "@server", default)]
    server: String,
    #[serde(rename = "@farm", default)]
    farm: String,
    #[serde(rename = "@title", default)]
    title: String,
    #[serde(rename = "@ispublic")]
    is_public: Option<String>,
    #[serde(rename = "@isfriend")]
    is_friend: Option<String>,
    #[serde(rename = "@isfamily")]
    is_family: Option<String>,
    #[serde(rename = "@width_t")]
    width_t: Option<String>,
    #[serde(rename = "@height_t")]
    height_t: Option<String>,
}

impl From<PhotoElement> for Photo {
    fn from(p: PhotoElement) -> Self {
        let width_t = dimension(&p.width_t);
        let height_t = dimension(&p.height_t);
        let ratio = match (width_t, height_t) {
            (Some(w), Some(h)) if h > 0 => Some(f64::from(w) / f64::from(h)),
            _ => None,
        };
        Photo {
            is_public: flag(&p.is_public),
            is_friend: flag(&p.is_friend),
            is_family: flag(&p.is_family),
            id: p.id,
            owner: p.owner,
            secret: p.secret,
            server: p.server,
            farm: p.farm,
            title: p.title,
            width_t,
            height_t,
            ratio,
        }
    }
}

impl Payload for SearchRsp {
    type Output = SearchResult;
    const CONTEXT: &'static str = "search result";

    fn into_output(self) -> SearchResult {
        let p = self.photos;
        SearchResult {
            page: p.page,
            pages: p.pages,
            per_page: p.per_page,
            total: p.total,
            photos: p.photos.into_iter().map(Photo::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// flickr.photos.getInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct InfoRsp {
    photo: InfoElement,
}

#[derive(Debug, Deserialize)]
struct InfoElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@secret", default)]
    secret: String,
    #[serde(rename = "@server", default)]
    server: String,
    #[serde(rename = "@farm")]
    farm: Option<String>,
    #[serde(rename = "@license", default)]
    license: String,
    #[serde(rename = "@rotation", default)]
    rotation: String,
    #[serde(rename = "@isfavorite")]
    is_favorite: Option<String>,
    #[serde(rename = "@originalsecret")]
    original_secret: Option<String>,
    #[serde(rename = "@originalformat")]
    original_format: Option<String>,
    owner: Option<OwnerElement>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    visibility: VisibilityElement,
    #[serde(default)]
    dates: DatesElement,
    #[serde(default)]
    comments: u32,
    #[serde(default)]
    notes: NotesElement,
    #[serde(default)]
    tags: TagsElement,
    #[serde(default)]
    urls: UrlsElement,
}

#[derive(Debug, Deserialize)]
struct OwnerElement {
    #[serde(rename = "@nsid")]
    nsid: String,
    #[serde(rename = "@username", default)]
    username: String,
    #[serde(rename = "@realname")]
    realname: Option<String>,
    #[serde(rename = "@location")]
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VisibilityElement {
    #[serde(rename = "@ispublic")]
    is_public: Option<String>,
    #[serde(rename = "@isfriend")]
    is_friend: Option<String>,
    #[serde(rename = "@isfamily")]
    is_family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DatesElement {
    #[serde(rename = "@posted", default)]
    posted: String,
    #[serde(rename = "@taken", default)]
    taken: String,
    #[serde(rename = "@takengranularity", default)]
    taken_granularity: u32,
    #[serde(rename = "@lastupdate", default)]
    last_update: String,
}

#[derive(Debug, Default, Deserialize)]
struct NotesElement {
    #[serde(rename = "note", default)]
    notes: Vec<NoteElement>,
}

#[derive(Debug, Deserialize)]
struct NoteElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@author", default)]
    author: String,
    #[serde(rename = "@authorname", default)]
    author_name: String,
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct TagsElement {
    #[serde(rename = "tag", default)]
    tags: Vec<TagElement>,
}

#[derive(Debug, Deserialize)]
struct TagElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@author", default)]
    author: String,
    #[serde(rename = "@raw", default)]
    raw: String,
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct UrlsElement {
    #[serde(rename = "url", default)]
    urls: Vec<UrlElement>,
}

#[derive(Debug, Deserialize)]
struct UrlElement {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "$text", default)]
    url: String,
}

impl Payload for InfoRsp {
    type Output = InfoResult;
    const CONTEXT: &'static str = "photo info";

    fn into_output(self) -> InfoResult {
        let p = self.photo;
        InfoResult {
            id: p.id,
            secret: p.secret,
            server: p.server,
            farm: p.farm,
            license: p.license,
            rotation: p.rotation,
            is_favorite: flag(&p.is_favorite),
            original_secret: p.original_secret,
            original_format: p.original_format,
            owner: p.owner.map(|o| Owner {
                nsid: o.nsid,
                username: o.username,
                realname: o.realname,
                location: o.location,
            }),
            title: p.title,
            description: p.description,
            visibility: Visibility {
                is_public: flag(&p.visibility.is_public),
                is_friend: flag(&p.visibility.is_friend),
                is_family: flag(&p.visibility.is_family),
            },
            dates: Dates {
                posted: p.dates.posted,
                taken: p.dates.taken,
                taken_granularity: p.dates.taken_granularity,
                last_update: p.dates.last_update,
            },
            comments: p.comments,
            notes: p
                .notes
                .notes
                .into_iter()
                .map(|n| Note {
                    id: n.id,
                    author: n.author,
                    author_name: n.author_name,
                    text: n.text,
                })
                .collect(),
            tags: p
                .tags
                .tags
                .into_iter()
                .map(|t| Tag {
                    id: t.id,
                    author: t.author,
                    raw: t.raw,
                    text: t.text,
                })
                .collect(),
            urls: p
                .urls
                .urls
                .into_iter()
                .map(|u| PhotoUrl {
                    kind: u.kind,
                    url: u.url,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// flickr.photos.getSizes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SizesRsp {
    sizes: SizesElement,
}

#[derive(Debug, Deserialize)]
struct SizesElement {
    #[serde(rename = "@canblog")]
    can_blog: Option<String>,
    #[serde(rename = "@canprint")]
    can_print: Option<String>,
    #[serde(rename = "@candownload")]
    can_download: Option<String>,
    #[serde(rename = "size", default)]
    sizes: Vec<SizeElement>,
}

#[derive(Debug, Deserialize)]
struct SizeElement {
    #[serde(rename = "@label")]
    label: String,
    #[serde(rename = "@width")]
    width: Option<String>,
    #[serde(rename = "@height")]
    height: Option<String>,
    #[serde(rename = "@source", default)]
    source: String,
    #[serde(rename = "@url", default)]
    url: String,
    #[serde(rename = "@media")]
    media: Option<String>,
}

impl Payload for SizesRsp {
    type Output = SizesResult;
    const CONTEXT: &'static str = "photo sizes";

    fn into_output(self) -> SizesResult {
        let s = self.sizes;
        SizesResult {
            can_blog: flag(&s.can_blog),
            can_print: flag(&s.can_print),
            can_download: flag(&s.can_download),
            sizes: s
                .sizes
                .into_iter()
                .map(|z| Size {
                    label: z.label,
                    width: dimension(&z.width).unwrap_or(0),
                    height: dimension(&z.height).unwrap_or(0),
                    source: z.source,
                    url: z.url,
                    media: z.media,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// upload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct UploadRsp {
    ticketid: String,
}

impl Payload for UploadRsp {
    type Output = String;
    const CONTEXT: &'static str = "upload ticket";

    fn into_output(self) -> String {
        self.ticketid.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// flickr.photos.upload.checkTickets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct TicketsRsp {
    uploader: UploaderElement,
}

#[derive(Debug, Deserialize)]
struct UploaderElement {
    #[serde(rename = "ticket", default)]
    tickets: Vec<TicketElement>,
}

#[derive(Debug, Deserialize)]
struct TicketElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@complete")]
    complete: Option<String>,
    #[serde(rename = "@invalid")]
    invalid: Option<String>,
    #[serde(rename = "@photoid")]
    photo_id: Option<String>,
}

impl Payload for TicketsRsp {
    type Output = Vec<TicketStatus>;
    const CONTEXT: &'static str = "ticket status";

    fn into_output(self) -> Vec<TicketStatus> {
        self.uploader
            .tickets
            .into_iter()
            .map(|t| TicketStatus {
                complete: flag(&t.complete),
                invalid: flag(&t.invalid),
                id: t.id,
                photo_id: t.photo_id.filter(|id| !id.is_empty()),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// flickr.photosets.getList
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoSetsRsp {
    photosets: PhotoSetsElement,
}

#[derive(Debug, Deserialize)]
struct PhotoSetsElement {
    #[serde(rename = "photoset", default)]
    sets: Vec<PhotoSetElement>,
}

#[derive(Debug, Deserialize)]
struct PhotoSetElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@photos", default)]
    photos: u32,
    #[serde(rename = "@videos", default)]
    videos: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

impl Payload for PhotoSetsRsp {
    type Output = Vec<PhotoSet>;
    const CONTEXT: &'static str = "photo sets";

    fn into_output(self) -> Vec<PhotoSet> {
        self.photosets
            .sets
            .into_iter()
            .map(|s| PhotoSet {
                id: s.id,
                title: s.title,
                description: s.description,
                photos: s.photos,
                videos: s.videos,
            })
            .collect()
    }
}
