use std::{borrow::Cow, collections::HashMap, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use md5::{Digest, Md5};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TEST_NSID: &str = "7687633@N01";
pub const TEST_USERNAME: &str = "testuser";

const UPLOAD_LIMIT: usize = 32 * 1024 * 1024;
const ACCEPTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "jpe", "gif", "png"];

/// Credentials the server accepts.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub api_key: String,
    pub secret: String,
}

#[derive(Clone, Debug)]
pub struct StoredPhoto {
    pub id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub farm: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug)]
struct Ticket {
    id: String,
    owner: String,
    title: String,
    checks: u32,
    photo_id: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    tokens: HashMap<String, String>,
    photos: Vec<StoredPhoto>,
    tickets: Vec<Ticket>,
    next_id: u64,
}

impl Store {
    fn seeded() -> Self {
        let photo = |id: &str, secret: &str, title: &str, is_public: bool, width: u32| StoredPhoto {
            id: id.to_string(),
            owner: TEST_NSID.to_string(),
            secret: secret.to_string(),
            server: "3".to_string(),
            farm: "1".to_string(),
            title: title.to_string(),
            description: format!("{title} & friends"),
            is_public,
            width,
            height: 100,
        };
        Self {
            tokens: HashMap::new(),
            photos: vec![
                photo("1234", "63562", "kitten", false, 100),
                photo("5678", "36221", "puppies", true, 120),
            ],
            tickets: Vec::new(),
            next_id: 10_000,
        }
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn photo(&self, id: &str) -> Option<&StoredPhoto> {
        self.photos.iter().find(|p| p.id == id)
    }
}

struct AppState {
    config: ServerConfig,
    store: RwLock<Store>,
}

type Shared = Arc<AppState>;

/// A `stat="fail"` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: u32,
    pub msg: String,
}

impl Failure {
    fn new(code: u32, msg: impl Into<String>) -> Self {
        Self { code, msg: msg.into() }
    }
}

pub fn app(config: ServerConfig) -> Router {
    let state: Shared = Arc::new(AppState {
        config,
        store: RwLock::new(Store::seeded()),
    });
    Router::new()
        .route("/services/rest/", get(rest))
        .route("/services/auth/", get(authorize))
        .route("/services/upload/", post(upload))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

/// Signature over every argument except `api_sig`, keys in byte order.
pub fn signature(secret: &str, args: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = args.iter().filter(|(k, _)| k != "api_sig").collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    let mut hasher = Md5::new();
    hasher.update(secret);
    for (k, v) in sorted {
        hasher.update(k);
        hasher.update(v);
    }
    hex::encode(hasher.finalize())
}

fn lookup<'a>(args: &'a [(String, String)], key: &str) -> Option<&'a str> {
    args.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn verify_signature(config: &ServerConfig, args: &[(String, String)]) -> Result<(), Failure> {
    if lookup(args, "api_key") != Some(config.api_key.as_str()) {
        return Err(Failure::new(100, "Invalid API Key (Key has invalid format)"));
    }
    let Some(sig) = lookup(args, "api_sig") else {
        return Err(Failure::new(97, "Missing signature"));
    };
    if sig != signature(&config.secret, args) {
        return Err(Failure::new(96, "Invalid signature"));
    }
    Ok(())
}

/// Resolve `auth_token` to a user. Absent is fine unless `required`.
fn caller(store: &Store, args: &[(String, String)], required: bool) -> Result<Option<String>, Failure> {
    match lookup(args, "auth_token").filter(|t| !t.is_empty()) {
        Some(token) => store
            .tokens
            .get(token)
            .cloned()
            .map(Some)
            .ok_or_else(|| Failure::new(98, "Invalid auth token")),
        None if required => Err(Failure::new(98, "Invalid auth token")),
        None => Ok(None),
    }
}

fn esc(s: &str) -> Cow<'_, str> {
    escape(s)
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn xml_response(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        format!("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n{body}"),
    )
        .into_response()
}

fn ok(payload: String) -> Response {
    xml_response(format!("<rsp stat=\"ok\">\n{payload}</rsp>\n"))
}

fn fail(failure: Failure) -> Response {
    warn!("failing request: code {} {}", failure.code, failure.msg);
    xml_response(format!(
        "<rsp stat=\"fail\">\n  <err code=\"{}\" msg=\"{}\" />\n</rsp>\n",
        failure.code,
        esc(&failure.msg)
    ))
}

fn respond(result: Result<String, Failure>) -> Response {
    match result {
        Ok(payload) => ok(payload),
        Err(failure) => fail(failure),
    }
}

async fn rest(State(state): State<Shared>, Query(args): Query<Vec<(String, String)>>) -> Response {
    let method = lookup(&args, "method").unwrap_or_default().to_string();
    info!("REST {method}");
    if let Err(failure) = verify_signature(&state.config, &args) {
        return fail(failure);
    }
    let result = match method.as_str() {
        "flickr.auth.getToken" => get_token(&state, &args).await,
        "flickr.photos.search" => search(&state, &args).await,
        "flickr.photos.getInfo" => get_info(&state, &args).await,
        "flickr.photos.getSizes" => get_sizes(&state, &args).await,
        "flickr.photos.upload.checkTickets" => check_tickets(&state, &args).await,
        "flickr.photosets.getList" => get_photosets(&state, &args).await,
        other => Err(Failure::new(112, format!("Method \"{other}\" not found"))),
    };
    respond(result)
}

async fn authorize(State(state): State<Shared>, Query(args): Query<Vec<(String, String)>>) -> Response {
    if let Err(failure) = verify_signature(&state.config, &args) {
        return fail(failure);
    }
    let perms = lookup(&args, "perms").unwrap_or("read");
    format!("Authorize application {} with {perms} permission?\n", state.config.api_key).into_response()
}

async fn get_token(state: &AppState, args: &[(String, String)]) -> Result<String, Failure> {
    let frob = lookup(args, "frob").filter(|f| !f.is_empty()).ok_or_else(|| Failure::new(108, "Invalid frob"))?;
    let token = format!("72157-{}", Uuid::new_v4().simple());
    state.store.write().await.tokens.insert(token.clone(), TEST_NSID.to_string());
    info!("exchanged frob {frob} for a token");
    Ok(format!(
        "  <auth>\n    <token>{token}</token>\n    <perms>write</perms>\n    \
         <user nsid=\"{TEST_NSID}\" username=\"{TEST_USERNAME}\" fullname=\"Test User\" />\n  </auth>\n"
    ))
}

async fn search(state: &AppState, args: &[(String, String)]) -> Result<String, Failure> {
    let store = state.store.read().await;
    let me = caller(&store, args, false)?;
    let owner = match lookup(args, "user_id") {
        Some("me") => Some(me.ok_or_else(|| Failure::new(98, "Invalid auth token"))?),
        Some(other) => Some(other.to_string()),
        None => None,
    };
    let per_page: usize = lookup(args, "per_page").and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(100);
    let page: usize = lookup(args, "page").and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(1);

    let matching: Vec<&StoredPhoto> = store
        .photos
        .iter()
        .filter(|p| owner.as_deref().map_or(true, |o| p.owner == o))
        .collect();
    let total = matching.len();
    let pages = total.div_ceil(per_page);

    let mut out = format!("  <photos page=\"{page}\" pages=\"{pages}\" perpage=\"{per_page}\" total=\"{total}\">\n");
    let skip = page.saturating_sub(1).saturating_mul(per_page);
    for p in matching.iter().skip(skip).take(per_page) {
        out.push_str(&format!(
            "    <photo id=\"{}\" owner=\"{}\" secret=\"{}\" server=\"{}\" farm=\"{}\" title=\"{}\" \
             ispublic=\"{}\" isfriend=\"0\" isfamily=\"0\" width_t=\"{}\" height_t=\"{}\" />\n",
            p.id,
            esc(&p.owner),
            p.secret,
            p.server,
            p.farm,
            esc(&p.title),
            flag(p.is_public),
            p.width,
            p.height
        ));
    }
    out.push_str("  </photos>\n");
    Ok(out)
}

fn photo_id<'a>(args: &'a [(String, String)]) -> Result<&'a str, Failure> {
    lookup(args, "photo_id").ok_or_else(|| Failure::new(1, "Photo not found"))
}

async fn get_info(state: &AppState, args: &[(String, String)]) -> Result<String, Failure> {
    let store = state.store.read().await;
    let p = store.photo(photo_id(args)?).ok_or_else(|| Failure::new(1, "Photo not found"))?;
    Ok(format!(
        "  <photo id=\"{id}\" secret=\"{secret}\" server=\"{server}\" farm=\"{farm}\" isfavorite=\"0\" license=\"3\" rotation=\"0\">\n    \
         <owner nsid=\"{owner}\" username=\"{TEST_USERNAME}\" realname=\"Test User\" location=\"\" />\n    \
         <title>{title}</title>\n    \
         <description>{description}</description>\n    \
         <visibility ispublic=\"{public}\" isfriend=\"0\" isfamily=\"0\" />\n    \
         <dates posted=\"1100897479\" taken=\"2004-11-19 12:51:19\" takengranularity=\"0\" lastupdate=\"1093022469\" />\n    \
         <comments>0</comments>\n    \
         <tags>\n      <tag id=\"{id}-1\" author=\"{owner}\" raw=\"{title}\">{tag}</tag>\n    </tags>\n    \
         <urls>\n      <url type=\"photopage\">http://www.flickr.com/photos/{owner}/{id}/</url>\n    </urls>\n  \
         </photo>\n",
        id = p.id,
        secret = p.secret,
        server = p.server,
        farm = p.farm,
        owner = esc(&p.owner),
        title = esc(&p.title),
        description = esc(&p.description),
        public = flag(p.is_public),
        tag = esc(&p.title.to_lowercase().replace(' ', "")),
    ))
}

async fn get_sizes(state: &AppState, args: &[(String, String)]) -> Result<String, Failure> {
    let store = state.store.read().await;
    let p = store.photo(photo_id(args)?).ok_or_else(|| Failure::new(1, "Photo not found"))?;
    let base = format!("http://farm{}.static.flickr.com/{}/{}_{}", p.farm, p.server, p.id, p.secret);
    let renditions = [
        ("Square", 75, 75, "_s", "sq"),
        ("Thumbnail", p.width, p.height, "_t", "t"),
        ("Medium", p.width * 5, p.height * 5, "", "m"),
        ("Original", p.width * 10, p.height * 10, "_o", "o"),
    ];
    let mut out = String::from("  <sizes canblog=\"0\" canprint=\"1\" candownload=\"1\">\n");
    for (label, width, height, suffix, page) in renditions {
        out.push_str(&format!(
            "    <size label=\"{label}\" width=\"{width}\" height=\"{height}\" source=\"{base}{suffix}.jpg\" \
             url=\"http://www.flickr.com/photos/{}/{}/sizes/{page}/\" media=\"photo\" />\n",
            esc(&p.owner),
            p.id
        ));
    }
    out.push_str("  </sizes>\n");
    Ok(out)
}

async fn check_tickets(state: &AppState, args: &[(String, String)]) -> Result<String, Failure> {
    let mut store = state.store.write().await;
    caller(&store, args, true)?;
    let ids: Vec<String> = lookup(args, "tickets")
        .unwrap_or_default()
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let mut out = String::from("  <uploader>\n");
    for id in ids {
        let Some(index) = store.tickets.iter().position(|t| t.id == id) else {
            out.push_str(&format!("    <ticket id=\"{}\" invalid=\"1\" />\n", esc(&id)));
            continue;
        };
        store.tickets[index].checks += 1;
        let ticket = store.tickets[index].clone();
        if ticket.checks < 2 {
            out.push_str(&format!("    <ticket id=\"{id}\" complete=\"0\" />\n"));
            continue;
        }
        let photo_id = match ticket.photo_id {
            Some(photo_id) => photo_id,
            None => {
                let photo_id = store.next_id();
                store.photos.push(StoredPhoto {
                    id: photo_id.clone(),
                    owner: ticket.owner.clone(),
                    secret: Uuid::new_v4().simple().to_string()[..10].to_string(),
                    server: "1".to_string(),
                    farm: "1".to_string(),
                    title: ticket.title.clone(),
                    description: String::new(),
                    is_public: false,
                    width: 100,
                    height: 75,
                });
                store.tickets[index].photo_id = Some(photo_id.clone());
                info!("ticket {id} completed as photo {photo_id}");
                photo_id
            }
        };
        out.push_str(&format!("    <ticket id=\"{id}\" complete=\"1\" photoid=\"{photo_id}\" />\n"));
    }
    out.push_str("  </uploader>\n");
    Ok(out)
}

async fn get_photosets(state: &AppState, args: &[(String, String)]) -> Result<String, Failure> {
    let store = state.store.read().await;
    let me = caller(&store, args, false)?;
    let user = match lookup(args, "user_id") {
        Some(user) => user.to_string(),
        None => me.ok_or_else(|| Failure::new(1, "User not found"))?,
    };
    let mut out = String::from("  <photosets cancreate=\"1\">\n");
    if user == TEST_NSID {
        out.push_str(
            "    <photoset id=\"12345\" photos=\"35\" videos=\"0\">\n      <title>Flowers</title>\n      \
             <description>All my flower pictures</description>\n    </photoset>\n    \
             <photoset id=\"65656\" photos=\"112\" videos=\"32\">\n      <title>Sophie</title>\n      \
             <description>Photos and videos of Sophie</description>\n    </photoset>\n",
        );
    }
    out.push_str("  </photosets>\n");
    Ok(out)
}

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Result<Response, MultipartError> {
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut photo: Option<UploadedFile> = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) if name == "photo" => {
                let data = field.bytes().await?.to_vec();
                photo = Some(UploadedFile { filename, data });
            }
            _ => {
                let value = field.text().await?;
                fields.push((name, value));
            }
        }
    }
    info!("upload with {} fields", fields.len());
    Ok(respond(accept_upload(&state, &fields, photo).await))
}

async fn accept_upload(
    state: &AppState,
    fields: &[(String, String)],
    photo: Option<UploadedFile>,
) -> Result<String, Failure> {
    verify_signature(&state.config, fields)?;
    let mut store = state.store.write().await;
    let owner = caller(&store, fields, true)?.unwrap_or_default();
    let photo = photo.ok_or_else(|| Failure::new(2, "No photo specified"))?;
    if photo.data.is_empty() {
        return Err(Failure::new(4, "Filesize was zero"));
    }
    let extension = photo
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Failure::new(5, "Filetype was not recognised"));
    }

    let id = store.next_id();
    let title = lookup(fields, "title").unwrap_or(&photo.filename).to_string();
    store.tickets.push(Ticket {
        id: id.clone(),
        owner,
        title,
        checks: 0,
        photo_id: None,
    });
    info!("accepted {} ({} bytes) as ticket {id}", photo.filename, photo.data.len());
    Ok(format!("  <ticketid>{id}</ticketid>\n"))
}
