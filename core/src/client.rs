//! Flickr API client.
//!
//! # Design
//! `FlickrClient` holds the credentials, the endpoints and an injected
//! `Transport`. Every operation is the same pipeline: build a signed request,
//! hand it to the transport, decode the `<rsp>` envelope into the operation's
//! result type. The first failure is returned as is; there are no retries, no
//! caching and no background work.
//!
//! The only mutable state is the auth token. Setting it takes `&mut self`, so
//! it cannot race with requests in flight on the same client.

use log::debug;

use crate::args::ArgumentSet;
use crate::config::{Credentials, Endpoints};
use crate::decode::decode;
use crate::error::{FlickrError, Result};
use crate::http::{Body, HttpMethod, Transport};
use crate::request::RequestBuilder;
use crate::types::{AuthToken, InfoResult, Perms, PhotoSet, SearchResult, SizesResult, TicketStatus, User};
use crate::wire::{AuthRsp, InfoRsp, Payload, PhotoSetsRsp, SearchRsp, SizesRsp, TicketsRsp, UploadRsp};

pub const METHOD_GET_TOKEN: &str = "flickr.auth.getToken";
pub const METHOD_SEARCH: &str = "flickr.photos.search";
pub const METHOD_GET_INFO: &str = "flickr.photos.getInfo";
pub const METHOD_GET_SIZES: &str = "flickr.photos.getSizes";
pub const METHOD_CHECK_TICKETS: &str = "flickr.photos.upload.checkTickets";
pub const METHOD_GET_PHOTOSETS: &str = "flickr.photosets.getList";

/// Synchronous client for the Flickr REST API.
pub struct FlickrClient<T> {
    credentials: Credentials,
    endpoints: Endpoints,
    transport: T,
}

impl<T: Transport> FlickrClient<T> {
    pub fn new(api_key: &str, secret: &str, transport: T) -> Self {
        Self {
            credentials: Credentials::new(api_key, secret),
            endpoints: Endpoints::default(),
            transport,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.credentials.auth_token()
    }

    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.credentials.auth_token = Some(token.into());
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn requests(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.credentials, &self.endpoints)
    }

    /// URL the user visits to authorize this application. No request is made.
    pub fn auth_url(&self, perms: Perms) -> String {
        self.requests().auth_url(perms)
    }

    /// Exchange a frob for an auth token. The client's own token is unchanged;
    /// see [`FlickrClient::authenticate`].
    pub fn get_token(&self, frob: &str) -> Result<AuthToken> {
        self.call::<AuthRsp>(METHOD_GET_TOKEN, &ArgumentSet::from([("frob", frob)]))
    }

    /// Exchange a frob and keep the resulting token for later calls.
    pub fn authenticate(&mut self, frob: &str) -> Result<User> {
        let auth = self.get_token(frob)?;
        debug!("authenticated as {} with {} permission", auth.user.nsid, auth.perms);
        self.set_auth_token(auth.token);
        Ok(auth.user)
    }

    pub fn search(&self, args: &ArgumentSet) -> Result<SearchResult> {
        self.call::<SearchRsp>(METHOD_SEARCH, args)
    }

    pub fn get_info(&self, photo_id: &str) -> Result<InfoResult> {
        self.call::<InfoRsp>(METHOD_GET_INFO, &ArgumentSet::from([("photo_id", photo_id)]))
    }

    pub fn get_sizes(&self, photo_id: &str) -> Result<SizesResult> {
        self.call::<SizesRsp>(METHOD_GET_SIZES, &ArgumentSet::from([("photo_id", photo_id)]))
    }

    /// Upload `photo` asynchronously and return its ticket id.
    ///
    /// Unsupported file types are reported by the server as an API error.
    pub fn upload(&self, filename: &str, photo: &[u8], args: &ArgumentSet) -> Result<String> {
        let request = self.requests().upload_request(filename, photo, args)?;
        debug!("POST {}", request.url);
        let body = self
            .transport
            .send(&request)
            .map_err(|source| FlickrError::Transport {
                method: request.method,
                url: request.url.clone(),
                source,
            })?;
        decode::<UploadRsp>(body)
    }

    /// Status of each ticket, ordered like `ticket_ids`.
    pub fn check_tickets<S: AsRef<str>>(&self, ticket_ids: &[S]) -> Result<Vec<TicketStatus>> {
        let ids: Vec<&str> = ticket_ids.iter().map(AsRef::as_ref).collect();
        let args = ArgumentSet::from([("tickets", ids.join(","))]);
        let mut statuses = self.call::<TicketsRsp>(METHOD_CHECK_TICKETS, &args)?;
        statuses.sort_by_key(|s| ids.iter().position(|id| *id == s.id).unwrap_or(ids.len()));
        Ok(statuses)
    }

    /// Photo sets owned by `user_id`, in the server's order.
    pub fn get_sets(&self, user_id: &str) -> Result<Vec<PhotoSet>> {
        self.call::<PhotoSetsRsp>(METHOD_GET_PHOTOSETS, &ArgumentSet::from([("user_id", user_id)]))
    }

    fn call<P: Payload>(&self, method: &str, args: &ArgumentSet) -> Result<P::Output> {
        let url = self.requests().method_url(method, args);
        let body = self.fetch(&url)?;
        decode::<P>(body)
    }

    fn fetch(&self, url: &str) -> Result<Body> {
        debug!("GET {url}");
        self.transport.get(url).map_err(|source| FlickrError::Transport {
            method: HttpMethod::Get,
            url: url.to_string(),
            source,
        })
    }
}

impl<T> std::fmt::Debug for FlickrClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrClient")
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    use url::Url;

    use super::*;
    use crate::error::TransportError;
    use crate::http::HttpRequest;

    const API_KEY: &str = "87337fd784";
    const SECRET: &str = "sf97838dijd";

    /// Replays one canned body (or failure) and records what was asked for.
    struct FakeTransport {
        body: Option<&'static str>,
        gets: RefCell<Vec<String>>,
        sends: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn replying(body: &'static str) -> Self {
            Self {
                body: Some(body),
                gets: RefCell::new(Vec::new()),
                sends: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                body: None,
                gets: RefCell::new(Vec::new()),
                sends: RefCell::new(Vec::new()),
            }
        }

        fn reply(&self) -> std::result::Result<Body, TransportError> {
            match self.body {
                Some(body) => Ok(Box::new(Cursor::new(body.as_bytes().to_vec()))),
                None => Err(TransportError::new("random error")),
            }
        }

        fn last_query(&self) -> HashMap<String, String> {
            let gets = self.gets.borrow();
            let url = Url::parse(gets.last().unwrap()).unwrap();
            url.query_pairs().into_owned().collect()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> std::result::Result<Body, TransportError> {
            self.gets.borrow_mut().push(url.to_string());
            self.reply()
        }

        fn send(&self, request: &HttpRequest) -> std::result::Result<Body, TransportError> {
            self.sends.borrow_mut().push(request.clone());
            self.reply()
        }
    }

    fn client(transport: &FakeTransport) -> FlickrClient<&FakeTransport> {
        FlickrClient::new(API_KEY, SECRET, transport)
    }

    #[test]
    fn transport_failure_is_wrapped_with_url() {
        let transport = FakeTransport::failing();
        let err = client(&transport).get_info("2733").unwrap_err();
        let url = transport.gets.borrow()[0].clone();
        match &err {
            FlickrError::Transport { method, url: failed, .. } => {
                assert_eq!(*method, HttpMethod::Get);
                assert_eq!(*failed, url);
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(err.to_string(), format!("GET {url} failed: random error"));
    }

    #[test]
    fn upload_transport_failure_names_post() {
        let transport = FakeTransport::failing();
        let err = client(&transport)
            .upload("a.jpg", b"x", &ArgumentSet::new())
            .unwrap_err();
        assert!(matches!(err, FlickrError::Transport { method: HttpMethod::Post, .. }));
    }

    #[test]
    fn auth_url_makes_no_request() {
        let transport = FakeTransport::failing();
        let url = client(&transport).auth_url(Perms::Write);
        assert!(url.contains("perms=write"));
        assert!(transport.gets.borrow().is_empty());
    }

    #[test]
    fn get_token_sends_frob() {
        let transport = FakeTransport::replying(
            r#"<rsp stat="ok"><auth><token>121-84669832774</token><perms>write</perms>
               <user nsid="7687633@N01" username="testuser" fullname="Test User"/></auth></rsp>"#,
        );
        let auth = client(&transport).get_token("837cjnei").unwrap();
        assert_eq!(auth.token, "121-84669832774");
        assert_eq!(auth.user.username, "testuser");

        let q = transport.last_query();
        assert_eq!(q["method"], METHOD_GET_TOKEN);
        assert_eq!(q["frob"], "837cjnei");
        assert_eq!(q["api_key"], API_KEY);
        assert!(q.contains_key("api_sig"));
        assert!(!q.contains_key("auth_token"));
    }

    #[test]
    fn get_token_failure_surfaces_api_error() {
        let transport = FakeTransport::replying(
            r#"<?xml version="1.0" encoding="utf-8"?>
               <rsp stat="fail"><err code="97" msg="Missing signature"/></rsp>"#,
        );
        let err = client(&transport).get_token("878243").unwrap_err();
        assert!(err.to_string().contains("code 97: Missing signature"));
    }

    #[test]
    fn authenticate_stores_token_for_later_calls() {
        let transport = FakeTransport::replying(
            r#"<rsp stat="ok"><auth><token>tok-1</token><perms>read</perms>
               <user nsid="1@N01" username="u"/></auth></rsp>"#,
        );
        let mut c = client(&transport);
        assert_eq!(c.auth_token(), None);
        let user = c.authenticate("frob").unwrap();
        assert_eq!(user.nsid, "1@N01");
        assert_eq!(user.fullname, None);
        assert_eq!(c.auth_token(), Some("tok-1"));

        c.get_token("again").unwrap();
        assert_eq!(transport.last_query()["auth_token"], "tok-1");
    }

    #[test]
    fn failed_authentication_leaves_token_unset() {
        let transport = FakeTransport::replying(r#"<rsp stat="fail"><err code="108" msg="Invalid frob"/></rsp>"#);
        let mut c = client(&transport);
        assert_eq!(c.authenticate("bad").unwrap_err().api_code(), Some(108));
        assert_eq!(c.auth_token(), None);
    }

    #[test]
    fn search_passes_caller_args() {
        let transport = FakeTransport::replying(
            r#"<rsp stat="ok"><photos page="2" pages="3" perpage="10" total="25"/></rsp>"#,
        );
        let args = ArgumentSet::from([("per_page", "10"), ("user_id", "me")]);
        let r = client(&transport).search(&args).unwrap();
        assert_eq!((r.page, r.pages, r.per_page, r.total), (2, 3, 10, 25));

        let q = transport.last_query();
        assert_eq!(q["method"], METHOD_SEARCH);
        assert_eq!(q["per_page"], "10");
        assert_eq!(q["user_id"], "me");
    }

    #[test]
    fn get_info_and_sizes_send_photo_id() {
        let transport = FakeTransport::replying(r#"<rsp stat="ok"><photo id="2733" secret="s" server="1"/></rsp>"#);
        let info = client(&transport).get_info("2733").unwrap();
        assert_eq!(info.id, "2733");
        assert_eq!(transport.last_query()["method"], METHOD_GET_INFO);
        assert_eq!(transport.last_query()["photo_id"], "2733");

        let transport = FakeTransport::replying(r#"<rsp stat="ok"><sizes canblog="1"/></rsp>"#);
        let sizes = client(&transport).get_sizes("2733").unwrap();
        assert!(sizes.can_blog && !sizes.can_print);
        assert!(sizes.sizes.is_empty());
        assert_eq!(transport.last_query()["method"], METHOD_GET_SIZES);
    }

    #[test]
    fn upload_returns_ticket() {
        let transport = FakeTransport::replying(
            r#"<?xml version="1.0" encoding="utf-8"?><rsp stat="ok"><ticketid>363</ticketid></rsp>"#,
        );
        let mut c = client(&transport);
        c.set_auth_token("ase878723623");
        let ticket = c.upload("filename", &vec![0u8; 1024 * 1024], &ArgumentSet::new()).unwrap();
        assert_eq!(ticket, "363");

        let sends = transport.sends.borrow();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].method, HttpMethod::Post);
        assert_eq!(sends[0].url, crate::config::DEFAULT_UPLOAD_URL);
        assert!(sends[0].body.as_ref().unwrap().len() > 1024 * 1024);
    }

    #[test]
    fn upload_rejected_filetype_is_api_error() {
        let transport = FakeTransport::replying(
            r#"<rsp stat="fail"><err code="5" msg="Filetype was not recognised"/></rsp>"#,
        );
        let err = client(&transport)
            .upload("filename", b"photo content", &ArgumentSet::new())
            .unwrap_err();
        assert!(err.to_string().contains("code 5: Filetype was not recognised"));
    }

    #[test]
    fn check_tickets_joins_ids_and_follows_input_order() {
        let transport = FakeTransport::replying(
            r#"<rsp stat="ok"><uploader>
                 <ticket id="333" invalid="1"/>
                 <ticket id="12345" complete="0"/>
                 <ticket id="56789" complete="1" photoid="232323"/>
               </uploader></rsp>"#,
        );
        let statuses = client(&transport).check_tickets(&["12345", "56789", "333"]).unwrap();
        let ids: Vec<&str> = statuses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["12345", "56789", "333"]);
        assert_eq!(statuses[1].photo_id.as_deref(), Some("232323"));

        let q = transport.last_query();
        assert_eq!(q["method"], METHOD_CHECK_TICKETS);
        assert_eq!(q["tickets"], "12345,56789,333");
    }

    #[test]
    fn get_sets_sends_user_id() {
        let transport = FakeTransport::replying(
            r#"<rsp stat="ok"><photosets cancreate="1">
                 <photoset id="12345" photos="35" videos="0"><title>Flowers</title><description>All my flower pictures</description></photoset>
               </photosets></rsp>"#,
        );
        let sets = client(&transport).get_sets("7687633@N01").unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].title, "Flowers");

        let q = transport.last_query();
        assert_eq!(q["method"], METHOD_GET_PHOTOSETS);
        assert_eq!(q["user_id"], "7687633@N01");
    }

    #[test]
    fn custom_endpoints_are_used() {
        let transport = FakeTransport::replying(r#"<rsp stat="ok"><photosets/></rsp>"#);
        let c = client(&transport).with_endpoints(Endpoints::new("http://localhost:9/services/", "http://localhost:9/up"));
        assert!(c.get_sets("me").unwrap().is_empty());
        assert!(transport.gets.borrow()[0].starts_with("http://localhost:9/services/rest/?"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let transport = FakeTransport::failing();
        let shown = format!("{:?}", client(&transport));
        assert!(shown.contains(API_KEY));
        assert!(!shown.contains(SECRET));
    }
}
