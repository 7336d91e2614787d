//! Signed request construction.
//!
//! # Design
//! `RequestBuilder` borrows the client's credentials and endpoints and turns
//! an `ArgumentSet` into something a transport can send: a signed GET URL for
//! API methods, an unfetched authorization URL, or a signed multipart POST for
//! uploads. Nothing here performs I/O.
//!
//! The GET and upload paths treat the auth token differently: a GET omits
//! `auth_token` entirely when none is set, while an upload always carries the
//! field, empty if need be.

use log::debug;
use url::form_urlencoded;

use crate::args::{sign, ArgumentSet};
use crate::config::{Credentials, Endpoints};
use crate::error::FlickrError;
use crate::http::{HttpMethod, HttpRequest};
use crate::multipart::{content_type_for, MultipartWriter};
use crate::types::Perms;

/// Name of the multipart part carrying the photo bytes.
pub const PHOTO_FIELD: &str = "photo";

#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    credentials: &'a Credentials,
    endpoints: &'a Endpoints,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(credentials: &'a Credentials, endpoints: &'a Endpoints) -> Self {
        Self {
            credentials,
            endpoints,
        }
    }

    /// Signed `GET <service>/rest/?...` URL invoking `method`.
    pub fn method_url(&self, method: &str, args: &ArgumentSet) -> String {
        let mut args = args.clone();
        args.insert("method", method);
        if let Some(token) = self.credentials.auth_token() {
            args.insert("auth_token", token);
        }
        let url = self.signed_url(self.endpoints.rest_url(), args);
        debug!("built {method} request for api_key {}", self.credentials.api_key);
        url
    }

    /// Authorization URL a user visits to grant `perms`. Never fetched here.
    pub fn auth_url(&self, perms: Perms) -> String {
        let args = ArgumentSet::from([("perms", perms.as_str())]);
        self.signed_url(self.endpoints.auth_url(), args)
    }

    /// Signed multipart upload of `photo` named `filename`.
    ///
    /// `args` carries caller metadata such as `title` or `description`.
    pub fn upload_request(
        &self,
        filename: &str,
        photo: &[u8],
        args: &ArgumentSet,
    ) -> Result<HttpRequest, FlickrError> {
        let mut fields = args.clone();
        fields.insert("api_key", self.credentials.api_key.as_str());
        fields.insert("auth_token", self.credentials.auth_token().unwrap_or_default());
        fields.insert("async", "1");
        let api_sig = sign(&self.credentials.secret, &fields);
        fields.insert("api_sig", api_sig);

        let mut writer = MultipartWriter::new(Vec::with_capacity(photo.len() + 1024));
        for (name, value) in fields.canonical() {
            writer.write_field(name, value)?;
        }
        writer.write_file(PHOTO_FIELD, filename, content_type_for(filename), photo)?;
        let content_type = writer.form_data_content_type();
        let body = writer.finish()?;

        debug!(
            "built upload request for {filename} ({} bytes, {} fields)",
            photo.len(),
            fields.len()
        );
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoints.upload.clone(),
            headers: vec![("content-type".to_string(), content_type)],
            body: Some(body),
        })
    }

    fn signed_url(&self, base: String, mut args: ArgumentSet) -> String {
        args.insert("api_key", self.credentials.api_key.as_str());
        let api_sig = sign(&self.credentials.secret, &args);
        args.insert("api_sig", api_sig);

        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in args.canonical() {
            query.append_pair(key, value);
        }
        format!("{base}?{}", query.finish())
    }
}
