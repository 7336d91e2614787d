//! Minimal `multipart/form-data` writer for photo uploads.

use std::io::Write;

use uuid::Uuid;

use crate::error::MultipartError;

/// Content type for an upload, chosen from the lower-cased file extension.
///
/// Unknown extensions yield `None`; the server decides whether it accepts
/// the file.
pub fn content_type_for(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Writes form fields and a file part to `W`, framed by a random boundary.
pub struct MultipartWriter<W> {
    inner: W,
    boundary: String,
}

impl<W: Write> MultipartWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            boundary: format!("flickr-{}", Uuid::new_v4().simple()),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn form_data_content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn write_field(&mut self, name: &str, value: &str) -> Result<(), MultipartError> {
        check_header_value("field name", name)?;
        write!(
            self.inner,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            self.boundary, name, value
        )
        .map_err(|source| MultipartError::Field {
            name: name.to_string(),
            source,
        })
    }

    pub fn write_file(
        &mut self,
        name: &str,
        filename: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<(), MultipartError> {
        check_header_value("field name", name)?;
        check_header_value("filename", filename)?;
        let file_err = |source| MultipartError::File {
            filename: filename.to_string(),
            source,
        };

        write!(
            self.inner,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            self.boundary, name, filename
        )
        .map_err(file_err)?;
        if let Some(content_type) = content_type {
            write!(self.inner, "Content-Type: {content_type}\r\n").map_err(file_err)?;
        }
        self.inner.write_all(b"\r\n").map_err(file_err)?;
        self.inner.write_all(data).map_err(file_err)?;
        self.inner.write_all(b"\r\n").map_err(file_err)
    }

    /// Write the closing boundary and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, MultipartError> {
        write!(self.inner, "--{}--\r\n", self.boundary).map_err(|source| MultipartError::Field {
            name: "closing boundary".to_string(),
            source,
        })?;
        Ok(self.inner)
    }
}

fn check_header_value(what: &'static str, value: &str) -> Result<(), MultipartError> {
    if value.contains(['"', '\r', '\n']) {
        return Err(MultipartError::InvalidHeaderValue {
            what,
            value: value.to_string(),
        });
    }
    Ok(())
}
