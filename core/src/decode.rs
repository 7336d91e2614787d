//! Response envelope decoding.
//!
//! Decoding is two passes over the same text: first the `<rsp stat=..>`
//! status and optional `<err>`, then, only for `stat="ok"`, the
//! method-specific payload. Whether a body is an error or a payload is decided
//! by the status tag alone.

use std::io::Read;

use log::{trace, warn};

use crate::error::{FlickrError, Result};
use crate::wire::{Payload, Status};

pub(crate) fn decode<P: Payload>(mut body: impl Read) -> Result<P::Output> {
    let mut buf = Vec::new();
    body.read_to_end(&mut buf)
        .map_err(|e| FlickrError::decode(P::CONTEXT, format!("reading response body: {e}")))?;
    let text = std::str::from_utf8(&buf).map_err(|e| FlickrError::decode(P::CONTEXT, e))?;
    trace!("decoding {} from {}", P::CONTEXT, text);

    let status: Status = quick_xml::de::from_str(text)
        .map_err(|e| FlickrError::decode(P::CONTEXT, format!("response envelope: {e}")))?;
    match status.stat.as_str() {
        "ok" => {}
        "fail" => return Err(api_error(P::CONTEXT, status)),
        other => {
            return Err(FlickrError::decode(
                P::CONTEXT,
                format!("unknown response status {other:?}"),
            ))
        }
    }

    let payload: P = quick_xml::de::from_str(text).map_err(|e| FlickrError::decode(P::CONTEXT, e))?;
    Ok(payload.into_output())
}

fn api_error(context: &'static str, status: Status) -> FlickrError {
    let Some(err) = status.err else {
        return FlickrError::decode(context, "failure response without <err> element");
    };
    match err.code.trim().parse::<u32>() {
        Ok(code) => {
            warn!("API reported failure for {context}: code {code}: {}", err.msg);
            FlickrError::Api {
                code,
                message: err.msg,
            }
        }
        Err(_) => FlickrError::decode(context, format!("non-numeric error code {:?}", err.code)),
    }
}
