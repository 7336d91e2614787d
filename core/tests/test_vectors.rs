//! Verify signing and envelope decoding against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Signature vectors pin the canonical argument order and the MD5 digest.
//! Envelope vectors feed a canned `<rsp>` body through each client operation
//! and compare the typed result as JSON, so field order never matters.

use std::io::Cursor;

use flickr_core::{
    sign, ArgumentSet, Body, FlickrClient, FlickrError, HttpRequest, Transport, TransportError,
};
use serde_json::Value;

const API_KEY: &str = "87337fd784";
const SECRET: &str = "sf97838dijd";

/// Answers every request with the same body.
struct CannedTransport(String);

impl CannedTransport {
    fn body(&self) -> Result<Body, TransportError> {
        Ok(Box::new(Cursor::new(self.0.clone().into_bytes())))
    }
}

impl Transport for CannedTransport {
    fn get(&self, _url: &str) -> Result<Body, TransportError> {
        self.body()
    }

    fn send(&self, _request: &HttpRequest) -> Result<Body, TransportError> {
        self.body()
    }
}

fn args_from(value: &Value) -> ArgumentSet {
    value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

#[test]
fn signature_test_vectors() {
    let raw = include_str!("../../test-vectors/signatures.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let args = args_from(&case["args"]);

        let canonical: Vec<Value> = args
            .canonical()
            .into_iter()
            .map(|(k, v)| serde_json::json!([k, v]))
            .collect();
        assert_eq!(Value::Array(canonical), case["expected_canonical"], "{name}: canonical order");

        let sig = sign(case["secret"].as_str().unwrap(), &args);
        assert_eq!(sig, case["expected_sig"].as_str().unwrap(), "{name}: api_sig");
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

fn run(case: &Value) -> Result<Value, FlickrError> {
    let body = case["simulated_response"].as_str().unwrap().to_string();
    let mut client = FlickrClient::new(API_KEY, SECRET, CannedTransport(body));
    client.set_auth_token("ase878723623");

    let value = match case["operation"].as_str().unwrap() {
        "get_token" => serde_json::to_value(client.get_token("frob")?),
        "search" => serde_json::to_value(client.search(&ArgumentSet::new())?),
        "get_info" => serde_json::to_value(client.get_info("1")?),
        "get_sizes" => serde_json::to_value(client.get_sizes("1")?),
        "check_tickets" => {
            let tickets: Vec<&str> = case["tickets"]
                .as_array()
                .unwrap()
                .iter()
                .map(|t| t.as_str().unwrap())
                .collect();
            serde_json::to_value(client.check_tickets(tickets.as_slice())?)
        }
        "get_sets" => serde_json::to_value(client.get_sets("7687633@N01")?),
        "upload" => serde_json::to_value(client.upload("kitten.jpg", b"photo", &ArgumentSet::new())?),
        other => panic!("unknown operation: {other}"),
    };
    Ok(value.unwrap())
}

#[test]
fn envelope_test_vectors() {
    let raw = include_str!("../../test-vectors/envelopes.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let outcome = run(case);

        if let Some(expected) = case.get("expected_result") {
            match outcome {
                Ok(actual) => assert_eq!(&actual, expected, "{name}: result"),
                Err(err) => panic!("{name}: expected success, got {err}"),
            }
            continue;
        }

        let expected = &case["expected_error"];
        let err = match outcome {
            Ok(actual) => panic!("{name}: expected an error, got {actual}"),
            Err(err) => err,
        };
        if expected["decode"].as_bool() == Some(true) {
            assert!(matches!(err, FlickrError::Decode { .. }), "{name}: expected decode error, got {err:?}");
            continue;
        }
        match &err {
            FlickrError::Api { code, message } => {
                assert_eq!(u64::from(*code), expected["code"].as_u64().unwrap(), "{name}: code");
                assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
            }
            other => panic!("{name}: expected API error, got {other:?}"),
        }
        assert_eq!(err.to_string(), expected["display"].as_str().unwrap(), "{name}: display");
    }
}
