//! Fuzz target for inbound wire decoding.
//!
//! Every byte string the server (or anything impersonating it) can send is
//! fed to the three decoders the client runs on untrusted input: CBOR
//! events, JSON events and the JSON history body.
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Anything that decodes re-encodes and decodes to the same value

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_proto::{HistoryBatch, ServerEvent};

fuzz_target!(|data: &[u8]| {
    if let Ok(event) = ServerEvent::decode(data) {
        let mut buf = Vec::new();
        if event.encode(&mut buf).is_ok() {
            assert_eq!(ServerEvent::decode(&buf).ok(), Some(event));
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(event) = ServerEvent::from_json(text) {
            let json = event.to_json().expect("decoded event re-encodes");
            assert_eq!(ServerEvent::from_json(&json).ok(), Some(event));
        }
    }

    let _ = HistoryBatch::from_json(data);
});
