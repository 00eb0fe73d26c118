// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

use std::sync::Once;

use stun_wire::message::*;
use stun_wire::validate;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

fn init_log() {
    TRACING.call_once(|| {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    });
}

#[derive(Arbitrary, Debug)]
struct DataAndCredentials<'data> {
    data: &'data [u8],
    credentials: MessageIntegrityCredentials,
}

fuzz_target!(|data_and_credentials: DataAndCredentials| {
    init_log();
    let data = data_and_credentials.data;
    let key = data_and_credentials.credentials.make_hmac_key();

    // byte level verification never panics
    let _ = validate::verify_fingerprint(data);
    let _ = validate::verify_message_integrity(data, &key);

    let Ok(msg) = Message::from_bytes(data) else {
        return;
    };
    let _ = validate::validate_fingerprint(&msg);
    let _ = validate::validate_message_integrity(&msg, &key);

    // anything that re-encodes must decode to the same message
    if let Ok(encoded) = msg.to_bytes() {
        let reparsed = Message::from_bytes(&encoded).unwrap();
        assert_eq!(reparsed, msg);
        assert_eq!(reparsed.to_bytes().unwrap(), encoded);
    }
});
