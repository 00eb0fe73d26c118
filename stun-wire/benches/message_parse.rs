// Copyright (C) 2020 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stun_wire::attribute::{Attribute, AttributeType};
use stun_wire::message::{Message, BINDING};
use stun_wire::validate;

const KEY: &[u8] = b"password";

fn bench_message_parse(c: &mut Criterion) {
    let addr = "192.168.10.200:9876".parse().unwrap();

    let mut msg = Message::new_request(BINDING);
    msg.add_software("stun-wire").unwrap();
    let software = msg.to_bytes().unwrap();

    msg.add_xor_mapped_address(addr).unwrap();
    msg.add_nonce("nonce").unwrap();
    msg.add_priority(100).unwrap();
    msg.add_ice_controlling(300).unwrap();
    msg.add_use_candidate().unwrap();
    let attributes = msg.to_bytes().unwrap();

    msg.add_message_integrity(KEY).unwrap();
    msg.add_fingerprint().unwrap();
    let signed = msg.to_bytes().unwrap();

    let mut group = c.benchmark_group("Message/Parse");
    for (name, data) in [
        ("Software", &software),
        ("Attributes/6", &attributes),
        ("Attributes/6+Integrity+Fingerprint", &signed),
    ] {
        group.throughput(criterion::Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), data, |b, data| {
            b.iter(|| Message::from_bytes(data).unwrap())
        });
    }
    group.finish();

    let mut group = c.benchmark_group("Message/Verify");
    group.throughput(criterion::Throughput::Bytes(signed.len() as u64));
    group.bench_with_input(
        BenchmarkId::from_parameter("Fingerprint"),
        &signed,
        |b, data| b.iter(|| validate::verify_fingerprint(data).unwrap()),
    );
    group.bench_with_input(
        BenchmarkId::from_parameter("Integrity"),
        &signed,
        |b, data| b.iter(|| validate::verify_message_integrity(data, KEY).unwrap()),
    );
    group.finish();

    let mut group = c.benchmark_group("Attribute/Parse/Nonce");
    for n in [4, 64, 127] {
        let nonce = Attribute::text(AttributeType::NONCE, &"c".repeat(n)).unwrap();
        let raw = nonce.to_raw(None).unwrap().to_bytes();
        group.throughput(criterion::Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n.to_string()), &raw, |b, raw| {
            b.iter(|| {
                let raw = stun_wire::attribute::RawAttribute::from_bytes(raw).unwrap();
                Attribute::parse(&raw, None).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(message_parse, bench_message_parse);
criterion_main!(message_parse);
