use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::net::Ipv4Addr;
use walkdns::dns::{
    DNSPacket, PacketBuffer,
    enums::DNSResourceType,
    resource::{DNSResource, DNSResourceData},
};

fn small_packet() -> DNSPacket {
    DNSPacket::new_query(0x1234, "www.example.com", DNSResourceType::A)
}

/// Referral shaped like a TLD server reply: 4 NS records with glue.
fn referral_packet() -> DNSPacket {
    let mut packet = small_packet();
    packet.header.qr = true;
    for (i, letter) in ["a", "b", "c", "d"].iter().enumerate() {
        let host = format!("{}.iana-servers.net", letter);
        packet.add_authority(DNSResource::new(
            "example.com",
            172800,
            DNSResourceData::NS(host.clone()),
        ));
        packet.add_resource(DNSResource::new(
            host,
            172800,
            DNSResourceData::A(Ipv4Addr::new(199, 43, 135, 53 + i as u8)),
        ));
    }
    packet
}

fn bench_packet_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_parsing");

    for (name, packet) in [("small_packet", small_packet()), ("referral", referral_packet())] {
        let bytes = packet.serialize().expect("serialize");
        group.bench_with_input(BenchmarkId::new("parse", name), &bytes, |b, bytes| {
            b.iter(|| DNSPacket::parse(black_box(bytes)))
        });
        group.bench_with_input(BenchmarkId::new("serialize", name), &packet, |b, packet| {
            b.iter(|| black_box(packet).serialize())
        });
    }

    group.finish();
}

fn bench_name_decoding(c: &mut Criterion) {
    // "example.com" at 0, then "www" plus a pointer back to it
    let mut data = b"\x07example\x03com\x00".to_vec();
    data.extend_from_slice(b"\x03www\xc0\x00");

    c.bench_function("read_compressed_name", |b| {
        b.iter(|| {
            let mut buffer = PacketBuffer::from_bytes(black_box(&data)).expect("buffer");
            buffer.seek(13).expect("seek");
            buffer.read_name()
        })
    });
}

criterion_group!(benches, bench_packet_parsing, bench_name_decoding);
criterion_main!(benches);
