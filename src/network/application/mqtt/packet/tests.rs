use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sample_connect() -> ConnectRequest<'static> {
    ConnectRequest {
        client_id: b"c",
        username: Some(&b"u"[..]),
        password: Some(&b"p"[..]),
        keep_alive_seconds: 20,
        clean_session: false,
    }
}

#[test]
fn test_fixed_header_packing() {
    assert_eq!(FixedHeader::new(PacketType::Connect, 0).to_byte(), 0x10);
    assert_eq!(FixedHeader::new(PacketType::Publish, 0).to_byte(), 0x30);
    assert_eq!(FixedHeader::new(PacketType::Subscribe, 0x02).to_byte(), 0x82);
    assert_eq!(FixedHeader::new(PacketType::Disconnect, 0).to_byte(), 0xE0);

    let header = FixedHeader::from_byte(0x3B).unwrap();
    assert_eq!(header.packet_type, PacketType::Publish);
    assert_eq!(header.flags, 0x0B);

    assert!(FixedHeader::from_byte(0x00).is_err());
    assert!(FixedHeader::from_byte(0xF0).is_err());
}

#[test]
fn test_connect_packet_layout() {
    let packet = PacketBuilder::default().connect(&sample_connect()).unwrap();

    let expected: &[u8] = &[
        0x10, // CONNECT, no flags
        19,   // remaining length
        0x00, 0x04, b'M', b'Q', b'T', b'T', // protocol name
        0x04, // protocol level 3.1.1
        0xC0, // username + password, no clean session
        0x00, 0x14, // keep alive 20s
        0x00, 0x01, b'c', // client id
        0x00, 0x01, b'u', // username
        0x00, 0x01, b'p', // password
    ];
    assert_eq!(packet, expected);
    assert_eq!(packet[1] as usize, packet.len() - 2);
}

#[test]
fn test_connect_flags() {
    let mut request = sample_connect();
    assert_eq!(request.connect_flags(), 0xC0);

    request.clean_session = true;
    assert_eq!(request.connect_flags(), 0xC2);

    request.password = None;
    assert_eq!(request.connect_flags(), 0x82);

    request.username = None;
    assert_eq!(request.connect_flags(), 0x02);

    let packet = PacketBuilder::default().connect(&request).unwrap();
    // Without credentials the packet ends right after the client id.
    assert_eq!(&packet[packet.len() - 3..], &[0x00, 0x01, b'c']);
}

#[test]
fn test_connect_password_without_username_rejected() {
    let request = ConnectRequest {
        username: None,
        ..sample_connect()
    };
    let err = PacketBuilder::default().connect(&request).unwrap_err();
    assert!(matches!(err, Error::Protocol("password without username")));
}

#[test]
fn test_connect_with_long_client_id_uses_two_length_digits() {
    let client_id = [b'x'; 200];
    let request = ConnectRequest {
        client_id: &client_id,
        ..sample_connect()
    };
    let packet = PacketBuilder::default().connect(&request).unwrap();

    let remaining = 10 + 2 + 200 + 3 + 3;
    assert_eq!(packet[0], 0x10);
    assert_eq!(&packet[1..3], &encode_remaining_length(remaining).unwrap()[..]);
    assert_eq!(packet.len(), 3 + remaining);
    assert_eq!(&packet[3..9], &[0x00, 0x04, b'M', b'Q', b'T', b'T']);
}

#[test]
fn test_publish_packet_layout() {
    let packet = PacketBuilder::default()
        .publish(&PublishRequest {
            topic: b"t",
            payload: b"hi",
        })
        .unwrap();

    assert_eq!(packet, [0x30, 0x05, 0x00, 0x01, b't', b'h', b'i']);
}

#[test]
fn test_publish_large_payload_backfills_header() {
    let payload = alloc::vec![0xA5u8; 20_000];
    let packet = PacketBuilder::default()
        .publish(&PublishRequest {
            topic: b"BDS-RTK/test",
            payload: &payload,
        })
        .unwrap();

    let remaining = 2 + 12 + payload.len();
    assert_eq!(packet[0], 0x30);
    assert_eq!(&packet[1..4], &encode_remaining_length(remaining).unwrap()[..]);
    assert_eq!(&packet[4..6], &[0x00, 0x0C]);
    assert_eq!(&packet[6..18], b"BDS-RTK/test");
    assert_eq!(&packet[18..], &payload[..]);
}

#[test]
fn test_empty_payload_publish() {
    let packet = PacketBuilder::default()
        .publish(&PublishRequest {
            topic: b"a/b",
            payload: b"",
        })
        .unwrap();
    assert_eq!(packet, [0x30, 0x05, 0x00, 0x03, b'a', b'/', b'b']);
}

#[test]
fn test_size_limit_is_enforced() {
    let builder = PacketBuilder::new(16);
    let ok = builder
        .publish(&PublishRequest {
            topic: b"t",
            payload: &[0; 11],
        })
        .unwrap();
    assert_eq!(ok.len(), 16);

    let err = builder
        .publish(&PublishRequest {
            topic: b"t",
            payload: &[0; 12],
        })
        .unwrap_err();
    assert!(matches!(
        err,
        Error::SizeLimit {
            field: "PUBLISH packet",
            len: 17,
            max: 16
        }
    ));

    let err = builder.connect(&sample_connect()).unwrap_err();
    assert!(matches!(err, Error::SizeLimit { len: 21, .. }));
}

#[test]
fn test_oversized_topic_rejected() {
    let topic = alloc::vec![b't'; 70_000];
    let err = PacketBuilder::default()
        .publish(&PublishRequest {
            topic: &topic,
            payload: b"",
        })
        .unwrap_err();
    assert!(matches!(err, Error::SizeLimit { field: "topic", .. }));
}

#[test]
fn test_parse_connack() {
    assert_eq!(
        parse_connack(&[0x20, 0x02, 0x00, 0x00]).unwrap(),
        ConnAckResult::Accepted
    );
    assert_eq!(
        parse_connack(&[0x20, 0x02, 0x00, 0x05]).unwrap(),
        ConnAckResult::Rejected(5)
    );
    // Trailing bytes are ignored, only fixed offsets are read.
    assert_eq!(
        parse_connack(&[0x20, 0x02, 0x01, 0x00, 0x30]).unwrap(),
        ConnAckResult::Accepted
    );
}

#[test]
fn test_parse_connack_malformed() {
    for buf in [
        &[][..],
        &[0x20, 0x02, 0x00][..],
        &[0x30, 0x02, 0x00, 0x00][..],
        &[0x90, 0x03, 0x00, 0x01][..],
    ] {
        assert!(
            matches!(parse_connack(buf), Err(Error::Protocol("malformed CONNACK"))),
            "{buf:02X?}"
        );
    }
}

#[test]
fn test_decode_connect_round_trip() {
    let request = ConnectRequest {
        clean_session: true,
        ..sample_connect()
    };
    let packet = PacketBuilder::default().connect(&request).unwrap();

    let (decoded, used) = Packet::decode(&packet).unwrap().unwrap();
    assert_eq!(decoded, Packet::Connect(request));
    assert_eq!(used, packet.len());
}

#[test]
fn test_decode_publish_and_trailing_data() {
    let builder = PacketBuilder::default();
    let mut stream = builder
        .publish(&PublishRequest {
            topic: b"BDS-RTK/test",
            payload: b"BDS-RTKtest",
        })
        .unwrap();
    let first_len = stream.len();
    stream.extend(builder.disconnect());

    let (packet, used) = Packet::decode(&stream).unwrap().unwrap();
    assert_eq!(used, first_len);
    assert_eq!(
        packet,
        Packet::Publish(PublishRequest {
            topic: b"BDS-RTK/test",
            payload: b"BDS-RTKtest",
        })
    );

    let (packet, used) = Packet::decode(&stream[used..]).unwrap().unwrap();
    assert_eq!(packet, Packet::Disconnect);
    assert_eq!(used, 2);
}

#[test]
fn test_decode_connack() {
    let (packet, used) = Packet::decode(&[0x20, 0x02, 0x01, 0x04]).unwrap().unwrap();
    assert_eq!(
        packet,
        Packet::ConnAck {
            session_present: true,
            result: ConnAckResult::Rejected(4),
        }
    );
    assert_eq!(used, 4);

    assert!(Packet::decode(&[0x20, 0x03, 0x00, 0x00, 0x00]).is_err());
}

#[test]
fn test_decode_incomplete() {
    let packet = PacketBuilder::default()
        .publish(&PublishRequest {
            topic: b"t",
            payload: b"hello",
        })
        .unwrap();

    assert_eq!(Packet::decode(&[]).unwrap(), None);
    for cut in 1..packet.len() {
        assert_eq!(Packet::decode(&packet[..cut]).unwrap(), None, "cut at {cut}");
    }
}

#[test]
fn test_decode_other_and_rejects() {
    let (packet, used) = Packet::decode(&[0xD0, 0x00]).unwrap().unwrap();
    assert_eq!(
        packet,
        Packet::Other {
            header: FixedHeader::new(PacketType::PingResp, 0),
            body: &[],
        }
    );
    assert_eq!(used, 2);

    // QoS 1 PUBLISH
    assert!(Packet::decode(&[0x32, 0x05, 0x00, 0x01, b't', 0x00, 0x01]).is_err());
    // Reserved type 0
    assert!(Packet::decode(&[0x00, 0x00]).is_err());
}

#[test]
fn test_decode_random_bytes_never_panics() {
    let mut rng = StdRng::seed_from_u64(0x5254_4b32);
    let mut buf = [0u8; 64];
    for _ in 0..5_000 {
        let len = rng.gen_range(0..=buf.len());
        rng.fill(&mut buf[..len]);
        if let Ok(Some((_, used))) = Packet::decode(&buf[..len]) {
            assert!(used <= len);
        }
    }
}
