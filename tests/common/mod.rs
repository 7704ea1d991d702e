//! A single-connection loopback broker for end-to-end tests.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use rtklink::network::application::mqtt::Packet;

/// Broker that accepts one client, answers its CONNECT and records every
/// byte the client sends until it hangs up.
pub struct LoopbackBroker {
    addr: SocketAddr,
    handle: JoinHandle<Vec<u8>>,
}

impl LoopbackBroker {
    /// Start a broker that replies to CONNECT with `return_code`, or stays
    /// silent when `None`.
    pub fn start(return_code: Option<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept client");
            let mut received = Vec::new();
            let mut buf = [0u8; 512];

            while Packet::decode(&received).expect("client sent a malformed packet").is_none() {
                let n = stream.read(&mut buf).expect("read CONNECT");
                if n == 0 {
                    return received;
                }
                received.extend_from_slice(&buf[..n]);
            }
            if let Some(code) = return_code {
                stream.write_all(&[0x20, 0x02, 0x00, code]).expect("send CONNACK");
            }

            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => return received,
                    Ok(n) => received.extend_from_slice(&buf[..n]),
                }
            }
        });
        Self { addr, handle }
    }

    /// Port the broker listens on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the client to disconnect and return everything it sent.
    pub fn finish(self) -> Vec<u8> {
        self.handle.join().expect("broker thread panicked")
    }
}

/// Split a byte stream into decoded packets.
pub fn decode_all(mut buf: &[u8]) -> Vec<Packet<'_>> {
    let mut packets = Vec::new();
    while let Some((packet, used)) = Packet::decode(buf).expect("decode packet") {
        packets.push(packet);
        buf = &buf[used..];
    }
    assert!(buf.is_empty(), "trailing bytes: {buf:02X?}");
    packets
}
