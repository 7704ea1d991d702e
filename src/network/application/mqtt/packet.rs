//! MQTT 3.1.1 packet assembly and parsing.
//!
//! The builder covers the two packets the uplink sends (CONNECT and QoS 0
//! PUBLISH, plus the optional DISCONNECT). The decoder understands the same
//! set together with CONNACK, and hands back anything else untouched so the
//! codec stays testable from both ends of the wire.

use alloc::vec::Vec;

use super::codec::{
    decode_remaining_length, encode_remaining_length, read_field, read_u16, write_field,
    MAX_LENGTH_DIGITS, MAX_REMAINING_LENGTH,
};
use super::error::{Error, Result};

/// Protocol name carried in every CONNECT.
const PROTOCOL_NAME: &[u8] = b"MQTT";
/// MQTT protocol level for version 3.1.1.
const PROTOCOL_LEVEL: u8 = 4;

// CONNECT flag bits
const FLAG_USERNAME: u8 = 0x80;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_WILL: u8 = 0x04;
const FLAG_CLEAN_SESSION: u8 = 0x02;

/// Room kept in front of the staged body for the fixed header.
const HEADER_RESERVE: usize = 1 + MAX_LENGTH_DIGITS;

/// MQTT control packet types, the upper nibble of the first header byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum PacketType {
    /// Client request to connect to a server.
    Connect = 1,
    /// Connect acknowledgment.
    ConnAck = 2,
    /// Publish message.
    Publish = 3,
    /// Publish acknowledgment.
    PubAck = 4,
    /// Publish received.
    PubRec = 5,
    /// Publish release.
    PubRel = 6,
    /// Publish complete.
    PubComp = 7,
    /// Subscribe request.
    Subscribe = 8,
    /// Subscribe acknowledgment.
    SubAck = 9,
    /// Unsubscribe request.
    Unsubscribe = 10,
    /// Unsubscribe acknowledgment.
    UnsubAck = 11,
    /// Ping request.
    PingReq = 12,
    /// Ping response.
    PingResp = 13,
    /// Client is disconnecting.
    Disconnect = 14,
}

impl PacketType {
    /// Map a four-bit type code to a packet type. Codes 0 and 15 are reserved.
    pub fn from_code(code: u8) -> Option<Self> {
        use PacketType::*;
        Some(match code {
            1 => Connect,
            2 => ConnAck,
            3 => Publish,
            4 => PubAck,
            5 => PubRec,
            6 => PubRel,
            7 => PubComp,
            8 => Subscribe,
            9 => SubAck,
            10 => Unsubscribe,
            11 => UnsubAck,
            12 => PingReq,
            13 => PingResp,
            14 => Disconnect,
            _ => return None,
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PacketType {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PacketType({=u8})", *self as u8)
    }
}

/// First byte of every packet: type code in the high nibble, flags in the low.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FixedHeader {
    /// Control packet type.
    pub packet_type: PacketType,
    /// Type-specific flag bits, only the low four are used.
    pub flags: u8,
}

impl FixedHeader {
    /// A header with the given type and flags.
    pub const fn new(packet_type: PacketType, flags: u8) -> Self {
        Self { packet_type, flags }
    }

    /// Pack into `(type << 4) | flags`.
    pub const fn to_byte(self) -> u8 {
        ((self.packet_type as u8) << 4) | (self.flags & 0x0F)
    }

    /// Unpack a header byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        let packet_type =
            PacketType::from_code(byte >> 4).ok_or(Error::Protocol("reserved packet type"))?;
        Ok(Self {
            packet_type,
            flags: byte & 0x0F,
        })
    }
}

/// Contents of a CONNECT packet.
///
/// Username and password are optional on the wire; each one that is present
/// sets its bit in the connect flags and is written length-prefixed after the
/// client identifier.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ConnectRequest<'a> {
    /// Client identifier.
    pub client_id: &'a [u8],
    /// User name, if the broker requires authentication.
    pub username: Option<&'a [u8]>,
    /// Password sent alongside the user name.
    pub password: Option<&'a [u8]>,
    /// Keep-alive interval advertised to the broker, in seconds.
    pub keep_alive_seconds: u16,
    /// Ask the broker to discard any previous session.
    pub clean_session: bool,
}

impl ConnectRequest<'_> {
    /// The connect flags byte for this request.
    pub fn connect_flags(&self) -> u8 {
        let mut flags = 0;
        if self.username.is_some() {
            flags |= FLAG_USERNAME;
        }
        if self.password.is_some() {
            flags |= FLAG_PASSWORD;
        }
        if self.clean_session {
            flags |= FLAG_CLEAN_SESSION;
        }
        flags
    }
}

/// Contents of a QoS 0 PUBLISH packet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PublishRequest<'a> {
    /// Topic name.
    pub topic: &'a [u8],
    /// Application message; its length is implied by the remaining length.
    pub payload: &'a [u8],
}

/// Outcome of the CONNECT handshake as reported by CONNACK.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnAckResult {
    /// Return code 0.
    Accepted,
    /// Any nonzero return code.
    Rejected(u8),
}

impl ConnAckResult {
    /// Interpret a CONNACK return code.
    pub const fn from_return_code(code: u8) -> Self {
        match code {
            0 => ConnAckResult::Accepted,
            code => ConnAckResult::Rejected(code),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnAckResult {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConnAckResult::Accepted => defmt::write!(f, "Accepted"),
            ConnAckResult::Rejected(code) => defmt::write!(f, "Rejected({=u8})", code),
        }
    }
}

/// Check a received buffer for a CONNACK and read its return code.
///
/// Only the fixed offsets are inspected: the buffer must hold at least four
/// bytes, the first byte's high nibble must be the CONNACK type, and byte 3
/// is the return code.
pub fn parse_connack(buf: &[u8]) -> Result<ConnAckResult> {
    match buf {
        [first, _, _, code, ..] if first >> 4 == PacketType::ConnAck as u8 => {
            Ok(ConnAckResult::from_return_code(*code))
        }
        _ => Err(Error::Protocol("malformed CONNACK")),
    }
}

/// Serializes outgoing packets, enforcing a maximum packet size.
///
/// Each packet body is staged behind a reserved header slot; once the body is
/// measured the fixed header and remaining length are backfilled directly in
/// front of it and the unused part of the slot is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketBuilder {
    max_packet_size: usize,
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self {
            max_packet_size: HEADER_RESERVE + MAX_REMAINING_LENGTH,
        }
    }
}

impl PacketBuilder {
    /// A builder that refuses packets larger than `max_packet_size` bytes on the wire.
    pub fn new(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    /// The configured limit.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Assemble a CONNECT packet.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtklink::network::application::mqtt::{ConnectRequest, PacketBuilder};
    ///
    /// let packet = PacketBuilder::default()
    ///     .connect(&ConnectRequest {
    ///         client_id: b"c",
    ///         username: Some(&b"u"[..]),
    ///         password: Some(&b"p"[..]),
    ///         keep_alive_seconds: 20,
    ///         clean_session: false,
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(packet[0], 0x10);
    /// assert_eq!(packet[1] as usize, packet.len() - 2);
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] for a password without a username, which MQTT
    /// 3.1.1 forbids.
    pub fn connect(&self, request: &ConnectRequest<'_>) -> Result<Vec<u8>> {
        if request.username.is_none() && request.password.is_some() {
            return Err(Error::Protocol("password without username"));
        }
        let optional = |field: Option<&[u8]>| field.map_or(0, |f| 2 + f.len());
        let body_len = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2
            + 2 + request.client_id.len()
            + optional(request.username)
            + optional(request.password);
        self.check_size("CONNECT packet", body_len)?;

        let mut buf = stage(body_len);
        write_field(&mut buf, "protocol name", PROTOCOL_NAME)?;
        buf.push(PROTOCOL_LEVEL);
        buf.push(request.connect_flags());
        buf.extend_from_slice(&request.keep_alive_seconds.to_be_bytes());
        write_field(&mut buf, "client id", request.client_id)?;
        if let Some(username) = request.username {
            write_field(&mut buf, "username", username)?;
        }
        if let Some(password) = request.password {
            write_field(&mut buf, "password", password)?;
        }

        backfill(buf, FixedHeader::new(PacketType::Connect, 0))
    }

    /// Assemble a QoS 0 PUBLISH packet. No packet identifier is written.
    pub fn publish(&self, request: &PublishRequest<'_>) -> Result<Vec<u8>> {
        let body_len = 2 + request.topic.len() + request.payload.len();
        self.check_size("PUBLISH packet", body_len)?;

        let mut buf = stage(body_len);
        write_field(&mut buf, "topic", request.topic)?;
        buf.extend_from_slice(request.payload);

        backfill(buf, FixedHeader::new(PacketType::Publish, 0))
    }

    /// The two-byte DISCONNECT packet.
    pub fn disconnect(&self) -> Vec<u8> {
        alloc::vec![FixedHeader::new(PacketType::Disconnect, 0).to_byte(), 0x00]
    }

    fn check_size(&self, field: &'static str, body_len: usize) -> Result<()> {
        let total = 1 + encode_remaining_length(body_len)?.len() + body_len;
        if total > self.max_packet_size {
            return Err(Error::SizeLimit {
                field,
                len: total,
                max: self.max_packet_size,
            });
        }
        Ok(())
    }
}

fn stage(body_len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_RESERVE + body_len);
    buf.resize(HEADER_RESERVE, 0);
    buf
}

fn backfill(mut buf: Vec<u8>, header: FixedHeader) -> Result<Vec<u8>> {
    let body_len = buf.len() - HEADER_RESERVE;
    let digits = encode_remaining_length(body_len)?;
    let start = HEADER_RESERVE - 1 - digits.len();
    buf[start] = header.to_byte();
    buf[start + 1..HEADER_RESERVE].copy_from_slice(&digits);
    let len = buf.len();
    buf.copy_within(start.., 0);
    buf.truncate(len - start);
    Ok(buf)
}

/// A decoded packet borrowing from the receive buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Packet<'a> {
    /// CONNECT from a client.
    Connect(ConnectRequest<'a>),
    /// CONNACK from the broker.
    ConnAck {
        /// Whether the broker resumed a stored session.
        session_present: bool,
        /// The return code.
        result: ConnAckResult,
    },
    /// QoS 0 PUBLISH.
    Publish(PublishRequest<'a>),
    /// DISCONNECT.
    Disconnect,
    /// Any other packet type, left undecoded.
    Other {
        /// The fixed header.
        header: FixedHeader,
        /// Variable header and payload.
        body: &'a [u8],
    },
}

impl<'a> Packet<'a> {
    /// Decode one packet from the front of `buf`.
    ///
    /// Returns the packet and the number of bytes it occupied, or `Ok(None)`
    /// if `buf` does not yet hold a complete packet.
    pub fn decode(buf: &'a [u8]) -> Result<Option<(Packet<'a>, usize)>> {
        let Some((&first, rest)) = buf.split_first() else {
            return Ok(None);
        };
        let header = FixedHeader::from_byte(first)?;
        let Some((body_len, digits)) = decode_remaining_length(rest)? else {
            return Ok(None);
        };
        let start = 1 + digits;
        let Some(body) = buf.get(start..start + body_len) else {
            return Ok(None);
        };

        let packet = match header.packet_type {
            PacketType::Connect => Packet::Connect(decode_connect(body)?),
            PacketType::ConnAck => match body {
                [ack_flags, code] => Packet::ConnAck {
                    session_present: ack_flags & 0x01 != 0,
                    result: ConnAckResult::from_return_code(*code),
                },
                _ => return Err(Error::Protocol("malformed CONNACK")),
            },
            PacketType::Publish => Packet::Publish(decode_publish(header, body)?),
            PacketType::Disconnect if body.is_empty() => Packet::Disconnect,
            PacketType::Disconnect => return Err(Error::Protocol("DISCONNECT with a body")),
            _ => Packet::Other { header, body },
        };
        Ok(Some((packet, start + body_len)))
    }
}

fn decode_connect(body: &[u8]) -> Result<ConnectRequest<'_>> {
    let (name, mut pos) = read_field(body)?;
    if name != PROTOCOL_NAME {
        return Err(Error::Protocol("unsupported protocol name"));
    }
    let (level, flags) = match body.get(pos..pos + 2) {
        Some(&[level, flags]) => (level, flags),
        _ => return Err(Error::Protocol("truncated CONNECT")),
    };
    if level != PROTOCOL_LEVEL {
        return Err(Error::Protocol("unsupported protocol level"));
    }
    if flags & FLAG_WILL != 0 {
        return Err(Error::Protocol("will messages are not supported"));
    }
    pos += 2;
    let keep_alive_seconds = read_u16(&body[pos..])?;
    pos += 2;

    let client_id = take_field(body, &mut pos)?;
    let username = if flags & FLAG_USERNAME != 0 {
        Some(take_field(body, &mut pos)?)
    } else {
        None
    };
    let password = if flags & FLAG_PASSWORD != 0 {
        Some(take_field(body, &mut pos)?)
    } else {
        None
    };

    Ok(ConnectRequest {
        client_id,
        username,
        password,
        keep_alive_seconds,
        clean_session: flags & FLAG_CLEAN_SESSION != 0,
    })
}

fn take_field<'a>(body: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let (field, used) = read_field(&body[*pos..])?;
    *pos += used;
    Ok(field)
}

fn decode_publish(header: FixedHeader, body: &[u8]) -> Result<PublishRequest<'_>> {
    if (header.flags >> 1) & 0x03 != 0 {
        return Err(Error::Protocol("only QoS 0 PUBLISH is supported"));
    }
    let (topic, used) = read_field(body)?;
    Ok(PublishRequest {
        topic,
        payload: &body[used..],
    })
}

#[cfg(test)]
mod tests;
