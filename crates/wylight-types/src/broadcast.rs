//! Decoding of the UDP broadcast datagram sent by WiFly modules.
//!
//! An RN-171 module announces itself every few seconds with a fixed
//! 110-byte datagram. All multi-byte fields are big-endian.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 6 | MAC address of the access point |
//! | 6 | 1 | WLAN channel |
//! | 7 | 1 | RSSI |
//! | 8 | 2 | local TCP port |
//! | 10 | 4 | real-time clock |
//! | 14 | 2 | battery voltage (mV) |
//! | 16 | 2 | GPIO pins |
//! | 18 | 14 | ASCII time |
//! | 32 | 28 | version string |
//! | 60 | 32 | device id |
//! | 92 | 2 | boot time (ms) |
//! | 94 | 16 | sensor readings |

use core::fmt;
use std::net::{IpAddr, SocketAddr};

use bytes::{Buf, BufMut};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::error::ParseError;

/// Size of a WiFly broadcast datagram.
pub const BROADCAST_MESSAGE_LEN: usize = 110;

/// Prefix of the device id every WiFly module reports.
pub const BROADCAST_DEVICE_ID: &[u8] = b"WiFly";

/// UDP port WiFly modules broadcast on by default.
pub const DEFAULT_BROADCAST_PORT: u16 = 55555;

const ASCII_TIME_LEN: usize = 14;
const VERSION_LEN: usize = 28;
const DEVICE_ID_LEN: usize = 32;
const SENSOR_COUNT: usize = 8;

/// A decoded WiFly broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BroadcastMessage {
    /// MAC address of the access point the module is associated with.
    pub mac: [u8; 6],
    /// WLAN channel.
    pub channel: u8,
    /// Received signal strength as reported by the module.
    pub rssi: u8,
    /// TCP port the module accepts connections on.
    pub port: u16,
    /// Real-time clock value.
    pub rtc: u32,
    /// Battery voltage in millivolts.
    pub battery_mv: u16,
    /// State of the GPIO pins.
    pub gpio: u16,
    /// Module time as text.
    pub ascii_time: String,
    /// Firmware version string.
    pub version: String,
    /// Configured device id, e.g. `WiFly-EZX`.
    pub device_id: String,
    /// Time the module needed to boot, in milliseconds.
    pub boot_time_ms: u16,
    /// Raw sensor readings.
    pub sensors: [u16; SENSOR_COUNT],
}

impl BroadcastMessage {
    /// Decode a datagram.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLength`] unless `data` is exactly
    /// [`BROADCAST_MESSAGE_LEN`] bytes long. The device id is not checked;
    /// use [`BroadcastMessage::parse_wifly`] for that.
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() != BROADCAST_MESSAGE_LEN {
            return Err(ParseError::InvalidLength {
                expected: BROADCAST_MESSAGE_LEN,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let mut mac = [0u8; 6];
        buf.copy_to_slice(&mut mac);
        let channel = buf.get_u8();
        let rssi = buf.get_u8();
        let port = buf.get_u16();
        let rtc = buf.get_u32();
        let battery_mv = buf.get_u16();
        let gpio = buf.get_u16();
        let ascii_time = take_text(&mut buf, ASCII_TIME_LEN);
        let version = take_text(&mut buf, VERSION_LEN);
        let device_id = take_text(&mut buf, DEVICE_ID_LEN);
        let boot_time_ms = buf.get_u16();
        let mut sensors = [0u16; SENSOR_COUNT];
        for sensor in &mut sensors {
            *sensor = buf.get_u16();
        }

        Ok(Self {
            mac,
            channel,
            rssi,
            port,
            rtc,
            battery_mv,
            gpio,
            ascii_time,
            version,
            device_id,
            boot_time_ms,
            sensors,
        })
    }

    /// Decode a datagram and require it to come from a WiFly module.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLength`] for datagrams of the wrong size
    /// and [`ParseError::NotWifly`] when the device id lacks the `WiFly` prefix.
    pub fn parse_wifly(data: &[u8]) -> Result<Self, ParseError> {
        let msg = Self::from_bytes(data)?;
        if !msg.is_wifly() {
            return Err(ParseError::NotWifly(msg.device_id));
        }
        Ok(msg)
    }

    /// Whether the device id carries the WiFly prefix.
    pub fn is_wifly(&self) -> bool {
        self.device_id.as_bytes().starts_with(BROADCAST_DEVICE_ID)
    }

    /// Encode the message into its wire representation.
    ///
    /// Text fields longer than their slot are truncated.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BROADCAST_MESSAGE_LEN);
        out.put_slice(&self.mac);
        out.put_u8(self.channel);
        out.put_u8(self.rssi);
        out.put_u16(self.port);
        out.put_u32(self.rtc);
        out.put_u16(self.battery_mv);
        out.put_u16(self.gpio);
        put_text(&mut out, &self.ascii_time, ASCII_TIME_LEN);
        put_text(&mut out, &self.version, VERSION_LEN);
        put_text(&mut out, &self.device_id, DEVICE_ID_LEN);
        out.put_u16(self.boot_time_ms);
        for sensor in self.sensors {
            out.put_u16(sensor);
        }
        out
    }

    /// The endpoint announced by this message when it arrived from `sender`.
    ///
    /// The announced TCP port replaces the UDP source port.
    pub fn endpoint(&self, sender: IpAddr) -> Endpoint {
        Endpoint::discovered(SocketAddr::new(sender, self.port), self.device_id.clone())
    }

    /// Format the access point MAC as `aa:bb:cc:dd:ee:ff`.
    pub fn mac_string(&self) -> String {
        self.mac
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl Default for BroadcastMessage {
    fn default() -> Self {
        Self {
            mac: [0; 6],
            channel: 0,
            rssi: 0,
            port: 2000,
            rtc: 0,
            battery_mv: 0,
            gpio: 0,
            ascii_time: String::new(),
            version: String::new(),
            device_id: "WiFly".to_string(),
            boot_time_ms: 0,
            sensors: [0; SENSOR_COUNT],
        }
    }
}

impl fmt::Display for BroadcastMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} port={} ap={} ch={} rssi={} battery={}mV version={:?}",
            self.device_id,
            self.port,
            self.mac_string(),
            self.channel,
            self.rssi,
            self.battery_mv,
            self.version
        )
    }
}

/// Read a NUL padded text slot.
fn take_text(buf: &mut &[u8], len: usize) -> String {
    let raw = &buf[..len];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(len);
    let text = String::from_utf8_lossy(&raw[..end]).trim_end().to_string();
    buf.advance(len);
    text
}

fn put_text(out: &mut Vec<u8>, text: &str, len: usize) {
    let bytes = text.as_bytes();
    let used = bytes.len().min(len);
    out.put_slice(&bytes[..used]);
    out.put_bytes(0, len - used);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BroadcastMessage {
        BroadcastMessage {
            mac: [0x00, 0x06, 0x66, 0x71, 0x2b, 0x9c],
            channel: 11,
            rssi: 0xc2,
            port: 2000,
            rtc: 0x0000_1234,
            battery_mv: 3300,
            gpio: 0x0410,
            ascii_time: "1353254300".to_string(),
            version: "WiFly Ver 2.36, 09-20-2011".to_string(),
            device_id: "WiFly-EZX".to_string(),
            boot_time_ms: 127,
            sensors: [1, 2, 3, 4, 5, 6, 7, 8],
        }
    }

    #[test]
    fn test_decode_field_offsets() {
        let mut raw = [0u8; BROADCAST_MESSAGE_LEN];
        raw[6] = 11; // channel
        raw[8] = 0x07; // port 2000 = 0x07D0
        raw[9] = 0xD0;
        raw[14] = 0x0C; // battery 3300 = 0x0CE4
        raw[15] = 0xE4;
        raw[60..69].copy_from_slice(b"WiFly-EZX");
        raw[92] = 0x00;
        raw[93] = 0x7F; // boot time 127
        raw[108] = 0x01; // last sensor 0x0102
        raw[109] = 0x02;

        let msg = BroadcastMessage::parse_wifly(&raw).unwrap();
        assert_eq!(msg.channel, 11);
        assert_eq!(msg.port, 2000);
        assert_eq!(msg.battery_mv, 3300);
        assert_eq!(msg.device_id, "WiFly-EZX");
        assert_eq!(msg.boot_time_ms, 127);
        assert_eq!(msg.sensors[7], 0x0102);
        assert!(msg.version.is_empty());
    }

    #[test]
    fn test_encode_matches_wire_size() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), BROADCAST_MESSAGE_LEN);
        assert_eq!(BroadcastMessage::from_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = BroadcastMessage::from_bytes(&[0u8; 11]).unwrap_err();
        assert!(err.to_string().contains("requires 110 bytes"));

        let long = [0u8; BROADCAST_MESSAGE_LEN + 1];
        assert!(matches!(
            BroadcastMessage::from_bytes(&long),
            Err(ParseError::InvalidLength { actual: 111, .. })
        ));
    }

    #[test]
    fn test_stop_message_is_not_a_broadcast() {
        assert!(BroadcastMessage::parse_wifly(b"StopThread\0").is_err());
    }

    #[test]
    fn test_foreign_device_id_rejected() {
        let mut msg = sample();
        msg.device_id = "Roku-1234".to_string();
        let err = BroadcastMessage::parse_wifly(&msg.to_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::NotWifly(id) if id == "Roku-1234"));
    }

    #[test]
    fn test_endpoint_uses_announced_port() {
        let endpoint = sample().endpoint("192.168.1.40".parse().unwrap());
        assert_eq!(endpoint.address, "192.168.1.40:2000".parse().unwrap());
        assert_eq!(endpoint.name, "WiFly-EZX");
        assert!(endpoint.online);
    }

    #[test]
    fn test_long_text_truncated() {
        let mut msg = sample();
        msg.device_id = format!("WiFly-{}", "x".repeat(40));
        let decoded = BroadcastMessage::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(decoded.device_id.len(), DEVICE_ID_LEN);
        assert!(decoded.is_wifly());
    }

    #[test]
    fn test_mac_string() {
        assert_eq!(sample().mac_string(), "00:06:66:71:2b:9c");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Decoding arbitrary bytes should never panic.
        #[test]
        fn parse_wifly_never_panics(data: Vec<u8>) {
            let _ = BroadcastMessage::parse_wifly(&data);
        }

        /// Any datagram of the right size decodes, whatever its content.
        #[test]
        fn any_full_size_datagram_decodes(data in proptest::collection::vec(any::<u8>(), BROADCAST_MESSAGE_LEN)) {
            prop_assert!(BroadcastMessage::from_bytes(&data).is_ok());
        }
    }
}
