//! Platform-agnostic types for WyLight lighting controllers.
//!
//! This crate provides the data shared by discovery (wylight-core), the
//! recent-endpoints file (wylight-store) and front ends.
//!
//! # Features
//!
//! - [`Endpoint`]: a controller address with its display state
//! - [`BroadcastMessage`]: decoder for the 110-byte WiFly UDP broadcast
//! - Error types for wire parsing
//!
//! # Example
//!
//! ```
//! use wylight_types::{BroadcastMessage, DEFAULT_BROADCAST_PORT};
//!
//! let datagram = BroadcastMessage::default().to_bytes();
//! let msg = BroadcastMessage::parse_wifly(&datagram).unwrap();
//! let endpoint = msg.endpoint("192.168.0.20".parse().unwrap());
//! assert_eq!(endpoint.port(), 2000);
//! assert_eq!(DEFAULT_BROADCAST_PORT, 55555);
//! ```

pub mod broadcast;
pub mod endpoint;
pub mod error;

pub use broadcast::{
    BROADCAST_DEVICE_ID, BROADCAST_MESSAGE_LEN, BroadcastMessage, DEFAULT_BROADCAST_PORT,
};
pub use endpoint::Endpoint;
pub use error::{ParseError, ParseResult};
