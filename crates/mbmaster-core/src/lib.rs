//! Modbus TCP master protocol encoding in pure Rust.
//!
//! `mbmaster-core` provides zero-copy, `no_std`-compatible encoding and
//! decoding of the MBAP framing header and the PDUs of the four function
//! codes this master speaks: read coils (FC01), read holding registers
//! (FC03), write single coil (FC05) and write single register (FC06).

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

pub mod encoding;
pub mod error;
pub mod frame;
pub mod pdu;

pub use error::{DecodeError, EncodeError};
