use crate::encoding::{ByteReader, ByteWriter};
use crate::{DecodeError, EncodeError};
use core::fmt;

/// Modbus exception codes as reported by the server device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    ServerDeviceFailure,
    Acknowledge,
    ServerDeviceBusy,
    NegativeAcknowledge,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetFailedToRespond,
    Unknown(u8),
}

impl ExceptionCode {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerDeviceBusy,
            0x07 => Self::NegativeAcknowledge,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetFailedToRespond,
            other => Self::Unknown(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerDeviceBusy => 0x06,
            Self::NegativeAcknowledge => 0x07,
            Self::MemoryParityError => 0x08,
            Self::GatewayPathUnavailable => 0x0A,
            Self::GatewayTargetFailedToRespond => 0x0B,
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalFunction => f.write_str("illegal function"),
            Self::IllegalDataAddress => f.write_str("illegal data address"),
            Self::IllegalDataValue => f.write_str("illegal data value"),
            Self::ServerDeviceFailure => f.write_str("server device failure"),
            Self::Acknowledge => f.write_str("acknowledge"),
            Self::ServerDeviceBusy => f.write_str("server device busy"),
            Self::NegativeAcknowledge => f.write_str("negative acknowledge"),
            Self::MemoryParityError => f.write_str("memory parity error"),
            Self::GatewayPathUnavailable => f.write_str("gateway path unavailable"),
            Self::GatewayTargetFailedToRespond => {
                f.write_str("gateway target device failed to respond")
            }
            Self::Unknown(raw) => write!(f, "unknown exception code {raw}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExceptionResponse {
    /// Raw function code without the exception bit (bit 7).
    pub function_code: u8,
    pub exception_code: ExceptionCode,
}

impl ExceptionResponse {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        w.write_u8(self.function_code | 0x80)?;
        w.write_u8(self.exception_code.as_u8())?;
        Ok(())
    }

    pub fn decode(function_byte: u8, r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        if (function_byte & 0x80) == 0 {
            return Err(DecodeError::InvalidFunctionCode);
        }
        let exception = r.read_u8()?;
        Ok(Self {
            function_code: function_byte & 0x7F,
            exception_code: ExceptionCode::from_u8(exception),
        })
    }
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "function {} failed: {} (code {})",
            self.function_code,
            self.exception_code,
            self.exception_code.as_u8()
        )
    }
}
