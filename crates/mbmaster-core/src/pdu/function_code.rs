use crate::DecodeError;

/// The closed set of function codes this master speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionCode {
    ReadCoils,
    ReadHoldingRegisters,
    WriteSingleCoil,
    WriteSingleRegister,
}

impl FunctionCode {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadHoldingRegisters => 0x03,
            Self::WriteSingleCoil => 0x05,
            Self::WriteSingleRegister => 0x06,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0x01 => Ok(Self::ReadCoils),
            0x03 => Ok(Self::ReadHoldingRegisters),
            0x05 => Ok(Self::WriteSingleCoil),
            0x06 => Ok(Self::WriteSingleRegister),
            _ => Err(DecodeError::InvalidFunctionCode),
        }
    }

    /// Bit 7 set marks an exception response on the wire.
    pub const fn is_exception(value: u8) -> bool {
        (value & 0x80) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::FunctionCode;
    use crate::DecodeError;

    #[test]
    fn parses_supported_codes() {
        assert_eq!(FunctionCode::from_u8(0x01).unwrap(), FunctionCode::ReadCoils);
        assert_eq!(
            FunctionCode::from_u8(0x03).unwrap(),
            FunctionCode::ReadHoldingRegisters
        );
        assert_eq!(
            FunctionCode::from_u8(0x05).unwrap(),
            FunctionCode::WriteSingleCoil
        );
        assert_eq!(
            FunctionCode::from_u8(0x06).unwrap(),
            FunctionCode::WriteSingleRegister
        );
    }

    #[test]
    fn rejects_unsupported_codes() {
        assert_eq!(
            FunctionCode::from_u8(0x02).unwrap_err(),
            DecodeError::InvalidFunctionCode
        );
        assert_eq!(
            FunctionCode::from_u8(0x10).unwrap_err(),
            DecodeError::InvalidFunctionCode
        );
    }

    #[test]
    fn exception_bit_is_detected() {
        assert!(FunctionCode::is_exception(0x83));
        assert!(!FunctionCode::is_exception(0x03));
    }
}
