use crate::encoding::{ByteReader, ByteWriter};
use crate::pdu::{ExceptionResponse, FunctionCode};
use crate::{DecodeError, EncodeError};

const MAX_READ_REGISTERS: u16 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCoilsResponse<'a> {
    /// Packed coil bits, LSB-first within each byte.
    pub coil_status: &'a [u8],
}

impl<'a> ReadCoilsResponse<'a> {
    fn decode_body(r: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let byte_count = usize::from(r.read_u8()?);
        if byte_count == 0 {
            return Err(DecodeError::InvalidLength);
        }
        let data = r.read_slice(byte_count)?;
        Ok(Self { coil_status: data })
    }

    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        let byte_count: u8 = self
            .coil_status
            .len()
            .try_into()
            .map_err(|_| EncodeError::ValueOutOfRange)?;
        w.write_u8(FunctionCode::ReadCoils.as_u8())?;
        w.write_u8(byte_count)?;
        w.write_bytes(self.coil_status)?;
        Ok(())
    }

    pub fn coil(&self, index: usize) -> Option<bool> {
        let byte = self.coil_status.get(index / 8)?;
        Some((byte & (1u8 << (index % 8))) != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadHoldingRegistersResponse<'a> {
    pub data: &'a [u8],
}

impl<'a> ReadHoldingRegistersResponse<'a> {
    fn decode_body(r: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let byte_count = usize::from(r.read_u8()?);
        if byte_count == 0 || (byte_count % 2) != 0 {
            return Err(DecodeError::InvalidLength);
        }
        if byte_count > usize::from(MAX_READ_REGISTERS) * 2 {
            return Err(DecodeError::InvalidLength);
        }
        let data = r.read_slice(byte_count)?;
        Ok(Self { data })
    }

    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        if (self.data.len() % 2) != 0 {
            return Err(EncodeError::InvalidLength);
        }
        let byte_count: u8 = self
            .data
            .len()
            .try_into()
            .map_err(|_| EncodeError::ValueOutOfRange)?;
        w.write_u8(FunctionCode::ReadHoldingRegisters.as_u8())?;
        w.write_u8(byte_count)?;
        w.write_bytes(self.data)?;
        Ok(())
    }

    pub fn register_count(&self) -> usize {
        self.data.len() / 2
    }

    pub fn register(&self, index: usize) -> Option<u16> {
        let offset = index.checked_mul(2)?;
        let bytes = self.data.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleCoilResponse {
    pub address: u16,
    pub value: bool,
}

impl WriteSingleCoilResponse {
    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let address = r.read_u16()?;
        let raw = r.read_u16()?;
        let value = match raw {
            0xFF00 => true,
            0x0000 => false,
            _ => return Err(DecodeError::InvalidValue),
        };
        Ok(Self { address, value })
    }

    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        w.write_u8(FunctionCode::WriteSingleCoil.as_u8())?;
        w.write_u16(self.address)?;
        w.write_u16(if self.value { 0xFF00 } else { 0x0000 })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleRegisterResponse {
    pub address: u16,
    pub value: u16,
}

impl WriteSingleRegisterResponse {
    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            address: r.read_u16()?,
            value: r.read_u16()?,
        })
    }

    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        w.write_u8(FunctionCode::WriteSingleRegister.as_u8())?;
        w.write_u16(self.address)?;
        w.write_u16(self.value)?;
        Ok(())
    }
}

/// Closed response variant over the supported function codes plus the
/// server exception form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    ReadCoils(ReadCoilsResponse<'a>),
    ReadHoldingRegisters(ReadHoldingRegistersResponse<'a>),
    WriteSingleCoil(WriteSingleCoilResponse),
    WriteSingleRegister(WriteSingleRegisterResponse),
    Exception(ExceptionResponse),
}

impl<'a> Response<'a> {
    pub fn decode(r: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let function_byte = r.read_u8()?;
        if FunctionCode::is_exception(function_byte) {
            return Ok(Self::Exception(ExceptionResponse::decode(function_byte, r)?));
        }

        match FunctionCode::from_u8(function_byte)? {
            FunctionCode::ReadCoils => Ok(Self::ReadCoils(ReadCoilsResponse::decode_body(r)?)),
            FunctionCode::ReadHoldingRegisters => Ok(Self::ReadHoldingRegisters(
                ReadHoldingRegistersResponse::decode_body(r)?,
            )),
            FunctionCode::WriteSingleCoil => {
                Ok(Self::WriteSingleCoil(WriteSingleCoilResponse::decode_body(r)?))
            }
            FunctionCode::WriteSingleRegister => Ok(Self::WriteSingleRegister(
                WriteSingleRegisterResponse::decode_body(r)?,
            )),
        }
    }

    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        match self {
            Self::ReadCoils(resp) => resp.encode(w),
            Self::ReadHoldingRegisters(resp) => resp.encode(w),
            Self::WriteSingleCoil(resp) => resp.encode(w),
            Self::WriteSingleRegister(resp) => resp.encode(w),
            Self::Exception(resp) => resp.encode(w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadHoldingRegistersResponse, Response};
    use crate::encoding::ByteReader;
    use crate::pdu::ExceptionCode;
    use crate::DecodeError;

    #[test]
    fn coil_bits_are_lsb_first() {
        let mut r = ByteReader::new(&[0x01, 0x01, 0b0000_0110]);
        let decoded = Response::decode(&mut r).unwrap();
        match decoded {
            Response::ReadCoils(resp) => {
                assert_eq!(resp.coil(0), Some(false));
                assert_eq!(resp.coil(1), Some(true));
                assert_eq!(resp.coil(2), Some(true));
                assert_eq!(resp.coil(3), Some(false));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn register_helpers_work() {
        let resp = ReadHoldingRegistersResponse {
            data: &[0x00, 0x2A, 0xAB, 0xCD],
        };
        assert_eq!(resp.register_count(), 2);
        assert_eq!(resp.register(0), Some(42));
        assert_eq!(resp.register(1), Some(0xABCD));
        assert_eq!(resp.register(2), None);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        // Byte count claims 4 bytes, only 2 present.
        let mut r = ByteReader::new(&[0x03, 0x04, 0x00, 0x2A]);
        assert_eq!(
            Response::decode(&mut r).unwrap_err(),
            DecodeError::UnexpectedEof
        );
    }

    #[test]
    fn short_pdu_is_rejected() {
        let mut r = ByteReader::new(&[0x03]);
        assert_eq!(
            Response::decode(&mut r).unwrap_err(),
            DecodeError::UnexpectedEof
        );
    }

    #[test]
    fn exception_is_decoded_with_its_code() {
        let mut r = ByteReader::new(&[0x83, 0x02]);
        match Response::decode(&mut r).unwrap() {
            Response::Exception(ex) => {
                assert_eq!(ex.function_code, 0x03);
                assert_eq!(ex.exception_code, ExceptionCode::IllegalDataAddress);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn invalid_coil_echo_value_is_rejected() {
        let mut r = ByteReader::new(&[0x05, 0x00, 0x01, 0x12, 0x34]);
        assert_eq!(
            Response::decode(&mut r).unwrap_err(),
            DecodeError::InvalidValue
        );
    }
}
