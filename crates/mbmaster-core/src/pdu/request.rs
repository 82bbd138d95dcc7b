use crate::encoding::ByteWriter;
use crate::pdu::FunctionCode;
use crate::EncodeError;

const MAX_READ_BITS: u16 = 2000;
const MAX_READ_REGISTERS: u16 = 125;

/// Every request PDU is function code + start address + one 16-bit field.
pub const REQUEST_PDU_LEN: usize = 5;

fn validate_quantity(quantity: u16, max: u16) -> Result<(), EncodeError> {
    if quantity == 0 || quantity > max {
        return Err(EncodeError::ValueOutOfRange);
    }
    Ok(())
}

fn write_pdu(
    w: &mut ByteWriter<'_>,
    function: FunctionCode,
    start_address: u16,
    field: u16,
) -> Result<(), EncodeError> {
    w.write_u8(function.as_u8())?;
    w.write_u16(start_address)?;
    w.write_u16(field)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCoilsRequest {
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadCoilsRequest {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        validate_quantity(self.quantity, MAX_READ_BITS)?;
        write_pdu(w, FunctionCode::ReadCoils, self.start_address, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadHoldingRegistersRequest {
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadHoldingRegistersRequest {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        validate_quantity(self.quantity, MAX_READ_REGISTERS)?;
        write_pdu(
            w,
            FunctionCode::ReadHoldingRegisters,
            self.start_address,
            self.quantity,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleCoilRequest {
    pub address: u16,
    pub value: bool,
}

impl WriteSingleCoilRequest {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        write_pdu(
            w,
            FunctionCode::WriteSingleCoil,
            self.address,
            if self.value { 0xFF00 } else { 0x0000 },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSingleRegisterRequest {
    pub address: u16,
    pub value: u16,
}

impl WriteSingleRegisterRequest {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        write_pdu(
            w,
            FunctionCode::WriteSingleRegister,
            self.address,
            self.value,
        )
    }
}

/// Closed request variant over the supported function codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    ReadCoils(ReadCoilsRequest),
    ReadHoldingRegisters(ReadHoldingRegistersRequest),
    WriteSingleCoil(WriteSingleCoilRequest),
    WriteSingleRegister(WriteSingleRegisterRequest),
}

impl Request {
    pub fn encode(&self, w: &mut ByteWriter<'_>) -> Result<(), EncodeError> {
        match self {
            Self::ReadCoils(req) => req.encode(w),
            Self::ReadHoldingRegisters(req) => req.encode(w),
            Self::WriteSingleCoil(req) => req.encode(w),
            Self::WriteSingleRegister(req) => req.encode(w),
        }
    }

    pub fn function_code(&self) -> FunctionCode {
        match self {
            Self::ReadCoils(_) => FunctionCode::ReadCoils,
            Self::ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            Self::WriteSingleCoil(_) => FunctionCode::WriteSingleCoil,
            Self::WriteSingleRegister(_) => FunctionCode::WriteSingleRegister,
        }
    }
}
