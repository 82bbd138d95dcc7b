//! High-level Modbus TCP master.
//!
//! [`Master`] composes a [`Connection`] with the frame codec into the four
//! request/response operations this stack supports. Every operation performs
//! exactly one frame write, one header read and one payload read; requests
//! are strictly serialized (one in flight per connection) and the response
//! transaction id is deliberately not correlated back.

#![forbid(unsafe_code)]

pub mod sync;

pub use sync::{SyncMaster, SyncMasterError};

use mbmaster_core::encoding::{ByteReader, ByteWriter};
use mbmaster_core::frame::{self, MbapHeader};
use mbmaster_core::pdu::{
    ExceptionResponse, ReadCoilsRequest, ReadHoldingRegistersRequest, Request, Response,
    WriteSingleCoilRequest, WriteSingleRegisterRequest,
};
use mbmaster_core::{DecodeError, EncodeError};
use mbmaster_net::{Connection, NetError};
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_UNIT_ID: u8 = 1;

#[derive(Debug, Error)]
pub enum MasterError {
    #[error("not connected")]
    NotConnected,
    #[error("network error: {0}")]
    Net(#[from] NetError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("server exception: {0}")]
    Exception(ExceptionResponse),
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),
}

/// Session orchestrator owning one connection towards one unit id.
#[derive(Debug)]
pub struct Master {
    connection: Connection,
    unit_id: u8,
}

impl Master {
    pub fn new(connection: Connection) -> Self {
        Self::with_unit_id(connection, DEFAULT_UNIT_ID)
    }

    pub fn with_unit_id(connection: Connection, unit_id: u8) -> Self {
        Self {
            connection,
            unit_id,
        }
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    pub fn into_connection(self) -> Connection {
        self.connection
    }

    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), MasterError> {
        self.connection.connect(host, port).await?;
        Ok(())
    }

    pub fn close(&mut self) {
        self.connection.close();
    }

    /// One protocol sequence: encode, write, read header, read payload.
    ///
    /// Fails fast without touching the socket unless the connection state is
    /// `Connected`.
    async fn transact(&mut self, request: Request) -> Result<Vec<u8>, MasterError> {
        if !self.connection.is_connected() {
            return Err(MasterError::NotConnected);
        }

        let transaction_id = self.connection.next_transaction_id();
        let mut frame_buf = [0u8; frame::REQUEST_FRAME_LEN];
        let mut writer = ByteWriter::new(&mut frame_buf);
        frame::encode_request(&mut writer, transaction_id, self.unit_id, &request)?;

        debug!(
            transaction_id,
            unit_id = self.unit_id,
            function = request.function_code().as_u8(),
            "dispatching request"
        );
        self.connection.write_frame(writer.as_written()).await?;

        let mut header_buf = [0u8; frame::MBAP_HEADER_LEN];
        self.connection.read_exact(&mut header_buf).await?;
        let mut reader = ByteReader::new(&header_buf);
        let header = match MbapHeader::decode(&mut reader) {
            Ok(header) => header,
            Err(err) => {
                self.connection.mark_read_error("malformed mbap header");
                return Err(MasterError::Decode(err));
            }
        };

        let pdu_len = header.pdu_len();
        if pdu_len == 0 || pdu_len > frame::MAX_PDU_LEN {
            self.connection.mark_read_error("implausible pdu length");
            return Err(MasterError::InvalidResponse("implausible pdu length"));
        }

        let mut payload = vec![0u8; pdu_len];
        self.connection.read_exact(&mut payload).await?;
        trace!(
            transaction_id,
            response_transaction_id = header.transaction_id,
            pdu_len,
            "response received"
        );
        Ok(payload)
    }

    fn decode_payload<'a>(&mut self, payload: &'a [u8]) -> Result<Response<'a>, MasterError> {
        let mut reader = ByteReader::new(payload);
        let response = match Response::decode(&mut reader) {
            Ok(response) => response,
            Err(err) => {
                self.connection.mark_read_error("malformed response pdu");
                return Err(MasterError::Decode(err));
            }
        };
        if let Response::Exception(ex) = response {
            return Err(MasterError::Exception(ex));
        }
        Ok(response)
    }

    fn unexpected(&mut self, what: &'static str) -> MasterError {
        self.connection.mark_read_error(what);
        MasterError::InvalidResponse(what)
    }

    /// Read `quantity` coils starting at `start`; returns exactly `quantity`
    /// values.
    pub async fn read_coils(
        &mut self,
        start: u16,
        quantity: u16,
    ) -> Result<Vec<bool>, MasterError> {
        let request = Request::ReadCoils(ReadCoilsRequest {
            start_address: start,
            quantity,
        });
        let payload = self.transact(request).await?;

        match self.decode_payload(&payload)? {
            Response::ReadCoils(data) => {
                let count = usize::from(quantity);
                if data.coil_status.len() * 8 < count {
                    return Err(self.unexpected("coil payload shorter than requested"));
                }
                Ok((0..count).filter_map(|idx| data.coil(idx)).collect())
            }
            _ => Err(self.unexpected("unexpected function response")),
        }
    }

    pub async fn write_single_coil(
        &mut self,
        address: u16,
        value: bool,
    ) -> Result<(), MasterError> {
        let request = Request::WriteSingleCoil(WriteSingleCoilRequest { address, value });
        let payload = self.transact(request).await?;

        match self.decode_payload(&payload)? {
            Response::WriteSingleCoil(resp) if resp.address == address && resp.value == value => {
                Ok(())
            }
            Response::WriteSingleCoil(_) => Err(self.unexpected("write single coil echo mismatch")),
            _ => Err(self.unexpected("unexpected function response")),
        }
    }

    /// Read `quantity` holding registers starting at `start`; returns exactly
    /// `quantity` values.
    pub async fn read_holding_registers(
        &mut self,
        start: u16,
        quantity: u16,
    ) -> Result<Vec<u16>, MasterError> {
        let request = Request::ReadHoldingRegisters(ReadHoldingRegistersRequest {
            start_address: start,
            quantity,
        });
        let payload = self.transact(request).await?;

        match self.decode_payload(&payload)? {
            Response::ReadHoldingRegisters(data) => {
                let count = usize::from(quantity);
                if data.register_count() < count {
                    return Err(self.unexpected("register payload shorter than requested"));
                }
                Ok((0..count).filter_map(|idx| data.register(idx)).collect())
            }
            _ => Err(self.unexpected("unexpected function response")),
        }
    }

    pub async fn write_single_register(
        &mut self,
        address: u16,
        value: u16,
    ) -> Result<(), MasterError> {
        let request = Request::WriteSingleRegister(WriteSingleRegisterRequest { address, value });
        let payload = self.transact(request).await?;

        match self.decode_payload(&payload)? {
            Response::WriteSingleRegister(resp)
                if resp.address == address && resp.value == value =>
            {
                Ok(())
            }
            Response::WriteSingleRegister(_) => {
                Err(self.unexpected("write single register echo mismatch"))
            }
            _ => Err(self.unexpected("unexpected function response")),
        }
    }
}
