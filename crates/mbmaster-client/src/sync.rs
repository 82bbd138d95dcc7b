//! Blocking facade over [`Master`] for callers without an async runtime,
//! e.g. GUI event handlers and poll timers.

use crate::{Master, MasterError};
use mbmaster_net::{Connection, ConnectionConfig, ConnectionEvent, ConnectionState};
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Error)]
pub enum SyncMasterError {
    #[error("runtime init error: {0}")]
    RuntimeInit(std::io::Error),
    #[error("master error: {0}")]
    Master(#[from] MasterError),
}

/// A [`Master`] bundled with its own tokio runtime and the diagnostic
/// event receiver. Every call blocks the current thread, bounded by the
/// configured timeouts.
pub struct SyncMaster {
    runtime: Runtime,
    master: Master,
    events: UnboundedReceiver<ConnectionEvent>,
}

impl SyncMaster {
    pub fn new(config: ConnectionConfig, unit_id: u8) -> Result<Self, SyncMasterError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SyncMasterError::RuntimeInit)?;
        let (connection, events) = Connection::open(config);
        let master = Master::with_unit_id(connection, unit_id);
        Ok(Self {
            runtime,
            master,
            events,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.master.connection().state()
    }

    pub fn connection_id(&self) -> u32 {
        self.master.connection().connection_id()
    }

    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), SyncMasterError> {
        self.runtime
            .block_on(self.master.connect(host, port))
            .map_err(SyncMasterError::Master)
    }

    pub fn close(&mut self) {
        self.master.close();
    }

    pub fn read_coils(&mut self, start: u16, quantity: u16) -> Result<Vec<bool>, SyncMasterError> {
        self.runtime
            .block_on(self.master.read_coils(start, quantity))
            .map_err(SyncMasterError::Master)
    }

    pub fn write_single_coil(&mut self, address: u16, value: bool) -> Result<(), SyncMasterError> {
        self.runtime
            .block_on(self.master.write_single_coil(address, value))
            .map_err(SyncMasterError::Master)
    }

    pub fn read_holding_registers(
        &mut self,
        start: u16,
        quantity: u16,
    ) -> Result<Vec<u16>, SyncMasterError> {
        self.runtime
            .block_on(self.master.read_holding_registers(start, quantity))
            .map_err(SyncMasterError::Master)
    }

    pub fn write_single_register(
        &mut self,
        address: u16,
        value: u16,
    ) -> Result<(), SyncMasterError> {
        self.runtime
            .block_on(self.master.write_single_register(address, value))
            .map_err(SyncMasterError::Master)
    }

    /// Collect every diagnostic event emitted since the previous call,
    /// in delivery order.
    pub fn drain_events(&mut self) -> Vec<ConnectionEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}
