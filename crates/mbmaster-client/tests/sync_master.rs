use mbmaster_client::SyncMaster;
use mbmaster_net::{ConnectionConfig, ConnectionState};
use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Scripted endpoint: answers two FC03 requests with a fixed register value,
/// then one FC05 request with its echo.
async fn run_scripted_server(addr_tx: mpsc::Sender<SocketAddr>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    addr_tx.send(listener.local_addr().unwrap()).unwrap();

    let (mut socket, _) = listener.accept().await.unwrap();
    for _ in 0..2 {
        let mut req = [0u8; 12];
        socket.read_exact(&mut req).await.unwrap();
        assert_eq!(req[7], 0x03);

        let mut resp = [0u8; 11];
        resp[..2].copy_from_slice(&req[..2]);
        resp[4..].copy_from_slice(&[0x00, 0x05, 0x01, 0x03, 0x02, 0x00, 0x64]);
        socket.write_all(&resp).await.unwrap();
    }

    let mut req = [0u8; 12];
    socket.read_exact(&mut req).await.unwrap();
    assert_eq!(req[7], 0x05);
    let mut resp = [0u8; 12];
    resp.copy_from_slice(&req);
    socket.write_all(&resp).await.unwrap();
}

#[test]
fn sync_master_blocking_surface() {
    let (addr_tx, addr_rx) = mpsc::channel();

    let server_thread = std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build");
        runtime.block_on(run_scripted_server(addr_tx));
    });

    let addr = addr_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("server address should arrive");

    let mut master =
        SyncMaster::new(ConnectionConfig::default(), 1).expect("sync master should build");
    assert_eq!(master.state(), ConnectionState::Disconnected);

    master
        .connect("127.0.0.1", addr.port())
        .expect("connect should succeed");
    assert_eq!(master.state(), ConnectionState::Connected);

    let first = master
        .read_holding_registers(0, 1)
        .expect("first read should succeed");
    assert_eq!(first, vec![100]);
    let second = master
        .read_holding_registers(0, 1)
        .expect("second read should succeed");
    assert_eq!(second, vec![100]);

    master
        .write_single_coil(7, true)
        .expect("coil write should succeed");

    master.close();
    assert_eq!(master.state(), ConnectionState::Disconnected);

    let events = master.drain_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].connection_id, master.connection_id());
    assert!(events[0].message.contains("connection established"));
    assert!(events[1].message.contains("connection closed"));

    server_thread.join().expect("server thread should join");
}

#[test]
fn sync_master_fails_fast_when_disconnected() {
    let mut master =
        SyncMaster::new(ConnectionConfig::default(), 1).expect("sync master should build");
    assert!(master.read_coils(0, 1).is_err());
    assert!(master.drain_events().is_empty());
}
