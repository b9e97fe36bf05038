//! Per-connection I/O: owns the accepted socket, forwards bytes read from
//! it to the hub, and writes back whatever bytes the hub sends in reply.
//! Carries no protocol state of its own.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::hub::{ConnId, ToHub};

const READ_CHUNK: usize = 4096;

/// Drives one accepted connection until either side closes it.
pub async fn run(id: ConnId, socket: TcpStream, hub_tx: mpsc::UnboundedSender<ToHub>) {
    let (mut read_half, mut write_half) = socket.into_split();
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    if hub_tx.send(ToHub::Accepted { id, outbox: outbox_tx }).is_err() {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(bytes) = outbox_rx.recv().await {
            if write_half.write_all(&bytes).await.is_err() {
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match read_half.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if hub_tx
                    .send(ToHub::Data {
                        id,
                        bytes: buf[..n].to_vec(),
                    })
                    .is_err()
                {
                    break;
                }
            }
        }
    }

    let _ = hub_tx.send(ToHub::Disconnected { id });
    let _ = writer.await;
}
