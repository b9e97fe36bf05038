//! End-to-end test driving a real TCP socket through the connection task
//! and hub, rather than feeding the hub's inbox directly.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use core::auth::{AuthConfig, HashedPassword};
use daemon::connection_task;
use daemon::hub::Hub;

async fn start_server() -> std::net::SocketAddr {
    start_server_with_auth(AuthConfig::default()).await
}

async fn start_server_with_auth(auth: AuthConfig) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (hub_tx, hub_rx) = mpsc::unbounded_channel();
    let hub = Hub::new(auth, None);
    tokio::spawn(hub.run(hub_rx));

    tokio::spawn(async move {
        let mut next_id = 1u64;
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let id = next_id;
            next_id += 1;
            let hub_tx = hub_tx.clone();
            tokio::spawn(connection_task::run(id, socket, hub_tx));
        }
    });

    addr
}

async fn read_reply(stream: &mut TcpStream) -> String {
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

#[tokio::test]
async fn authenticate_and_quit_over_a_real_socket() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"AUTHENTICATE\r\n").await.unwrap();
    assert_eq!(read_reply(&mut stream).await, "250 OK\r\n");

    stream.write_all(b"QUIT\r\n").await.unwrap();
    assert_eq!(read_reply(&mut stream).await, "250 closing connection\r\n");
}

#[tokio::test]
async fn unauthenticated_commands_are_rejected() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"GETINFO version\r\n").await.unwrap();
    let reply = read_reply(&mut stream).await;
    assert!(reply.starts_with("514"), "expected auth-required, got {reply:?}");
}

#[tokio::test]
async fn unknown_command_while_authenticated_stays_open() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"AUTHENTICATE\r\n").await.unwrap();
    read_reply(&mut stream).await;

    stream.write_all(b"FROBNICATE\r\n").await.unwrap();
    assert_eq!(
        read_reply(&mut stream).await,
        "510 Unrecognized command \"FROBNICATE\"\r\n"
    );

    stream.write_all(b"QUIT\r\n").await.unwrap();
    assert_eq!(read_reply(&mut stream).await, "250 closing connection\r\n");
}

#[tokio::test]
async fn protocolinfo_then_bad_password_closes_the_connection() {
    let auth = AuthConfig {
        cookie: None,
        hashed_passwords: vec![HashedPassword::derive(b"realpassword", [3u8; 16], 50)],
    };
    let addr = start_server_with_auth(auth).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"PROTOCOLINFO 1\r\n").await.unwrap();
    let reply = read_reply(&mut stream).await;
    assert!(reply.starts_with("250-PROTOCOLINFO 1"), "got {reply:?}");

    stream.write_all(b"AUTHENTICATE \"wrongpassword\"\r\n").await.unwrap();
    let reply = read_reply(&mut stream).await;
    assert!(reply.starts_with("515"), "expected auth failure, got {reply:?}");

    let mut buf = [0u8; 16];
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0, "connection should have closed");
}

#[tokio::test]
async fn multiline_postdescriptor_round_trips_over_a_real_socket() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(b"AUTHENTICATE\r\n").await.unwrap();
    read_reply(&mut stream).await;

    stream
        .write_all(b"+POSTDESCRIPTOR\r\nrouter example\r\nmore fields\r\n.\r\n")
        .await
        .unwrap();
    let reply = read_reply(&mut stream).await;
    assert_eq!(reply, "250 OK\r\n");
}
