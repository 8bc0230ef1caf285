//! End-to-end accept flow through `Link`/`Listener` over a real TCP socket.

use mudgate_core::ListenerConfig;
use mudgate_gateway::Link;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn accepted_connection_shows_up_in_the_queue() {
    init_tracing();
    let addr = free_addr();
    let mut link = Link::new();
    link.register_listener(ListenerConfig::new("mud", mudgate_core::ListenerKind::Telnet).bind(addr)).unwrap();
    link.start_listening().await.unwrap();

    // Give the spawned accept loop a chance to start listening.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"\r\n").await.unwrap();

    // Allow the accept + negotiation start to run.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(link.queue().len(), 1);
}

#[tokio::test]
async fn stopping_an_unregistered_name_is_an_error() {
    let mut link = Link::new();
    assert!(link.stop_listening("ghost").await.is_err());
}

#[tokio::test]
async fn registering_listener_with_unknown_named_address_fails_at_start() {
    let mut link = Link::new();
    link.register_listener(ListenerConfig::new("mud", mudgate_core::ListenerKind::Telnet).bind_named("missing")).unwrap();
    assert!(link.start_listening().await.is_err());
}
