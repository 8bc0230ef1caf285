//! Full accept -> negotiate -> ready -> line -> disconnect flow driven over a
//! real loopback TCP pair, independent of any listener/link wiring.

use mudgate_core::connection::{Connection, Transport};
use mudgate_core::queue::ConnectionQueue;
use mudgate_telnet::{InboundEvent, OutboundEvent};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server, _) = listener.accept().await.unwrap();
    (server, client)
}

#[tokio::test]
async fn quiet_client_reaches_ready_after_deadline_call() {
    let (server, _client) = loopback_pair().await;
    let queue = ConnectionQueue::new();
    let id = queue.allocate_id();
    let peer = server.peer_addr().unwrap();
    let mut connection = Connection::new(id, peer, Transport::Plain(server));

    connection.start().await.unwrap();
    connection.finish_ready().await.unwrap();
    let events = connection.drain_inbound();
    assert!(events.iter().any(|e| matches!(e, InboundEvent::Ready)));
}

#[tokio::test]
async fn line_from_peer_is_delivered_as_inbound_event() {
    let (server, mut client) = loopback_pair().await;
    let id = ConnectionQueue::new().allocate_id();
    let peer = server.peer_addr().unwrap();
    let mut connection = Connection::new(id, peer, Transport::Plain(server));

    connection.start().await.unwrap();
    connection.finish_ready().await.unwrap();
    connection.drain_inbound();

    client.write_all(b"look\r\n").await.unwrap();
    connection.on_receive().await.unwrap();

    let events = connection.drain_inbound();
    assert!(events.iter().any(|e| matches!(e, InboundEvent::Line(l) if l == "look")));
}

#[tokio::test]
async fn outbound_command_is_written_to_the_wire() {
    let (server, mut client) = loopback_pair().await;
    let id = ConnectionQueue::new().allocate_id();
    let peer = server.peer_addr().unwrap();
    let mut connection = Connection::new(id, peer, Transport::Plain(server));

    connection.start().await.unwrap();
    connection.finish_ready().await.unwrap();

    connection.enqueue_outbound(OutboundEvent::Command("welcome".into()));
    connection.process_outbound().await.unwrap();

    let mut buf = vec![0u8; 64];
    let n = client.read(&mut buf).await.unwrap();
    buf.truncate(n);
    assert!(buf.ends_with(b"welcome\r\n"));
}

#[tokio::test]
async fn peer_initiated_close_surfaces_as_disconnect() {
    let (server, client) = loopback_pair().await;
    let id = ConnectionQueue::new().allocate_id();
    let peer = server.peer_addr().unwrap();
    let mut connection = Connection::new(id, peer, Transport::Plain(server));

    connection.start().await.unwrap();
    connection.finish_ready().await.unwrap();
    connection.drain_inbound();

    drop(client);
    let disconnected = connection.on_receive().await.unwrap();
    assert!(disconnected);

    let events = connection.drain_inbound();
    assert!(events.contains(&InboundEvent::Disconnect));
    assert!(connection.has_pending_outbound());
}

#[tokio::test]
async fn disconnect_event_is_reported_to_the_queue() {
    let (server, _client) = loopback_pair().await;
    let queue = ConnectionQueue::new();
    let id = queue.allocate_id();
    let peer = server.peer_addr().unwrap();
    let mut connection = Connection::new(id, peer, Transport::Plain(server));
    connection.start().await.unwrap();
    connection.finish_ready().await.unwrap();

    queue.insert(connection);
    queue.send(id, OutboundEvent::Disconnected).await.unwrap();
    let disconnected = queue.process_out_events().await;
    assert_eq!(disconnected, vec![id]);
    assert!(queue.get(id).is_none());
}
