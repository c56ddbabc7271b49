//! Echo server over real TCP sockets.

use framewire::config::ServiceConfig;
use framewire::lifecycle;
use framewire::HandlingStrategy;
use framewire_client::FrameClient;

mod common;
use common::{wait_until, within};

#[tokio::test]
async fn echo_over_tcp_with_connection_limit() {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.listener.max_connections = 4;
    config.server.strategy = HandlingStrategy::Concurrent;

    let mut server = lifecycle::start(&config).await.unwrap();
    let addr = server.acceptor().local_addr().unwrap();
    let tracker = server.tracker();
    tokio::spawn(async move { server.serve().await });

    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(FrameClient::connect(addr).await.unwrap());
    }
    for (i, client) in clients.iter_mut().enumerate() {
        let payload = vec![i as u8; 1000 + i];
        assert_eq!(within(client.call(&payload)).await.unwrap(), payload);
    }
    for client in &mut clients {
        client.finish().await.unwrap();
    }

    wait_until(|| tracker.completed() == 3).await;
    assert_eq!(tracker.exchanges(), 3);
    assert_eq!(tracker.failed() + tracker.disconnected(), 0);
}

#[tokio::test]
async fn empty_connection_over_tcp_is_silent() {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.server.strategy = HandlingStrategy::Serial;

    let mut server = lifecycle::start(&config).await.unwrap();
    let addr = server.acceptor().local_addr().unwrap();
    let tracker = server.tracker();
    tokio::spawn(async move { server.serve().await });

    drop(tokio::net::TcpStream::connect(addr).await.unwrap());

    wait_until(|| tracker.completed() == 1).await;
    assert_eq!(tracker.failed() + tracker.disconnected(), 0);
}
