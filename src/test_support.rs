//! Helpers shared by unit tests.

use std::net::SocketAddr;
use std::sync::mpsc;

use axum::Router;

/// Serve `router` on an ephemeral localhost port from a dedicated thread
/// and runtime, so blocking HTTP clients can call it from plain `#[test]`s.
/// The server lives until the test process exits.
pub(crate) fn spawn_mock_server(router: Router) -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    rx.recv().unwrap()
}
