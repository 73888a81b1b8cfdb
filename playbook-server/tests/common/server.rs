//! Test server harness for integration tests.
//!
//! Spins up the real router on a random port, seeded from the shipped
//! fixtures.

use std::net::SocketAddr;
use std::path::PathBuf;

use playbook_core::{Catalog, WidgetFixture};
use playbook_renderer::ExportConfig;
use playbook_server::{build_router, AppState, WidgetStore};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    store: WidgetStore,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server hosting every fixture.
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// Start a server, optionally forcing every widget read-only.
    ///
    /// # Panics
    ///
    /// Panics if fixtures fail to load, no port is available or the server
    /// fails to bind.
    pub async fn start_with(force_read_only: bool) -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures");
        let fixtures = WidgetFixture::load_dir(fixtures_dir).expect("fixtures");
        let store = WidgetStore::from_fixtures(&fixtures, &Catalog::builtin(), force_read_only)
            .expect("store");

        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let app = build_router(AppState::new(store.clone(), ExportConfig::default()));

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            store,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// URL of a widget sub-resource.
    pub fn widget_url(&self, widget_id: &str, rest: &str) -> String {
        self.url(&format!("/api/widgets/{widget_id}{rest}"))
    }

    /// Direct access to the hosted widgets (for test assertions).
    #[allow(dead_code)]
    pub fn store(&self) -> &WidgetStore {
        &self.store
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
