//! Start/stop control for the HTTP and DNS listeners.
//!
//! Both listeners share one [`RecordStore`][crate::store::RecordStore]: records created or
//! deleted through the HTTP API are visible to the next DNS query.
//!
//! Each listener is either stopped or running. Starting a running listener fails with
//! [`Error::AlreadyRunning`]; stopping a stopped (or never started) listener does nothing.

use crate::config::{Config, Shared};
use crate::error::Error;
use crate::store::{RecordStore, SharedStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use trust_dns_proto::error::ProtoError;

const HTTP: &str = "HTTP";
const DNS: &str = "DNS";

struct HttpListener {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<hyper::Result<()>>,
}

struct DnsListener {
    local_addr: SocketAddr,
    handle: JoinHandle<Result<(), ProtoError>>,
}

/// The directory mock service: a record store plus the listeners serving it.
pub struct DirectoryMock {
    config: Shared,
    store: SharedStore,
    http: Mutex<Option<HttpListener>>,
    dns: Mutex<Option<DnsListener>>,
}

impl DirectoryMock {
    /// Seed a new store from `config`. No listener is started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDomain`], [`Error::DuplicateRecordId`] or
    /// [`Error::RecordIdsExhausted`] for invalid seed data.
    pub fn new(config: Config) -> Result<Self, Error> {
        let store = RecordStore::try_new(&config.organizations)?;
        Ok(DirectoryMock {
            config: Arc::new(config),
            store: Arc::new(store),
            http: Mutex::new(None),
            dns: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Shared {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Start the HTTP API on `addr` (port 0 picks a free port). Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if the API is already being served,
    /// [`Error::InsecureAPIBind`] for a public address and [`Error::Http`] if binding fails.
    pub async fn start_http(&self, addr: SocketAddr) -> Result<SocketAddr, Error> {
        let mut http = self.http.lock().await;
        if http.is_some() {
            return Err(Error::AlreadyRunning(HTTP));
        }
        Config::addr_is_secure(addr.ip())?;

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let (local_addr, server) = crate::api::new(
            self.config.clone(),
            self.store.clone(),
            addr,
            async {
                shutdown_rx.await.ok();
            },
        )?;
        let handle = tokio::spawn(server);
        tracing::info!("API listening on {local_addr}");
        *http = Some(HttpListener {
            local_addr,
            shutdown,
            handle,
        });
        Ok(local_addr)
    }

    /// Gracefully stop the HTTP API, waiting up to
    /// [`Config::shutdown_timeout`][`crate::config::Config::shutdown_timeout`] for in-flight
    /// requests to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownTimeout`] if the server doesn't stop in time, or the error the
    /// server failed with.
    pub async fn stop_http(&self) -> Result<(), Error> {
        let Some(listener) = self.http.lock().await.take() else {
            return Ok(());
        };
        tracing::info!("stopping API on {}", listener.local_addr);
        // The receiver is gone if the server already exited on its own.
        listener.shutdown.send(()).ok();

        let mut handle = listener.handle;
        match tokio::time::timeout(self.config.shutdown_timeout, &mut handle).await {
            Err(_) => {
                handle.abort();
                Err(Error::ShutdownTimeout(HTTP))
            }
            Ok(Ok(served)) => Ok(served?),
            Ok(Err(err)) => Err(std::io::Error::from(err).into()),
        }
    }

    /// Start the DNS responder on UDP `addr` (port 0 picks a free port). Returns the bound
    /// address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if the responder is already running and
    /// [`Error::IO`] if the socket can't be bound.
    pub async fn start_dns(&self, addr: SocketAddr) -> Result<SocketAddr, Error> {
        let mut dns = self.dns.lock().await;
        if dns.is_some() {
            return Err(Error::AlreadyRunning(DNS));
        }

        let (local_addr, server) = crate::dns::new(self.store.clone(), addr).await?;
        let handle = tokio::spawn(server.block_until_done());
        tracing::info!("DNS listening on UDP {local_addr}");
        *dns = Some(DnsListener { local_addr, handle });
        Ok(local_addr)
    }

    /// Stop the DNS responder. Queries being answered are dropped.
    ///
    /// # Errors
    ///
    /// Returns the error the responder failed with, if it had already exited with one.
    pub async fn stop_dns(&self) -> Result<(), Error> {
        let Some(listener) = self.dns.lock().await.take() else {
            return Ok(());
        };
        tracing::info!("stopping DNS on UDP {}", listener.local_addr);
        listener.handle.abort();
        match listener.handle.await {
            Ok(result) => Ok(result?),
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => Err(std::io::Error::from(err).into()),
        }
    }

    /// Address the HTTP API is bound to, if running.
    pub async fn http_addr(&self) -> Option<SocketAddr> {
        self.http.lock().await.as_ref().map(|l| l.local_addr)
    }

    /// Address the DNS responder is bound to, if running.
    pub async fn dns_addr(&self) -> Option<SocketAddr> {
        self.dns.lock().await.as_ref().map(|l| l.local_addr)
    }
}

impl Drop for DirectoryMock {
    fn drop(&mut self) {
        if let Some(listener) = self.http.get_mut().take() {
            listener.handle.abort();
        }
        if let Some(listener) = self.dns.get_mut().take() {
            listener.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    const RECORD_BODY: &str = r#"{"name":"_acme-challenge","type":"TXT","ttl":60,"text":"t"}"#;

    fn mock_with_timeout(shutdown_timeout: u64) -> DirectoryMock {
        let config = Config::from_str(&format!(
            r#"{{
                "auth_key": "k",
                "api_bind_addr": "127.0.0.1:0",
                "dns_udp_bind_addr": "127.0.0.1:0",
                "shutdown_timeout": {shutdown_timeout},
                "organizations": {{ "1": {{ "example.com": [] }} }}
            }}"#
        ))
        .unwrap();
        DirectoryMock::new(config).unwrap()
    }

    fn mock() -> DirectoryMock {
        mock_with_timeout(2)
    }

    // Opens a connection and sends a create request whose body stops after its first byte, so
    // the request stays in flight until the rest is written.
    async fn partial_create(addr: SocketAddr) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let head = format!(
            "POST /directory/v1/org/1/domains/example.com/dns HTTP/1.1\r\n\
             Host: localhost\r\n\
             Authorization: OAuth k\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\r\n",
            RECORD_BODY.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(&RECORD_BODY.as_bytes()[..1]).await.unwrap();
        // Let the server parse the head and start reading the body.
        tokio::time::sleep(Duration::from_millis(200)).await;
        stream
    }

    fn any_port() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn test_http_lifecycle() {
        let mock = mock();
        assert!(mock.stop_http().await.is_ok());
        assert_eq!(mock.http_addr().await, None);

        let addr = mock.start_http(any_port()).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(mock.http_addr().await, Some(addr));
        assert!(matches!(
            mock.start_http(any_port()).await,
            Err(Error::AlreadyRunning("HTTP"))
        ));

        mock.stop_http().await.unwrap();
        assert_eq!(mock.http_addr().await, None);
        assert!(mock.stop_http().await.is_ok());

        // The port is free again after a stop.
        let again = mock.start_http(addr).await.unwrap();
        assert_eq!(again, addr);
        mock.stop_http().await.unwrap();
    }

    #[tokio::test]
    async fn test_http_stop_waits_for_in_flight_requests() {
        let mock = mock();
        let addr = mock.start_http(any_port()).await.unwrap();
        let mut stream = partial_create(addr).await;

        let finish_request = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            stream
                .write_all(&RECORD_BODY.as_bytes()[1..])
                .await
                .unwrap();
            let mut rsp = vec![];
            stream.read_to_end(&mut rsp).await.unwrap();
            String::from_utf8_lossy(&rsp).into_owned()
        };
        let (stopped, rsp) = tokio::join!(mock.stop_http(), finish_request);

        stopped.unwrap();
        assert!(rsp.starts_with("HTTP/1.1 200"), "{rsp}");
        assert_eq!(mock.store().list(1, "example.com").await.unwrap().len(), 1);
        assert_eq!(mock.http_addr().await, None);
    }

    #[tokio::test]
    async fn test_http_stop_times_out() {
        let mock = mock_with_timeout(1);
        let addr = mock.start_http(any_port()).await.unwrap();
        let _stream = partial_create(addr).await;

        assert!(matches!(
            mock.stop_http().await,
            Err(Error::ShutdownTimeout("HTTP"))
        ));
        assert_eq!(mock.http_addr().await, None);
        assert!(mock.stop_http().await.is_ok());
    }

    #[tokio::test]
    async fn test_http_refuses_public_bind() {
        let mock = mock();
        assert!(matches!(
            mock.start_http("8.8.8.8:80".parse().unwrap()).await,
            Err(Error::InsecureAPIBind(_))
        ));
        assert_eq!(mock.http_addr().await, None);
    }

    #[tokio::test]
    async fn test_dns_lifecycle() {
        let mock = mock();
        assert!(mock.stop_dns().await.is_ok());

        let addr = mock.start_dns(any_port()).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(mock.dns_addr().await, Some(addr));
        assert!(matches!(
            mock.start_dns(any_port()).await,
            Err(Error::AlreadyRunning("DNS"))
        ));

        mock.stop_dns().await.unwrap();
        assert_eq!(mock.dns_addr().await, None);
        assert!(mock.stop_dns().await.is_ok());
    }

    #[test]
    fn test_new_rejects_duplicate_domains() {
        let config = Config::from_str(
            r#"{
                "auth_key": "k",
                "api_bind_addr": "127.0.0.1:0",
                "dns_udp_bind_addr": "127.0.0.1:0",
                "organizations": {
                    "1": { "example.com": [] },
                    "2": { "example.com": [] }
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(
            DirectoryMock::new(config),
            Err(Error::DuplicateDomain(_))
        ));
    }
}
