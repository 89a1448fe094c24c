use crate::dns::handlers::Handler;
use crate::error::Error;
use crate::store::SharedStore;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use trust_dns_server::ServerFuture;

/// Bind a UDP socket at `addr` and register it with a new server. Returns the bound address
/// and the server; the server runs until [`ServerFuture::block_until_done`]'s future is
/// dropped.
pub(crate) async fn new(
    store: SharedStore,
    addr: SocketAddr,
) -> Result<(SocketAddr, ServerFuture<Handler>), Error> {
    let socket = UdpSocket::bind(addr).await?;
    let local_addr = socket.local_addr()?;
    let mut dns_server = ServerFuture::new(Handler::new(store));
    dns_server.register_socket(socket);
    Ok((local_addr, dns_server))
}
