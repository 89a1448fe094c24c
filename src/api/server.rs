use crate::api::routes;
use crate::config::Shared;
use crate::error::Error;
use crate::store::SharedStore;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: Shared,
    pub store: SharedStore,
}

/// Bind the directory API to `addr`. Returns the bound address and the server future, which
/// completes once `shutdown` resolves and in-flight requests have finished.
pub(crate) fn new(
    config: Shared,
    store: SharedStore,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = hyper::Result<()>>), Error> {
    let server = axum::Server::try_bind(&addr)?
        .serve(routes::new(AppState { config, store }).into_make_service());
    let local_addr = server.local_addr();
    Ok((local_addr, server.with_graceful_shutdown(shutdown)))
}
