use crate::error::Error;
use crate::store::Organizations;
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type Shared = Arc<Config>;

/// Directory mock configuration, loaded from a JSON file.
///
/// ```json
/// {
///   "auth_key": "mockTestKey=",
///   "api_bind_addr": "127.0.0.1:8489",
///   "shutdown_timeout": 5,
///   "dns_udp_bind_addr": "127.0.0.1:59351",
///   "organizations": {
///     "1001": {
///       "example1.com": [
///         { "recordId": 1, "name": "@", "type": "A", "ttl": 21600, "address": "1.2.3.4" }
///       ]
///     }
///   }
/// }
/// ```
#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Shared secret expected as `Authorization: OAuth <auth_key>`.
    pub auth_key: String,
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: Duration,
    pub dns_udp_bind_addr: SocketAddr,
    /// Seed data. Organizations and domains are fixed for the lifetime of the service.
    #[serde(default)]
    pub organizations: Organizations,
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(5)
}

lazy_static! {
    // NOTE(XXX): Once the "ip" feature has stabilized we can use Ipv6Addr.is_unique_local[0].
    //            See also RFC 4193[1].
    // [0]: https://doc.rust-lang.org/std/net/struct.Ipv6Addr.html#method.is_unique_local
    // [1]: https://www.rfc-editor.org/rfc/rfc4193.html
    static ref IPV6_UNIQUE_LOCAL_NETWORK: IpNetwork = IpNetwork::from_str("fc00::/7").unwrap();
}

impl Config {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be read, [`Error::InvalidJSON`] if it can't be
    /// decoded and [`Error::InsecureAPIBind`] if the API would listen on a public address.
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.bind_addr_is_secure()?;
        Ok(conf)
    }

    /// The `Authorization` header value clients must send.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("OAuth {}", self.auth_key)
    }

    pub(crate) fn bind_addr_is_secure(&self) -> Result<(), Error> {
        Self::addr_is_secure(self.api_bind_addr.ip())
    }

    pub(crate) fn addr_is_secure(ip: IpAddr) -> Result<(), Error> {
        let secure = match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_private(),
            IpAddr::V6(v6) => v6.is_loopback() || IPV6_UNIQUE_LOCAL_NETWORK.contains(ip),
        };
        if secure {
            Ok(())
        } else {
            Err(Error::InsecureAPIBind(ip))
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let conf: Config = serde_json::from_str(s)?;
        conf.bind_addr_is_secure()?;
        Ok(conf)
    }
}
