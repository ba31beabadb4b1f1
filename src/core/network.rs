use crate::domain::model::Artifact;
use crate::utils::error::{Result, ShareError};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use url::Url;

/// 公開位址，只用來讓作業系統選出對外的網卡，不會真的送出封包
pub const DEFAULT_IP_PROBE: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 80));
pub const DEFAULT_PORT: u16 = 8000;

/// Returns the address of the interface the OS would route `probe` through.
///
/// UDP `connect` only records the peer, so nothing leaves the machine. The
/// socket is dropped on every path out of this function.
pub fn resolve_local_ip(probe: SocketAddr) -> Result<IpAddr> {
    let bind_addr: SocketAddr = match probe {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (std::net::Ipv6Addr::UNSPECIFIED, 0).into(),
    };

    let socket = UdpSocket::bind(bind_addr)?;
    socket.connect(probe)?;
    let local = socket.local_addr()?;
    drop(socket);

    tracing::debug!("Resolved local address {} via {}", local.ip(), probe);
    Ok(local.ip())
}

/// `http://<ip>:<port>/<file-name>`
pub fn local_share_url(ip: IpAddr, port: u16, artifact: &Artifact) -> Result<Url> {
    share_url_for(ip, port, artifact.file_name())
}

pub(crate) fn share_url_for(ip: IpAddr, port: u16, file_name: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("http://{}/", SocketAddr::new(ip, port)))?;
    url.path_segments_mut()
        .map_err(|_| ShareError::ConfigError {
            message: "share URL cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .push(file_name);
    Ok(url)
}
