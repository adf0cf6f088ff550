use std::net::{IpAddr, TcpListener, ToSocketAddrs};
use std::process::Command;

use log::debug;

use super::SessionError;

/// True when the scheduler's allocation variable is set, i.e. this process
/// runs inside a job on a compute node.
pub fn on_compute_node(node_env_var: &str) -> bool {
  std::env::var_os(node_env_var).is_some_and(|value| !value.is_empty())
}

pub fn hostname() -> Result<String, SessionError> {
  let output = Command::new("hostname")
    .output()
    .map_err(|e| SessionError::SpawnError(format!("hostname: {}", e)))?;
  let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if !output.status.success() || name.is_empty() {
    return Err(SessionError::SpawnError("hostname returned nothing".into()));
  }
  Ok(name)
}

/// First non-loopback IPv4 address of `host`, or `host` itself when it does
/// not resolve to one.
pub fn resolve_address(host: &str) -> String {
  let addresses = match (host, 0).to_socket_addrs() {
    Ok(addresses) => addresses,
    Err(e) => {
      debug!("Cannot resolve {}: {}", host, e);
      return host.to_string();
    }
  };
  addresses
    .map(|a| a.ip())
    .find(|ip| matches!(ip, IpAddr::V4(v4) if !v4.is_loopback()))
    .map(|ip| ip.to_string())
    .unwrap_or_else(|| host.to_string())
}

/// Asks the OS for an unused TCP port.
pub fn pick_free_port() -> Result<u16, SessionError> {
  let listener = TcpListener::bind(("0.0.0.0", 0))?;
  Ok(listener.local_addr()?.port())
}
