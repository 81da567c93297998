//! Port resolution.
//!
//! Probes the preferred port with a transient bind on all interfaces (the
//! address the dev server listens on) and walks upward until a free port is
//! found or the search budget runs out.

use std::net::{Ipv4Addr, SocketAddr, TcpListener};

use crate::error::{DevError, Result};

/// How many ports past the preferred one are tried.
pub const DEFAULT_PORT_ATTEMPTS: u16 = 10;

/// Outcome of a port search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLease {
    pub requested: u16,
    pub actual: u16,
}

impl PortLease {
    pub fn is_fallback(&self) -> bool {
        self.requested != self.actual
    }
}

/// Find a free port starting at `preferred`, trying up to `attempts` more.
///
/// # Errors
///
/// [`DevError::PortsExhausted`] when every candidate is taken.
pub fn resolve_port(preferred: u16, attempts: u16) -> Result<PortLease> {
    if is_port_free(preferred) {
        return Ok(PortLease {
            requested: preferred,
            actual: preferred,
        });
    }

    let mut last = preferred;
    for offset in 1..=attempts {
        let Some(candidate) = preferred.checked_add(offset) else {
            break;
        };
        last = candidate;
        if is_port_free(candidate) {
            return Ok(PortLease {
                requested: preferred,
                actual: candidate,
            });
        }
    }

    Err(DevError::PortsExhausted {
        start: preferred,
        end: last,
    })
}

/// Whether a listener can currently bind `port` on all interfaces.
pub fn is_port_free(port: u16) -> bool {
    if port == 0 {
        return false;
    }
    TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied() -> Option<(TcpListener, u16)> {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)) {
            Ok(listener) => {
                let port = listener.local_addr().ok()?.port();
                Some((listener, port))
            }
            Err(err) => {
                eprintln!("Skipping: unable to bind socket ({})", err);
                None
            }
        }
    }

    #[test]
    fn free_port_is_returned_as_is() {
        let Some((listener, port)) = occupied() else {
            return;
        };
        drop(listener);

        let lease = resolve_port(port, DEFAULT_PORT_ATTEMPTS).expect("should find port");
        assert_eq!(lease.actual, port);
        assert!(!lease.is_fallback());
    }

    #[test]
    fn occupied_port_falls_back_upward() {
        let Some((_listener, port)) = occupied() else {
            return;
        };

        let lease = resolve_port(port, DEFAULT_PORT_ATTEMPTS).expect("should find port");
        assert!(lease.is_fallback());
        assert_eq!(lease.requested, port);
        assert!(lease.actual > port);
        assert!(is_port_free(lease.actual));
    }

    #[test]
    fn zero_attempts_on_busy_port_is_fatal() {
        let Some((_listener, port)) = occupied() else {
            return;
        };

        let err = resolve_port(port, 0).unwrap_err();
        assert!(matches!(err, DevError::PortsExhausted { start, end } if start == port && end == port));
    }

    #[test]
    fn search_stops_at_top_of_range() {
        // port 0 always counts as taken; u16::MAX has no successor
        assert!(!is_port_free(0));
        if let Err(err) = resolve_port(u16::MAX, 5) {
            assert!(matches!(err, DevError::PortsExhausted { end: u16::MAX, .. }));
        }
    }
}
