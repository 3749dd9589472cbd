//! Single-instance guard
//!
//! The first instance owns a loopback listener. A later launch connects to it,
//! asks it to come to the front and exits.

use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_INSTANCE_PORT: u16 = 47811;
pub const INSTANCE_PORT_ENV: &str = "PROTON_INSTANCE_PORT";

const ACTIVATE_LINE: &str = "activate";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("port {port} is taken by something that is not a running wallet: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start instance listener: {0}")]
    Listener(#[source] std::io::Error),
}

/// Outcome of claiming the instance lock
#[derive(Debug)]
pub enum InstanceLock {
    /// This process is the only one; keep the guard alive
    Primary(InstanceGuard),
    /// Another instance was asked to activate; this one should exit
    Secondary,
}

/// Held by the primary instance for its whole lifetime
#[derive(Debug)]
pub struct InstanceGuard {
    addr: SocketAddr,
}

impl InstanceGuard {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Port from the environment, falling back to the default
pub fn instance_port() -> u16 {
    std::env::var(INSTANCE_PORT_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_INSTANCE_PORT)
}

/// Claim the lock on `port`. `on_activate` runs each time a later launch
/// knocks.
pub fn acquire<F>(port: u16, on_activate: F) -> Result<InstanceLock, InstanceError>
where
    F: Fn() + Send + 'static,
{
    let listener = match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
        Ok(listener) => listener,
        Err(bind_error) => {
            return match notify_primary(port) {
                Ok(()) => {
                    info!("Another instance is running, asked it to activate");
                    Ok(InstanceLock::Secondary)
                }
                Err(_) => Err(InstanceError::PortUnavailable {
                    port,
                    source: bind_error,
                }),
            };
        }
    };

    let addr = listener.local_addr().map_err(InstanceError::Listener)?;
    thread::Builder::new()
        .name("instance-listener".into())
        .spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        if read_activation(stream) {
                            on_activate();
                        }
                    }
                    Err(e) => warn!("Instance listener accept failed: {}", e),
                }
            }
        })
        .map_err(InstanceError::Listener)?;

    debug!("Instance lock held on {}", addr);
    Ok(InstanceLock::Primary(InstanceGuard { addr }))
}

fn notify_primary(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    writeln!(stream, "{ACTIVATE_LINE}")?;
    stream.flush()
}

fn read_activation(stream: TcpStream) -> bool {
    let _ = stream.set_read_timeout(Some(CONNECT_TIMEOUT));
    let mut line = String::new();
    match BufReader::new(stream).read_line(&mut line) {
        Ok(_) => line.trim() == ACTIVATE_LINE,
        Err(e) => {
            debug!("Ignoring instance connection: {}", e);
            false
        }
    }
}
