// crates/server/src/config.rs
//! Server configuration from command-line flags and environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 8080;

/// Maximum upload of 50 MB files.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 << 20;

/// Default upper bound of the simulated per-record work.
pub const DEFAULT_MAX_RECORD_DELAY_MS: u64 = 1000;

/// Every flag can also be set through its `PIPELINE_*` environment variable.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipeline",
    version,
    about = "Upload CSV files and control their background processing"
)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "PIPELINE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PIPELINE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory where uploaded files are stored.
    #[arg(long, env = "PIPELINE_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "PIPELINE_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Upper bound of the simulated processing time per record, in milliseconds.
    #[arg(long, env = "PIPELINE_MAX_RECORD_DELAY_MS", default_value_t = DEFAULT_MAX_RECORD_DELAY_MS)]
    pub max_record_delay_ms: u64,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn max_record_delay(&self) -> Duration {
        Duration::from_millis(self.max_record_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_record_delay_ms: DEFAULT_MAX_RECORD_DELAY_MS,
        }
    }
}
