use std::path::PathBuf;

use clap::Parser;

/// blockscope: read-only block explorer API over a Bitcoin Core node.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Full Bitcoin Core RPC URL. Overrides --rpc-host/--rpc-port.
    #[arg(long, env = "BITCOIN_RPC_URL")]
    pub rpc_url: Option<String>,

    #[arg(long, default_value = "localhost", env = "BITCOIN_RPC_HOST")]
    pub rpc_host: String,

    #[arg(long, default_value = "18443", env = "BITCOIN_RPC_PORT")]
    pub rpc_port: u16,

    #[arg(long, default_value = "user", env = "BITCOIN_RPC_USER")]
    pub rpc_user: String,

    #[arg(long, default_value = "pass", env = "BITCOIN_RPC_PASSWORD")]
    pub rpc_password: String,

    /// Bitcoin Core cookie file. Takes precedence over user/password.
    #[arg(long, env = "BITCOIN_RPC_COOKIE_FILE")]
    pub rpc_cookie_file: Option<PathBuf>,

    /// Address to bind the web server to.
    #[arg(long, default_value = "0.0.0.0", env = "BLOCKSCOPE_BIND")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "8000", env = "BLOCKSCOPE_PORT")]
    pub port: u16,
}

impl Cli {
    pub fn rpc_endpoint(&self) -> String {
        match &self.rpc_url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.rpc_host, self.rpc_port),
        }
    }

    /// Explicit credentials, unless a cookie file is configured.
    pub fn rpc_credentials(&self) -> (Option<&str>, Option<&str>) {
        if self.rpc_cookie_file.is_some() {
            (None, None)
        } else {
            (Some(&self.rpc_user), Some(&self.rpc_password))
        }
    }
}
