use clap::Parser;
use live_stomp::{ConnectOptions, DEFAULT_WS_PATH, resolve_ws_url};

#[derive(Parser)]
#[command(name = "stomp")]
#[command(version)]
#[command(about = "Interactive STOMP-over-WebSocket client")]
pub struct Cli {
    /// Full WebSocket endpoint (ws:// or wss://). Overrides --api-base.
    #[arg(short, long)]
    pub url: Option<String>,

    /// HTTP API base the endpoint is derived from (e.g. https://shop.example.com)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Endpoint path appended to the API base
    #[arg(long, default_value = DEFAULT_WS_PATH)]
    pub path: String,

    /// Version list sent in accept-version
    #[arg(long, default_value = "1.2")]
    pub accept_version: String,

    /// Virtual host sent in the CONNECT frame
    #[arg(long)]
    pub host: Option<String>,

    /// Destinations to subscribe to (can be specified multiple times)
    #[arg(short, long)]
    pub subscribe: Vec<String>,

    /// Show session summary on exit
    #[arg(long)]
    pub summary: bool,
}

impl Cli {
    /// Endpoint the client connects to.
    pub fn endpoint(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => resolve_ws_url(self.api_base.as_deref(), &self.path),
        }
    }

    pub fn connect_options(&self) -> ConnectOptions {
        let options = ConnectOptions::default().accept_version(self.accept_version.as_str());
        match &self.host {
            Some(host) => options.host(host.as_str()),
            None => options,
        }
    }
}
