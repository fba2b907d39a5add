//! Single-host reachability probes.

use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use routerdog_core::Host;

/// Extra time granted to `ping` beyond its own deadline before it is killed.
const PING_GRACE: Duration = Duration::from_secs(1);

/// Tests one host for reachability.
///
/// Implementations must not fail: every error is reported as `false`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &Host) -> bool;
}

/// Probes hosts over the network: ICMP for IP addresses, HTTP for URLs.
#[derive(Debug, Clone)]
pub struct NetworkProber {
    timeout: Duration,
    /// `None` if the HTTP client could not be built; HTTP probes then fail.
    http: Option<reqwest::Client>,
}

impl NetworkProber {
    pub fn new(timeout: Duration) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("routerdog/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "failed to build HTTP client, URL hosts will be reported unreachable");
                None
            }
        };
        Self { timeout, http }
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn probe(&self, host: &Host) -> bool {
        let reachable = match host {
            Host::Icmp(ip) => icmp_probe(*ip, self.timeout).await,
            Host::Http(url) => match &self.http {
                Some(client) => http_probe(client, url, self.timeout).await,
                None => false,
            },
        };

        if reachable {
            info!(%host, method = %host.method(), reachable, "probe finished");
        } else {
            warn!(%host, method = %host.method(), reachable, "probe finished");
        }
        reachable
    }
}

/// Send a single ICMP echo request using the system `ping`.
///
/// Reachable iff `ping` exits successfully within `timeout`.
pub async fn icmp_probe(ip: IpAddr, timeout: Duration) -> bool {
    let mut command = ping_command(ip, timeout);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(%ip, error = %e, "failed to spawn ping");
            return false;
        }
    };

    let output = match tokio::time::timeout(timeout + PING_GRACE, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(%ip, error = %e, "ping failed");
            return false;
        }
        Err(_) => {
            debug!(%ip, "ping timed out");
            return false;
        }
    };

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(%ip, "ping: {line}");
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        warn!(%ip, "ping: {line}");
    }

    output.status.success()
}

/// Build `ping -c 1 -W <secs> <ip>` (or the Windows equivalent).
fn ping_command(ip: IpAddr, timeout: Duration) -> Command {
    let mut command = Command::new("ping");
    if cfg!(windows) {
        let millis = timeout.as_millis().max(1);
        command.args(["-n", "1", "-w", millis.to_string().as_str()]);
    } else {
        // `-W` only takes whole seconds.
        let secs = (timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)).max(1);
        command.args(["-c", "1", "-W", secs.to_string().as_str()]);
    }
    command.arg(ip.to_string());
    command
}

/// Issue a single GET against `url`.
///
/// Any response counts as reachable, whatever its status; the body is
/// never read. Timeouts and connection-level errors are unreachable.
pub async fn http_probe(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    match client.get(url).timeout(timeout).send().await {
        Ok(resp) => {
            debug!(%url, status = %resp.status(), "http probe got response");
            true
        }
        Err(e) if e.is_timeout() => {
            debug!(%url, "http probe timed out");
            false
        }
        Err(e) => {
            debug!(%url, error = %e, "http probe failed");
            false
        }
    }
}
