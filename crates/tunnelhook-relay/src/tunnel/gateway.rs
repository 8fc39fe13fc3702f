//! Default gateway discovery from the host routing table.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::config::GatewaySource;
use super::error::ResolutionError;

/// Resolve the gateway host for `source`.
pub async fn resolve_gateway(
    source: &GatewaySource,
    limit: Duration,
) -> Result<String, ResolutionError> {
    match source {
        GatewaySource::Fixed(host) => Ok(host.clone()),
        GatewaySource::RouteTable { program, args } => {
            let output = timeout(
                limit,
                Command::new(program).args(args).kill_on_drop(true).output(),
            )
            .await
            .map_err(|_| ResolutionError::CommandTimeout(limit))?
            .map_err(|e| ResolutionError::Command(format!("failed to execute {program}: {e}")))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ResolutionError::Command(format!(
                    "{program} exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            debug!(output = %stdout, "Route command output");
            parse_route_output(&stdout).ok_or(ResolutionError::EmptyOutput)
        }
    }
}

/// Second field of the third line, i.e. the gateway column of the first
/// route in `route -n` output:
///
/// ```text
/// Kernel IP routing table
/// Destination     Gateway         Genmask         Flags Metric Ref    Use Iface
/// 0.0.0.0         172.17.0.1      0.0.0.0         UG    0      0        0 eth0
/// ```
pub fn parse_route_output(output: &str) -> Option<String> {
    output
        .lines()
        .nth(2)?
        .split_whitespace()
        .nth(1)
        .map(ToString::to_string)
}
