use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sim_bridge::DEFAULT_BRIDGE_ADDR;
use sim_bridge::bridge::Bridge;
use sim_bridge::bridge::config::BridgeConfig;
use sim_bridge::command::ACTION_SET_VERSION;
use sim_bridge::fleet::Fleet;
use sim_bridge::grpc;
use sim_bridge::sim::{SimConfig, SimDrone};
use sim_bridge::snapshot::Position;
use sim_bridge::stepping::SteppingAdapter;
use tracing::{debug, info};

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let addr: SocketAddr = env_parse("BRIDGE_ADDR", DEFAULT_BRIDGE_ADDR.parse()?)?;
    let tick = Duration::from_millis(env_parse("TICK_MS", 100)?);
    let return_timeout = Duration::from_secs(env_parse("RETURN_TIMEOUT_SECS", 300)?);
    let seed: u64 = env_parse("SIM_SEED", 0)?;
    let drone_ids = std::env::var("DRONE_IDS").unwrap_or_else(|_| "drone-1".to_string());

    let fleet = Arc::new(Fleet::new());
    let bridge_config = BridgeConfig::builder()
        .return_timeout(return_timeout)
        .build();

    let ids = drone_ids.split(',').map(str::trim).filter(|id| !id.is_empty());
    for (index, id) in ids.enumerate() {
        let bridge = fleet.register(id.into(), bridge_config.clone())?;

        // Bases side by side so drones do not start on top of each other
        let base = Position::new(index as f32 * 0.5, 0.0, 0.0);
        let sim_config = SimConfig::builder()
            .seed(seed.wrapping_add(index as u64))
            .build();

        spawn_stepping_loop(bridge, SimDrone::new(base, sim_config), tick)?;
    }

    anyhow::ensure!(!fleet.is_empty(), "DRONE_IDS names no drones");
    info!(
        count = fleet.len(),
        drones = ?fleet.targets(),
        tick = ?tick,
        action_set = ACTION_SET_VERSION,
        "Drones online"
    );

    grpc::start_server(addr, fleet).await
}

/// Run the control loop for one drone on its own OS thread at a fixed period.
fn spawn_stepping_loop(bridge: Arc<Bridge>, mut drone: SimDrone, period: Duration) -> Result<()> {
    let name = format!("step-{}", bridge.target());

    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let mut adapter = SteppingAdapter::new(bridge);
            let mut deadline = Instant::now();

            loop {
                drone.step(&mut adapter);

                deadline += period;
                let now = Instant::now();
                match deadline.checked_duration_since(now) {
                    Some(wait) => thread::sleep(wait),
                    None => {
                        debug!(drone = %adapter.target(), behind = ?(now - deadline), "Tick overran");
                        deadline = now;
                    }
                }
            }
        })
        .with_context(|| format!("failed to spawn {name}"))?;

    Ok(())
}
