use std::time::Duration;

use anyhow::Result;
use sim_bridge::DEFAULT_BRIDGE_ADDR;
use sim_bridge::grpc::SimulationClient;
use sim_bridge::simulation_proto::MissionRequest;
use sim_bridge::snapshot::DistanceSnapshot;
use tonic::transport::Channel;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let addr = std::env::var("BRIDGE_ADDR").unwrap_or_else(|_| DEFAULT_BRIDGE_ADDR.to_string());
    let drone_id = std::env::var("DRONE_ID").unwrap_or_else(|_| "drone-1".to_string());
    let rounds: u32 = std::env::var("POLL_ROUNDS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(5);

    info!(address = %addr, drone_id = %drone_id, "Controller connecting");
    let mut client = SimulationClient::connect(format!("http://{addr}")).await?;

    let request = || MissionRequest {
        uri: drone_id.clone(),
    };

    let reply = client.start_mission(request()).await?.into_inner();
    info!(drone_id = %drone_id, reply = %reply.message, "Mission started");

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    for _ in 0..rounds {
        ticker.tick().await;
        poll_reports(&mut client, &drone_id).await?;
    }

    info!(drone_id = %drone_id, "Returning to base, waiting for landing");
    let reply = client.return_to_base(request()).await?.into_inner();
    info!(drone_id = %drone_id, reply = %reply.message, "Drone is home");
    poll_reports(&mut client, &drone_id).await?;

    let reply = client.end_mission(request()).await?.into_inner();
    info!(drone_id = %drone_id, reply = %reply.message, "Mission ended");

    Ok(())
}

async fn poll_reports(client: &mut SimulationClient<Channel>, drone_id: &str) -> Result<()> {
    let request = || MissionRequest {
        uri: drone_id.to_string(),
    };

    let telemetry = client.get_telemetrics(request()).await?.into_inner().telemetric;
    if let Some(latest) = telemetry.last() {
        info!(
            drone_id,
            count = telemetry.len(),
            status = ?latest.status(),
            position = ?latest.position,
            battery = latest.battery_level,
            "Telemetry"
        );
    }

    let distances = client.get_distances(request()).await?.into_inner().distance_obstacle;
    let nearest = distances
        .iter()
        .flat_map(|d| [d.front, d.back, d.left, d.right])
        .filter(|reading| *reading != DistanceSnapshot::NO_READING)
        .reduce(f32::min);
    info!(drone_id, count = distances.len(), nearest = ?nearest, "Distances");

    for log in client.get_logs(request()).await?.into_inner().logs {
        info!(drone_id, level = %log.level, "{}", log.message);
    }

    Ok(())
}
