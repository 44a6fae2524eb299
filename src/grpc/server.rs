use std::net::SocketAddr;
use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, info};

use super::convert;
use crate::bridge::Bridge;
use crate::fleet::Fleet;
use crate::simulation_proto::simulation_server::{Simulation, SimulationServer};
use crate::simulation_proto::{
    DistancesReply, LogReply, MissionReply, MissionRequest, TelemetricsReply,
};
use crate::target::TargetId;

pub async fn start_server(addr: SocketAddr, fleet: Arc<Fleet>) -> anyhow::Result<()> {
    let service = SimulationService::new(fleet);

    info!(address = %addr, "gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(SimulationServer::new(service))
        .serve(addr)
        .await?;

    Ok(())
}

/// Request-handling side of every drone's bridge. tonic runs each call on its own task; all
/// serialization happens inside the bridge channels.
pub struct SimulationService {
    fleet: Arc<Fleet>,
}

impl SimulationService {
    pub fn new(fleet: Arc<Fleet>) -> Self {
        Self { fleet }
    }

    fn bridge(&self, target: &TargetId) -> Result<Arc<Bridge>, Status> {
        Ok(self.fleet.get(target)?)
    }
}

fn target_of(request: Request<MissionRequest>) -> TargetId {
    TargetId::from(request.into_inner().uri)
}

#[tonic::async_trait]
impl Simulation for SimulationService {
    async fn start_mission(
        &self,
        request: Request<MissionRequest>,
    ) -> Result<Response<MissionReply>, Status> {
        let target = target_of(request);
        let ack = self.bridge(&target)?.issue_start(target);
        Ok(Response::new(ack.into()))
    }

    async fn end_mission(
        &self,
        request: Request<MissionRequest>,
    ) -> Result<Response<MissionReply>, Status> {
        let target = target_of(request);
        let ack = self.bridge(&target)?.issue_stop(target);
        Ok(Response::new(ack.into()))
    }

    async fn return_to_base(
        &self,
        request: Request<MissionRequest>,
    ) -> Result<Response<MissionReply>, Status> {
        let target = target_of(request);
        let bridge = self.bridge(&target)?;

        info!(drone = %target, "Return to base requested");
        let ack = bridge.issue_return(target).await?;
        Ok(Response::new(ack.into()))
    }

    async fn get_telemetrics(
        &self,
        request: Request<MissionRequest>,
    ) -> Result<Response<TelemetricsReply>, Status> {
        let target = target_of(request);
        let telemetric: Vec<_> = self
            .fleet
            .select(&target)?
            .iter()
            .flat_map(|bridge| {
                let drone = bridge.target().clone();
                bridge
                    .poll_telemetry()
                    .into_iter()
                    .map(move |snapshot| convert::telemetric(&drone, snapshot))
            })
            .collect();

        debug!(drone = %target, count = telemetric.len(), "Telemetry drained");
        Ok(Response::new(TelemetricsReply { telemetric }))
    }

    async fn get_distances(
        &self,
        request: Request<MissionRequest>,
    ) -> Result<Response<DistancesReply>, Status> {
        let target = target_of(request);
        let distance_obstacle: Vec<_> = self
            .fleet
            .select(&target)?
            .iter()
            .flat_map(|bridge| {
                let drone = bridge.target().clone();
                bridge
                    .poll_distances()
                    .into_iter()
                    .map(move |snapshot| convert::distance_obstacle(&drone, snapshot))
            })
            .collect();

        debug!(drone = %target, count = distance_obstacle.len(), "Distances drained");
        Ok(Response::new(DistancesReply { distance_obstacle }))
    }

    async fn get_logs(
        &self,
        request: Request<MissionRequest>,
    ) -> Result<Response<LogReply>, Status> {
        let target = target_of(request);
        let logs: Vec<_> = self
            .fleet
            .select(&target)?
            .iter()
            .flat_map(|bridge| {
                let drone = bridge.target().clone();
                bridge
                    .poll_logs()
                    .into_iter()
                    .map(move |entry| convert::log_data(&drone, entry))
            })
            .collect();

        Ok(Response::new(LogReply { logs }))
    }
}
