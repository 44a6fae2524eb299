pub mod bridge;
pub mod command;
pub mod fleet;
pub mod grpc;
pub mod sim;
pub mod snapshot;
pub mod state_machine;
pub mod stepping;
pub mod target;

pub mod simulation_proto {
    include!(concat!(env!("OUT_DIR"), "/simulation.rs"));
}

/// Default address of the simulation gRPC service.
pub const DEFAULT_BRIDGE_ADDR: &str = "[::1]:50051";
