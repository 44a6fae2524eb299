mod convert;
mod server;

pub use crate::simulation_proto::simulation_client::SimulationClient;
pub use server::{SimulationService, start_server};
