//! # TM Server
//!
//! Fire-and-forget telemetry publication. The executive builds a packet from
//! the data store after the control computation has finished, so telemetry
//! emission never interleaves with the kinematics.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use comms_if::{
    eqpt::drive::{DriveDems, NUM_MODULES},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions}
};

use crate::data_store::DataStore;
use crate::drive_ctrl::{self, ChassisSpeeds, ModuleState};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    socket: MonitoredSocket
}

/// Telemetry packet that is output by the server.
#[derive(Debug, Serialize)]
pub struct TmPacket {
    pub time_s: f64,

    pub num_cycles: u64,

    pub safe: bool,

    pub safe_cause: String,

    pub drive_dems: DriveDems,

    pub drive_status_rpt: drive_ctrl::StatusReport,

    pub measured_states: [ModuleState; NUM_MODULES],

    pub est_chassis_speeds: ChassisSpeeds,

    pub yaw_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TmServerError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Bind the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            &params.tm_endpoint
        ).map_err(TmServerError::SocketError)?;

        // Create self
        Ok(Self {
            socket
        })
    }

    /// Publish a telemetry packet built from the data store.
    pub fn send(&mut self, ds: &DataStore) -> Result<(), TmServerError> {
        // Build packet
        let packet = TmPacket::from_datastore(ds);

        // Serialize packet
        let packet_string = serde_json::to_string(&packet)
            .map_err(TmServerError::SerializationError)?;

        // Send the packet
        self.socket.send(&packet_string, 0)
            .map_err(TmServerError::SendError)
    }
}

impl TmPacket {
    pub fn from_datastore(ds: &DataStore) -> Self {
        Self {
            time_s: ds.time_s,
            num_cycles: ds.num_cycles,
            safe: ds.safe,
            safe_cause: format!("{:?}", ds.safe_cause),
            drive_dems: ds.drive_dems,
            drive_status_rpt: ds.drive_status_rpt,
            measured_states: ds.measured_states,
            est_chassis_speeds: ds.est_chassis_speeds,
            yaw_rad: ds.yaw_rad,
        }
    }
}
