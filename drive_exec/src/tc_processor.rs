//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source (the remote
//! TC server or a drive script).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use comms_if::tc::{Tc, TcResponse};
use drive_lib::data_store::{DataStore, SafeModeCause};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules, and returns
/// the response to be sent back to the TC sender.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) -> TcResponse {

    // Handle different Tcs
    match tc {
        Tc::MakeSafe => {
            debug!("Received MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
            TcResponse::Ok
        },
        Tc::MakeUnsafe => {
            debug!("Received MakeUnsafe command");
            ds.make_unsafe(SafeModeCause::MakeSafeTc).ok();
            TcResponse::Ok
        },
        Tc::ZeroYaw => {
            debug!("Received ZeroYaw command");
            ds.zero_yaw_requested = true;
            TcResponse::Ok
        },
        Tc::Drive(cmd) => {
            if cmd.is_valid() {
                ds.drive_ctrl_input.cmd = Some(*cmd);
                TcResponse::Ok
            }
            else {
                warn!("Rejected invalid drive command: {:?}", cmd);
                TcResponse::Invalid
            }
        }
    }
}
