//! Main robot-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop (fixed 50 Hz cadence):
//!         - Telecommand processing and handling
//!         - Drivetrain control processing
//!         - Actuator driver execution
//!         - Simulation stepping and sensor readback
//!         - Archive writing and telemetry publication
//!         - Cycle period enforcement
//!
//! # Modules
//!
//! All modules (e.g. `drive_ctrl`) shall provide a public struct implementing
//! the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{
    act_driver::{self, OrientationSensor},
    data_store::{DataStore, SafeModeCause},
    sim_eqpt::{SimImu, SimModule, SimParams},
    tc_server::{TcServer, TcServerError},
    tm_server::TmServer,
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use comms_if::{
    eqpt::drive::NUM_MODULES,
    net::NetParams,
    tc::{Tc, TcResponse},
};
use log::{debug, error, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
    archive::Archived,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    let sim_params: SimParams = util::params::load(
        "sim.toml"
    ).wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // TC source is used to determine whether we're getting TCs from a script
    // or from a remote sender.
    let mut tc_source = TcSource::None;
    let mut use_tc_server = false;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {

        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(
            &args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} TCs\n",
            si.get_duration(),
            si.get_num_tcs()
        );

        // Set the interpreter in the source
        tc_source = TcSource::Script(si);
    }
    // If no arguments then setup the tc server
    else if args.len() == 1 {

        info!("No script provided, remote control via the TcServer will be used\n");
        use_tc_server = true;

    }
    else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}", args.len() - 1)
        );
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.drive_ctrl.init("drive_ctrl.toml", &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    info!("Module initialisation complete\n");

    // Save the resolved parameters into the session for later inspection
    session.save("params/net.json", net_params.clone());
    session.save("params/sim.json", sim_params.clone());
    session.save("params/drive_ctrl.json", ds.drive_ctrl.params().clone());

    // ---- INITIALISE SIMULATED EQUIPMENT ----

    let mut sim_modules: [SimModule; NUM_MODULES] = std::array::from_fn(
        |i| SimModule::new(ds.drive_ctrl.params(), &sim_params, i)
    );
    let mut sim_imu = SimImu::default();

    info!("Simulated equipment initialised");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    if use_tc_server {
        tc_source = TcSource::Remote(
            TcServer::new(&zmq_ctx, &net_params)
                .wrap_err("Failed to initialise the TcServer")?
        );
        info!("TcServer initialised");
    }

    let mut tm_server = {
        let s = TmServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise TmServer")?;
        info!("TmServer initialised");
        s
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- TELECOMMAND PROCESSING ----

        // Branch depending on the source
        match tc_source {
            // If no source no point in continuing so break
            TcSource::None => raise_error!("No TC source present"),

            TcSource::Remote(ref server) => {
                // If a sender is connected remove any safe mode, otherwise
                // make safe
                if server.is_connected() {
                    ds.make_unsafe(SafeModeCause::TcSenderNotConnected).ok();
                }
                else {
                    ds.make_safe(SafeModeCause::TcSenderNotConnected);
                }

                // Get commands until none remain
                loop {
                    match server.receive_tc() {
                        Ok(Some(tc)) => {
                            // Branch based on safe mode. If we are in safe
                            // mode we need to send the cannot execute
                            // response and should not process the TC, unless
                            // it is the make unsafe TC
                            let response = match (ds.safe, &tc) {
                                (true, Tc::MakeUnsafe) | (false, _) =>
                                    tc_processor::exec(&mut ds, &tc),
                                (true, _) => TcResponse::CannotExecute
                            };

                            // Print warning if couldn't send the response
                            match server.send_response(response) {
                                Ok(_) => (),
                                Err(e) => warn!("Could not respond to TC: {}", e)
                            }
                        },
                        Ok(None) => {
                            break
                        },
                        // If not connected go into safe mode
                        Err(TcServerError::NotConnected) => {
                            if !ds.safe {
                                error!("Connection to the TC sender lost");
                            }

                            ds.make_safe(SafeModeCause::TcSenderNotConnected);
                            break;
                        },
                        Err(TcServerError::TcParseError(e)) => {
                            warn!("Could not parse received TC: {}", e);
                            break;
                        }
                        Err(e) => return Err(e)
                            .wrap_err("An error occured while receiving TCs")
                    }
                }
            },

            TcSource::Script(ref mut si) =>
                match si.get_pending_tcs() {
                    PendingTcs::None => (),
                    PendingTcs::Some(tc_vec) => {
                        for tc in tc_vec.iter() {
                            tc_processor::exec(&mut ds, tc);
                        }
                    }
                    // Exit if end of script reached
                    PendingTcs::EndOfScript => {
                        info!("End of TC script reached, stopping");
                        break
                    }
                }
        };

        // Action a pending yaw zero request
        if ds.zero_yaw_requested {
            sim_imu.zero_yaw();
            ds.zero_yaw_requested = false;
            info!("Orientation sensor yaw zeroed");
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // DriveCtrl processing
        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_dems = o;
                ds.drive_status_rpt = r;
            },
            Err(e) => {
                // DriveCtrl errors usually just mean you sent the wrong TC,
                // so just issue the warning and continue.
                warn!("Error during DriveCtrl processing: {}", e)
            }
        };

        // ---- ACTUATION ----

        act_driver::exec(&mut sim_modules, &ds.drive_dems);

        // ---- SIMULATION STEP & SENSING ----

        for module in sim_modules.iter_mut() {
            module.step(CYCLE_PERIOD_S);
        }

        ds.measured_states = act_driver::measured_states(&sim_modules);

        // Estimate the achieved chassis speeds from the measured module
        // states, and integrate the simulated IMU's yaw from them
        if let Some(kin) = ds.drive_ctrl.kinematics() {
            ds.est_chassis_speeds = kin.forward(&ds.measured_states);
        }
        sim_imu.integrate(ds.est_chassis_speeds.omega_rads, CYCLE_PERIOD_S);
        ds.yaw_rad = sim_imu.yaw_rad();

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.drive_ctrl.write() {
            warn!("Could not write DriveCtrl archives: {}", e);
        }

        // ---- TELEMETRY ----

        match tm_server.send(&ds) {
            Ok(_) => (),
            Err(e) => warn!("TmServer error: {}", e)
        };

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    None,
    Remote(TcServer),
    Script(ScriptInterpreter)
}
