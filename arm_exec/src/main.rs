//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules and the simulated scene
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Pick and place sequencing
//!         - Arm control processing
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `arm_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::StepStatus,
    data_store::DataStore,
    sim::{self, SimScene},
    tc_processor,
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Reactive robot arm controller running against a simulated scene.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec")]
struct Opts {
    /// Path to a TC script to execute.
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Pick up the named object and drop it in the drop zone, formatted as
    /// `<object>:<drop_zone>`.
    #[structopt(long)]
    pick_and_place: Option<String>,

    /// Stop after this many cycles.
    #[structopt(short, long)]
    cycles: Option<u128>,

    /// Run cycles back to back instead of at the cycle period.
    #[structopt(long)]
    fast: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let sim_params: sim::Params =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    let mut ds = DataStore::default();

    ds.sequence_params = util::params::load("pick_and_place.toml")
        .wrap_err("Could not load pick and place params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE SCENE ----

    let mut scene = SimScene::new(sim_params).wrap_err("Failed to build the simulated scene")?;
    info!("Scene contains {} bodies", scene.bodies().len());

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    ds.arm_ctrl
        .init("arm_ctrl.toml", &session)
        .wrap_err("Failed to initialise ArmCtrl")?;
    ds.arm_ctrl.sync_joints(&scene);
    info!("ArmCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE TC SOURCE ----

    let mut script = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            Some(si)
        }
        None => None,
    };

    if let Some(ref names) = opts.pick_and_place {
        let tc = pick_and_place_tc(names)?;
        tc_processor::exec(&mut ds, &mut scene, &tc);
    }

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        let cycle_start_instant = Instant::now();

        ds.cycle_start(CYCLE_PERIOD_S);

        // ---- TELECOMMAND PROCESSING ----

        let mut end_of_script = script.is_none();

        if let Some(ref mut si) = script {
            match si.get_pending_tcs(ds.sim_time_s) {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, &mut scene, tc);
                    }
                }
                PendingTcs::EndOfScript => end_of_script = true,
            }
        }

        // ---- SEQUENCING ----

        let seq_status = match ds.sequence {
            Some(ref mut seq) => Some(
                seq.step(CYCLE_PERIOD_S, &mut ds.arm_ctrl, &mut scene)
                    .unwrap_or_else(|e| {
                        warn!("Pick and place failed: {}", e);
                        StepStatus::Cancelled
                    }),
            ),
            None => None,
        };

        match seq_status {
            Some(StepStatus::Completed) => {
                info!("Pick and place complete");
                ds.sequence = None;
            }
            Some(StepStatus::Cancelled) => {
                info!("Pick and place cancelled");
                ds.sequence = None;
            }
            _ => (),
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.arm_ctrl.proc(&ds.arm_ctrl_input, &mut scene) {
            Ok((o, r)) => {
                ds.arm_ctrl_output = o;
                ds.arm_ctrl_status_rpt = r;
            }
            // Errors here are operator requests that can't be met, so warn and carry on
            Err(e) => warn!("Error during ArmCtrl processing: {}", e),
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.arm_ctrl.write() {
            warn!("Could not archive ArmCtrl status: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        ds.num_cycles += 1;
        ds.sim_time_s += CYCLE_PERIOD_S;

        if let Some(max) = opts.cycles {
            if ds.num_cycles >= max {
                info!("Cycle limit of {} reached, stopping", max);
                break;
            }
        }

        if end_of_script && ds.sequence.is_none() && !ds.arm_ctrl.is_busy() {
            // With nothing commanded the exec only stops on the cycle limit
            if script.is_some() || opts.pick_and_place.is_some() {
                info!("All commands complete, stopping");
                break;
            }
        }

        if opts.fast {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "End of execution after {} cycles ({:.02} s), final angles: {:?}",
        ds.num_cycles, ds.sim_time_s, ds.arm_ctrl_output
    );

    Ok(())
}

/// Build the pick and place TC from an `<object>:<drop_zone>` pair.
fn pick_and_place_tc(names: &str) -> Result<arm_if::tc::Tc, Report> {
    let mut parts = names.splitn(2, ':');

    let (object, drop_zone) = match (parts.next(), parts.next()) {
        (Some(o), Some(d)) if !o.is_empty() && !d.is_empty() => (o, d),
        _ => {
            return Err(color_eyre::eyre::eyre!(
                "Expected --pick-and-place <object>:<drop_zone>, found \"{}\"",
                names
            ))
        }
    };

    let json = serde_json::json!({
        "type": "ARM",
        "payload": {
            "PickAndPlace": { "object": object, "drop_zone": drop_zone }
        }
    });

    arm_if::tc::Tc::from_json(&json.to_string()).wrap_err("Could not build the pick and place TC")
}
