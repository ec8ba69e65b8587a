//! # Exoskeleton Control Executable
//!
//! Runs the control loop of the suit against the simulated angle sources and actuators.
//!
//! # Architecture
//!
//! - Initialise the session, logging and parameters
//! - Build the control loop and its equipment
//! - Spawn the operator console, which turns lines typed on stdin into mode requests
//! - Request shutdown on SIGINT or SIGTERM, so the actuators are stopped before exiting
//! - Run the control loop until shutdown is requested or the angle sources run out
//! - Save a summary of the run into the session directory

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use serde::Serialize;
use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use ctrl_lib::{
    ctrl_loop::{CtrlLoop, CtrlParams, LoopExit, LoopStats, ModeRequester},
    mode_mgr::{Fault, ModeRequest, OperatingMode, StatusHandle},
    sim::{SimActuator, SineAngleSource, SineParams},
};
use eqpt_if::tc::{ModeTc, TcParseError};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "ctrl_exec", about = "Exoskeleton control executable")]
struct Opts {
    /// Control parameter file, relative to $EXO_SW_ROOT/params
    #[structopt(long, default_value = "ctrl_exec.toml")]
    params: String,

    /// Simulated gait parameter file, relative to $EXO_SW_ROOT/params
    #[structopt(long, default_value = "sim.toml")]
    sim_params: String,

    /// Request shutdown after this many seconds
    #[structopt(long)]
    duration_s: Option<f64>,

    /// Request Active as soon as the loop starts
    #[structopt(long)]
    activate: bool,

    /// Don't read operator commands from stdin
    #[structopt(long)]
    no_console: bool,

    /// Log everything at trace level
    #[structopt(short, long)]
    verbose: bool,

    /// Log every tick of the control loop
    #[structopt(long)]
    trace_ticks: bool,
}

/// Summary of the run, saved into the session directory on exit.
#[derive(Debug, Serialize)]
struct RunSummary {
    session_start: String,
    session_end: String,
    exit: LoopExit,
    final_mode: OperatingMode,
    last_fault: Option<Fault>,
    num_transitions: u64,
    stats: LoopStats,
}

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("ctrl_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = if opts.verbose { LevelFilter::Trace } else { LevelFilter::Debug };
    let tick_level = if opts.trace_ticks { LevelFilter::Trace } else { level };
    logger_init(level, &[("ctrl_lib::ctrl_loop", tick_level)], &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Exoskeleton Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: CtrlParams = util::params::load(&opts.params)
        .wrap_err("Could not load control params")?;
    params.validate().wrap_err("Invalid control params")?;

    let sim_params: SineParams = util::params::load(&opts.sim_params)
        .wrap_err("Could not load simulation params")?;

    info!("Parameters loaded");

    // ---- MODULE INITIALISATION ----

    let sources = params
        .limbs
        .iter()
        .map(|l| (l.limb, SineAngleSource::new(sim_params)))
        .collect();

    let actuators = SimActuator::all()
        .into_iter()
        .filter(|(id, _)| {
            params
                .limb(id.limb)
                .map(|l| l.actuator(id.joint).driven)
                .unwrap_or(false)
        })
        .collect();

    let mut ctrl = CtrlLoop::new(params, sources, actuators)
        .wrap_err("Failed to initialise the control loop")?;

    match Archiver::from_path(&session, "ctrl_loop/tick_records.csv") {
        Ok(a) => ctrl.attach_archiver(a),
        Err(e) => warn!("Tick records will not be archived: {}", e),
    }

    info!("Module initialisation complete\n");

    // ---- OPERATOR INPUT ----

    let requester = ctrl.requester();

    ctrlc::set_handler(requester.shutdown_handler())
        .wrap_err("Failed to set the interrupt handler")?;

    if opts.activate {
        requester
            .request(ModeRequest::Activate)
            .wrap_err("Could not request activation")?;
    }

    if let Some(duration_s) = opts.duration_s {
        let requester = requester.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs_f64(duration_s.max(0.0)));
            info!("Run duration of {} s reached", duration_s);
            requester.request(ModeRequest::Shutdown).ok();
        });
    }

    if !opts.no_console {
        let requester = requester.clone();
        let status = ctrl.status_handle();
        thread::spawn(move || console(requester, status));
        info!("Operator console ready, commands: activate, idle, shutdown, status");
    }

    // ---- MAIN LOOP ----

    info!("Entering control loop in {}", ctrl.mode());

    let exit = ctrl.run();

    // ---- SHUTDOWN ----

    info!("Control loop exited: {:?}", exit);

    let summary = RunSummary {
        session_start: session::get_epoch().to_rfc3339(),
        session_end: chrono::Utc::now().to_rfc3339(),
        exit,
        final_mode: ctrl.mode(),
        last_fault: ctrl.last_fault().cloned(),
        num_transitions: ctrl.num_transitions(),
        stats: ctrl.stats(),
    };
    info!(
        "{} ticks, {} overruns, {} commands",
        summary.stats.num_ticks, summary.stats.num_overruns, summary.stats.num_commands
    );
    session.save("summary.json", summary);

    // Stops every actuator
    drop(ctrl);

    session.exit();

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Read telecommands from stdin until shutdown is sent or the input is closed.
fn console(requester: ModeRequester, status: StatusHandle) {
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Could not read operator input: {}", e);
                break;
            }
        };

        let tc = match ModeTc::from_line(&line) {
            Ok(tc) => tc,
            Err(TcParseError::Empty) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        if let Err(e) = tc_processor::exec(&requester, &status, &tc) {
            warn!("Could not execute {:?}: {}", tc, e);
            break;
        }

        if tc == ModeTc::Shutdown {
            break;
        }
    }
}
