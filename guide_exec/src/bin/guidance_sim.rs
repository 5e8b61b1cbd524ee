//! # Guidance simulation executable
//!
//! Runs guidance in closed loop with a kinematic skid steer rover along a mission loaded from a
//! TOML file. The status record of every cycle is written as JSON lines into the session
//! directory, or to the file given by `--output`.
//!
//! Parameter and mission paths are resolved the same way as all parameter files, see
//! `util::params::load`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{info, warn};
use std::{fs::File, io::BufWriter, path::PathBuf};
use structopt::StructOpt;

// Internal
use comms_if::tm::GuidanceMode;
use guide_lib::{
    exec::{FileParams, GuidanceExec, JsonLinesPublisher, ParamsProvider},
    pursuit::PurePursuit,
    sim::{SimConfig, SimWorld}
};
use util::{
    logger::{logger_init, LogConfig},
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed loop simulation of differential rover guidance.
#[derive(Debug, StructOpt)]
#[structopt(name = "guidance_sim")]
struct Args {
    /// Guidance parameter file
    #[structopt(short, long, default_value = "guidance.toml")]
    params: PathBuf,

    /// Mission file
    #[structopt(short, long, default_value = "sim_mission.toml")]
    mission: PathBuf,

    /// Maximum simulated duration in seconds
    #[structopt(short, long, default_value = "300")]
    duration: f64,

    /// Cycle period in seconds
    #[structopt(long, default_value = "0.1")]
    period: f32,

    /// Status output file, defaults to `status.jsonl` in the session directory
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// Reload the parameter file every this many cycles, zero to never reload
    #[structopt(long, default_value = "0")]
    reload_every: u64,

    /// Log at debug level
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new(
        "guidance_sim",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    logger_init(&LogConfig::new(args.verbose), &session).wrap_err("Failed to initialise logging")?;

    info!("Differential Guidance Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);

    if !args.period.is_finite() || args.period <= 0.0 {
        return Err(eyre!("The cycle period must be greater than zero, found {}", args.period))
    }

    // ---- LOAD PARAMETERS ----

    let mut params = FileParams::new(&args.params)
        .wrap_err("Could not load guidance parameters")?;

    // Keep a record of the parameters the run started with
    let params_record = session.file("guidance_params.json");
    serde_json::to_writer_pretty(
        File::create(&params_record)
            .wrap_err_with(|| format!("Could not create {:?}", params_record))?,
        &params.snapshot()
    ).wrap_err("Could not record the guidance parameters")?;

    let config: SimConfig = util::params::load(&args.mission)
        .wrap_err("Could not load the mission")?;

    info!(
        "Loaded mission with {} waypoints starting at ({:.7}, {:.7})",
        config.waypoints.len(),
        config.start.lat_deg,
        config.start.lon_deg
    );

    // ---- OPEN STATUS OUTPUT ----

    let output_path = args.output
        .clone()
        .unwrap_or_else(|| session.status_file_path.clone());

    let output = File::create(&output_path)
        .wrap_err_with(|| format!("Could not create the status output {:?}", output_path))?;

    info!("Writing status to {:?}", output_path);

    // ---- MAIN LOOP ----

    let mut exec = GuidanceExec::new(
        PurePursuit::new(),
        SimWorld::new(config),
        params,
        JsonLinesPublisher::new(BufWriter::new(output))
    );

    let max_cycles = (args.duration / args.period as f64).ceil() as u64;
    let mut num_cycles = 0u64;

    info!("Beginning main loop\n");

    while num_cycles < max_cycles {
        if args.reload_every > 0 && num_cycles > 0 && num_cycles % args.reload_every == 0 {
            // A failed reload keeps the old parameters and has already been logged
            exec.params_provider_mut().reload().ok();
        }

        let setpoint = exec.cycle(args.period);
        exec.state_provider_mut().step(&setpoint, args.period);

        num_cycles += 1;

        let world = exec.state_provider();
        if world.mission().is_finished() && exec.guidance().mode() == GuidanceMode::Stopped {
            info!("Mission complete after {:.1} s", world.time_s());
            break
        }
    }

    // ---- SHUTDOWN ----

    let world = exec.state_provider();
    if !world.mission().is_finished() {
        warn!(
            "Simulation ended after {:.1} s with the mission incomplete (waypoint {})",
            world.time_s(),
            world.mission().index()
        );
    }

    let rover = world.rover();
    info!(
        "Final rover position {:.2} m north, {:.2} m east, heading {:.1} deg",
        rover.pos_m[0],
        rover.pos_m[1],
        rover.heading_rad.to_degrees()
    );

    let num_failed = exec.publisher().num_failed();
    if num_failed > 0 {
        warn!("{} status records could not be written", num_failed);
    }

    exec.publisher_mut()
        .flush()
        .wrap_err("Could not flush the status output")?;

    info!("End of execution");

    Ok(())
}
