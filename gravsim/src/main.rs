use gravsim::{Scenario, ScenarioConfig, SimError};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under the crate's `scenarios/` directory
    #[arg(short, default_value = "two_body.yaml")]
    file_name: String,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_yaml_reader(reader)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;

    let mut sim = Scenario::build_scenario(scenario_cfg).into_simulation()?;
    sim.run()?;

    info!("bodies:     {}", sim.state().len());
    info!("steps:      {}", sim.steps_taken());
    info!("dt:         {}", sim.config().dt);
    info!("softening:  {}", sim.config().softening);

    match sim.diagnostics() {
        Ok(history) => {
            if let Some(last) = history.last() {
                info!("final energy:           {:.6e}", last.invariants.energy());
                info!("energy drift:           {:.3e}", last.drift.energy);
                info!("momentum drift:         {:.3e}", last.drift.momentum);
                info!("angular momentum drift: {:.3e}", last.drift.angular_momentum);
            }
        }
        Err(SimError::NoDiagnostics) => info!("no diagnostics recorded"),
        Err(e) => return Err(e.into()),
    }

    match sim.frames() {
        Ok(frames) => info!("frames recorded: {}", frames.len()),
        Err(SimError::NoFrames) => info!("no frames recorded"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
