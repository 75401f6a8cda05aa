// Copyright contributors to the Logical Circuit Compiler project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    error::Error,
    io::{self, Read, Write},
};

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use serde_json::Deserializer;

use qec_compiler::{
    CircuitNoiseModel, CodeFamily, ExperimentConfig, LogicalInstruction, detectors_for,
    experiment_from_circuit, gate_to_emitter, parse_circuit,
};
use qec_frames::FrameConvention;

/// Compile a logical circuit read from stdin into a physical circuit with
/// detectors and observables.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    code: CodeFamily,
    #[arg(short, long, default_value_t = 3)]
    distance: usize,
    /// Number of logical qubits; defaults to the largest target plus one.
    #[arg(short, long)]
    qubits: Option<usize>,
    #[arg(short, long, value_enum, default_value_t = FrameConvention::PostGate)]
    frame: FrameConvention,
    /// Error probability of the circuit noise model.
    #[arg(short, long, default_value_t = 0.0)]
    noise: f64,
    #[arg(long)]
    no_anc_reset: bool,
    #[arg(long)]
    include_gauge_dets: bool,
    /// Let active blocks idle through logical operations without an `I`.
    #[arg(long)]
    allow_idling: bool,
    /// Read the logical circuit as JSON instructions.
    #[arg(long)]
    json_input: bool,
    /// Write the physical circuit as JSON.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    commands: Option<Commands>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Commands {
    /// Print the layouts as JSON instead of compiling.
    Layouts,
}

fn read_circuit(json: bool) -> Result<Vec<LogicalInstruction>, Box<dyn Error>> {
    let mut text = String::new();
    io::stdin().lock().read_to_string(&mut text)?;
    if json {
        let de = Deserializer::from_str(&text);
        Ok(de
            .into_iter::<LogicalInstruction>()
            .collect::<Result<_, _>>()?)
    } else {
        Ok(parse_circuit(&text)?)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // By default log INFO.
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    if cli.commands == Some(Commands::Layouts) {
        let layouts = cli.code.blocks(cli.distance, cli.qubits.unwrap_or(1));
        serde_json::to_writer_pretty(&mut stdout, &layouts)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let instructions = read_circuit(cli.json_input)?;
    let num_qubits = cli.qubits.unwrap_or_else(|| {
        instructions
            .iter()
            .flat_map(|i| i.targets.iter())
            .max()
            .map_or(0, |t| t + 1)
    });
    info!(
        "Compiling {} logical instructions on {num_qubits} blocks of the distance {} {}",
        instructions.len(),
        cli.distance,
        cli.code
    );

    let layouts = cli.code.blocks(cli.distance, num_qubits);
    let model = CircuitNoiseModel::new(&layouts, cli.noise)?;
    let mut detectors = detectors_for(&layouts, cli.frame, cli.include_gauge_dets)?;
    let config = ExperimentConfig {
        anc_reset: !cli.no_anc_reset,
        anc_detectors: None,
        ensure_idling: !cli.allow_idling,
    };
    let circuit = experiment_from_circuit(
        &instructions,
        &layouts,
        &model,
        &mut detectors,
        &gate_to_emitter(),
        &config,
    )?;

    let written = if cli.json {
        serde_json::to_writer(&mut stdout, &circuit)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(stdout))
    } else {
        write!(stdout, "{circuit}")
    };
    debug!("Finished writing with {:?}", written);
    written?;

    Ok(())
}
