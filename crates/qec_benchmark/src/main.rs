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
    io::{self, Write},
    time::Instant,
};

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

use qec_benchmark::random::random_circuit;
use qec_compiler::{
    CircuitNoiseModel, CodeFamily, ExperimentConfig, detectors_for,
    experiment_from_schedule, gate_to_emitter, schedule_from_circuit,
};
use qec_frames::FrameConvention;

#[derive(Parser)]
struct Cli {
    /// Number of logical qubits.
    qubits: usize,
    #[arg(short, long, default_value_t = 10)]
    layers: usize,
    #[arg(short, long)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize random circuits and write statistics as CSV.
    Profile {
        code: CodeFamily,
        #[arg(short, long, default_value_t = 3)]
        distance: usize,
        #[arg(short = 'n', long, default_value_t = 10)]
        samples: usize,
        #[arg(short, long, value_enum, default_value_t = FrameConvention::PostGate)]
        frame: FrameConvention,
        #[arg(short, long, default_value_t = 0.001)]
        p: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
struct Output {
    i: usize,
    code: String,
    distance: usize,
    qubits: usize,
    layers: usize,
    instructions: usize,
    ticks: usize,
    measurements: usize,
    detectors: usize,
    observables: usize,
    micros: u128,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.qubits == 0 {
        return Err("at least one logical qubit is needed".into());
    }
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let Some(Commands::Profile {
        code,
        distance,
        samples,
        frame,
        p,
    }) = cli.command
    else {
        // Print one random circuit as JSON lines.
        let circuit = random_circuit(cli.qubits, cli.layers, &mut rng);
        let mut stdout = io::stdout().lock();
        // Stop on first error
        let err = circuit.iter().try_for_each(|instr| {
            let mut out = serde_json::to_string(instr)?;
            out.push('\n');
            stdout.write_all(out.as_bytes())
        });
        debug!("Finished writing with {:?}", err);
        return Ok(());
    };

    info!(
        "Profiling {samples} random circuits on {} blocks of the distance {distance} {code}",
        cli.qubits
    );
    let layouts = code.blocks(distance, cli.qubits);
    let model = CircuitNoiseModel::new(&layouts, p)?;
    let mut detectors = detectors_for(&layouts, frame, false)?;
    let gates = gate_to_emitter();
    let config = ExperimentConfig::default();

    let mut wtr = csv::Writer::from_writer(io::stdout());
    for i in 0..samples {
        let instructions = random_circuit(cli.qubits, cli.layers, &mut rng);
        let start = Instant::now();
        let schedule = schedule_from_circuit(&instructions, layouts.len(), &gates)?;
        let circuit = experiment_from_schedule(&schedule, &layouts, &model, &mut detectors, &config)?;
        let micros = start.elapsed().as_micros();

        wtr.serialize(Output {
            i,
            code: code.to_string(),
            distance,
            qubits: cli.qubits,
            layers: cli.layers,
            instructions: circuit.len(),
            ticks: circuit.num_ticks(),
            measurements: circuit.num_measurements(),
            detectors: circuit.num_detectors(),
            observables: circuit.num_observables(),
            micros,
        })?;
    }
    wtr.flush()?;

    Ok(())
}
