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

//! Noise models: how every physical gate is written into the circuit.

use std::fmt::{Debug, Display};

use log::trace;
use qec_common::{Circuit, Instruction, QubitMap, RecordError};

use crate::layout::Layout;

/// Gates the emitters use.
pub const GATES: [&str; 9] = ["I", "X", "Z", "H", "R", "RX", "M", "MX", "CX"];

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    UnknownGate { name: String },
    /// Two-qubit gates need an even number of targets.
    OddTargets { name: String, count: usize },
    InvalidProbability { p: f64 },
    Record(RecordError),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownGate { name } => write!(f, "the noise model has no gate {name}"),
            Self::OddTargets { name, count } => {
                write!(f, "{name} needs pairs of targets, got {count} targets")
            }
            Self::InvalidProbability { p } => {
                write!(f, "error probability {p} is not in [0, 1]")
            }
            Self::Record(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Record(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordError> for ModelError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

/// Qubits of a list of layouts, indexed in layout order, with their
/// coordinates.
#[derive(Debug, Clone)]
pub struct QubitRegister {
    map: QubitMap,
    coords: Vec<Vec<f64>>,
}

impl QubitRegister {
    pub fn from_layouts(layouts: &[Layout]) -> Result<Self, ModelError> {
        let labels = layouts.iter().flat_map(|l| l.qubits().iter().cloned());
        let map = QubitMap::from_labels(labels)?;
        let coords = layouts
            .iter()
            .flat_map(|l| {
                l.qubits()
                    .iter()
                    .map(move |q| l.coords(q).map(<[f64]>::to_vec).unwrap_or_default())
            })
            .collect();
        Ok(Self { map, coords })
    }

    pub fn qubits(&self) -> &QubitMap {
        &self.map
    }

    /// One `QUBIT_COORDS` per qubit.
    pub fn qubit_coords(&self) -> Circuit {
        self.coords
            .iter()
            .enumerate()
            .map(|(qubit, coords)| Instruction::QubitCoords {
                qubit,
                coords: coords.clone(),
            })
            .collect()
    }
}

/// Writes physical gates, with whatever noise channels the model attaches to
/// them, on qubits addressed by label.
pub trait NoiseModel: Debug {
    fn register(&self) -> &QubitRegister;

    /// Noise channels placed before and after `name` acting on `targets`.
    fn noise(&self, name: &str, targets: &[usize]) -> (Circuit, Circuit);

    fn qubits(&self) -> &QubitMap {
        self.register().qubits()
    }

    /// `name` applied to `qubits`; `CX` takes them as control, target,
    /// control, target, ...
    fn gate(&self, name: &str, qubits: &[String]) -> Result<Circuit, ModelError> {
        if !GATES.contains(&name) {
            return Err(ModelError::UnknownGate {
                name: name.to_string(),
            });
        }
        if name == "CX" && qubits.len() % 2 == 1 {
            return Err(ModelError::OddTargets {
                name: name.to_string(),
                count: qubits.len(),
            });
        }
        if qubits.is_empty() {
            return Ok(Circuit::new());
        }
        let targets = self.qubits().indices(qubits.iter().map(String::as_str))?;
        let (mut circuit, after) = self.noise(name, &targets);
        circuit.append_gate(name, targets);
        circuit.extend(after);
        Ok(circuit)
    }

    fn tick(&self) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.tick();
        circuit
    }

    fn qubit_coords(&self) -> Circuit {
        self.register().qubit_coords()
    }
}

/// Ideal gates.
#[derive(Debug, Clone)]
pub struct NoiselessModel {
    register: QubitRegister,
}

impl NoiselessModel {
    pub fn new(layouts: &[Layout]) -> Result<Self, ModelError> {
        Ok(Self {
            register: QubitRegister::from_layouts(layouts)?,
        })
    }
}

impl NoiseModel for NoiselessModel {
    fn register(&self) -> &QubitRegister {
        &self.register
    }

    fn noise(&self, _name: &str, _targets: &[usize]) -> (Circuit, Circuit) {
        (Circuit::new(), Circuit::new())
    }
}

/// Uniform circuit-level noise: depolarizing channels after unitaries, flips
/// after resets and before measurements, all with probability `p`.
#[derive(Debug, Clone)]
pub struct CircuitNoiseModel {
    register: QubitRegister,
    p: f64,
}

impl CircuitNoiseModel {
    pub fn new(layouts: &[Layout], p: f64) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::InvalidProbability { p });
        }
        Ok(Self {
            register: QubitRegister::from_layouts(layouts)?,
            p,
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl NoiseModel for CircuitNoiseModel {
    fn register(&self) -> &QubitRegister {
        &self.register
    }

    fn noise(&self, name: &str, targets: &[usize]) -> (Circuit, Circuit) {
        let mut before = Circuit::new();
        let mut after = Circuit::new();
        if self.p == 0.0 {
            return (before, after);
        }
        let channel =
            |channel: &str| Instruction::gate_with_args(channel, targets.to_vec(), vec![self.p]);
        match name {
            "R" => after.push(channel("X_ERROR")),
            "RX" => after.push(channel("Z_ERROR")),
            "M" => before.push(channel("X_ERROR")),
            "MX" => before.push(channel("Z_ERROR")),
            "CX" => after.push(channel("DEPOLARIZE2")),
            _ => after.push(channel("DEPOLARIZE1")),
        }
        trace!("Attached noise to {name} on {} qubits", targets.len());
        (before, after)
    }
}
