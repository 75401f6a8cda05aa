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

//! Emitters turn one logical operation on one or two layouts into a stream
//! of physical circuit fragments.

use std::{
    collections::{BTreeSet, HashMap},
    fmt::{Debug, Display},
    sync::Arc,
};

use qec_common::Circuit;
use qec_frames::StabilizerUpdate;
use serde::{Deserialize, Serialize};

use crate::{error::CompileError, layout::Layout, model::NoiseModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    QecRound,
    SingleQubitUnitary,
    TwoQubitUnitary,
    Init,
    Measurement,
}

impl OperationKind {
    /// Number of layouts a scheduled operation of this kind names. QEC rounds
    /// name none and act on every active layout.
    pub fn arity(&self) -> usize {
        match self {
            Self::QecRound => 0,
            Self::TwoQubitUnitary => 2,
            Self::SingleQubitUnitary | Self::Init | Self::Measurement => 1,
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::QecRound => "QEC round",
            Self::SingleQubitUnitary => "single-qubit unitary",
            Self::TwoQubitUnitary => "two-qubit unitary",
            Self::Init => "initialization",
            Self::Measurement => "measurement",
        };
        write!(f, "{name}")
    }
}

/// What an operation does to the stabilizer frame once its fragments are in
/// the circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEffect {
    None,
    /// Stabilizer relabeling of a logical Clifford gate.
    Update(StabilizerUpdate),
    /// Start detecting `ancillas`; `gauge` are not yet deterministic.
    Activate {
        ancillas: Vec<String>,
        gauge: Vec<String>,
    },
    /// Destructive data measurement: `reconstructable` checks are read off
    /// the data qubits and `observable` is the logical operator measured.
    Measure {
        ancillas: Vec<String>,
        reconstructable: Vec<String>,
        observable: Vec<String>,
    },
}

pub type Fragments<'a> = Box<dyn Iterator<Item = Result<Circuit, CompileError>> + 'a>;

pub trait Emitter: Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> OperationKind;

    /// Lazily produce the fragments of this operation, each ending in a
    /// `TICK`. A QEC round is emitted for one layout at a time.
    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError>;

    fn frame_effect(&self, _layouts: &[&Layout]) -> Result<FrameEffect, CompileError> {
        Ok(FrameEffect::None)
    }
}

/// Emitters by instruction name.
#[derive(Debug, Clone, Default)]
pub struct GateSet {
    emitters: HashMap<String, Arc<dyn Emitter>>,
}

impl GateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, emitter: Arc<dyn Emitter>) {
        self.emitters.insert(name.into(), emitter);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Emitter>> {
        self.emitters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.emitters.contains_key(name)
    }

    pub fn names(&self) -> BTreeSet<&str> {
        self.emitters.keys().map(String::as_str).collect()
    }
}

pub(crate) fn expect_layouts(
    emitter: &dyn Emitter,
    layouts: &[&Layout],
    expected: usize,
) -> Result<(), CompileError> {
    if layouts.len() != expected {
        return Err(CompileError::ArityMismatch {
            name: emitter.name().to_string(),
            expected,
            found: layouts.len(),
        });
    }
    Ok(())
}

/// Gates applied in parallel between two `TICK`s.
#[derive(Debug, Clone, Default)]
pub(crate) struct Layer {
    gates: Vec<(&'static str, Vec<String>)>,
    busy: BTreeSet<String>,
}

impl Layer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, name: &'static str, qubits: Vec<String>) {
        if qubits.is_empty() {
            return;
        }
        self.busy.extend(qubits.iter().cloned());
        self.gates.push((name, qubits));
    }

    /// Idle every qubit of `qubits` without a gate in this layer.
    pub(crate) fn idle_rest(mut self, qubits: &[String]) -> Self {
        let rest: Vec<String> = qubits
            .iter()
            .filter(|q| !self.busy.contains(*q))
            .cloned()
            .collect();
        self.add("I", rest);
        self
    }

    fn render(&self, model: &dyn NoiseModel) -> Result<Circuit, CompileError> {
        let mut circuit = Circuit::new();
        for (name, qubits) in &self.gates {
            circuit.extend(model.gate(name, qubits)?);
        }
        circuit.extend(model.tick());
        Ok(circuit)
    }
}

/// Render the layers one fragment at a time.
pub(crate) fn render<'a>(model: &'a dyn NoiseModel, layers: Vec<Layer>) -> Fragments<'a> {
    Box::new(layers.into_iter().map(move |layer| layer.render(model)))
}
