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

//! Physical circuit representation.
//!
//! A [`Circuit`] is a flat list of [`Instruction`]s with the same semantics as
//! a flattened stim circuit: gate layers separated by `TICK`s, plus detector,
//! observable and coordinate annotations whose measurement references are
//! look-backs into the measurement record (`rec[-k]`).

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Instruction names that append to the measurement record.
pub const MEAS_INSTR: &[&str] = &[
    "M", "MR", "MRX", "MRY", "MRZ", "MX", "MY", "MZ", "MXX", "MYY", "MZZ", "MPP",
];

/// Look-back into the measurement record, `rec[-k]`. Always negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeasTarget(pub i64);

impl MeasTarget {
    pub fn lookback(&self) -> i64 {
        self.0
    }
}

impl Display for MeasTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec[{}]", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Gate {
        name: String,
        targets: Vec<usize>,
        args: Vec<f64>,
    },
    Tick,
    Detector {
        coords: Vec<f64>,
        targets: Vec<MeasTarget>,
    },
    Observable {
        index: usize,
        targets: Vec<MeasTarget>,
    },
    QubitCoords {
        qubit: usize,
        coords: Vec<f64>,
    },
}

impl Instruction {
    pub fn gate(name: &str, targets: Vec<usize>) -> Self {
        Self::Gate {
            name: name.to_string(),
            targets,
            args: vec![],
        }
    }

    /// A gate carrying parenthesised arguments, e.g. `DEPOLARIZE1(0.001)`.
    pub fn gate_with_args(name: &str, targets: Vec<usize>, args: Vec<f64>) -> Self {
        Self::Gate {
            name: name.to_string(),
            targets,
            args,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Gate { name, .. } => name,
            Self::Tick => "TICK",
            Self::Detector { .. } => "DETECTOR",
            Self::Observable { .. } => "OBSERVABLE_INCLUDE",
            Self::QubitCoords { .. } => "QUBIT_COORDS",
        }
    }

    pub fn is_measurement(&self) -> bool {
        matches!(self, Self::Gate { name, .. } if MEAS_INSTR.contains(&name.as_str()))
    }

    /// Number of records this instruction appends to the measurement record.
    pub fn num_measurements(&self) -> usize {
        match self {
            Self::Gate { targets, .. } if self.is_measurement() => targets.len(),
            _ => 0,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn fmt_args(args: &[f64]) -> String {
            if args.is_empty() {
                String::new()
            } else {
                format!(
                    "({})",
                    args.iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }

        match self {
            Self::Gate {
                name,
                targets,
                args,
            } => {
                write!(f, "{}{}", name, fmt_args(args))?;
                for t in targets {
                    write!(f, " {t}")?;
                }
                Ok(())
            }
            Self::Tick => write!(f, "TICK"),
            Self::Detector { coords, targets } => {
                write!(f, "DETECTOR{}", fmt_args(coords))?;
                for t in targets {
                    write!(f, " {t}")?;
                }
                Ok(())
            }
            Self::Observable { index, targets } => {
                write!(f, "OBSERVABLE_INCLUDE({index})")?;
                for t in targets {
                    write!(f, " {t}")?;
                }
                Ok(())
            }
            Self::QubitCoords { qubit, coords } => {
                write!(f, "QUBIT_COORDS{} {qubit}", fmt_args(coords))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    instructions: Vec<Instruction>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Append a gate; gates without targets are dropped.
    pub fn append_gate(&mut self, name: &str, targets: Vec<usize>) {
        if !targets.is_empty() {
            self.push(Instruction::gate(name, targets));
        }
    }

    pub fn tick(&mut self) {
        self.push(Instruction::Tick);
    }

    pub fn extend(&mut self, other: Circuit) {
        self.instructions.extend(other.instructions);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn first(&self) -> Option<&Instruction> {
        self.instructions.first()
    }

    pub fn num_ticks(&self) -> usize {
        self.iter()
            .filter(|instr| matches!(instr, Instruction::Tick))
            .count()
    }

    pub fn num_measurements(&self) -> usize {
        self.iter().map(Instruction::num_measurements).sum()
    }

    pub fn num_detectors(&self) -> usize {
        self.iter()
            .filter(|instr| matches!(instr, Instruction::Detector { .. }))
            .count()
    }

    /// One more than the largest observable index, as stim counts them.
    pub fn num_observables(&self) -> usize {
        self.iter()
            .filter_map(|instr| match instr {
                Instruction::Observable { index, .. } => Some(index + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Split the circuit into the instruction blocks between `TICK`s.
    /// The result always has `num_ticks() + 1` blocks.
    pub fn tick_blocks(&self) -> Vec<Vec<Instruction>> {
        let mut blocks = vec![vec![]];
        for instr in self.iter() {
            match instr {
                Instruction::Tick => blocks.push(vec![]),
                other => {
                    if let Some(block) = blocks.last_mut() {
                        block.push(other.clone());
                    }
                }
            }
        }
        blocks
    }

    /// Drop every `I` instruction.
    pub fn without_idling(&self) -> Circuit {
        self.iter()
            .filter(|instr| instr.name() != "I")
            .cloned()
            .collect()
    }
}

impl FromIterator<Instruction> for Circuit {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Circuit {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Prints the circuit in stim's text format, one instruction per line.
impl Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in self.iter() {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}
