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

//! Post-processing of `OBSERVABLE_INCLUDE` declarations.

use std::{collections::BTreeSet, fmt::Display};

use crate::circuit::{Circuit, Instruction, MeasTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservableError {
    IndexOutOfRange {
        index: usize,
        num_observables: usize,
    },
}

impl Display for ObservableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange {
                index,
                num_observables,
            } => write!(
                f,
                "observable index {index} is out of range for a circuit with {num_observables} observables"
            ),
        }
    }
}

impl std::error::Error for ObservableError {}

/// Move every observable declaration to the end of the circuit.
///
/// Look-backs are shifted by the number of measurements between the
/// declaration and the end, and the declarations of the same index are merged
/// (mod 2) into a single one, ordered by first appearance.
pub fn move_observables_to_end(circuit: &Circuit) -> Circuit {
    let mut remaining = circuit.num_measurements();
    let mut observables: Vec<(usize, BTreeSet<MeasTarget>)> = vec![];
    let mut out = Circuit::new();

    for instr in circuit.iter() {
        remaining -= instr.num_measurements();
        match instr {
            Instruction::Observable { index, targets } => {
                let shift = remaining as i64;
                let pos = match observables.iter().position(|(i, _)| i == index) {
                    Some(pos) => pos,
                    None => {
                        observables.push((*index, BTreeSet::new()));
                        observables.len() - 1
                    }
                };
                for target in targets {
                    toggle(&mut observables[pos].1, MeasTarget(target.0 - shift));
                }
            }
            other => out.push(other.clone()),
        }
    }

    for (index, targets) in observables {
        out.push(Instruction::Observable {
            index,
            targets: targets.into_iter().collect(),
        });
    }
    out
}

/// Keep only the given combinations of observables.
///
/// Entry `k` of `deterministic_obs` lists the indices of the observables whose
/// product becomes the new observable `k`. Every other observable is dropped.
pub fn remove_nondeterministic_observables(
    circuit: &Circuit,
    deterministic_obs: &[Vec<usize>],
) -> Result<Circuit, ObservableError> {
    let num_observables = circuit.num_observables();
    if num_observables == 0 {
        return Ok(circuit.clone());
    }
    if let Some(&index) = deterministic_obs
        .iter()
        .flatten()
        .find(|&&i| i >= num_observables)
    {
        return Err(ObservableError::IndexOutOfRange {
            index,
            num_observables,
        });
    }

    let moved = move_observables_to_end(circuit);
    let mut observables: Vec<(usize, Vec<MeasTarget>)> = vec![];
    let mut out = Circuit::new();
    for instr in moved {
        match instr {
            Instruction::Observable { index, targets } => observables.push((index, targets)),
            other => out.push(other),
        }
    }

    for (k, combination) in deterministic_obs.iter().enumerate() {
        let mut targets = BTreeSet::new();
        for obs in combination {
            if let Some((_, obs_targets)) = observables.iter().find(|(i, _)| i == obs) {
                for target in obs_targets {
                    toggle(&mut targets, *target);
                }
            }
        }
        out.push(Instruction::Observable {
            index: k,
            targets: targets.into_iter().collect(),
        });
    }
    Ok(out)
}

fn toggle(set: &mut BTreeSet<MeasTarget>, target: MeasTarget) {
    if !set.remove(&target) {
        set.insert(target);
    }
}
