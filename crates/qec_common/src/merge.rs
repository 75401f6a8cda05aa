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

use std::{collections::BTreeSet, fmt::Display};

use log::trace;

use crate::circuit::{Circuit, Instruction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The inputs do not all have the same number of `TICK`s.
    TickMismatch { ticks: Vec<usize> },
    /// Input `circuit` measures in more than one tick block.
    MultipleMeasurementBlocks { circuit: usize, blocks: Vec<usize> },
    /// The measuring inputs do so in different tick blocks.
    MeasurementBlockMismatch { blocks: Vec<usize> },
}

impl Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TickMismatch { ticks } => write!(
                f,
                "all circuits must have the same number of TICKs, got {ticks:?}"
            ),
            Self::MultipleMeasurementBlocks { circuit, blocks } => write!(
                f,
                "circuit {circuit} measures in more than one TICK block: {blocks:?}"
            ),
            Self::MeasurementBlockMismatch { blocks } => write!(
                f,
                "the measurements happen at different TICK blocks: {blocks:?}"
            ),
        }
    }
}

impl std::error::Error for MergeError {}

/// Merge circuits tick block by tick block.
///
/// Block `i` of the result holds block `i` of every input, concatenated in
/// argument order. All inputs must have the same number of `TICK`s. With
/// `check_meas`, every input may measure in at most one tick block and the
/// measuring inputs must all do so in the same block.
pub fn merge_circuits(circuits: &[Circuit], check_meas: bool) -> Result<Circuit, MergeError> {
    let Some(first) = circuits.first() else {
        return Ok(Circuit::new());
    };
    let num_ticks = first.num_ticks();
    if circuits.iter().any(|c| c.num_ticks() != num_ticks) {
        return Err(MergeError::TickMismatch {
            ticks: circuits.iter().map(Circuit::num_ticks).collect(),
        });
    }

    let mut blocks: Vec<Vec<Instruction>> = vec![vec![]; num_ticks + 1];
    let mut measure_blocks: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); circuits.len()];
    for (k, circuit) in circuits.iter().enumerate() {
        for (block_id, block) in circuit.tick_blocks().into_iter().enumerate() {
            if block.iter().any(Instruction::is_measurement) {
                measure_blocks[k].insert(block_id);
            }
            blocks[block_id].extend(block);
        }
    }

    if check_meas {
        for (circuit, measured) in measure_blocks.iter().enumerate() {
            if measured.len() > 1 {
                return Err(MergeError::MultipleMeasurementBlocks {
                    circuit,
                    blocks: measured.iter().copied().collect(),
                });
            }
        }
        let distinct: BTreeSet<usize> = measure_blocks.iter().flatten().copied().collect();
        if distinct.len() > 1 {
            return Err(MergeError::MeasurementBlockMismatch {
                blocks: distinct.into_iter().collect(),
            });
        }
    }

    trace!(
        "Merged {} circuits over {} tick blocks",
        circuits.len(),
        num_ticks + 1
    );

    let mut merged = Circuit::new();
    for (block_id, block) in blocks.into_iter().enumerate() {
        if block_id > 0 {
            merged.tick();
        }
        for instr in block {
            merged.push(instr);
        }
    }
    Ok(merged)
}
