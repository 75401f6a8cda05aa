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

//! Schedules: the order in which logical operations are applied to layouts.

use std::sync::Arc;

use log::debug;

use crate::{
    emitter::{Emitter, GateSet, OperationKind},
    error::CompileError,
    language::LogicalInstruction,
};

/// An operation on one or two layouts, addressed by index.
#[derive(Debug, Clone)]
pub struct ScheduledOp {
    pub emitter: Arc<dyn Emitter>,
    pub layouts: Vec<usize>,
}

#[derive(Debug, Clone)]
pub enum ScheduleEntry {
    /// A round of syndrome extraction on every active layout.
    QecRound(Arc<dyn Emitter>),
    Operation(ScheduledOp),
}

impl ScheduleEntry {
    pub fn emitter(&self) -> &Arc<dyn Emitter> {
        match self {
            Self::QecRound(emitter) => emitter,
            Self::Operation(op) => &op.emitter,
        }
    }
}

/// Build the schedule of a logical circuit over `num_layouts` layouts.
///
/// `TICK` becomes a QEC round; every other instruction becomes one entry per
/// target, or per consecutive pair of targets for two-qubit emitters. Every
/// name is checked before anything is scheduled.
pub fn schedule_from_circuit(
    instructions: &[LogicalInstruction],
    num_layouts: usize,
    gates: &GateSet,
) -> Result<Vec<ScheduleEntry>, CompileError> {
    if let Some(unknown) = instructions.iter().find(|i| !gates.contains(&i.name)) {
        return Err(CompileError::UnknownInstruction {
            name: unknown.name.clone(),
        });
    }

    let mut schedule = vec![];
    for instr in instructions {
        let Some(emitter) = gates.get(&instr.name) else {
            continue;
        };
        let name = instr.name.clone();
        if instr.name == "TICK" {
            if emitter.kind() != OperationKind::QecRound {
                return Err(CompileError::TickNotQecRound {
                    name: emitter.name().to_string(),
                });
            }
            schedule.push(ScheduleEntry::QecRound(emitter.clone()));
            continue;
        }
        if let Some(&target) = instr.targets.iter().find(|&&t| t >= num_layouts) {
            return Err(CompileError::TargetOutOfRange {
                name,
                target,
                num_layouts,
            });
        }

        match emitter.kind() {
            OperationKind::QecRound => schedule.push(ScheduleEntry::QecRound(emitter.clone())),
            OperationKind::TwoQubitUnitary => {
                if instr.targets.len() % 2 == 1 {
                    return Err(CompileError::OddTargets {
                        name,
                        count: instr.targets.len(),
                    });
                }
                for pair in instr.targets.chunks(2) {
                    if pair[0] == pair[1] {
                        return Err(CompileError::RepeatedTarget {
                            name,
                            target: pair[0],
                        });
                    }
                    schedule.push(ScheduleEntry::Operation(ScheduledOp {
                        emitter: emitter.clone(),
                        layouts: pair.to_vec(),
                    }));
                }
            }
            _ => {
                for &target in &instr.targets {
                    schedule.push(ScheduleEntry::Operation(ScheduledOp {
                        emitter: emitter.clone(),
                        layouts: vec![target],
                    }));
                }
            }
        }
    }
    debug!(
        "Scheduled {} entries from {} instructions",
        schedule.len(),
        instructions.len()
    );
    Ok(schedule)
}
