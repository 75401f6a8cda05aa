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

//! Synthesis of one physical circuit from a schedule.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, trace, warn};
use qec_common::{Circuit, Instruction, MeasurementLookup, MeasurementRecord, merge_circuits};
use qec_frames::{Detectors, FrameConvention, SupportMap};
use serde::{Deserialize, Serialize};

use crate::{
    emitter::{Emitter, FrameEffect, Fragments, GateSet, OperationKind},
    error::CompileError,
    language::LogicalInstruction,
    layout::Layout,
    model::NoiseModel,
    schedule::{ScheduleEntry, ScheduledOp, schedule_from_circuit},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Ancillas are reset at the start of every round.
    pub anc_reset: bool,
    /// Ancillas whose detectors have targets; `None` for all of them.
    pub anc_detectors: Option<Vec<String>>,
    /// Every active layout must take part in exactly one operation between
    /// two QEC rounds.
    pub ensure_idling: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            anc_reset: true,
            anc_detectors: None,
            ensure_idling: true,
        }
    }
}

/// Frame tracker over every ancilla of `layouts`, annotated with their
/// coordinates.
pub fn detectors_for(
    layouts: &[Layout],
    frame: FrameConvention,
    include_gauge_dets: bool,
) -> Result<Detectors, CompileError> {
    let ancillas: Vec<String> = layouts.iter().flat_map(Layout::anc_qubits).collect();
    let coords: BTreeMap<String, Vec<f64>> = layouts.iter().flat_map(Layout::anc_coords).collect();
    Ok(Detectors::new(
        ancillas,
        frame,
        Some(coords),
        include_gauge_dets,
    )?)
}

/// Parse-free shortcut: schedule `instructions` and synthesize the circuit.
pub fn experiment_from_circuit(
    instructions: &[LogicalInstruction],
    layouts: &[Layout],
    model: &dyn NoiseModel,
    detectors: &mut Detectors,
    gates: &GateSet,
    config: &ExperimentConfig,
) -> Result<Circuit, CompileError> {
    let schedule = schedule_from_circuit(instructions, layouts.len(), gates)?;
    experiment_from_schedule(&schedule, layouts, model, detectors, config)
}

/// Synthesize the physical circuit of `schedule`, with detectors and
/// observables.
///
/// Operations are gathered into blocks until a QEC round, or until a layout
/// would get a second operation, and the fragments of one block are merged
/// tick by tick. `detectors` is reset first and may be reused afterwards.
pub fn experiment_from_schedule(
    schedule: &[ScheduleEntry],
    layouts: &[Layout],
    model: &dyn NoiseModel,
    detectors: &mut Detectors,
    config: &ExperimentConfig,
) -> Result<Circuit, CompileError> {
    let mut synthesis = Synthesis::new(layouts, model, detectors, config)?;
    for entry in schedule {
        match entry {
            ScheduleEntry::QecRound(emitter) => {
                synthesis.flush()?;
                synthesis.qec_round(emitter.as_ref())?;
            }
            ScheduleEntry::Operation(op) if op.emitter.kind() == OperationKind::QecRound => {
                synthesis.flush()?;
                synthesis.qec_round(op.emitter.as_ref())?;
            }
            ScheduleEntry::Operation(op) => synthesis.queue(op)?,
        }
    }
    synthesis.flush()?;

    let circuit = synthesis.circuit;
    info!(
        "Synthesized {} instructions with {} measurements, {} detectors and {} observables",
        circuit.len(),
        circuit.num_measurements(),
        circuit.num_detectors(),
        circuit.num_observables()
    );
    Ok(circuit)
}

struct Synthesis<'a> {
    layouts: &'a [Layout],
    model: &'a dyn NoiseModel,
    detectors: &'a mut Detectors,
    config: &'a ExperimentConfig,
    support_maps: Vec<SupportMap>,
    record: MeasurementRecord,
    circuit: Circuit,
    active: BTreeSet<usize>,
    block: Vec<&'a ScheduledOp>,
    counts: BTreeMap<usize, usize>,
    num_observables: usize,
}

impl<'a> Synthesis<'a> {
    fn new(
        layouts: &'a [Layout],
        model: &'a dyn NoiseModel,
        detectors: &'a mut Detectors,
        config: &'a ExperimentConfig,
    ) -> Result<Self, CompileError> {
        detectors.new_circuit();
        let universe = detectors.anc_qubits().to_vec();
        detectors.deactivate_detectors(&universe)?;
        detectors.set_anc_detectors(config.anc_detectors.as_deref())?;

        let support_maps = layouts
            .iter()
            .map(Layout::support_map)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            layouts,
            model,
            detectors,
            config,
            support_maps,
            record: MeasurementRecord::new(model.qubits().clone()),
            circuit: model.qubit_coords(),
            active: BTreeSet::new(),
            block: vec![],
            counts: BTreeMap::new(),
            num_observables: 0,
        })
    }

    fn layout_refs(&self, indices: &[usize]) -> Vec<&'a Layout> {
        let layouts: &'a [Layout] = self.layouts;
        indices.iter().map(|&i| &layouts[i]).collect()
    }

    fn queue(&mut self, op: &'a ScheduledOp) -> Result<(), CompileError> {
        let name = op.emitter.name().to_string();
        let kind = op.emitter.kind();
        if op.layouts.len() != kind.arity() {
            return Err(CompileError::ArityMismatch {
                name,
                expected: kind.arity(),
                found: op.layouts.len(),
            });
        }
        if let Some(&target) = op.layouts.iter().find(|&&l| l >= self.layouts.len()) {
            return Err(CompileError::TargetOutOfRange {
                name,
                target,
                num_layouts: self.layouts.len(),
            });
        }

        if op.layouts.iter().any(|l| self.counts.contains_key(l)) {
            trace!("{name} acts on a layout of the pending block, flushing");
            self.flush()?;
        }

        for &l in &op.layouts {
            let layout = self.layouts[l].name().to_string();
            match (kind, self.active.contains(&l)) {
                (OperationKind::Init, true) => {
                    return Err(CompileError::AlreadyActive { name, layout });
                }
                (OperationKind::Init, false) => {}
                (_, false) => return Err(CompileError::InactiveLayout { name, layout }),
                (_, true) => {}
            }
        }
        for &l in &op.layouts {
            match kind {
                OperationKind::Init => {
                    self.active.insert(l);
                }
                OperationKind::Measurement => {
                    self.active.remove(&l);
                }
                _ => {}
            }
            *self.counts.entry(l).or_default() += 1;
        }
        self.block.push(op);
        Ok(())
    }

    fn check_idling(&self) -> Result<(), CompileError> {
        let idle = self
            .active
            .iter()
            .any(|l| self.counts.get(l).copied().unwrap_or(0) != 1);
        if !idle {
            return Ok(());
        }
        let active: Vec<String> = self
            .active
            .iter()
            .map(|&l| self.layouts[l].name().to_string())
            .collect();
        let counts: BTreeMap<String, usize> = self
            .counts
            .iter()
            .map(|(&l, &n)| (self.layouts[l].name().to_string(), n))
            .collect();
        if self.config.ensure_idling {
            return Err(CompileError::IdlingViolation { active, counts });
        }
        debug!("Active layouts {active:?} idle through a block with operations {counts:?}");
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CompileError> {
        if self.block.is_empty() {
            return Ok(());
        }
        self.check_idling()?;
        let block = std::mem::take(&mut self.block);
        self.counts.clear();

        let mut streams = Vec::with_capacity(block.len());
        for op in &block {
            let layouts = self.layout_refs(&op.layouts);
            streams.push(op.emitter.emit(self.model, &layouts, self.config.anc_reset)?);
        }
        let merged = lockstep(streams, false)?;
        self.record.observe(&merged)?;
        self.circuit.extend(merged);

        let mut effects = Vec::with_capacity(block.len());
        for op in &block {
            effects.push(op.emitter.frame_effect(&self.layout_refs(&op.layouts))?);
        }
        trace!("Flushed a block of {} operations", block.len());

        for effect in &effects {
            if let FrameEffect::Update(update) = effect {
                let update = update.embed(self.detectors.anc_qubits())?;
                self.detectors.update(update)?;
            }
        }
        for effect in &effects {
            if let FrameEffect::Activate { ancillas, gauge } = effect {
                self.detectors.activate_detectors(ancillas, gauge)?;
            }
        }
        for (op, effect) in block.iter().zip(&effects) {
            if let FrameEffect::Measure {
                ancillas,
                reconstructable,
                observable,
            } = effect
            {
                let support_map = &self.support_maps[op.layouts[0]];
                let dets = self.detectors.build_from_data(
                    &self.record,
                    support_map,
                    self.config.anc_reset,
                    Some(reconstructable.as_slice()),
                )?;
                self.circuit.extend(dets);
                self.detectors.deactivate_detectors(ancillas)?;

                let targets = observable
                    .iter()
                    .map(|q| self.record.meas_target(q, -1))
                    .collect::<Result<Vec<_>, _>>()?;
                self.circuit.push(Instruction::Observable {
                    index: self.num_observables,
                    targets,
                });
                self.num_observables += 1;
            }
        }
        Ok(())
    }

    fn qec_round(&mut self, emitter: &dyn Emitter) -> Result<(), CompileError> {
        if emitter.kind() != OperationKind::QecRound {
            return Err(CompileError::WrongKind {
                name: emitter.name().to_string(),
                expected: OperationKind::QecRound,
                found: emitter.kind(),
            });
        }
        if self.active.is_empty() {
            warn!("Skipping QEC round, no layout is active");
            return Ok(());
        }

        let active: Vec<usize> = self.active.iter().copied().collect();
        let mut streams = Vec::with_capacity(active.len());
        for &l in &active {
            let layouts = self.layout_refs(&[l]);
            streams.push(emitter.emit(self.model, &layouts, self.config.anc_reset)?);
        }
        let merged = lockstep(streams, true)?;
        self.record.observe(&merged)?;
        self.circuit.extend(merged);

        let ancillas: Vec<String> = active
            .iter()
            .flat_map(|&l| self.layouts[l].anc_qubits())
            .collect();
        let dets = self.detectors.build_from_anc(
            &self.record,
            self.config.anc_reset,
            Some(ancillas.as_slice()),
        )?;
        trace!(
            "QEC round on {} layouts, {} detectors",
            active.len(),
            dets.num_detectors()
        );
        self.circuit.extend(dets);
        Ok(())
    }
}

/// Merge fragment `i` of every stream into fragment `i` of the output.
fn lockstep(mut streams: Vec<Fragments<'_>>, check_meas: bool) -> Result<Circuit, CompileError> {
    let mut out = Circuit::new();
    let mut produced = 0;
    loop {
        let mut fragments = Vec::with_capacity(streams.len());
        let mut yielded = Vec::with_capacity(streams.len());
        for stream in streams.iter_mut() {
            let next = stream.next();
            yielded.push(next.is_some());
            if let Some(fragment) = next {
                fragments.push(fragment?);
            }
        }
        if fragments.is_empty() {
            return Ok(out);
        }
        if fragments.len() != streams.len() {
            let counts = streams
                .iter_mut()
                .zip(yielded)
                .map(|(stream, y)| produced + usize::from(y) + stream.count())
                .collect();
            return Err(CompileError::FragmentCountMismatch { counts });
        }
        out.extend(merge_circuits(&fragments, check_meas)?);
        produced += 1;
    }
}
