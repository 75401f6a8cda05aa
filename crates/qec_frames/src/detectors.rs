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

//! Detector construction across logical gates.
//!
//! [`Detectors`] keeps, for every ancilla, when it was measured and activated
//! and which stabilizer updates have happened since its last detector. When a
//! round of ancillas (or a destructive data-qubit measurement) is appended to
//! the circuit, it emits one `DETECTOR` per ancilla comparing the current
//! syndrome with the previous one, translated through the pending updates
//! according to the [`FrameConvention`].
//!
//! The previous syndrome of ancilla `a` is its value at its last detector (or
//! at its activation). Walking the pending history back to that point, a label
//! whose block was initialized in between drops out, since its stabilizer was
//! freshly prepared.
//!
//! Syndrome of label `x` in terms of measurement look-backs:
//!
//! * current round from ancillas: `(x, -1)`, and `(x, -2)` without ancilla
//!   reset when `x` was already measured since its activation;
//! * current round from data qubits: `(d, -1)` for every `d` in the support
//!   of `x`;
//! * previous round: the measurement of `x` at that point, `k` measurements of
//!   `x` ago, i.e. `(x, -k)` or `(x, -k - 1)` if `x` is also measured in this
//!   build; without ancilla reset, the measurement of `x` before it as well
//!   when both fall between the same two activations. Nothing when `x` has not
//!   been measured since its last activation.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Display,
    str::FromStr,
};

use clap::ValueEnum;
use log::{debug, trace};
use qec_common::{Circuit, Instruction, MeasTarget, MeasurementLookup};
use serde::{Deserialize, Serialize};

use crate::{error::FrameError, stabilizer_map::StabilizerUpdate, support::SupportMap};

/// Which stabilizer labels a detector spanning a logical gate is written in.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FrameConvention {
    /// Compare every ancilla with itself, ignoring stabilizer updates.
    #[value(name = "gate-independent", alias = "t")]
    GateIndependent,
    /// Label detectors by the stabilizers valid before the gates.
    #[value(name = "pre-gate", alias = "r-1")]
    PreGate,
    /// Label detectors by the stabilizers valid after the gates.
    #[default]
    #[value(name = "post-gate", alias = "r")]
    PostGate,
}

impl FromStr for FrameConvention {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gate-independent" | "t" => Ok(Self::GateIndependent),
            "pre-gate" | "r-1" => Ok(Self::PreGate),
            "post-gate" | "r" => Ok(Self::PostGate),
            other => Err(FrameError::UnknownFrame {
                frame: other.to_string(),
            }),
        }
    }
}

impl Display for FrameConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GateIndependent => "gate-independent",
            Self::PreGate => "pre-gate",
            Self::PostGate => "post-gate",
        };
        write!(f, "{name}")
    }
}

/// Frame tracker for one set of code blocks. Ancillas are addressed by label
/// and kept in the order given at construction.
#[derive(Debug, Clone)]
pub struct Detectors {
    anc_qubits: Vec<String>,
    positions: HashMap<String, usize>,
    frame: FrameConvention,
    anc_coords: Vec<Vec<f64>>,
    include_gauge_dets: bool,
    num_rounds: Vec<usize>,
    // Every event (activation, update, build) gets the next tick of `clock`.
    clock: usize,
    // Ticks of the ancilla's own measurements since the start of the circuit,
    // matching its entries in the measurement record.
    meas_ticks: Vec<Vec<usize>>,
    activation_ticks: Vec<Vec<usize>>,
    // `(tick, ancilla)` of every activation, in order.
    activation_log: Vec<(usize, usize)>,
    // Tick of the last detector or activation of each ancilla.
    since: Vec<usize>,
    update_dict_list: Vec<StabilizerUpdate>,
    update_ticks: Vec<usize>,
    // Absolute index of `update_dict_list[0]` in the update history.
    history_start: usize,
    cursors: Vec<usize>,
    activated: Vec<bool>,
    gauge: Vec<bool>,
    anc_detectors: Option<Vec<bool>>,
}

impl Detectors {
    /// `anc_coords`, when given, must have an entry for every ancilla and all
    /// entries must have the same length.
    pub fn new<I, S>(
        anc_qubits: I,
        frame: FrameConvention,
        anc_coords: Option<BTreeMap<String, Vec<f64>>>,
        include_gauge_dets: bool,
    ) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let anc_qubits: Vec<String> = anc_qubits.into_iter().map(Into::into).collect();
        let mut positions = HashMap::new();
        for (i, anc) in anc_qubits.iter().enumerate() {
            if positions.insert(anc.clone(), i).is_some() {
                return Err(FrameError::DuplicateAncilla {
                    ancilla: anc.clone(),
                });
            }
        }

        let anc_coords = match anc_coords {
            None => vec![vec![]; anc_qubits.len()],
            Some(mut coords) => {
                let mut expected: Vec<String> = anc_qubits.clone();
                expected.sort();
                let found: Vec<String> = coords.keys().cloned().collect();
                if expected != found {
                    return Err(FrameError::DomainMismatch { expected, found });
                }
                let mut ordered = Vec::with_capacity(anc_qubits.len());
                for anc in &anc_qubits {
                    ordered.push(coords.remove(anc).unwrap_or_default());
                }
                if let Some(first) = ordered.first().map(Vec::len) {
                    if let Some((anc, c)) = anc_qubits
                        .iter()
                        .zip(&ordered)
                        .find(|(_, c)| c.len() != first)
                    {
                        return Err(FrameError::CoordsMismatch {
                            ancilla: anc.clone(),
                            expected: first,
                            found: c.len(),
                        });
                    }
                }
                ordered
            }
        };

        let n = anc_qubits.len();
        Ok(Self {
            anc_qubits,
            positions,
            frame,
            anc_coords,
            include_gauge_dets,
            num_rounds: vec![0; n],
            clock: 0,
            meas_ticks: vec![vec![]; n],
            activation_ticks: vec![vec![]; n],
            activation_log: vec![],
            since: vec![0; n],
            update_dict_list: vec![],
            update_ticks: vec![],
            history_start: 0,
            cursors: vec![0; n],
            activated: vec![false; n],
            gauge: vec![false; n],
            anc_detectors: None,
        })
    }

    pub fn frame(&self) -> FrameConvention {
        self.frame
    }

    pub fn anc_qubits(&self) -> &[String] {
        &self.anc_qubits
    }

    pub fn include_gauge_dets(&self) -> bool {
        self.include_gauge_dets
    }

    pub fn num_rounds(&self, anc: &str) -> Result<usize, FrameError> {
        Ok(self.num_rounds[self.position(anc)?])
    }

    pub fn is_active(&self, anc: &str) -> Result<bool, FrameError> {
        Ok(self.activated[self.position(anc)?])
    }

    pub fn is_gauge(&self, anc: &str) -> Result<bool, FrameError> {
        Ok(self.gauge[self.position(anc)?])
    }

    /// Updates not yet consumed by every active ancilla.
    pub fn pending_updates(&self) -> &[StabilizerUpdate] {
        &self.update_dict_list
    }

    /// Updates since the last detector of `anc`.
    pub fn pending_for(&self, anc: &str) -> Result<&[StabilizerUpdate], FrameError> {
        Ok(self.pending(self.position(anc)?))
    }

    /// Start of a new circuit: round counters and pending updates are
    /// cleared, activation and gauge flags are kept.
    pub fn new_circuit(&mut self) {
        self.num_rounds.fill(0);
        self.clock = 0;
        self.meas_ticks.iter_mut().for_each(Vec::clear);
        self.activation_ticks.iter_mut().for_each(Vec::clear);
        self.activation_log.clear();
        self.since.fill(0);
        self.update_dict_list.clear();
        self.update_ticks.clear();
        self.history_start = 0;
        self.cursors.fill(0);
    }

    /// Newly activated ancillas start counting rounds from zero and ignore
    /// earlier updates. Already active ancillas are left untouched.
    ///
    /// Earlier measurements of a re-activated ancilla stay in the history:
    /// detectors of other blocks that still owe it an update keep referring
    /// to them.
    pub fn activate_detectors(
        &mut self,
        ancillas: &[String],
        gauge_detectors: &[String],
    ) -> Result<(), FrameError> {
        let ancillas = self.positions_of(ancillas)?;
        let gauge_detectors = self.positions_of(gauge_detectors)?;
        let end = self.history_end();
        let tick = self.tick();
        for i in ancillas {
            if !self.activated[i] {
                self.activated[i] = true;
                self.num_rounds[i] = 0;
                self.cursors[i] = end;
                self.since[i] = tick;
                self.activation_ticks[i].push(tick);
                self.activation_log.push((tick, i));
            }
        }
        for i in gauge_detectors {
            self.gauge[i] = true;
        }
        self.drop_consumed();
        Ok(())
    }

    pub fn deactivate_detectors(&mut self, ancillas: &[String]) -> Result<(), FrameError> {
        for i in self.positions_of(ancillas)? {
            self.activated[i] = false;
            self.gauge[i] = false;
        }
        self.drop_consumed();
        Ok(())
    }

    /// Restrict detectors to a subset of the ancillas; the others still get a
    /// `DETECTOR` without targets. `None` observes every ancilla.
    pub fn set_anc_detectors(&mut self, anc_detectors: Option<&[String]>) -> Result<(), FrameError> {
        self.anc_detectors = match anc_detectors {
            None => None,
            Some(list) => {
                let mut observed = vec![false; self.anc_qubits.len()];
                for i in self.positions_of(list)? {
                    observed[i] = true;
                }
                Some(observed)
            }
        };
        Ok(())
    }

    /// Append a stabilizer update. It must be defined on exactly the ancilla
    /// universe; see [`StabilizerUpdate::embed`].
    pub fn update(&mut self, update: StabilizerUpdate) -> Result<(), FrameError> {
        let found: Vec<String> = update.domain().map(str::to_string).collect();
        let mut expected = self.anc_qubits.clone();
        expected.sort();
        if found != expected {
            return Err(FrameError::DomainMismatch { expected, found });
        }
        let tick = self.tick();
        self.update_dict_list.push(update);
        self.update_ticks.push(tick);
        trace!(
            "Stored stabilizer update, {} pending",
            self.update_dict_list.len()
        );
        Ok(())
    }

    /// Detectors for a round in which the ancillas `anc_qubits` (all of them
    /// if `None`) have just been measured. Inactive ancillas are skipped.
    pub fn build_from_anc<L>(
        &mut self,
        meas_ref: &L,
        anc_reset: bool,
        anc_qubits: Option<&[String]>,
    ) -> Result<Circuit, FrameError>
    where
        L: MeasurementLookup + ?Sized,
    {
        self.build(meas_ref, anc_reset, anc_qubits, None)
    }

    /// Detectors for a destructive measurement of the data qubits, with the
    /// current syndrome of each ancilla given by the parity of its support.
    pub fn build_from_data<L>(
        &mut self,
        meas_ref: &L,
        support_map: &SupportMap,
        anc_reset: bool,
        anc_qubits: Option<&[String]>,
    ) -> Result<Circuit, FrameError>
    where
        L: MeasurementLookup + ?Sized,
    {
        self.build(meas_ref, anc_reset, anc_qubits, Some(support_map))
    }

    fn build<L>(
        &mut self,
        meas_ref: &L,
        anc_reset: bool,
        anc_qubits: Option<&[String]>,
        support_map: Option<&SupportMap>,
    ) -> Result<Circuit, FrameError>
    where
        L: MeasurementLookup + ?Sized,
    {
        let mut in_build = vec![false; self.anc_qubits.len()];
        match anc_qubits {
            Some(list) => {
                for i in self.positions_of(list)? {
                    in_build[i] = self.activated[i];
                }
            }
            None => in_build.clone_from(&self.activated),
        }
        let rounds = self.num_rounds.clone();

        let mut detectors = Circuit::new();
        for i in (0..self.anc_qubits.len()).filter(|&i| in_build[i]) {
            let observed = self.anc_detectors.as_ref().is_none_or(|o| o[i]);
            let suppressed = self.gauge[i] && !self.include_gauge_dets;
            let mut targets = vec![];
            if observed && !suppressed {
                for (qubit, rel) in self.references(i, &in_build, anc_reset, support_map)? {
                    targets.push(meas_ref.meas_target(&qubit, rel)?);
                }
                targets.sort_by_key(|t: &MeasTarget| std::cmp::Reverse(t.lookback()));
            }
            let mut coords = self.anc_coords[i].clone();
            coords.push(rounds[i] as f64);
            detectors.push(Instruction::Detector { coords, targets });
        }

        let end = self.history_end();
        let tick = self.tick();
        for i in (0..self.anc_qubits.len()).filter(|&i| in_build[i]) {
            self.num_rounds[i] += 1;
            if support_map.is_none() {
                self.meas_ticks[i].push(tick);
            }
            self.since[i] = tick;
            self.cursors[i] = end;
            self.gauge[i] = false;
        }
        self.drop_consumed();

        debug!(
            "Built {} detectors from {} in the {} frame",
            detectors.len(),
            if support_map.is_some() { "data" } else { "ancillas" },
            self.frame
        );
        Ok(detectors)
    }

    /// Measurement references of the detector of ancilla `i`, reduced mod 2.
    fn references(
        &self,
        i: usize,
        in_build: &[bool],
        anc_reset: bool,
        support_map: Option<&SupportMap>,
    ) -> Result<BTreeSet<(String, i32)>, FrameError> {
        let label = BTreeSet::from([self.anc_qubits[i].clone()]);
        let (current, previous) = match self.frame {
            FrameConvention::GateIndependent => (label.clone(), label),
            FrameConvention::PostGate => (label.clone(), self.walk_backward(i, &label)),
            FrameConvention::PreGate => match self.walk_forward(i, &label) {
                Some(current)
                    if current
                        .iter()
                        .all(|l| self.positions.get(l).is_some_and(|&p| in_build[p])) =>
                {
                    (current, label)
                }
                _ => {
                    debug!(
                        "Labels of {} are not all measured in this build, using the post-gate frame",
                        self.anc_qubits[i]
                    );
                    (label.clone(), self.walk_backward(i, &label))
                }
            },
        };

        let mut refs = BTreeSet::new();
        for anc in &current {
            let p = self.position(anc)?;
            match support_map {
                None => {
                    toggle(&mut refs, (anc.clone(), -1));
                    if !anc_reset && self.measured_since_activation(p) {
                        toggle(&mut refs, (anc.clone(), -2));
                    }
                }
                Some(support_map) => {
                    let support =
                        support_map
                            .support(anc)
                            .ok_or_else(|| FrameError::UnknownAncilla {
                                ancilla: anc.clone(),
                            })?;
                    for data in support {
                        toggle(&mut refs, (data.to_string(), -1));
                    }
                }
            }
        }
        for anc in &previous {
            let p = self.position(anc)?;
            let Some(j) = self.measurement_at(p, self.since[i]) else {
                continue;
            };
            let ticks = &self.meas_ticks[p];
            let measured_now = support_map.is_none() && in_build[p];
            let offset = -((ticks.len() - j) as i32) - i32::from(measured_now);
            toggle(&mut refs, (anc.clone(), offset));
            if !anc_reset && j >= 1 && !self.activated_between(p, ticks[j - 1], ticks[j]) {
                toggle(&mut refs, (anc.clone(), offset - 1));
            }
        }
        Ok(refs)
    }

    /// Index in `meas_ticks[p]` of the measurement giving the stabilizer of
    /// `p` at `tick`, if it has not been prepared afresh since.
    fn measurement_at(&self, p: usize, tick: usize) -> Option<usize> {
        let count = self.meas_ticks[p].partition_point(|&t| t <= tick);
        let j = count.checked_sub(1)?;
        if self.activated_between(p, self.meas_ticks[p][j], tick) {
            return None;
        }
        Some(j)
    }

    fn measured_since_activation(&self, p: usize) -> bool {
        match (self.meas_ticks[p].last(), self.activation_ticks[p].last()) {
            (Some(meas), Some(activation)) => meas > activation,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    // Activations of `p` in `(after, until]`.
    fn activated_between(&self, p: usize, after: usize, until: usize) -> bool {
        self.activation_ticks[p]
            .iter()
            .any(|&t| after < t && t <= until)
    }

    /// Pending updates of ancilla `i` interleaved with the activations that
    /// happened since its last detector, oldest first.
    fn steps(&self, i: usize) -> Vec<Step<'_>> {
        let since = self.since[i];
        let start = self.activation_log.partition_point(|&(t, _)| t <= since);
        let mut activations = self.activation_log[start..].iter().peekable();
        let pending = self.pending(i);
        let ticks = &self.update_ticks[self.update_ticks.len() - pending.len()..];

        let mut steps = Vec::with_capacity(pending.len());
        for (update, &tick) in pending.iter().zip(ticks) {
            while let Some(&(_, p)) = activations.next_if(|&&(t, _)| t < tick) {
                steps.push(Step::Activation(self.anc_qubits[p].as_str()));
            }
            steps.push(Step::Update(update));
        }
        steps.extend(activations.map(|&(_, p)| Step::Activation(self.anc_qubits[p].as_str())));
        steps
    }

    // Apply the forward maps of the pending updates, latest first. Labels
    // prepared afresh in between carry no earlier syndrome.
    fn walk_backward(&self, i: usize, labels: &BTreeSet<String>) -> BTreeSet<String> {
        self.steps(i)
            .iter()
            .rev()
            .fold(labels.clone(), |mut acc, step| match step {
                Step::Update(update) => update.forward().apply(&acc),
                Step::Activation(anc) => {
                    acc.remove(*anc);
                    acc
                }
            })
    }

    // Apply the inverse maps of the pending updates, earliest first. `None`
    // when one of the labels is prepared afresh on the way.
    fn walk_forward(&self, i: usize, labels: &BTreeSet<String>) -> Option<BTreeSet<String>> {
        let mut acc = labels.clone();
        for step in self.steps(i) {
            match step {
                Step::Update(update) => acc = update.inverse().apply(&acc),
                Step::Activation(anc) if acc.contains(anc) => return None,
                Step::Activation(_) => {}
            }
        }
        Some(acc)
    }

    fn pending(&self, i: usize) -> &[StabilizerUpdate] {
        let start = self.cursors[i].saturating_sub(self.history_start);
        &self.update_dict_list[start.min(self.update_dict_list.len())..]
    }

    fn tick(&mut self) -> usize {
        self.clock += 1;
        self.clock
    }

    fn history_end(&self) -> usize {
        self.history_start + self.update_dict_list.len()
    }

    // Forget the updates every active ancilla has already consumed.
    fn drop_consumed(&mut self) {
        let end = self.history_end();
        let oldest = (0..self.anc_qubits.len())
            .filter(|&i| self.activated[i])
            .map(|i| self.cursors[i])
            .min()
            .unwrap_or(end);
        let consumed = oldest.saturating_sub(self.history_start);
        if consumed > 0 {
            self.update_dict_list.drain(..consumed);
            self.update_ticks.drain(..consumed);
            self.history_start = oldest;
        }
    }

    fn position(&self, anc: &str) -> Result<usize, FrameError> {
        self.positions
            .get(anc)
            .copied()
            .ok_or_else(|| FrameError::UnknownAncilla {
                ancilla: anc.to_string(),
            })
    }

    fn positions_of(&self, ancillas: &[String]) -> Result<Vec<usize>, FrameError> {
        ancillas.iter().map(|a| self.position(a)).collect()
    }
}

enum Step<'a> {
    Update(&'a StabilizerUpdate),
    Activation(&'a str),
}

fn toggle(refs: &mut BTreeSet<(String, i32)>, reference: (String, i32)) {
    if !refs.remove(&reference) {
        refs.insert(reference);
    }
}
