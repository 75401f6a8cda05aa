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

//! Reference emitters for the repetition and rotated surface codes.
//!
//! Every logical operation is two layers long so that the fragments of
//! different operations in one block line up tick by tick. Every layer
//! touches every qubit of its layouts, idling those without a gate.

use std::sync::Arc;

use qec_frames::{StabilizerMap, StabilizerUpdate};

use crate::{
    emitter::{
        Emitter, FrameEffect, Fragments, GateSet, Layer, OperationKind, expect_layouts, render,
    },
    error::CompileError,
    layout::{Basis, CodeFamily, Direction, Layout, StabType},
    model::NoiseModel,
};

/// Number of layers of one syndrome extraction round.
pub const ROUND_LAYERS: usize = 12;

/// One round of syndrome extraction: Z checks, then X checks.
#[derive(Debug, Clone, Default)]
pub struct QecRound;

impl QecRound {
    fn layers(layout: &Layout, anc_reset: bool) -> Vec<Layer> {
        let qubits = layout.qubits();
        let ancillas = layout.anc_qubits();
        let x_anc = layout.anc_by_type(StabType::XType);
        let z_anc = layout.anc_by_type(StabType::ZType);
        let (z_order, x_order) = check_order(layout.code());

        let mut layers = Vec::with_capacity(ROUND_LAYERS);
        layers.push(single(if anc_reset { "R" } else { "I" }, &ancillas, qubits));
        layers.push(single("H", &x_anc, qubits));
        for dir in z_order {
            let mut layer = Layer::new();
            layer.add("CX", check_pairs(layout, &z_anc, dir, false));
            layers.push(layer.idle_rest(qubits));
        }
        for dir in x_order {
            let mut layer = Layer::new();
            layer.add("CX", check_pairs(layout, &x_anc, dir, true));
            layers.push(layer.idle_rest(qubits));
        }
        layers.push(single("H", &x_anc, qubits));
        layers.push(single("M", &ancillas, qubits));
        layers
    }
}

impl Emitter for QecRound {
    fn name(&self) -> &str {
        "TICK"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::QecRound
    }

    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError> {
        expect_layouts(self, layouts, 1)?;
        Ok(render(model, Self::layers(layouts[0], anc_reset)))
    }
}

// Interaction order of the Z and X checks, one direction per layer.
fn check_order(code: CodeFamily) -> ([Option<Direction>; 4], [Option<Direction>; 4]) {
    use Direction::*;
    match code {
        CodeFamily::Repetition => ([Some(West), Some(East), None, None], [None; 4]),
        CodeFamily::RotatedSurface => (
            [
                Some(NorthEast),
                Some(NorthWest),
                Some(SouthEast),
                Some(SouthWest),
            ],
            [
                Some(NorthEast),
                Some(SouthEast),
                Some(NorthWest),
                Some(SouthWest),
            ],
        ),
    }
}

// CX targets between every ancilla and its neighbor in `dir`, flattened.
fn check_pairs(
    layout: &Layout,
    ancillas: &[String],
    dir: Option<Direction>,
    anc_controls: bool,
) -> Vec<String> {
    let Some(dir) = dir else {
        return vec![];
    };
    let mut pairs = vec![];
    for anc in ancillas {
        if let Some(data) = layout.neighbor(anc, dir) {
            if anc_controls {
                pairs.extend([anc.clone(), data.to_string()]);
            } else {
                pairs.extend([data.to_string(), anc.clone()]);
            }
        }
    }
    pairs
}

fn single(name: &'static str, targets: &[String], qubits: &[String]) -> Layer {
    let mut layer = Layer::new();
    layer.add(name, targets.to_vec());
    layer.idle_rest(qubits)
}

fn idle_layer(qubits: &[String]) -> Layer {
    Layer::new().idle_rest(qubits)
}

/// Explicit idling of a live block.
#[derive(Debug, Clone, Default)]
pub struct Idle;

impl Emitter for Idle {
    fn name(&self) -> &str {
        "I"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::SingleQubitUnitary
    }

    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        _anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError> {
        expect_layouts(self, layouts, 1)?;
        let qubits = layouts[0].qubits();
        Ok(render(model, vec![idle_layer(qubits), idle_layer(qubits)]))
    }
}

/// Transversal logical X or Z.
#[derive(Debug, Clone)]
pub struct LogicalPauli {
    pauli: Basis,
}

impl LogicalPauli {
    pub fn new(pauli: Basis) -> Self {
        Self { pauli }
    }

    fn gate(&self) -> &'static str {
        match self.pauli {
            Basis::X => "X",
            Basis::Z => "Z",
        }
    }
}

impl Emitter for LogicalPauli {
    fn name(&self) -> &str {
        self.gate()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::SingleQubitUnitary
    }

    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        _anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError> {
        expect_layouts(self, layouts, 1)?;
        let layout = layouts[0];
        let qubits = layout.qubits();
        let pauli = single(self.gate(), layout.logical(self.pauli), qubits);
        Ok(render(model, vec![pauli, idle_layer(qubits)]))
    }
}

/// Preparation of a logical basis state, `|1>` / `|->` when `flip` is set.
///
/// Checks of the prepared basis start out deterministic, the others are
/// gauge until they have been measured once.
#[derive(Debug, Clone)]
pub struct Init {
    basis: Basis,
    flip: bool,
}

impl Init {
    pub fn new(basis: Basis, flip: bool) -> Self {
        Self { basis, flip }
    }
}

impl Emitter for Init {
    fn name(&self) -> &str {
        match (self.basis, self.flip) {
            (Basis::Z, false) => "R",
            (Basis::Z, true) => "R1",
            (Basis::X, false) => "RX",
            (Basis::X, true) => "RX1",
        }
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Init
    }

    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        _anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError> {
        expect_layouts(self, layouts, 1)?;
        let layout = layouts[0];
        let qubits = layout.qubits();

        let mut reset = Layer::new();
        let data_reset = match self.basis {
            Basis::Z => "R",
            Basis::X => "RX",
        };
        reset.add(data_reset, layout.data_qubits());
        reset.add("R", layout.anc_qubits());

        let flip = if self.flip {
            match self.basis {
                Basis::Z => single("X", layout.logical(Basis::X), qubits),
                Basis::X => single("Z", layout.logical(Basis::Z), qubits),
            }
        } else {
            idle_layer(qubits)
        };
        Ok(render(model, vec![reset.idle_rest(qubits), flip]))
    }

    fn frame_effect(&self, layouts: &[&Layout]) -> Result<FrameEffect, CompileError> {
        expect_layouts(self, layouts, 1)?;
        let layout = layouts[0];
        let gauge = match self.basis.stab_type() {
            StabType::XType => StabType::ZType,
            StabType::ZType => StabType::XType,
        };
        Ok(FrameEffect::Activate {
            ancillas: layout.anc_qubits(),
            gauge: layout.anc_by_type(gauge),
        })
    }
}

/// Destructive measurement of every data qubit in one basis.
#[derive(Debug, Clone)]
pub struct Measure {
    basis: Basis,
}

impl Measure {
    pub fn new(basis: Basis) -> Self {
        Self { basis }
    }
}

impl Emitter for Measure {
    fn name(&self) -> &str {
        match self.basis {
            Basis::Z => "M",
            Basis::X => "MX",
        }
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Measurement
    }

    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        _anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError> {
        expect_layouts(self, layouts, 1)?;
        let layout = layouts[0];
        let qubits = layout.qubits();
        let gate = match self.basis {
            Basis::Z => "M",
            Basis::X => "MX",
        };
        let measure = single(gate, &layout.data_qubits(), qubits);
        Ok(render(model, vec![idle_layer(qubits), measure]))
    }

    fn frame_effect(&self, layouts: &[&Layout]) -> Result<FrameEffect, CompileError> {
        expect_layouts(self, layouts, 1)?;
        let layout = layouts[0];
        Ok(FrameEffect::Measure {
            ancillas: layout.anc_qubits(),
            reconstructable: layout.anc_by_type(self.basis.stab_type()),
            observable: layout.logical(self.basis).to_vec(),
        })
    }
}

/// Transversal CNOT between two blocks of the same code, the first layout
/// being the control.
#[derive(Debug, Clone, Default)]
pub struct TransversalCnot;

impl TransversalCnot {
    fn check<'l>(&self, layouts: &[&'l Layout]) -> Result<(&'l Layout, &'l Layout), CompileError> {
        expect_layouts(self, layouts, 2)?;
        let (control, target) = (layouts[0], layouts[1]);
        if control.code() != target.code() || control.distance() != target.distance() {
            return Err(CompileError::CodeMismatch {
                name: self.name().to_string(),
                first: describe(control),
                second: describe(target),
            });
        }
        Ok((control, target))
    }
}

fn describe(layout: &Layout) -> String {
    format!(
        "{} (distance {} {})",
        layout.name(),
        layout.distance(),
        layout.code()
    )
}

impl Emitter for TransversalCnot {
    fn name(&self) -> &str {
        "CX"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::TwoQubitUnitary
    }

    fn emit<'a>(
        &self,
        model: &'a dyn NoiseModel,
        layouts: &[&Layout],
        _anc_reset: bool,
    ) -> Result<Fragments<'a>, CompileError> {
        let (control, target) = self.check(layouts)?;
        let qubits: Vec<String> = control
            .qubits()
            .iter()
            .chain(target.qubits())
            .cloned()
            .collect();
        let pairs: Vec<String> = control
            .data_qubits()
            .into_iter()
            .zip(target.data_qubits())
            .flat_map(|(c, t)| [c, t])
            .collect();
        let mut cnot = Layer::new();
        cnot.add("CX", pairs);
        Ok(render(
            model,
            vec![cnot.idle_rest(&qubits), idle_layer(&qubits)],
        ))
    }

    /// X checks of the control spread onto the target, Z checks of the
    /// target onto the control.
    fn frame_effect(&self, layouts: &[&Layout]) -> Result<FrameEffect, CompileError> {
        let (control, target) = self.check(layouts)?;
        let mut images = vec![];
        for (c, t) in control
            .anc_by_type(StabType::XType)
            .into_iter()
            .zip(target.anc_by_type(StabType::XType))
        {
            images.push((c.clone(), vec![c, t.clone()]));
            images.push((t.clone(), vec![t]));
        }
        for (c, t) in control
            .anc_by_type(StabType::ZType)
            .into_iter()
            .zip(target.anc_by_type(StabType::ZType))
        {
            images.push((t.clone(), vec![t, c.clone()]));
            images.push((c.clone(), vec![c]));
        }
        let update = StabilizerUpdate::from_forward(StabilizerMap::from_images(images))?;
        Ok(FrameEffect::Update(update))
    }
}

/// The emitters behind the instruction names of logical circuits.
pub fn gate_to_emitter() -> GateSet {
    let mut gates = GateSet::new();
    gates.insert("TICK", Arc::new(QecRound));
    gates.insert("I", Arc::new(Idle));
    gates.insert("X", Arc::new(LogicalPauli::new(Basis::X)));
    gates.insert("Z", Arc::new(LogicalPauli::new(Basis::Z)));
    for name in ["R", "RZ"] {
        gates.insert(name, Arc::new(Init::new(Basis::Z, false)));
    }
    gates.insert("RX", Arc::new(Init::new(Basis::X, false)));
    for name in ["M", "MZ"] {
        gates.insert(name, Arc::new(Measure::new(Basis::Z)));
    }
    gates.insert("MX", Arc::new(Measure::new(Basis::X)));
    for name in ["CX", "CNOT"] {
        gates.insert(name, Arc::new(TransversalCnot));
    }
    gates
}

#[cfg(test)]
mod tests {
    use qec_common::Circuit;

    use super::*;
    use crate::{
        layout::{repetition_code, rotated_surface_code},
        model::NoiselessModel,
    };

    fn collect(fragments: Fragments<'_>) -> Vec<Circuit> {
        fragments.collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn rounds_have_the_same_length_for_every_code() {
        let layouts = [repetition_code(3, "A"), rotated_surface_code(3, "B")];
        let model = NoiselessModel::new(&layouts).unwrap();
        for layout in &layouts {
            for anc_reset in [true, false] {
                let fragments = collect(QecRound.emit(&model, &[layout], anc_reset).unwrap());
                assert_eq!(fragments.len(), ROUND_LAYERS);
                assert!(fragments.iter().all(|f| f.num_ticks() == 1));
                let measured: usize = fragments.iter().map(Circuit::num_measurements).sum();
                assert_eq!(measured, layout.anc_qubits().len());
            }
        }
    }

    #[test]
    fn round_touches_every_qubit_in_every_layer() {
        let layouts = [rotated_surface_code(3, "A")];
        let model = NoiselessModel::new(&layouts).unwrap();
        for fragment in collect(QecRound.emit(&model, &[&layouts[0]], true).unwrap()) {
            let mut touched: Vec<usize> = fragment
                .iter()
                .filter_map(|instr| match instr {
                    qec_common::Instruction::Gate { targets, .. } => Some(targets.clone()),
                    _ => None,
                })
                .flatten()
                .collect();
            touched.sort();
            assert_eq!(touched, (0..layouts[0].qubits().len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn surface_round_cx_count() {
        let layouts = [rotated_surface_code(3, "A")];
        let model = NoiselessModel::new(&layouts).unwrap();
        let round: Circuit = collect(QecRound.emit(&model, &[&layouts[0]], true).unwrap())
            .into_iter()
            .flatten()
            .collect();
        let cx_targets: usize = round
            .iter()
            .filter(|instr| instr.name() == "CX")
            .map(|instr| match instr {
                qec_common::Instruction::Gate { targets, .. } => targets.len() / 2,
                _ => 0,
            })
            .sum();
        // 4 weight-four and 4 weight-two checks
        assert_eq!(cx_targets, 4 * 4 + 4 * 2);
    }

    #[test]
    fn logical_operations_are_two_layers() {
        let layouts = [rotated_surface_code(3, "A"), rotated_surface_code(3, "B")];
        let model = NoiselessModel::new(&layouts).unwrap();
        let gates = gate_to_emitter();
        for name in ["I", "X", "Z", "R", "RX", "M", "MX"] {
            let emitter = gates.get(name).unwrap();
            let fragments = collect(emitter.emit(&model, &[&layouts[0]], true).unwrap());
            assert_eq!(fragments.len(), 2, "{name}");
        }
        let cnot = gates.get("CNOT").unwrap();
        let fragments = collect(cnot.emit(&model, &[&layouts[0], &layouts[1]], true).unwrap());
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].instructions()[0].to_string().split(' ').count(), 1 + 18);
    }

    #[test]
    fn init_gauges_the_other_basis() {
        let layout = rotated_surface_code(3, "A");
        let effect = Init::new(Basis::Z, false).frame_effect(&[&layout]).unwrap();
        assert_eq!(
            effect,
            FrameEffect::Activate {
                ancillas: layout.anc_qubits(),
                gauge: layout.anc_by_type(StabType::XType),
            }
        );
    }

    #[test]
    fn cnot_requires_matching_codes() {
        let a = rotated_surface_code(3, "A");
        let b = rotated_surface_code(5, "B");
        let c = repetition_code(3, "C");
        for other in [&b, &c] {
            assert!(matches!(
                TransversalCnot.frame_effect(&[&a, other]),
                Err(CompileError::CodeMismatch { .. })
            ));
        }
        assert!(matches!(
            TransversalCnot.frame_effect(&[&a]),
            Err(CompileError::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn cnot_update_spreads_checks() {
        let a = repetition_code(3, "A");
        let b = repetition_code(3, "B");
        let FrameEffect::Update(update) = TransversalCnot.frame_effect(&[&a, &b]).unwrap() else {
            panic!("expected a stabilizer update");
        };
        assert_eq!(
            update.forward().image("B_Z1").into_iter().collect::<Vec<_>>(),
            ["A_Z1", "B_Z1"]
        );
        assert!(update.forward().then(update.inverse()).is_identity());
    }
}
