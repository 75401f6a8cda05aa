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

//! End-to-end synthesis of small logical circuits: detector and observable
//! counts, frame tracking across transversal gates and schedule validation.

use std::sync::LazyLock;

use qec_common::{Circuit, Instruction, observables::move_observables_to_end};
use qec_compiler::{
    CircuitNoiseModel, CodeFamily, CompileError, ExperimentConfig, Layout, NoiselessModel,
    detectors_for, experiment_from_circuit, experiment_from_schedule, gate_to_emitter,
    layout::StabType, parse_circuit, repetition_code, rotated_surface_code, schedule_from_circuit,
};
use qec_frames::FrameConvention;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

// ---------------------------------------------------------------------------
// Shared fixtures
// ---------------------------------------------------------------------------

static SURFACES: LazyLock<Vec<Layout>> =
    LazyLock::new(|| CodeFamily::RotatedSurface.blocks(3, 2));

static REPETITION: LazyLock<Vec<Layout>> = LazyLock::new(|| vec![repetition_code(3, "L0")]);

fn compile_with(
    text: &str,
    layouts: &[Layout],
    frame: FrameConvention,
    include_gauge_dets: bool,
    config: &ExperimentConfig,
) -> Result<Circuit, CompileError> {
    let model = NoiselessModel::new(layouts).unwrap();
    let mut detectors = detectors_for(layouts, frame, include_gauge_dets).unwrap();
    let instructions = parse_circuit(text).unwrap();
    experiment_from_circuit(
        &instructions,
        layouts,
        &model,
        &mut detectors,
        &gate_to_emitter(),
        config,
    )
}

fn compile(text: &str, layouts: &[Layout]) -> Result<Circuit, CompileError> {
    compile_with(
        text,
        layouts,
        FrameConvention::PostGate,
        false,
        &ExperimentConfig::default(),
    )
}

fn detector_targets(circuit: &Circuit) -> Vec<Vec<i64>> {
    circuit
        .iter()
        .filter_map(|instr| match instr {
            Instruction::Detector { targets, .. } => Some(targets.iter().map(|t| t.0).collect()),
            _ => None,
        })
        .collect()
}

fn sorted_sizes(targets: &[Vec<i64>]) -> Vec<usize> {
    let mut sizes: Vec<usize> = targets.iter().map(Vec::len).collect();
    sizes.sort();
    sizes
}

fn observables(circuit: &Circuit) -> Vec<(usize, usize)> {
    circuit
        .iter()
        .filter_map(|instr| match instr {
            Instruction::Observable { index, targets } => Some((*index, targets.len())),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Detector and observable structure
// ---------------------------------------------------------------------------

#[test]
fn memory_experiment_counts() {
    let circuit = compile("R 0\nTICK\nX 0\nTICK\nM 0", &SURFACES[..1]).unwrap();
    let qubit_coords = circuit
        .iter()
        .filter(|i| matches!(i, Instruction::QubitCoords { .. }))
        .count();
    assert_eq!(qubit_coords, 17);
    assert_eq!(circuit.num_ticks(), 2 + 12 + 2 + 12 + 2);
    assert_eq!(circuit.num_measurements(), 8 + 8 + 9);

    let targets = detector_targets(&circuit);
    // one detector per ancilla per round, plus one per Z check at the end
    assert_eq!(targets.len(), 8 + 8 + 4);

    // Z checks start deterministic, X checks are gauge in the first round
    assert_eq!(sorted_sizes(&targets[..8]), [0, 0, 0, 0, 1, 1, 1, 1]);
    for round in &targets[8..16] {
        assert_eq!(round.len(), 2);
        assert_eq!((round[0] - round[1]).abs(), 8);
    }
    assert_eq!(sorted_sizes(&targets[16..]), [3, 3, 5, 5]);

    assert_eq!(observables(&circuit), [(0, 3)]);
    assert_eq!(circuit.num_observables(), 1);
}

#[test]
fn x_basis_memory() {
    let circuit = compile("RX 0\nTICK\nMX 0", &SURFACES[..1]).unwrap();
    let targets = detector_targets(&circuit);
    assert_eq!(targets.len(), 8 + 4);
    assert_eq!(sorted_sizes(&targets[..8]), [0, 0, 0, 0, 1, 1, 1, 1]);
    assert_eq!(sorted_sizes(&targets[8..]), [3, 3, 5, 5]);
    assert_eq!(observables(&circuit), [(0, 3)]);
    assert!(circuit.iter().any(|i| i.name() == "MX"));
}

#[test]
fn included_gauge_detectors_have_targets() {
    let circuit = compile_with(
        "R 0\nTICK\nM 0",
        &SURFACES[..1],
        FrameConvention::PostGate,
        true,
        &ExperimentConfig::default(),
    )
    .unwrap();
    let targets = detector_targets(&circuit);
    assert!(targets[..8].iter().all(|t| t.len() == 1));
}

#[test]
fn cnot_spreads_detectors_across_blocks() {
    let circuit = compile("R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1", &SURFACES).unwrap();
    let targets = detector_targets(&circuit);
    assert_eq!(targets.len(), 16 + 16 + 8);
    // X checks of the control and Z checks of the target pick up the
    // previous outcome of their partner
    let mut expected = vec![2; 8];
    expected.extend([3; 8]);
    assert_eq!(sorted_sizes(&targets[16..32]), expected);
    assert_eq!(observables(&circuit), [(0, 3), (1, 3)]);

    let gate_independent = compile_with(
        "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1",
        &SURFACES,
        FrameConvention::GateIndependent,
        false,
        &ExperimentConfig::default(),
    )
    .unwrap();
    assert_eq!(
        sorted_sizes(&detector_targets(&gate_independent)[16..32]),
        vec![2; 16]
    );
}

#[test]
fn reinitialized_partner_keeps_its_earlier_outcome() {
    let text = "R 0 1\nTICK\nCX 0 1\nM 1\nI 0\nR 1\nI 0\nTICK\nM 0\nI 1";
    let control = &SURFACES[0];
    let x_checks = control.anc_by_type(StabType::XType);
    for frame in [FrameConvention::PostGate, FrameConvention::PreGate] {
        let circuit =
            compile_with(text, &SURFACES, frame, false, &ExperimentConfig::default()).unwrap();
        let targets = detector_targets(&circuit);
        // round 1, Z checks of block 1, round 2, Z checks of block 0
        assert_eq!(targets.len(), 16 + 4 + 16 + 4);
        assert_eq!(circuit.num_measurements(), 16 + 9 + 16 + 9);

        // at round 2 the record ends with: round 2 of block 1 (8), round 2 of
        // block 0 (8), data of block 1 (9), round 1 of block 1 (8), round 1
        // of block 0 (8)
        for (k, anc) in control.anc_qubits().iter().enumerate() {
            let i = k as i64;
            let mut expected = vec![-(16 - i), -(41 - i)];
            if x_checks.contains(anc) {
                // X checks of the control still owe the target's round 1
                expected.push(-(33 - i));
            }
            expected.sort();
            let mut found = targets[20 + k].clone();
            found.sort();
            assert_eq!(found, expected, "{anc} in the {frame} frame");
        }
        // the prepared block starts over: gauge X checks, fresh Z checks
        assert_eq!(sorted_sizes(&targets[28..36]), [0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(observables(&circuit), [(0, 3), (1, 3)]);
    }
}

#[test]
fn partner_prepared_before_cnot_brings_no_history() {
    let circuit = compile(
        "R 0 1\nTICK\nM 1\nI 0\nR 1\nI 0\nCX 0 1\nTICK\nM 0 1",
        &SURFACES,
    )
    .unwrap();
    let targets = detector_targets(&circuit);
    assert_eq!(targets.len(), 16 + 4 + 16 + 8);
    // X checks of block 0 spread onto freshly prepared X checks
    assert_eq!(sorted_sizes(&targets[20..28]), vec![2; 8]);
    // Z checks of block 1 pick up block 0's round 1, X checks are gauge
    assert_eq!(sorted_sizes(&targets[28..36]), [0, 0, 0, 0, 2, 2, 2, 2]);
    let z_checks = SURFACES[1].anc_by_type(StabType::ZType);
    for (k, anc) in SURFACES[1].anc_qubits().iter().enumerate() {
        if z_checks.contains(anc) {
            let i = k as i64;
            let mut found = targets[28 + k].clone();
            found.sort();
            // own round 2 and the partner's round 1
            assert_eq!(found, vec![-(41 - i), -(8 - i)], "{anc}");
        }
    }
}

#[test]
fn rounds_without_reset_look_two_back() {
    let config = ExperimentConfig {
        anc_reset: false,
        ..ExperimentConfig::default()
    };
    let circuit = compile_with(
        "R 0\nTICK\nTICK\nTICK\nM 0",
        &REPETITION,
        FrameConvention::PostGate,
        false,
        &config,
    )
    .unwrap();
    // only the preparation resets
    assert_eq!(circuit.iter().filter(|i| i.name() == "R").count(), 2);
    let targets = detector_targets(&circuit);
    assert_eq!(targets.len(), 2 + 2 + 2 + 2);
    assert!(targets[..4].iter().all(|t| t.len() == 1));
    for round in &targets[4..6] {
        assert_eq!(round.len(), 2);
        assert_eq!((round[0] - round[1]).abs(), 4);
    }
    assert!(targets[6..].iter().all(|t| t.len() == 4));
}

#[test]
fn observed_subset_of_ancillas() {
    let config = ExperimentConfig {
        anc_detectors: Some(vec!["L0_Z1".to_string()]),
        ..ExperimentConfig::default()
    };
    let circuit = compile_with(
        "R 0\nTICK\nTICK\nM 0",
        &REPETITION,
        FrameConvention::PostGate,
        false,
        &config,
    )
    .unwrap();
    let targets = detector_targets(&circuit);
    assert_eq!(targets.len(), 6);
    assert_eq!(sorted_sizes(&targets), [0, 0, 0, 1, 2, 3]);
}

#[test]
fn observables_can_be_moved_to_the_end() {
    let circuit = compile("R 0 1\nTICK\nM 0 1", &SURFACES).unwrap();
    let moved = move_observables_to_end(&circuit);
    assert_eq!(observables(&moved), [(0, 3), (1, 3)]);
    assert!(matches!(
        moved.instructions().last(),
        Some(Instruction::Observable { index: 1, .. })
    ));
}

// ---------------------------------------------------------------------------
// Blocks and idling
// ---------------------------------------------------------------------------

#[test]
fn idling_is_enforced() {
    let text = "R 0 1\nTICK\nX 0\nTICK\nM 0 1";
    match compile(text, &SURFACES) {
        Err(CompileError::IdlingViolation { active, counts }) => {
            assert_eq!(active, ["L0", "L1"]);
            assert_eq!(counts.into_iter().collect::<Vec<_>>(), [("L0".to_string(), 1)]);
        }
        other => panic!("expected an idling violation, got {other:?}"),
    }

    let relaxed = ExperimentConfig {
        ensure_idling: false,
        ..ExperimentConfig::default()
    };
    assert!(compile_with(text, &SURFACES, FrameConvention::PostGate, false, &relaxed).is_ok());
    assert!(compile("R 0 1\nTICK\nX 0\nI 1\nTICK\nM 0 1", &SURFACES).is_ok());
}

#[test]
fn second_operation_on_a_layout_starts_a_new_block() {
    let circuit = compile("R 0\nTICK\nX 0\nZ 0\nTICK\nM 0", &SURFACES[..1]).unwrap();
    assert_eq!(circuit.num_ticks(), 2 + 12 + 2 + 2 + 12 + 2);
    // the other block idles through the second of the two blocks
    assert!(matches!(
        compile("R 0 1\nTICK\nX 0\nI 1\nZ 0\nTICK\nM 0 1", &SURFACES),
        Err(CompileError::IdlingViolation { .. })
    ));
}

#[test]
fn operations_need_live_layouts() {
    assert_eq!(
        compile("R 0\nR 0", &SURFACES[..1]),
        Err(CompileError::AlreadyActive {
            name: "R".to_string(),
            layout: "L0".to_string()
        })
    );
    assert_eq!(
        compile("X 0", &SURFACES[..1]),
        Err(CompileError::InactiveLayout {
            name: "X".to_string(),
            layout: "L0".to_string()
        })
    );
    // measured layouts can be prepared again
    assert!(compile("R 0\nTICK\nM 0\nR 0\nTICK\nM 0", &SURFACES[..1]).is_ok());
}

#[test]
fn round_without_active_layouts_is_skipped() {
    let circuit = compile("TICK", &SURFACES).unwrap();
    assert_eq!(circuit.num_ticks(), 0);
    assert_eq!(circuit.num_detectors(), 0);
    assert_eq!(circuit.len(), 34);
}

#[test]
fn cnot_needs_matching_codes() {
    let mixed = vec![repetition_code(3, "A"), rotated_surface_code(3, "B")];
    assert!(matches!(
        compile("R 0 1\nTICK\nCX 0 1", &mixed),
        Err(CompileError::CodeMismatch { .. })
    ));
}

#[test]
fn schedule_errors_abort_before_synthesis() {
    assert_eq!(
        compile("R 0\nH 0", &SURFACES[..1]),
        Err(CompileError::UnknownInstruction {
            name: "H".to_string()
        })
    );
    assert!(matches!(
        compile("R 0 1 2", &SURFACES),
        Err(CompileError::TargetOutOfRange { target: 2, .. })
    ));
}

// ---------------------------------------------------------------------------
// Reuse and noise
// ---------------------------------------------------------------------------

#[test]
fn tracker_and_model_are_reusable() {
    let layouts = &SURFACES[..];
    let model = CircuitNoiseModel::new(layouts, 0.001).unwrap();
    let mut detectors = detectors_for(layouts, FrameConvention::PreGate, false).unwrap();
    let instructions = parse_circuit("R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1").unwrap();
    let schedule = schedule_from_circuit(&instructions, layouts.len(), &gate_to_emitter()).unwrap();
    let config = ExperimentConfig::default();

    let first =
        experiment_from_schedule(&schedule, layouts, &model, &mut detectors, &config).unwrap();
    let second =
        experiment_from_schedule(&schedule, layouts, &model, &mut detectors, &config).unwrap();
    assert_eq!(first, second);
    assert!(detectors.pending_updates().is_empty());
    assert!(first.iter().any(|i| i.name() == "DEPOLARIZE2"));

    let noiseless = compile_with(
        "R 0 1\nTICK\nCX 0 1\nTICK\nM 0 1",
        layouts,
        FrameConvention::PreGate,
        false,
        &config,
    )
    .unwrap();
    assert_eq!(detector_targets(&first), detector_targets(&noiseless));
}

#[test]
fn random_repetition_circuits_keep_their_detectors() {
    let layouts = CodeFamily::Repetition.blocks(3, 3);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5 {
        let layers = rng.random_range(1..5);
        let mut text = String::from("R 0 1 2\nTICK\n");
        for _ in 0..layers {
            let mut targets: Vec<usize> = (0..3).collect();
            targets.shuffle(&mut rng);
            if rng.random_bool(0.5) {
                text.push_str(&format!("CX {} {}\n", targets[0], targets[1]));
                text.push_str(&format!("X {}\n", targets[2]));
            } else {
                for t in targets {
                    let gate = ["I", "X", "Z"][rng.random_range(0..3)];
                    text.push_str(&format!("{gate} {t}\n"));
                }
            }
            text.push_str("TICK\n");
        }
        text.push_str("M 0 1 2");

        for frame in [
            FrameConvention::PostGate,
            FrameConvention::PreGate,
            FrameConvention::GateIndependent,
        ] {
            let circuit =
                compile_with(&text, &layouts, frame, false, &ExperimentConfig::default()).unwrap();
            let rounds = layers + 1;
            assert_eq!(circuit.num_ticks(), 2 + 12 * rounds + 2 * layers + 2);
            // two Z checks per block each round, reconstructed once more at the end
            let targets = detector_targets(&circuit);
            assert_eq!(targets.len(), 6 * rounds + 6);
            assert!(targets.iter().all(|t| !t.is_empty()));
            assert_eq!(observables(&circuit), [(0, 1), (1, 1), (2, 1)]);
        }
    }
}
