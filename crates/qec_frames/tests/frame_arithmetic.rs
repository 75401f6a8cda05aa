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

//! Worked examples of detectors spanning a transversal CNOT between two
//! single-check blocks, plus randomized invertibility checks.

use std::sync::LazyLock;

use itertools::Itertools;
use qec_common::{Circuit, Instruction, MeasTarget, RecordError};
use qec_frames::{
    Detectors, FrameConvention, FrameError, StabilizerMap, StabilizerUpdate, SupportMap,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const QUBITS: [&str; 6] = ["X1", "Z1", "X2", "Z2", "D1", "D2"];

static ANCILLAS: LazyLock<Vec<String>> =
    LazyLock::new(|| QUBITS[..4].iter().map(|q| q.to_string()).collect());

/// Encodes `(qubit, rel)` as `rec[-(100 * (position + 1) + |rel|)]`.
fn lookup(qubit: &str, rel: i32) -> Result<MeasTarget, RecordError> {
    let position = QUBITS
        .iter()
        .position(|q| *q == qubit)
        .ok_or_else(|| RecordError::UnknownQubit {
            qubit: qubit.to_string(),
        })?;
    Ok(MeasTarget(-(100 * (position as i64 + 1) + rel.abs() as i64)))
}

/// Control block 1, target block 2.
fn cnot() -> StabilizerUpdate {
    StabilizerUpdate::from_forward(StabilizerMap::from_images([
        ("X1", vec!["X1", "X2"]),
        ("Z1", vec!["Z1"]),
        ("X2", vec!["X2"]),
        ("Z2", vec!["Z2", "Z1"]),
    ]))
    .expect("CNOT is invertible")
}

fn block(k: usize) -> Vec<String> {
    vec![format!("X{k}"), format!("Z{k}")]
}

fn tracker(frame: FrameConvention) -> Detectors {
    let mut dets = Detectors::new(ANCILLAS.iter().cloned(), frame, None, false).unwrap();
    dets.activate_detectors(&ANCILLAS, &[]).unwrap();
    dets
}

fn detector_targets(circuit: &Circuit) -> Vec<Vec<i64>> {
    circuit
        .iter()
        .map(|instr| match instr {
            Instruction::Detector { targets, .. } => targets.iter().map(|t| t.0).collect(),
            other => panic!("expected only detectors, got {other}"),
        })
        .collect()
}

#[test]
fn post_gate_round_after_cnot() {
    let mut dets = tracker(FrameConvention::PostGate);
    dets.build_from_anc(&lookup, true, None).unwrap();
    dets.update(cnot()).unwrap();
    let round = dets.build_from_anc(&lookup, true, None).unwrap();
    assert_eq!(
        detector_targets(&round),
        vec![
            vec![-101, -102, -302],
            vec![-201, -202],
            vec![-301, -302],
            vec![-202, -401, -402],
        ]
    );
    assert!(dets.pending_updates().is_empty());
}

#[test]
fn pre_gate_round_after_cnot() {
    let mut dets = tracker(FrameConvention::PreGate);
    dets.build_from_anc(&lookup, true, None).unwrap();
    dets.update(cnot()).unwrap();
    let round = dets.build_from_anc(&lookup, true, None).unwrap();
    assert_eq!(
        detector_targets(&round),
        vec![
            vec![-101, -102, -301],
            vec![-201, -202],
            vec![-301, -302],
            vec![-201, -401, -402],
        ]
    );
}

#[test]
fn gate_independent_ignores_updates() {
    let mut dets = tracker(FrameConvention::GateIndependent);
    dets.build_from_anc(&lookup, true, None).unwrap();
    dets.update(cnot()).unwrap();
    let round = dets.build_from_anc(&lookup, true, None).unwrap();
    assert_eq!(
        detector_targets(&round),
        vec![
            vec![-101, -102],
            vec![-201, -202],
            vec![-301, -302],
            vec![-401, -402],
        ]
    );
    assert!(dets.pending_updates().is_empty());
}

#[test]
fn target_prepared_again_after_cnot() {
    for frame in [FrameConvention::PostGate, FrameConvention::PreGate] {
        let mut dets = tracker(frame);
        dets.build_from_anc(&lookup, true, None).unwrap();
        dets.update(cnot()).unwrap();
        dets.deactivate_detectors(&block(2)).unwrap();
        dets.activate_detectors(&block(2), &["X2".to_string()])
            .unwrap();

        let round = dets.build_from_anc(&lookup, true, None).unwrap();
        // X1 still refers to X2 before it was prepared again
        assert_eq!(
            detector_targets(&round),
            vec![
                vec![-101, -102, -302],
                vec![-201, -202],
                vec![],
                vec![-401],
            ],
            "{frame}"
        );
    }
}

#[test]
fn target_prepared_again_before_cnot() {
    let prepared = |frame| {
        let mut dets = tracker(frame);
        dets.build_from_anc(&lookup, true, None).unwrap();
        dets.deactivate_detectors(&block(2)).unwrap();
        dets.activate_detectors(&block(2), &[]).unwrap();
        dets.update(cnot()).unwrap();
        detector_targets(&dets.build_from_anc(&lookup, true, None).unwrap())
    };
    // the fresh X2 and Z2 carry no earlier syndrome
    assert_eq!(
        prepared(FrameConvention::PostGate),
        vec![
            vec![-101, -102],
            vec![-201, -202],
            vec![-301],
            vec![-202, -401],
        ]
    );
    assert_eq!(
        prepared(FrameConvention::PreGate),
        vec![
            vec![-101, -102, -301],
            vec![-201, -202],
            vec![-301],
            vec![-201, -401],
        ]
    );
}

#[test]
fn single_block_measurement_after_cnot() {
    let support = SupportMap::from_supports([("Z1", vec!["D1", "D2"])]).unwrap();
    let mut dets = tracker(FrameConvention::PostGate);
    dets.build_from_anc(&lookup, true, None).unwrap();
    dets.update(cnot()).unwrap();

    let measured = dets
        .build_from_data(&lookup, &support, true, Some(&["Z1".to_string()]))
        .unwrap();
    assert_eq!(detector_targets(&measured), vec![vec![-201, -501, -601]]);
    dets.deactivate_detectors(&block(1)).unwrap();

    // block 2 still owes the CNOT to its next round
    assert_eq!(dets.pending_for("Z2").unwrap().len(), 1);
    let round = dets
        .build_from_anc(&lookup, true, Some(&block(2)))
        .unwrap();
    assert_eq!(
        detector_targets(&round),
        vec![vec![-301, -302], vec![-201, -401, -402]]
    );
    assert!(dets.pending_updates().is_empty());
}

#[test]
fn pre_gate_falls_back_when_partner_is_not_measured() {
    let support = SupportMap::from_supports([("X1", vec!["D1", "D2"])]).unwrap();
    let mut dets = tracker(FrameConvention::PreGate);
    dets.build_from_anc(&lookup, true, None).unwrap();
    dets.update(cnot()).unwrap();

    let measured = dets
        .build_from_data(&lookup, &support, true, Some(&["X1".to_string()]))
        .unwrap();
    // X1 spreads onto X2, which is not measured: post-gate expression instead
    assert_eq!(detector_targets(&measured), vec![vec![-101, -301, -501, -601]]);
}

#[test]
fn data_measurement_without_reset() {
    let support = SupportMap::from_supports([("Z1", vec!["D1", "D2"])]).unwrap();
    let mut dets = tracker(FrameConvention::PostGate);
    for _ in 0..3 {
        dets.build_from_anc(&lookup, false, Some(&block(1))).unwrap();
    }
    let measured = dets
        .build_from_data(&lookup, &support, false, Some(&["Z1".to_string()]))
        .unwrap();
    assert_eq!(detector_targets(&measured), vec![vec![-201, -202, -501, -601]]);
}

#[test]
fn data_measurement_needs_support() {
    let support = SupportMap::from_supports([("Z1", vec!["D1"])]).unwrap();
    let mut dets = tracker(FrameConvention::PostGate);
    assert_eq!(
        dets.build_from_data(&lookup, &support, true, Some(&block(1))),
        Err(FrameError::UnknownAncilla {
            ancilla: "X1".to_string()
        })
    );
}

#[test]
fn random_updates_are_invertible() {
    let mut rng = StdRng::seed_from_u64(2024);
    let labels: Vec<String> = (0..6).map(|i| format!("A{i}")).collect();
    for _ in 0..50 {
        // products of row additions are invertible
        let mut rows: Vec<Vec<bool>> = (0..labels.len())
            .map(|i| (0..labels.len()).map(|j| i == j).collect())
            .collect();
        for _ in 0..10 {
            let src = rng.random_range(0..labels.len());
            let dst = rng.random_range(0..labels.len());
            if src != dst {
                let added = rows[src].clone();
                rows[dst]
                    .iter_mut()
                    .zip(added)
                    .for_each(|(d, s)| *d ^= s);
            }
        }
        let forward = StabilizerMap::from_images(labels.iter().zip(&rows).map(|(l, row)| {
            let image = labels
                .iter()
                .zip(row)
                .filter(|(_, set)| **set)
                .map(|(l, _)| l.clone())
                .collect_vec();
            (l.clone(), image)
        }));
        let update = StabilizerUpdate::from_forward(forward).unwrap();
        assert!(update.forward().then(update.inverse()).is_identity());
        assert!(update.inverse().then(update.forward()).is_identity());

        let mut dets = Detectors::new(labels.iter().cloned(), FrameConvention::PostGate, None, false)
            .unwrap();
        assert_eq!(dets.update(update.clone()), Ok(()));
        let checked = StabilizerUpdate::new(update.forward().clone(), update.inverse().clone());
        assert_eq!(checked, Ok(update));
    }
}

#[test]
fn detectors_follow_universe_order() {
    let mut dets = tracker(FrameConvention::PostGate);
    let requested = vec!["Z2".to_string(), "X1".to_string()];
    let built = dets.build_from_anc(&lookup, true, Some(&requested)).unwrap();
    let coords: Vec<f64> = built
        .iter()
        .filter_map(|instr| match instr {
            Instruction::Detector { coords, .. } => coords.last().copied(),
            _ => None,
        })
        .collect();
    assert_eq!(coords, vec![0.0, 0.0]);
    assert_eq!(detector_targets(&built), vec![vec![-101], vec![-401]]);
    let rounds = ANCILLAS
        .iter()
        .map(|a| dets.num_rounds(a).unwrap())
        .sorted()
        .collect_vec();
    assert_eq!(rounds, vec![0, 0, 1, 1]);
}
