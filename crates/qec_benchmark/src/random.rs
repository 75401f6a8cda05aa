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

use qec_compiler::{Basis, LogicalInstruction};

use rand::{Rng, seq::SliceRandom};

/// Probability that two neighbors in a shuffled layer are entangled.
const CNOT_PROBABILITY: f64 = 0.5;

/// Generate a random memory-style circuit: preparation of every block in one
/// basis, `layers` layers of logical operations each followed by a QEC
/// round, and measurement in the preparation basis.
///
/// Every block takes part in exactly one operation per layer, so the result
/// passes the idling check.
pub fn random_circuit<R: Rng + ?Sized>(
    qubits: usize,
    layers: usize,
    rng: &mut R,
) -> Vec<LogicalInstruction> {
    let basis = if rng.random_bool(0.5) {
        Basis::Z
    } else {
        Basis::X
    };
    let all: Vec<usize> = (0..qubits).collect();
    let (prepare, measure) = match basis {
        Basis::Z => ("R", "M"),
        Basis::X => ("RX", "MX"),
    };

    let mut circuit = vec![
        LogicalInstruction::new(prepare, all.clone()),
        LogicalInstruction::new("TICK", vec![]),
    ];
    for _ in 0..layers {
        circuit.extend(random_layer(qubits, rng));
        circuit.push(LogicalInstruction::new("TICK", vec![]));
    }
    circuit.push(LogicalInstruction::new(measure, all));
    circuit
}

/// One layer of operations touching every block once: CNOTs between random
/// pairs and a random Pauli or idle on the rest.
pub fn random_layer<R: Rng + ?Sized>(qubits: usize, rng: &mut R) -> Vec<LogicalInstruction> {
    let mut order: Vec<usize> = (0..qubits).collect();
    order.shuffle(rng);

    let mut cnots = vec![];
    let mut singles: [Vec<usize>; 3] = Default::default();
    let mut rest = order.as_slice();
    while let [a, b, tail @ ..] = rest {
        if rng.random_bool(CNOT_PROBABILITY) {
            cnots.extend([*a, *b]);
            rest = tail;
        } else {
            singles[rng.random_range(0..3)].push(*a);
            rest = &rest[1..];
        }
    }
    for &q in rest {
        singles[rng.random_range(0..3)].push(q);
    }

    let mut layer = vec![];
    if !cnots.is_empty() {
        layer.push(LogicalInstruction::new("CX", cnots));
    }
    for (name, targets) in ["I", "X", "Z"].into_iter().zip(singles) {
        if !targets.is_empty() {
            layer.push(LogicalInstruction::new(name, targets));
        }
    }
    layer
}
