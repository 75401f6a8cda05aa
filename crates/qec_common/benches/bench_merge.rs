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

use std::hint::black_box;
use std::time::Instant;

use qec_common::{Circuit, MeasurementRecord, QubitMap, merge_circuits};

fn layered_fragment(offset: usize, width: usize, ticks: usize) -> Circuit {
    let qubits: Vec<usize> = (offset..offset + width).collect();
    let mut circuit = Circuit::new();
    circuit.append_gate("R", qubits.clone());
    for layer in 0..ticks {
        circuit.tick();
        if layer + 1 == ticks {
            circuit.append_gate("M", qubits.clone());
        } else {
            let pairs: Vec<usize> = qubits.chunks_exact(2).flatten().copied().collect();
            circuit.append_gate("CX", pairs);
        }
    }
    circuit
}

fn main() {
    let blocks = 16;
    let width = 50;
    let ticks = 12;
    let repetitions: u32 = 2_000;

    println!("=== Merge Throughput Benchmark ===");
    println!("fragments: {blocks}, qubits per fragment: {width}, ticks: {ticks}");

    let fragments: Vec<Circuit> = (0..blocks)
        .map(|b| layered_fragment(b * width, width, ticks))
        .collect();
    let qubits =
        QubitMap::from_labels((0..blocks * width).map(|q| format!("Q{q}"))).expect("unique labels");
    let mut record = MeasurementRecord::new(qubits);

    let start = Instant::now();
    let mut checksum = 0;
    for _ in 0..repetitions {
        let merged = merge_circuits(&fragments, true).expect("benchmark inputs should be valid");
        record.observe(&merged).expect("benchmark inputs should be valid");
        checksum ^= merged.len();
    }
    let elapsed = start.elapsed();

    println!("total: {:.2?}", elapsed);
    println!("per merge: {:.2?}", elapsed / repetitions);
    println!("measurements recorded: {}", record.total());
    println!("checksum: {}", black_box(checksum));
}
