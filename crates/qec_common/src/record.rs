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

//! Bookkeeping of the measurement record of a circuit under construction.

use std::{collections::HashMap, fmt::Display};

use log::trace;

use crate::circuit::{Circuit, Instruction, MeasTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    UnknownQubit {
        qubit: String,
    },
    UnknownIndex {
        index: usize,
    },
    DuplicateQubit {
        qubit: String,
    },
    /// `rel` must lie in `[-available, -1]`.
    OffsetOutOfRange {
        qubit: String,
        rel: i32,
        available: usize,
    },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownQubit { qubit } => write!(f, "qubit {qubit} is not in the qubit map"),
            Self::UnknownIndex { index } => {
                write!(f, "qubit index {index} is not in the qubit map")
            }
            Self::DuplicateQubit { qubit } => {
                write!(f, "qubit {qubit} appears more than once in the qubit map")
            }
            Self::OffsetOutOfRange {
                qubit,
                rel,
                available,
            } => write!(
                f,
                "qubit {qubit} has {available} measurements, cannot look up offset {rel}"
            ),
        }
    }
}

impl std::error::Error for RecordError {}

/// Bijection between qubit labels and circuit indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QubitMap {
    labels: Vec<String>,
    indices: HashMap<String, usize>,
}

impl QubitMap {
    /// Index qubits in iteration order.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::default();
        for label in labels {
            let label = label.into();
            if map.indices.contains_key(&label) {
                return Err(RecordError::DuplicateQubit { qubit: label });
            }
            map.indices.insert(label.clone(), map.labels.len());
            map.labels.push(label);
        }
        Ok(map)
    }

    pub fn index(&self, label: &str) -> Result<usize, RecordError> {
        self.indices
            .get(label)
            .copied()
            .ok_or_else(|| RecordError::UnknownQubit {
                qubit: label.to_string(),
            })
    }

    pub fn indices<'a, I>(&self, labels: I) -> Result<Vec<usize>, RecordError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels.into_iter().map(|l| self.index(l)).collect()
    }

    pub fn label(&self, index: usize) -> Result<&str, RecordError> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(RecordError::UnknownIndex { index })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Resolves `(qubit, rel)` into a look-back into the measurement record,
/// where `rel = -1` is the latest measurement of `qubit`.
pub trait MeasurementLookup {
    fn meas_target(&self, qubit: &str, rel: i32) -> Result<MeasTarget, RecordError>;
}

impl<F> MeasurementLookup for F
where
    F: Fn(&str, i32) -> Result<MeasTarget, RecordError>,
{
    fn meas_target(&self, qubit: &str, rel: i32) -> Result<MeasTarget, RecordError> {
        self(qubit, rel)
    }
}

/// Absolute positions of every measurement of every qubit, in the order they
/// appear in the circuit.
#[derive(Debug, Clone)]
pub struct MeasurementRecord {
    qubits: QubitMap,
    per_qubit: Vec<Vec<usize>>,
    total: usize,
}

impl MeasurementRecord {
    pub fn new(qubits: QubitMap) -> Self {
        let per_qubit = vec![vec![]; qubits.len()];
        Self {
            qubits,
            per_qubit,
            total: 0,
        }
    }

    pub fn qubits(&self) -> &QubitMap {
        &self.qubits
    }

    /// Total number of measurements seen so far.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn num_measurements(&self, qubit: &str) -> Result<usize, RecordError> {
        Ok(self.per_qubit[self.qubits.index(qubit)?].len())
    }

    /// Append the measurements of `circuit`, which must directly follow
    /// everything observed so far.
    pub fn observe(&mut self, circuit: &Circuit) -> Result<(), RecordError> {
        let before = self.total;
        for instr in circuit.iter().filter(|i| i.is_measurement()) {
            let Instruction::Gate { targets, .. } = instr else {
                continue;
            };
            for &index in targets {
                let record = self
                    .per_qubit
                    .get_mut(index)
                    .ok_or(RecordError::UnknownIndex { index })?;
                record.push(self.total);
                self.total += 1;
            }
        }
        trace!("Recorded {} measurements", self.total - before);
        Ok(())
    }

    pub fn new_circuit(&mut self) {
        self.per_qubit.iter_mut().for_each(Vec::clear);
        self.total = 0;
    }
}

impl MeasurementLookup for MeasurementRecord {
    fn meas_target(&self, qubit: &str, rel: i32) -> Result<MeasTarget, RecordError> {
        let record = &self.per_qubit[self.qubits.index(qubit)?];
        let available = record.len();
        let out_of_range = || RecordError::OffsetOutOfRange {
            qubit: qubit.to_string(),
            rel,
            available,
        };
        if rel >= 0 || rel.unsigned_abs() as usize > available {
            return Err(out_of_range());
        }
        let absolute = record[available - rel.unsigned_abs() as usize];
        Ok(MeasTarget(absolute as i64 - self.total as i64))
    }
}
