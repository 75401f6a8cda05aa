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

use std::collections::HashMap;

use sprs::{CsMat, TriMat};

use crate::error::FrameError;

/// Incidence between ancillas (rows) and the data qubits their stabilizers
/// act on (columns), stored in CSR format.
#[derive(Debug, Clone)]
pub struct SupportMap {
    ancillas: Vec<String>,
    data_qubits: Vec<String>,
    rows: HashMap<String, usize>,
    incidence: CsMat<u8>,
}

impl SupportMap {
    /// Data qubits are indexed in order of first appearance.
    pub fn from_supports<I, A, J, D>(supports: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = (A, J)>,
        A: Into<String>,
        J: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let mut ancillas = vec![];
        let mut rows = HashMap::new();
        let mut data_qubits: Vec<String> = vec![];
        let mut columns: HashMap<String, usize> = HashMap::new();
        let mut entries = vec![];

        for (anc, support) in supports {
            let anc = anc.into();
            if rows.contains_key(&anc) {
                return Err(FrameError::DuplicateAncilla { ancilla: anc });
            }
            let row = ancillas.len();
            rows.insert(anc.clone(), row);
            ancillas.push(anc);
            for data in support {
                let data = data.into();
                let col = *columns.entry(data.clone()).or_insert_with(|| {
                    data_qubits.push(data);
                    data_qubits.len() - 1
                });
                entries.push((row, col));
            }
        }

        let mut tri = TriMat::new((ancillas.len(), data_qubits.len()));
        for (row, col) in entries {
            tri.add_triplet(row, col, 1u8);
        }
        Ok(Self {
            ancillas,
            data_qubits,
            rows,
            incidence: tri.to_csr(),
        })
    }

    /// Data qubits in the support of `anc`, or `None` if `anc` is unknown.
    pub fn support(&self, anc: &str) -> Option<Vec<&str>> {
        let row = *self.rows.get(anc)?;
        let view = self.incidence.outer_view(row)?;
        Some(
            view.iter()
                .filter(|(_, value)| **value % 2 == 1)
                .map(|(col, _)| self.data_qubits[col].as_str())
                .collect(),
        )
    }

    pub fn ancillas(&self) -> &[String] {
        &self.ancillas
    }

    pub fn data_qubits(&self) -> &[String] {
        &self.data_qubits
    }

    pub fn incidence(&self) -> &CsMat<u8> {
        &self.incidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_round_trip_through_csr() {
        let map = SupportMap::from_supports([
            ("Z1", vec!["D1", "D2"]),
            ("Z2", vec!["D2", "D3"]),
            ("X1", vec![]),
        ])
        .unwrap();
        assert_eq!(map.support("Z1"), Some(vec!["D1", "D2"]));
        assert_eq!(map.support("Z2"), Some(vec!["D2", "D3"]));
        assert_eq!(map.support("X1"), Some(vec![]));
        assert_eq!(map.support("X9"), None);
        assert_eq!(map.data_qubits(), ["D1", "D2", "D3"]);
        assert_eq!(map.incidence().nnz(), 4);
    }

    #[test]
    fn rejects_duplicate_ancillas() {
        let err = SupportMap::from_supports([("Z1", vec!["D1"]), ("Z1", vec!["D2"])]).unwrap_err();
        assert_eq!(
            err,
            FrameError::DuplicateAncilla {
                ancilla: "Z1".to_string()
            }
        );
    }
}
