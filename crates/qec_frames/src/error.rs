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

use std::fmt::Display;

use qec_common::RecordError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    UnknownAncilla {
        ancilla: String,
    },
    DuplicateAncilla {
        ancilla: String,
    },
    /// A map or update is not defined over the expected set of labels.
    DomainMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    NotInvertible {
        rank: usize,
        size: usize,
    },
    /// `label` maps onto `image`, which lies outside the domain.
    InvalidImage {
        label: String,
        image: String,
    },
    CoordsMismatch {
        ancilla: String,
        expected: usize,
        found: usize,
    },
    UnknownFrame {
        frame: String,
    },
    Record(RecordError),
}

impl Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAncilla { ancilla } => {
                write!(f, "ancilla {ancilla} is not part of the detector universe")
            }
            Self::DuplicateAncilla { ancilla } => {
                write!(f, "ancilla {ancilla} appears more than once")
            }
            Self::DomainMismatch { expected, found } => write!(
                f,
                "labels do not match, expected {expected:?} but found {found:?}"
            ),
            Self::NotInvertible { rank, size } => write!(
                f,
                "stabilizer map is not invertible: rank {rank} over {size} labels"
            ),
            Self::InvalidImage { label, image } => {
                write!(f, "{label} maps onto {image}, which is not in the domain")
            }
            Self::CoordsMismatch {
                ancilla,
                expected,
                found,
            } => write!(
                f,
                "coordinates of {ancilla} have length {found}, expected {expected}"
            ),
            Self::UnknownFrame { frame } => write!(
                f,
                "unknown frame '{frame}', expected gate-independent, pre-gate or post-gate"
            ),
            Self::Record(e) => write!(f, "measurement lookup failed: {e}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Record(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordError> for FrameError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}
