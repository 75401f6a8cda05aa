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

pub mod binary_matrix;
pub mod circuit;
pub mod merge;
pub mod observables;
pub mod record;

pub use binary_matrix::{BinaryMatrix, MatrixError};
pub use circuit::{Circuit, Instruction, MEAS_INSTR, MeasTarget};
pub use merge::{MergeError, merge_circuits};
pub use record::{MeasurementLookup, MeasurementRecord, QubitMap, RecordError};
