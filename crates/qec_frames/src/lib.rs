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

//! Stabilizer-frame tracking for circuits of logical operations.

pub mod detectors;
mod error;
pub mod stabilizer_map;
mod support;

pub use detectors::{Detectors, FrameConvention};
pub use error::FrameError;
pub use stabilizer_map::{StabilizerMap, StabilizerUpdate};
pub use support::SupportMap;
