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

pub mod emitter;
mod error;
pub mod experiment;
pub mod language;
pub mod layout;
pub mod library;
pub mod model;
pub mod schedule;

pub use emitter::{Emitter, FrameEffect, Fragments, GateSet, OperationKind};
pub use error::CompileError;
pub use experiment::{
    ExperimentConfig, detectors_for, experiment_from_circuit, experiment_from_schedule,
};
pub use language::{LogicalInstruction, ParseError, parse_circuit};
pub use layout::{Basis, CodeFamily, Layout, repetition_code, rotated_surface_code};
pub use library::gate_to_emitter;
pub use model::{CircuitNoiseModel, ModelError, NoiseModel, NoiselessModel};
pub use schedule::{ScheduleEntry, ScheduledOp, schedule_from_circuit};
