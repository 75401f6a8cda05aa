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

use std::{collections::BTreeMap, fmt::Display};

use qec_common::{MergeError, RecordError};
use qec_frames::FrameError;

use crate::{emitter::OperationKind, language::ParseError, model::ModelError};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// No emitter is registered under `name`.
    UnknownInstruction { name: String },
    /// `TICK` must map onto a QEC round.
    TickNotQecRound { name: String },
    TargetOutOfRange {
        name: String,
        target: usize,
        num_layouts: usize,
    },
    OddTargets { name: String, count: usize },
    /// A two-layout operation names the same layout twice.
    RepeatedTarget { name: String, target: usize },
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    WrongKind {
        name: String,
        expected: OperationKind,
        found: OperationKind,
    },
    /// Initialization of a layout that is already live.
    AlreadyActive { name: String, layout: String },
    /// An operation other than initialization on a layout that is not live.
    InactiveLayout { name: String, layout: String },
    /// Some active layout did not take part in exactly one operation of the
    /// block.
    IdlingViolation {
        active: Vec<String>,
        counts: BTreeMap<String, usize>,
    },
    /// Fragment streams merged in lock-step have different lengths.
    FragmentCountMismatch { counts: Vec<usize> },
    CodeMismatch {
        name: String,
        first: String,
        second: String,
    },
    Merge(MergeError),
    Frame(FrameError),
    Model(ModelError),
    Record(RecordError),
    Parse(ParseError),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownInstruction { name } => {
                write!(f, "no emitter is registered for instruction {name}")
            }
            Self::TickNotQecRound { name } => {
                write!(f, "TICK is mapped onto {name}, which is not a QEC round")
            }
            Self::TargetOutOfRange {
                name,
                target,
                num_layouts,
            } => write!(
                f,
                "{name} targets logical qubit {target}, but there are only {num_layouts} layouts"
            ),
            Self::OddTargets { name, count } => write!(
                f,
                "two-qubit instruction {name} needs an even number of targets, got {count}"
            ),
            Self::RepeatedTarget { name, target } => {
                write!(f, "{name} acts twice on logical qubit {target}")
            }
            Self::ArityMismatch {
                name,
                expected,
                found,
            } => write!(f, "{name} acts on {expected} layouts, got {found}"),
            Self::WrongKind {
                name,
                expected,
                found,
            } => write!(f, "{name} is a {found} operation, expected {expected}"),
            Self::AlreadyActive { name, layout } => {
                write!(f, "{name} initializes {layout}, which is already active")
            }
            Self::InactiveLayout { name, layout } => {
                write!(f, "{name} acts on {layout}, which is not active")
            }
            Self::IdlingViolation { active, counts } => write!(
                f,
                "every active layout must take part in exactly one operation per block; \
                 active layouts: {active:?}, operations per layout: {counts:?}"
            ),
            Self::FragmentCountMismatch { counts } => write!(
                f,
                "emitters merged in lock-step produced different numbers of fragments: {counts:?}"
            ),
            Self::CodeMismatch {
                name,
                first,
                second,
            } => write!(f, "{name} cannot act on {first} and {second} together"),
            Self::Merge(e) => write!(f, "{e}"),
            Self::Frame(e) => write!(f, "{e}"),
            Self::Model(e) => write!(f, "{e}"),
            Self::Record(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Merge(e) => Some(e),
            Self::Frame(e) => Some(e),
            Self::Model(e) => Some(e),
            Self::Record(e) => Some(e),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MergeError> for CompileError {
    fn from(e: MergeError) -> Self {
        Self::Merge(e)
    }
}

impl From<FrameError> for CompileError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<ModelError> for CompileError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}

impl From<RecordError> for CompileError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}
