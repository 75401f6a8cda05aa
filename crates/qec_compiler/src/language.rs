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

//! Logical circuits: one instruction name followed by logical qubit indices
//! per line, e.g.
//!
//! ```text
//! R 0 1
//! TICK
//! CX 0 1  # control 0, target 1
//! TICK
//! M 0 1
//! ```

use std::{fmt::Display, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>[A-Za-z][A-Za-z0-9_]*)(?<targets>(\s+\d+)*)$")
        .expect("instruction pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalInstruction {
    pub name: String,
    pub targets: Vec<usize>,
}

impl LogicalInstruction {
    pub fn new(name: &str, targets: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            targets,
        }
    }
}

impl Display for LogicalInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for t in &self.targets {
            write!(f, " {t}")?;
        }
        Ok(())
    }
}

/// Line `line` (1-based) is not an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub content: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {} is not a logical instruction: '{}'",
            self.line, self.content
        )
    }
}

impl std::error::Error for ParseError {}

/// Parse a logical circuit. Everything after `#` is a comment; blank lines
/// are skipped.
pub fn parse_circuit(text: &str) -> Result<Vec<LogicalInstruction>, ParseError> {
    let mut instructions = vec![];
    for (i, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let error = || ParseError {
            line: i + 1,
            content: raw.to_string(),
        };
        let caps = LINE.captures(line).ok_or_else(error)?;
        let targets = caps["targets"]
            .split_whitespace()
            .map(|t| t.parse::<usize>().map_err(|_| error()))
            .collect::<Result<Vec<_>, _>>()?;
        instructions.push(LogicalInstruction::new(&caps["name"], targets));
    }
    Ok(instructions)
}
