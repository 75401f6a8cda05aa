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

//! Code layouts: which qubits a code block consists of and how they connect.

use std::{collections::BTreeMap, fmt::Display};

use clap::ValueEnum;
use qec_frames::{FrameError, SupportMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Data,
    Anc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StabType {
    XType,
    ZType,
}

/// Pauli basis of logical operators, preparations and measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    X,
    Z,
}

impl Basis {
    /// Ancillas whose stabilizers are fixed by data qubits prepared or
    /// measured in this basis.
    pub fn stab_type(&self) -> StabType {
        match self {
            Basis::X => StabType::XType,
            Basis::Z => StabType::ZType,
        }
    }
}

impl Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Basis::X => write!(f, "X"),
            Basis::Z => write!(f, "Z"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
    East,
    West,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Self::NorthEast => Self::SouthWest,
            Self::NorthWest => Self::SouthEast,
            Self::SouthEast => Self::NorthWest,
            Self::SouthWest => Self::NorthEast,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeFamily {
    Repetition,
    RotatedSurface,
}

/// Empty columns between neighbouring blocks of [`CodeFamily::blocks`].
const BLOCK_GAP: f64 = 2.0;

impl CodeFamily {
    pub fn layout(&self, distance: usize, label: &str) -> Layout {
        match self {
            Self::Repetition => repetition_code(distance, label),
            Self::RotatedSurface => rotated_surface_code(distance, label),
        }
    }

    /// `count` blocks labelled `L0`, `L1`, ... side by side along x, so that
    /// no two qubits share coordinates.
    pub fn blocks(&self, distance: usize, count: usize) -> Vec<Layout> {
        (0..count)
            .map(|i| {
                let layout = self.layout(distance, &format!("L{i}"));
                let pitch = layout.width() + BLOCK_GAP;
                layout.with_origin(&[i as f64 * pitch, 0.0])
            })
            .collect()
    }
}

impl Display for CodeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repetition => write!(f, "repetition code"),
            Self::RotatedSurface => write!(f, "rotated surface code"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QubitInfo {
    pub role: Role,
    pub stab_type: Option<StabType>,
    pub coords: Vec<f64>,
    pub neighbors: BTreeMap<Direction, String>,
}

/// One code block holding one logical qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    name: String,
    code: CodeFamily,
    distance: usize,
    order: Vec<String>,
    qubits: BTreeMap<String, QubitInfo>,
    log_x: Vec<String>,
    log_z: Vec<String>,
}

impl Layout {
    fn new(name: &str, code: CodeFamily, distance: usize) -> Self {
        Self {
            name: name.to_string(),
            code,
            distance,
            order: vec![],
            qubits: BTreeMap::new(),
            log_x: vec![],
            log_z: vec![],
        }
    }

    fn add_qubit(&mut self, label: String, role: Role, stab_type: Option<StabType>, coords: Vec<f64>) {
        self.order.push(label.clone());
        self.qubits.insert(
            label,
            QubitInfo {
                role,
                stab_type,
                coords,
                neighbors: BTreeMap::new(),
            },
        );
    }

    // `b` lies in direction `dir` of `a`.
    fn connect(&mut self, a: &str, b: &str, dir: Direction) {
        if let Some(info) = self.qubits.get_mut(a) {
            info.neighbors.insert(dir, b.to_string());
        }
        if let Some(info) = self.qubits.get_mut(b) {
            info.neighbors.insert(dir.opposite(), a.to_string());
        }
    }

    /// Translate every qubit by `origin`.
    pub fn with_origin(mut self, origin: &[f64]) -> Self {
        for info in self.qubits.values_mut() {
            for (c, o) in info.coords.iter_mut().zip(origin) {
                *c += o;
            }
        }
        self
    }

    // Largest x coordinate, blocks start at x = 0.
    fn width(&self) -> f64 {
        self.qubits
            .values()
            .filter_map(|info| info.coords.first())
            .fold(0.0, |acc: f64, &x| acc.max(x))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> CodeFamily {
        self.code
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    /// All qubits, data qubits first.
    pub fn qubits(&self) -> &[String] {
        &self.order
    }

    pub fn data_qubits(&self) -> Vec<String> {
        self.filtered(|info| info.role == Role::Data)
    }

    pub fn anc_qubits(&self) -> Vec<String> {
        self.filtered(|info| info.role == Role::Anc)
    }

    pub fn anc_by_type(&self, stab_type: StabType) -> Vec<String> {
        self.filtered(|info| info.role == Role::Anc && info.stab_type == Some(stab_type))
    }

    fn filtered(&self, keep: impl Fn(&QubitInfo) -> bool) -> Vec<String> {
        self.order
            .iter()
            .filter(|q| self.qubits.get(*q).is_some_and(&keep))
            .cloned()
            .collect()
    }

    pub fn info(&self, qubit: &str) -> Option<&QubitInfo> {
        self.qubits.get(qubit)
    }

    pub fn coords(&self, qubit: &str) -> Option<&[f64]> {
        self.qubits.get(qubit).map(|info| info.coords.as_slice())
    }

    pub fn neighbor(&self, qubit: &str, dir: Direction) -> Option<&str> {
        self.qubits
            .get(qubit)
            .and_then(|info| info.neighbors.get(&dir))
            .map(String::as_str)
    }

    pub fn neighbors(&self, qubit: &str) -> Vec<&str> {
        self.qubits
            .get(qubit)
            .map(|info| info.neighbors.values().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Support of the logical operator of the given type.
    pub fn logical(&self, basis: Basis) -> &[String] {
        match basis {
            Basis::X => &self.log_x,
            Basis::Z => &self.log_z,
        }
    }

    /// Data qubits of every ancilla's stabilizer.
    pub fn support_map(&self) -> Result<SupportMap, FrameError> {
        SupportMap::from_supports(self.anc_qubits().into_iter().map(|anc| {
            let support: Vec<String> = self
                .neighbors(&anc)
                .into_iter()
                .filter(|q| self.qubits.get(*q).is_some_and(|i| i.role == Role::Data))
                .map(str::to_string)
                .collect();
            (anc, support)
        }))
    }

    pub fn anc_coords(&self) -> BTreeMap<String, Vec<f64>> {
        self.anc_qubits()
            .into_iter()
            .filter_map(|anc| {
                let coords = self.qubits.get(&anc)?.coords.clone();
                Some((anc, coords))
            })
            .collect()
    }
}

/// Distance-`distance` repetition code protecting against bit flips, with
/// data and ancillas alternating on a line.
pub fn repetition_code(distance: usize, label: &str) -> Layout {
    let mut layout = Layout::new(label, CodeFamily::Repetition, distance);
    let data = |i: usize| format!("{label}_D{}", i + 1);
    let anc = |i: usize| format!("{label}_Z{}", i + 1);

    for i in 0..distance {
        layout.add_qubit(data(i), Role::Data, None, vec![2.0 * i as f64, 0.0]);
    }
    for i in 0..distance.saturating_sub(1) {
        layout.add_qubit(
            anc(i),
            Role::Anc,
            Some(StabType::ZType),
            vec![2.0 * i as f64 + 1.0, 0.0],
        );
        layout.connect(&anc(i), &data(i), Direction::West);
        layout.connect(&anc(i), &data(i + 1), Direction::East);
    }

    layout.log_z = vec![data(0)];
    layout.log_x = (0..distance).map(data).collect();
    layout
}

/// Rotated surface code of odd `distance`.
///
/// Data qubits sit at odd coordinates `(2i + 1, 2j + 1)`, ancillas at even
/// coordinates. Weight-two Z checks close the left and right boundaries and
/// weight-two X checks the top and bottom ones. Logical Z runs along the
/// bottom row, logical X along the left column.
pub fn rotated_surface_code(distance: usize, label: &str) -> Layout {
    let mut layout = Layout::new(label, CodeFamily::RotatedSurface, distance);
    let d = distance;
    let data = |i: usize, j: usize| format!("{label}_D{}", j * d + i + 1);

    for j in 0..d {
        for i in 0..d {
            layout.add_qubit(
                data(i, j),
                Role::Data,
                None,
                vec![2.0 * i as f64 + 1.0, 2.0 * j as f64 + 1.0],
            );
        }
    }

    let (mut num_x, mut num_z) = (0, 0);
    for y in (0..=2 * d).step_by(2) {
        for x in (0..=2 * d).step_by(2) {
            let stab_type = if ((x + y) / 2) % 2 == 0 {
                StabType::XType
            } else {
                StabType::ZType
            };
            let vertical_edge = x == 0 || x == 2 * d;
            let horizontal_edge = y == 0 || y == 2 * d;
            let keep = match (vertical_edge, horizontal_edge) {
                (false, false) => true,
                (true, false) => stab_type == StabType::ZType,
                (false, true) => stab_type == StabType::XType,
                (true, true) => false,
            };
            if !keep {
                continue;
            }

            let name = match stab_type {
                StabType::XType => {
                    num_x += 1;
                    format!("{label}_X{num_x}")
                }
                StabType::ZType => {
                    num_z += 1;
                    format!("{label}_Z{num_z}")
                }
            };
            layout.add_qubit(
                name.clone(),
                Role::Anc,
                Some(stab_type),
                vec![x as f64, y as f64],
            );

            let corners = [
                (1isize, 1isize, Direction::NorthEast),
                (-1, 1, Direction::NorthWest),
                (1, -1, Direction::SouthEast),
                (-1, -1, Direction::SouthWest),
            ];
            for (dx, dy, dir) in corners {
                let (qx, qy) = (x as isize + dx, y as isize + dy);
                if qx < 0 || qy < 0 || qx > 2 * d as isize || qy > 2 * d as isize {
                    continue;
                }
                let (i, j) = ((qx as usize - 1) / 2, (qy as usize - 1) / 2);
                layout.connect(&name, &data(i, j), dir);
            }
        }
    }

    layout.log_z = (0..d).map(|i| data(i, 0)).collect();
    layout.log_x = (0..d).map(|j| data(0, j)).collect();
    layout
}
