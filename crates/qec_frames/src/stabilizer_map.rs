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

//! Mod-2 linear relabelings of stabilizers.
//!
//! A logical Clifford gate changes which products of ancilla outcomes give
//! the value of each stabilizer. A [`StabilizerMap`] sends a label to the set
//! of labels whose product it equals; a [`StabilizerUpdate`] pairs the map of
//! one gate with its inverse.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use qec_common::{BinaryMatrix, MatrixError};
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Sparse map from label to a set of labels. Labels without an explicit
/// image map onto themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilizerMap {
    images: BTreeMap<String, BTreeSet<String>>,
}

impl StabilizerMap {
    /// The identity written out explicitly over `labels`.
    pub fn identity<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: labels
                .into_iter()
                .map(|l| {
                    let l = l.into();
                    (l.clone(), BTreeSet::from([l]))
                })
                .collect(),
        }
    }

    pub fn from_images<I, L, J, S>(images: I) -> Self
    where
        I: IntoIterator<Item = (L, J)>,
        L: Into<String>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: images
                .into_iter()
                .map(|(l, image)| (l.into(), image.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Labels with an explicit image.
    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.images.contains_key(label)
    }

    pub fn image(&self, label: &str) -> BTreeSet<String> {
        self.images
            .get(label)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([label.to_string()]))
    }

    pub fn insert(&mut self, label: impl Into<String>, image: BTreeSet<String>) {
        self.images.insert(label.into(), image);
    }

    /// Image of a product of labels, i.e. the symmetric difference of the
    /// images of every label in `labels`.
    pub fn apply(&self, labels: &BTreeSet<String>) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for label in labels {
            for image in self.image(label) {
                if !out.remove(&image) {
                    out.insert(image);
                }
            }
        }
        out
    }

    /// The map `self ; next`, sending `a` to `next` applied to `self(a)`.
    pub fn then(&self, next: &StabilizerMap) -> StabilizerMap {
        let labels: BTreeSet<&String> = self.images.keys().chain(next.images.keys()).collect();
        Self {
            images: labels
                .into_iter()
                .map(|l| (l.clone(), next.apply(&self.image(l))))
                .collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.images
            .iter()
            .all(|(l, image)| image.len() == 1 && image.contains(l))
    }

    /// Row `i` holds the image of `labels[i]` over the columns `labels`.
    pub fn to_matrix(&self, labels: &[String]) -> Result<BinaryMatrix, FrameError> {
        let columns: BTreeMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let mut matrix = BinaryMatrix::zeros(labels.len(), labels.len());
        for (row, label) in labels.iter().enumerate() {
            for image in self.image(label) {
                let col = columns
                    .get(image.as_str())
                    .ok_or_else(|| FrameError::InvalidImage {
                        label: label.clone(),
                        image: image.clone(),
                    })?;
                matrix.set(row, *col, 1);
            }
        }
        Ok(matrix)
    }

    pub fn from_matrix(labels: &[String], matrix: &BinaryMatrix) -> Self {
        Self {
            images: labels
                .iter()
                .enumerate()
                .map(|(row, l)| {
                    let image = matrix
                        .row_support(row)
                        .into_iter()
                        .map(|col| labels[col].clone())
                        .collect();
                    (l.clone(), image)
                })
                .collect(),
        }
    }
}

/// The stabilizer relabeling of one logical gate.
///
/// `forward` sends every label after the gate to the labels before the gate
/// whose product it equals, `inverse` goes the other way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilizerUpdate {
    forward: StabilizerMap,
    inverse: StabilizerMap,
}

impl StabilizerUpdate {
    /// Both maps must have the same domain, map into it, and compose to the
    /// identity in either order.
    pub fn new(forward: StabilizerMap, inverse: StabilizerMap) -> Result<Self, FrameError> {
        let domain: Vec<String> = forward.domain().map(str::to_string).collect();
        let inverse_domain: Vec<String> = inverse.domain().map(str::to_string).collect();
        if domain != inverse_domain {
            return Err(FrameError::DomainMismatch {
                expected: domain,
                found: inverse_domain,
            });
        }
        check_images(&forward)?;
        check_images(&inverse)?;

        let forward_matrix = forward.to_matrix(&domain)?;
        let inverse_matrix = inverse.to_matrix(&domain)?;
        let composed = forward_matrix.mul(&inverse_matrix).map_err(singular)?;
        let reversed = inverse_matrix.mul(&forward_matrix).map_err(singular)?;
        if !composed.is_identity() || !reversed.is_identity() {
            return Err(FrameError::NotInvertible {
                rank: forward_matrix.rank(),
                size: domain.len(),
            });
        }
        Ok(Self { forward, inverse })
    }

    /// Compute the inverse of `forward` over GF(2).
    pub fn from_forward(forward: StabilizerMap) -> Result<Self, FrameError> {
        check_images(&forward)?;
        let domain: Vec<String> = forward.domain().map(str::to_string).collect();
        let matrix = forward.to_matrix(&domain)?;
        let inverse = matrix.inverse().map_err(singular)?;
        trace!("Inverted stabilizer map over {} labels", domain.len());
        Ok(Self {
            inverse: StabilizerMap::from_matrix(&domain, &inverse),
            forward,
        })
    }

    /// The update that relabels nothing.
    pub fn identity<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = StabilizerMap::identity(labels);
        Self {
            forward: map.clone(),
            inverse: map,
        }
    }

    pub fn forward(&self) -> &StabilizerMap {
        &self.forward
    }

    pub fn inverse(&self) -> &StabilizerMap {
        &self.inverse
    }

    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.forward.domain()
    }

    /// Extend the update with the identity on every label of `universe`
    /// outside its domain.
    pub fn embed(&self, universe: &[String]) -> Result<Self, FrameError> {
        let known: BTreeSet<&str> = universe.iter().map(String::as_str).collect();
        if let Some(label) = self.domain().find(|l| !known.contains(l)) {
            return Err(FrameError::UnknownAncilla {
                ancilla: label.to_string(),
            });
        }
        let mut forward = self.forward.clone();
        let mut inverse = self.inverse.clone();
        for label in universe.iter().filter(|l| !self.forward.contains(l)) {
            forward.insert(label.clone(), BTreeSet::from([label.clone()]));
            inverse.insert(label.clone(), BTreeSet::from([label.clone()]));
        }
        Ok(Self { forward, inverse })
    }

    /// Apply this update after `self`: gates `self` then `next`.
    pub fn then(&self, next: &StabilizerUpdate) -> Self {
        Self {
            forward: next.forward.then(&self.forward),
            inverse: self.inverse.then(&next.inverse),
        }
    }
}

fn check_images(map: &StabilizerMap) -> Result<(), FrameError> {
    for (label, image) in &map.images {
        if let Some(outside) = image.iter().find(|i| !map.images.contains_key(*i)) {
            return Err(FrameError::InvalidImage {
                label: label.clone(),
                image: outside.clone(),
            });
        }
    }
    Ok(())
}

fn singular(e: MatrixError) -> FrameError {
    match e {
        MatrixError::Singular { rank, size } => FrameError::NotInvertible { rank, size },
        MatrixError::NotSquare { rows, cols } | MatrixError::DimensionMismatch {
            lhs: (rows, cols),
            ..
        } => FrameError::NotInvertible {
            rank: rows.min(cols),
            size: rows.max(cols),
        },
    }
}
