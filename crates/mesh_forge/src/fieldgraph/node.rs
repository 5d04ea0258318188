//! Node kinds for the field graph.
//!
//! Each [`FieldKind`] is a typed operation in the DAG with a fixed number of
//! required input slots and a way to produce its composed [`ScalarField`]
//! once all of its input fields are composed. Dispatch is a closed match,
//! so an unhandled kind is a compile error rather than a runtime assertion.
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::fieldgraph::field::{self, FractalParams, ScalarField};

/// Parameters for a constant value node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantParams {
    /// The constant value.
    pub value: f32,
}

/// Parameters for a single-octave Perlin node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerlinParams {
    /// Sampling frequency.
    pub frequency: f32,
    /// Permutation table seed.
    pub seed: u64,
}

impl Default for PerlinParams {
    fn default() -> Self {
        Self {
            frequency: 2.0,
            seed: 42,
        }
    }
}

/// Parameters for a scale node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    /// Scaling factor.
    pub factor: f32,
}

/// Parameters for a clamp node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClampParams {
    /// Minimum value to clamp to.
    pub min: f32,
    /// Maximum value to clamp to.
    pub max: f32,
}

/// Specification of a node in the field graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    Constant { params: ConstantParams },
    Perlin { params: PerlinParams },
    Fbm { params: FractalParams },
    Ridged { params: FractalParams },
    /// Slot 0 + slot 1.
    Add,
    /// Slot 0 - slot 1.
    Subtract,
    /// Slot 0 * slot 1.
    Multiply,
    Min,
    Max,
    /// Absolute value of slot 0.
    Abs,
    Scale { params: ScaleParams },
    Clamp { params: ClampParams },
    /// Blend of slot 0 and slot 1 by slot 2.
    Mix,
}

impl FieldKind {
    /// Number of input slots this kind requires.
    pub fn required_inputs(&self) -> usize {
        match self {
            FieldKind::Constant { .. }
            | FieldKind::Perlin { .. }
            | FieldKind::Fbm { .. }
            | FieldKind::Ridged { .. } => 0,
            FieldKind::Abs | FieldKind::Scale { .. } | FieldKind::Clamp { .. } => 1,
            FieldKind::Add
            | FieldKind::Subtract
            | FieldKind::Multiply
            | FieldKind::Min
            | FieldKind::Max => 2,
            FieldKind::Mix => 3,
        }
    }

    /// Stable name for listings and logs.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Constant { .. } => "constant",
            FieldKind::Perlin { .. } => "perlin",
            FieldKind::Fbm { .. } => "fbm",
            FieldKind::Ridged { .. } => "ridged",
            FieldKind::Add => "add",
            FieldKind::Subtract => "subtract",
            FieldKind::Multiply => "multiply",
            FieldKind::Min => "min",
            FieldKind::Max => "max",
            FieldKind::Abs => "abs",
            FieldKind::Scale { .. } => "scale",
            FieldKind::Clamp { .. } => "clamp",
            FieldKind::Mix => "mix",
        }
    }

    /// Builds this node's composed field from its already-composed inputs.
    /// `inputs` must hold exactly [`FieldKind::required_inputs`] fields in
    /// slot order; the composition algorithm guarantees that.
    pub fn compose(&self, inputs: Vec<ScalarField>) -> ScalarField {
        debug_assert_eq!(inputs.len(), self.required_inputs());
        let mut it = inputs.into_iter();
        match self {
            FieldKind::Constant { params } => field::constant(params.value),
            FieldKind::Perlin { params } => field::perlin(params.frequency, params.seed),
            FieldKind::Fbm { params } => field::fbm(params),
            FieldKind::Ridged { params } => field::ridged(params),
            FieldKind::Add => {
                let (a, b) = (it.next().unwrap(), it.next().unwrap());
                std::sync::Arc::new(move |p| a(p) + b(p))
            }
            FieldKind::Subtract => {
                let (a, b) = (it.next().unwrap(), it.next().unwrap());
                std::sync::Arc::new(move |p| a(p) - b(p))
            }
            FieldKind::Multiply => {
                let (a, b) = (it.next().unwrap(), it.next().unwrap());
                std::sync::Arc::new(move |p| a(p) * b(p))
            }
            FieldKind::Min => {
                let (a, b) = (it.next().unwrap(), it.next().unwrap());
                std::sync::Arc::new(move |p| a(p).min(b(p)))
            }
            FieldKind::Max => {
                let (a, b) = (it.next().unwrap(), it.next().unwrap());
                std::sync::Arc::new(move |p| a(p).max(b(p)))
            }
            FieldKind::Abs => {
                let a = it.next().unwrap();
                std::sync::Arc::new(move |p| a(p).abs())
            }
            FieldKind::Scale { params } => {
                let a = it.next().unwrap();
                let factor = params.factor;
                std::sync::Arc::new(move |p| a(p) * factor)
            }
            FieldKind::Clamp { params } => {
                let a = it.next().unwrap();
                let (min, max) = (params.min, params.max);
                std::sync::Arc::new(move |p| a(p).clamp(min, max))
            }
            FieldKind::Mix => {
                let (a, b, t) = (
                    it.next().unwrap(),
                    it.next().unwrap(),
                    it.next().unwrap(),
                );
                std::sync::Arc::new(move |p| {
                    let t = t(p).clamp(0.0, 1.0);
                    a(p) * (1.0 - t) + b(p) * t
                })
            }
        }
    }

    /// Creates a constant node kind.
    pub fn constant(value: f32) -> Self {
        FieldKind::Constant {
            params: ConstantParams { value },
        }
    }

    /// Creates a scale node kind.
    pub fn scale(factor: f32) -> Self {
        FieldKind::Scale {
            params: ScaleParams { factor },
        }
    }

    /// Creates a clamp node kind.
    pub fn clamp(min: f32, max: f32) -> Self {
        FieldKind::Clamp {
            params: ClampParams { min, max },
        }
    }

    /// Creates an fBm node kind with default parameters and the given seed.
    pub fn fbm(seed: u64) -> Self {
        FieldKind::Fbm {
            params: FractalParams {
                seed,
                ..FractalParams::default()
            },
        }
    }
}

/// A node payload in the field graph: its kind, an editor-position hint, and
/// whether it is an auto-inserted placeholder standing in for an unconnected
/// required input slot.
#[derive(Clone, Debug)]
pub struct FieldNode {
    pub kind: FieldKind,
    /// 2D position hint for graph editors. Not used by evaluation.
    pub position: Vec2,
    placeholder: bool,
}

impl FieldNode {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            position: Vec2::ZERO,
            placeholder: false,
        }
    }

    /// A placeholder input with the fixed default value.
    pub(crate) fn placeholder(default: f32) -> Self {
        Self {
            kind: FieldKind::constant(default),
            position: Vec2::ZERO,
            placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}
