#![forbid(unsafe_code)]
//! mesh_forge: Staged procedural surface generation with incremental recomputation.
//!
//! Modules:
//! - pipeline: the staged generator/modifier/parameterizer/texturing sequence with per-stage caching
//! - fieldgraph: author and compose scalar field DAGs (noise, arithmetic, shaping)
//! - artifact: the mesh and texture map bundle flowing between stages
//! - rasterize: parallel per-pixel raster fills
//!
//! For examples and docs, see README and docs.rs.
pub mod artifact;
pub mod config;
pub mod error;
pub mod fieldgraph;
pub mod graph;
pub mod pipeline;
pub mod rasterize;

/// Convenient re-exports for common types. Import with `use mesh_forge::prelude::*;`.
pub mod prelude {
    pub use crate::artifact::{Artifact, Mesh, Raster, RasterRgb, TextureMaps};
    pub use crate::config::{ActiveWhen, Configuration, GradientStop, Parameter};
    pub use crate::error::{Error, Result};
    pub use crate::fieldgraph::{
        field, FieldGraph, FieldKind, FieldNode, FractalParams, GraphSnapshot, ScalarField,
        PLACEHOLDER_VALUE,
    };
    pub use crate::graph::{DiGraph, EdgeId, NodeId};
    pub use crate::pipeline::generators::{PlaneGenerator, SphereGenerator};
    pub use crate::pipeline::modifiers::{
        DisplaceModifier, PlanarParameterizer, SphericalParameterizer, TransformModifier,
    };
    pub use crate::pipeline::stage::{
        GeneratorOp, Stage, StageId, StageKind, StageOp, SurfaceOp, TextureOp,
    };
    pub use crate::pipeline::texturing::{FieldTextureGenerator, RoughnessAdder, TintAdder};
    pub use crate::pipeline::{Pipeline, DEFAULT_TEXTURE_RESOLUTION};
}
