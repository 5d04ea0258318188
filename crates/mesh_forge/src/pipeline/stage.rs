//! Stage contract: the uniform unit of work in the pipeline.
//!
//! A [`Stage`] pairs a leaf operation with the change-tracking state that
//! drives incremental recomputation: a `changed` flag set by external edits,
//! a `first_run` flag that forces the initial computation, a `disabled` flag
//! (modifiers and texture adders only), the cached output artifact, and a
//! recompute counter. The five stage kinds form a closed tagged variant, so
//! kind-specific policy is a match, never a downcast.
use std::sync::Arc;

use tracing::warn;

use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::error::{Error, Result};

/// Behavior shared by every leaf operation: a display name and the
/// externally editable parameter cells.
pub trait StageOp: Send {
    fn name(&self) -> &str;
    fn config(&self) -> &Configuration;
    fn config_mut(&mut self) -> &mut Configuration;
}

/// A source stage: produces the initial artifact from nothing.
pub trait GeneratorOp: StageOp {
    fn generate(&mut self) -> Result<Artifact>;
}

/// A mesh-to-mesh stage: modifiers and parameterizers.
pub trait SurfaceOp: StageOp {
    fn apply(&mut self, input: &Artifact) -> Result<Artifact>;
}

/// A texturing stage: builds or layers raster maps at a given resolution.
pub trait TextureOp: StageOp {
    fn apply(&mut self, input: &Artifact, resolution: usize) -> Result<Artifact>;
}

/// The closed set of stage kinds, each carrying its leaf operation.
pub enum StageKind {
    Generator(Box<dyn GeneratorOp>),
    Modifier(Box<dyn SurfaceOp>),
    Parameterizer(Box<dyn SurfaceOp>),
    TextureGenerator(Box<dyn TextureOp>),
    TextureAdder(Box<dyn TextureOp>),
}

impl StageKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            StageKind::Generator(_) => "generator",
            StageKind::Modifier(_) => "modifier",
            StageKind::Parameterizer(_) => "parameterizer",
            StageKind::TextureGenerator(_) => "texture-generator",
            StageKind::TextureAdder(_) => "texture-adder",
        }
    }

    fn op_name(&self) -> &str {
        match self {
            StageKind::Generator(op) => op.name(),
            StageKind::Modifier(op) | StageKind::Parameterizer(op) => op.name(),
            StageKind::TextureGenerator(op) | StageKind::TextureAdder(op) => op.name(),
        }
    }
}

/// Pipeline-unique stage identity, stable across reordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(pub u64);

/// One unit in the pipeline sequence: a leaf operation plus its
/// change-tracking state and cached output.
pub struct Stage {
    id: StageId,
    kind: StageKind,
    changed: bool,
    first_run: bool,
    disabled: bool,
    cache: Option<Arc<Artifact>>,
    recomputes: u64,
}

impl Stage {
    pub(crate) fn new(id: StageId, kind: StageKind) -> Self {
        Self {
            id,
            kind,
            changed: false,
            first_run: true,
            disabled: false,
            cache: None,
            recomputes: 0,
        }
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.kind.op_name()
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Marks this stage dirty (or clean). Called by whoever edited a
    /// parameter; the core does not auto-detect writes.
    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Enables or disables this stage. Only modifiers and texture adders can
    /// be disabled; other kinds warn and ignore the request.
    pub fn set_disabled(&mut self, disabled: bool) {
        match self.kind {
            StageKind::Modifier(_) | StageKind::TextureAdder(_) => self.disabled = disabled,
            _ => warn!("a {} cannot be disabled", self.kind.kind_name()),
        }
    }

    /// Modifiers and texture adders are freely reorderable; the three
    /// singleton kinds are fixed in place.
    pub fn is_moveable(&self) -> bool {
        matches!(
            self.kind,
            StageKind::Modifier(_) | StageKind::TextureAdder(_)
        )
    }

    pub fn is_removable(&self) -> bool {
        matches!(
            self.kind,
            StageKind::Modifier(_) | StageKind::TextureAdder(_)
        )
    }

    /// How many times this stage actually recomputed (cache misses included,
    /// cache reuse and disabled pass-throughs excluded).
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    pub fn config(&self) -> &Configuration {
        match &self.kind {
            StageKind::Generator(op) => op.config(),
            StageKind::Modifier(op) | StageKind::Parameterizer(op) => op.config(),
            StageKind::TextureGenerator(op) | StageKind::TextureAdder(op) => op.config(),
        }
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        match &mut self.kind {
            StageKind::Generator(op) => op.config_mut(),
            StageKind::Modifier(op) | StageKind::Parameterizer(op) => op.config_mut(),
            StageKind::TextureGenerator(op) | StageKind::TextureAdder(op) => op.config_mut(),
        }
    }

    /// Executes one tick of this stage and reports whether its output
    /// differs from the previous tick (a recomputation, or the first
    /// pass-through after disablement). A failed recomputation keeps the
    /// previous cache and leaves the stage marked changed, so the next tick
    /// retries.
    pub(crate) fn run(
        &mut self,
        input: Option<&Arc<Artifact>>,
        resolution: usize,
    ) -> Result<(Arc<Artifact>, bool)> {
        let first = self.first_run;
        self.first_run = false;

        let needs_input = !matches!(self.kind, StageKind::Generator(_));
        let input = if needs_input {
            Some(input.ok_or_else(|| {
                Error::Other(format!(
                    "{} '{}' ran without an upstream artifact",
                    self.kind.kind_name(),
                    self.kind.op_name()
                ))
            })?)
        } else {
            None
        };

        // Disabled stages are transparent, not absent: the previous artifact
        // passes through untouched. The cache is taken, so a re-enable has to
        // recompute, and the first pass-through after the toggle reports an
        // output change to its downstream consumer.
        if self.disabled {
            if let Some(input) = input {
                let became_transparent = self.cache.take().is_some();
                return Ok((Arc::clone(input), became_transparent));
            }
        }

        if !self.changed && !first && self.cache.is_some() {
            return Ok((Arc::clone(self.cache.as_ref().unwrap()), false));
        }

        let computed = match (&mut self.kind, input) {
            (StageKind::Generator(op), _) => op.generate(),
            (StageKind::Modifier(op) | StageKind::Parameterizer(op), Some(input)) => {
                op.apply(input)
            }
            (StageKind::TextureGenerator(op) | StageKind::TextureAdder(op), Some(input)) => {
                op.apply(input, resolution)
            }
            _ => unreachable!("non-generator input checked above"),
        };

        match computed {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                self.cache = Some(Arc::clone(&artifact));
                self.changed = false;
                self.recomputes += 1;
                Ok((artifact, true))
            }
            Err(e) => {
                self.changed = true;
                Err(Error::StageFailed {
                    name: self.kind.op_name().to_owned(),
                    message: e.to_string(),
                })
            }
        }
    }
}
