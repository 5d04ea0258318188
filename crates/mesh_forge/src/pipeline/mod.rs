//! Pipeline orchestration: the fixed-shape stage sequence and its
//! dependency-aware incremental recomputation.
//!
//! A [`Pipeline`] exclusively owns one generator, an ordered modifier list,
//! one parameterizer, one texture generator, and an ordered texture-adder
//! list. [`Pipeline::current_artifact`] pulls the artifact through that
//! sequence once, re-running exactly the stages whose inputs changed: each
//! stage's "did I actually recompute" signal is forwarded as the next
//! enabled stage's changed flag, because a structural change upstream
//! invalidates every positional assumption downstream.
pub mod generators;
pub mod modifiers;
pub mod stage;
pub mod texturing;

use std::sync::Arc;

use tracing::{debug, info};

pub use crate::pipeline::stage::{
    GeneratorOp, Stage, StageId, StageKind, StageOp, SurfaceOp, TextureOp,
};
use crate::artifact::Artifact;
use crate::error::{Error, Result};

/// Default square texture resolution.
pub const DEFAULT_TEXTURE_RESOLUTION: usize = 512;

/// The fixed-shape stage pipeline.
pub struct Pipeline {
    generator: Stage,
    modifiers: Vec<Stage>,
    parameterizer: Stage,
    texture_generator: Stage,
    texture_adders: Vec<Stage>,
    texture_resolution: usize,
    next_id: u64,
}

impl Pipeline {
    /// Assembles a pipeline around the three mandatory singleton stages.
    pub fn new(
        generator: Box<dyn GeneratorOp>,
        parameterizer: Box<dyn SurfaceOp>,
        texture_generator: Box<dyn TextureOp>,
    ) -> Self {
        let pipeline = Self {
            generator: Stage::new(StageId(0), StageKind::Generator(generator)),
            modifiers: Vec::new(),
            parameterizer: Stage::new(StageId(1), StageKind::Parameterizer(parameterizer)),
            texture_generator: Stage::new(
                StageId(2),
                StageKind::TextureGenerator(texture_generator),
            ),
            texture_adders: Vec::new(),
            texture_resolution: DEFAULT_TEXTURE_RESOLUTION,
            next_id: 3,
        };
        info!(
            "assembled pipeline: {} / {} / {}",
            pipeline.generator.name(),
            pipeline.parameterizer.name(),
            pipeline.texture_generator.name()
        );
        pipeline
    }

    fn alloc_id(&mut self) -> StageId {
        let id = StageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Replaces the generator. The fresh stage starts in its first run, so
    /// the next tick recomputes the whole chain.
    pub fn set_generator(&mut self, op: Box<dyn GeneratorOp>) -> StageId {
        let id = self.alloc_id();
        self.generator = Stage::new(id, StageKind::Generator(op));
        id
    }

    /// Replaces the parameterizer.
    pub fn set_parameterizer(&mut self, op: Box<dyn SurfaceOp>) -> StageId {
        let id = self.alloc_id();
        self.parameterizer = Stage::new(id, StageKind::Parameterizer(op));
        id
    }

    /// Replaces the texture generator.
    pub fn set_texture_generator(&mut self, op: Box<dyn TextureOp>) -> StageId {
        let id = self.alloc_id();
        self.texture_generator = Stage::new(id, StageKind::TextureGenerator(op));
        id
    }

    /// Appends a modifier to the end of the modifier list.
    pub fn add_modifier(&mut self, op: Box<dyn SurfaceOp>) -> StageId {
        let id = self.alloc_id();
        self.modifiers.push(Stage::new(id, StageKind::Modifier(op)));
        id
    }

    /// Appends a texture adder to the end of the adder list.
    pub fn add_texture_adder(&mut self, op: Box<dyn TextureOp>) -> StageId {
        let id = self.alloc_id();
        self.texture_adders
            .push(Stage::new(id, StageKind::TextureAdder(op)));
        id
    }

    /// Swaps a stage with its predecessor within its own list. Moving the
    /// first stage of a list is an error and leaves the order untouched.
    pub fn move_stage_up(&mut self, id: StageId) -> Result<()> {
        self.move_stage(id, -1)
    }

    /// Swaps a stage with its successor within its own list. Moving the last
    /// stage of a list is an error and leaves the order untouched.
    pub fn move_stage_down(&mut self, id: StageId) -> Result<()> {
        self.move_stage(id, 1)
    }

    fn move_stage(&mut self, id: StageId, direction: isize) -> Result<()> {
        // Identity alone does not say which list owns the stage; search the
        // modifier list first, then the adder list.
        for list in [&mut self.modifiers, &mut self.texture_adders] {
            let Some(index) = list.iter().position(|s| s.id() == id) else {
                continue;
            };
            let target = index as isize + direction;
            if target < 0 {
                return Err(Error::MoveOutOfBounds("top"));
            }
            if target as usize >= list.len() {
                return Err(Error::MoveOutOfBounds("bottom"));
            }
            list.swap(index, target as usize);
            // Both positions now see different inputs.
            list[index].set_changed(true);
            list[target as usize].set_changed(true);
            return Ok(());
        }
        if let Some(stage) = self.singleton(id) {
            return Err(Error::StageNotMoveable {
                name: stage.name().to_owned(),
            });
        }
        Err(Error::StageNotFound)
    }

    /// Removes a stage by identity from whichever list contains it.
    pub fn remove_stage(&mut self, id: StageId) -> Result<()> {
        for list in [&mut self.modifiers, &mut self.texture_adders] {
            let Some(index) = list.iter().position(|s| s.id() == id) else {
                continue;
            };
            if !list[index].is_removable() {
                return Err(Error::StageNotRemovable {
                    name: list[index].name().to_owned(),
                });
            }
            let removed = list.remove(index);
            debug!("removed {} '{}'", removed.kind_name(), removed.name());
            // The stage that inherited this position sees a different input.
            if let Some(next) = list.get_mut(index) {
                next.set_changed(true);
            } else if removed.kind_name() == "modifier" {
                self.parameterizer.set_changed(true);
            }
            return Ok(());
        }
        if let Some(stage) = self.singleton(id) {
            return Err(Error::StageNotRemovable {
                name: stage.name().to_owned(),
            });
        }
        Err(Error::StageNotFound)
    }

    fn singleton(&self, id: StageId) -> Option<&Stage> {
        [
            &self.generator,
            &self.parameterizer,
            &self.texture_generator,
        ]
        .into_iter()
        .find(|s| s.id() == id)
    }

    /// Looks up any stage by identity.
    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.singleton(id).or_else(|| {
            self.modifiers
                .iter()
                .chain(self.texture_adders.iter())
                .find(|s| s.id() == id)
        })
    }

    /// Mutable stage lookup, for flagging edits or toggling disablement.
    pub fn stage_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        [
            &mut self.generator,
            &mut self.parameterizer,
            &mut self.texture_generator,
        ]
        .into_iter()
        .chain(self.modifiers.iter_mut())
        .chain(self.texture_adders.iter_mut())
        .find(|s| s.id() == id)
    }

    pub fn generator(&self) -> &Stage {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut Stage {
        &mut self.generator
    }

    pub fn parameterizer(&self) -> &Stage {
        &self.parameterizer
    }

    pub fn texture_generator(&self) -> &Stage {
        &self.texture_generator
    }

    pub fn modifiers(&self) -> &[Stage] {
        &self.modifiers
    }

    pub fn texture_adders(&self) -> &[Stage] {
        &self.texture_adders
    }

    /// Total number of stages, singletons included.
    pub fn stage_count(&self) -> usize {
        3 + self.modifiers.len() + self.texture_adders.len()
    }

    pub fn texture_resolution(&self) -> usize {
        self.texture_resolution
    }

    /// Changes the square texture resolution and marks the texturing stages
    /// dirty; mesh stages are unaffected.
    pub fn set_texture_resolution(&mut self, resolution: usize) {
        if resolution == self.texture_resolution {
            return;
        }
        self.texture_resolution = resolution;
        self.texture_generator.set_changed(true);
        for adder in &mut self.texture_adders {
            adder.set_changed(true);
        }
    }

    /// Marks every stage changed, forcing the next tick to recompute the
    /// whole chain.
    pub fn invalidate_all(&mut self) {
        self.generator.set_changed(true);
        self.parameterizer.set_changed(true);
        self.texture_generator.set_changed(true);
        for stage in self.modifiers.iter_mut().chain(self.texture_adders.iter_mut()) {
            stage.set_changed(true);
        }
    }

    /// Sum of all stages' recompute counters.
    pub fn total_recomputes(&self) -> u64 {
        let singletons = self.generator.recompute_count()
            + self.parameterizer.recompute_count()
            + self.texture_generator.recompute_count();
        singletons
            + self
                .modifiers
                .iter()
                .chain(self.texture_adders.iter())
                .map(Stage::recompute_count)
                .sum::<u64>()
    }

    /// Computes the current output artifact, re-running exactly the stages
    /// affected by upstream changes and reusing cached output elsewhere.
    pub fn current_artifact(&mut self) -> Result<Arc<Artifact>> {
        let resolution = self.texture_resolution;

        let (mut artifact, generator_recomputed) = self.generator.run(None, resolution)?;
        // A generator change is invisible to its first consumer; force it
        // forward across the kind boundary.
        let mut upstream_changed = generator_recomputed;

        for stage in &mut self.modifiers {
            if upstream_changed && !stage.is_disabled() {
                stage.set_changed(true);
            }
            let (out, output_changed) = stage.run(Some(&artifact), resolution)?;
            if stage.is_disabled() {
                // An upstream change flows through a transparent stage; a
                // fresh toggle is itself an output change.
                upstream_changed = upstream_changed || output_changed;
            } else {
                upstream_changed = output_changed;
            }
            artifact = out;
        }

        if upstream_changed {
            self.parameterizer.set_changed(true);
        }
        let (out, recomputed) = self.parameterizer.run(Some(&artifact), resolution)?;
        artifact = out;
        upstream_changed = recomputed;

        if upstream_changed {
            self.texture_generator.set_changed(true);
        }
        let (out, recomputed) = self.texture_generator.run(Some(&artifact), resolution)?;
        artifact = out;
        upstream_changed = recomputed;

        for stage in &mut self.texture_adders {
            if upstream_changed && !stage.is_disabled() {
                stage.set_changed(true);
            }
            let (out, output_changed) = stage.run(Some(&artifact), resolution)?;
            if stage.is_disabled() {
                upstream_changed = upstream_changed || output_changed;
            } else {
                upstream_changed = output_changed;
            }
            artifact = out;
        }

        debug!(
            "tick complete: {} vertices, {} total recomputes",
            artifact.mesh.vertex_count(),
            self.total_recomputes()
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::artifact::{Mesh, TextureMaps};
    use crate::config::{Configuration, Parameter};

    struct TriangleGenerator {
        config: Configuration,
    }

    impl TriangleGenerator {
        fn boxed() -> Box<dyn GeneratorOp> {
            Box::new(Self {
                config: Configuration::new().with("size", Parameter::float(1.0, 0.0, 10.0)),
            })
        }
    }

    impl StageOp for TriangleGenerator {
        fn name(&self) -> &str {
            "triangle"
        }
        fn config(&self) -> &Configuration {
            &self.config
        }
        fn config_mut(&mut self) -> &mut Configuration {
            &mut self.config
        }
    }

    impl GeneratorOp for TriangleGenerator {
        fn generate(&mut self) -> crate::error::Result<Artifact> {
            let size = self.config.float_or("size", 1.0);
            let mut mesh = Mesh {
                positions: vec![Vec3::ZERO, Vec3::X * size, Vec3::Z * size],
                normals: Vec::new(),
                indices: vec![0, 1, 2],
                uvs: Vec::new(),
            };
            mesh.compute_normals();
            Ok(Artifact::from_mesh(mesh))
        }
    }

    struct OffsetModifier {
        config: Configuration,
        offset: Vec3,
    }

    impl OffsetModifier {
        fn boxed(offset: Vec3) -> Box<dyn SurfaceOp> {
            Box::new(Self {
                config: Configuration::new(),
                offset,
            })
        }
    }

    impl StageOp for OffsetModifier {
        fn name(&self) -> &str {
            "offset"
        }
        fn config(&self) -> &Configuration {
            &self.config
        }
        fn config_mut(&mut self) -> &mut Configuration {
            &mut self.config
        }
    }

    impl SurfaceOp for OffsetModifier {
        fn apply(&mut self, input: &Artifact) -> crate::error::Result<Artifact> {
            let mut out = input.clone();
            for p in &mut out.mesh.positions {
                *p += self.offset;
            }
            Ok(out)
        }
    }

    struct ZeroUvParameterizer {
        config: Configuration,
    }

    impl ZeroUvParameterizer {
        fn boxed() -> Box<dyn SurfaceOp> {
            Box::new(Self {
                config: Configuration::new(),
            })
        }
    }

    impl StageOp for ZeroUvParameterizer {
        fn name(&self) -> &str {
            "zero-uv"
        }
        fn config(&self) -> &Configuration {
            &self.config
        }
        fn config_mut(&mut self) -> &mut Configuration {
            &mut self.config
        }
    }

    impl SurfaceOp for ZeroUvParameterizer {
        fn apply(&mut self, input: &Artifact) -> crate::error::Result<Artifact> {
            let mut out = input.clone();
            out.mesh.uvs = vec![Vec2::ZERO; out.mesh.vertex_count()];
            Ok(out)
        }
    }

    struct NeutralMaps {
        config: Configuration,
    }

    impl NeutralMaps {
        fn boxed() -> Box<dyn TextureOp> {
            Box::new(Self {
                config: Configuration::new(),
            })
        }
    }

    impl StageOp for NeutralMaps {
        fn name(&self) -> &str {
            "neutral-maps"
        }
        fn config(&self) -> &Configuration {
            &self.config
        }
        fn config_mut(&mut self) -> &mut Configuration {
            &mut self.config
        }
    }

    impl TextureOp for NeutralMaps {
        fn apply(
            &mut self,
            input: &Artifact,
            resolution: usize,
        ) -> crate::error::Result<Artifact> {
            let mut out = input.clone();
            out.maps = Some(TextureMaps::new(resolution));
            Ok(out)
        }
    }

    fn pipeline() -> Pipeline {
        let mut p = Pipeline::new(
            TriangleGenerator::boxed(),
            ZeroUvParameterizer::boxed(),
            NeutralMaps::boxed(),
        );
        p.set_texture_resolution(4);
        p
    }

    fn counts(p: &Pipeline) -> Vec<u64> {
        let mut out = vec![p.generator().recompute_count()];
        out.extend(p.modifiers().iter().map(Stage::recompute_count));
        out.push(p.parameterizer().recompute_count());
        out.push(p.texture_generator().recompute_count());
        out.extend(p.texture_adders().iter().map(Stage::recompute_count));
        out
    }

    #[test]
    fn change_isolation_reuses_every_cache() {
        let mut p = pipeline();
        p.add_modifier(OffsetModifier::boxed(Vec3::Y));

        let first = p.current_artifact().unwrap();
        assert_eq!(counts(&p), vec![1, 1, 1, 1]);

        let second = p.current_artifact().unwrap();
        assert!(Arc::ptr_eq(&first, &second), "cached artifact is reused");
        assert_eq!(counts(&p), vec![1, 1, 1, 1], "zero recomputation work");
    }

    #[test]
    fn generator_change_propagates_through_everything() {
        let mut p = pipeline();
        p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        p.add_texture_adder(NeutralMaps::boxed());
        p.current_artifact().unwrap();

        p.generator_mut().set_changed(true);
        p.current_artifact().unwrap();
        assert_eq!(counts(&p), vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn late_change_leaves_earlier_stages_alone() {
        let mut p = pipeline();
        p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        let last = p.add_modifier(OffsetModifier::boxed(Vec3::X));
        p.current_artifact().unwrap();

        p.stage_mut(last).unwrap().set_changed(true);
        p.current_artifact().unwrap();
        // generator and first modifier untouched; last modifier onward reran.
        assert_eq!(counts(&p), vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn disabled_modifier_is_transparent() {
        let mut p = pipeline();
        let id = p.add_modifier(OffsetModifier::boxed(Vec3::Y * 5.0));
        let displaced = p.current_artifact().unwrap();
        assert_eq!(displaced.mesh.positions[0], Vec3::Y * 5.0);

        p.stage_mut(id).unwrap().set_disabled(true);
        let passthrough = p.current_artifact().unwrap();
        assert_eq!(passthrough.mesh.positions[0], Vec3::ZERO);

        // Re-enabling recomputes even without an explicit changed flag,
        // since the disabled passes never updated the cache.
        p.stage_mut(id).unwrap().set_disabled(false);
        let restored = p.current_artifact().unwrap();
        assert_eq!(restored.mesh.positions, displaced.mesh.positions);
    }

    #[test]
    fn disabling_non_disablable_kinds_is_ignored() {
        let mut p = pipeline();
        p.generator_mut().set_disabled(true);
        assert!(!p.generator().is_disabled());
    }

    #[test]
    fn upstream_change_crosses_disabled_stages() {
        let mut p = pipeline();
        let disabled = p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        let last = p.add_modifier(OffsetModifier::boxed(Vec3::X));
        p.current_artifact().unwrap();
        p.stage_mut(disabled).unwrap().set_disabled(true);
        p.current_artifact().unwrap();

        let before = p.stage(last).unwrap().recompute_count();
        p.generator_mut().set_changed(true);
        p.current_artifact().unwrap();
        assert_eq!(p.stage(last).unwrap().recompute_count(), before + 1);
    }

    #[test]
    fn boundary_moves_fail_and_preserve_order() {
        let mut p = pipeline();
        let first = p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        let second = p.add_modifier(OffsetModifier::boxed(Vec3::X));

        assert!(matches!(
            p.move_stage_up(first),
            Err(Error::MoveOutOfBounds("top"))
        ));
        assert!(matches!(
            p.move_stage_down(second),
            Err(Error::MoveOutOfBounds("bottom"))
        ));
        let order: Vec<StageId> = p.modifiers().iter().map(Stage::id).collect();
        assert_eq!(order, vec![first, second]);

        p.move_stage_up(second).unwrap();
        let order: Vec<StageId> = p.modifiers().iter().map(Stage::id).collect();
        assert_eq!(order, vec![second, first]);
    }

    #[test]
    fn singletons_cannot_be_moved_or_removed() {
        let mut p = pipeline();
        let parameterizer = p.parameterizer().id();
        let count = p.stage_count();

        assert!(matches!(
            p.remove_stage(parameterizer),
            Err(Error::StageNotRemovable { .. })
        ));
        assert!(matches!(
            p.move_stage_up(parameterizer),
            Err(Error::StageNotMoveable { .. })
        ));
        assert_eq!(p.stage_count(), count);
    }

    #[test]
    fn removing_a_modifier_dirties_the_successor() {
        let mut p = pipeline();
        let first = p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        p.add_modifier(OffsetModifier::boxed(Vec3::X));
        p.current_artifact().unwrap();

        p.remove_stage(first).unwrap();
        assert_eq!(p.stage_count(), 4);
        let after = p.current_artifact().unwrap();
        assert_eq!(after.mesh.positions[0], Vec3::X);

        assert!(matches!(
            p.remove_stage(first),
            Err(Error::StageNotFound)
        ));
    }

    #[test]
    fn replacing_the_generator_recomputes_the_chain() {
        let mut p = pipeline();
        p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        p.current_artifact().unwrap();

        p.set_generator(TriangleGenerator::boxed());
        p.current_artifact().unwrap();
        // New generator counter starts at 1; downstream stages reran.
        assert_eq!(counts(&p), vec![1, 2, 2, 2]);
    }

    #[test]
    fn resolution_changes_touch_only_texturing_stages() {
        let mut p = pipeline();
        p.add_modifier(OffsetModifier::boxed(Vec3::Y));
        p.add_texture_adder(NeutralMaps::boxed());
        p.current_artifact().unwrap();

        p.set_texture_resolution(8);
        let artifact = p.current_artifact().unwrap();
        assert_eq!(counts(&p), vec![1, 1, 1, 2, 2]);
        assert_eq!(artifact.maps.as_ref().unwrap().resolution(), 8);
    }
}
