//! Externally editable parameter cells for stages and nodes.
//!
//! A [`Configuration`] is an ordered mapping from a human-readable parameter
//! name to a typed, bounds-checked [`Parameter`] cell. The core exposes these
//! cells for an external editor or a parameter file to mutate; it does not
//! auto-detect writes. Whoever edits a value is responsible for marking the
//! owning stage changed afterwards.
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One stop of a color gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position in [0, 1].
    pub t: f32,
    pub color: [f32; 3],
}

/// A typed parameter value cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    Int { value: i32, min: i32, max: i32 },
    Float { value: f32, min: f32, max: f32 },
    Bool { value: bool },
    Vec3 { value: [f32; 3] },
    /// Stops sorted by `t`, evaluated with linear interpolation.
    Gradient { stops: Vec<GradientStop> },
    /// Single-choice enumeration over named options.
    Choice { options: Vec<String>, selected: usize },
}

impl Parameter {
    pub fn float(value: f32, min: f32, max: f32) -> Self {
        Parameter::Float { value, min, max }
    }

    pub fn int(value: i32, min: i32, max: i32) -> Self {
        Parameter::Int { value, min, max }
    }

    pub fn bool(value: bool) -> Self {
        Parameter::Bool { value }
    }

    pub fn vec3(value: Vec3) -> Self {
        Parameter::Vec3 {
            value: value.to_array(),
        }
    }

    pub fn choice(options: &[&str], selected: usize) -> Self {
        Parameter::Choice {
            options: options.iter().map(|s| s.to_string()).collect(),
            selected,
        }
    }

    /// Writes a float value, clamped to the cell's bounds. Ignored with a
    /// warning when the cell is not a float.
    pub fn set_float(&mut self, new: f32) {
        match self {
            Parameter::Float { value, min, max } => *value = new.clamp(*min, *max),
            _ => warn!("ignoring float write into non-float parameter"),
        }
    }

    /// Writes an int value, clamped to the cell's bounds. Ignored with a
    /// warning when the cell is not an int.
    pub fn set_int(&mut self, new: i32) {
        match self {
            Parameter::Int { value, min, max } => *value = new.clamp(*min, *max),
            _ => warn!("ignoring int write into non-int parameter"),
        }
    }

    /// Selects an option of a choice cell, clamped to the option count.
    /// Ignored with a warning when the cell is not a choice.
    pub fn set_choice(&mut self, index: usize) {
        match self {
            Parameter::Choice { options, selected } => {
                *selected = index.min(options.len().saturating_sub(1));
            }
            _ => warn!("ignoring choice write into non-choice parameter"),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Parameter::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Parameter::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Parameter::Bool { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Parameter::Vec3 { value } => Some(Vec3::from_array(*value)),
            _ => None,
        }
    }

    /// Selected option index for a choice cell.
    pub fn as_choice(&self) -> Option<usize> {
        match self {
            Parameter::Choice { options, selected } => Some((*selected).min(options.len().saturating_sub(1))),
            _ => None,
        }
    }

    /// Evaluates a gradient cell at `t`, linearly interpolating between
    /// stops and clamping outside the stop range.
    pub fn sample_gradient(&self, t: f32) -> Option<[f32; 3]> {
        let Parameter::Gradient { stops } = self else {
            return None;
        };
        let first = stops.first()?;
        if t <= first.t {
            return Some(first.color);
        }
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = (b.t - a.t).max(f32::EPSILON);
                let k = (t - a.t) / span;
                return Some([
                    a.color[0] + (b.color[0] - a.color[0]) * k,
                    a.color[1] + (b.color[1] - a.color[1]) * k,
                    a.color[2] + (b.color[2] - a.color[2]) * k,
                ]);
            }
        }
        stops.last().map(|s| s.color)
    }
}

/// Whether a parameter group is currently active. Replaces the "default
/// always-true lambda" pattern with an explicit closed set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ActiveWhen {
    #[default]
    AlwaysActive,
    /// Active only while the named boolean parameter is true.
    ConditionalOn(String),
}

/// An ordered mapping from parameter name to value cell.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    entries: Vec<(String, Parameter)>,
    pub active_when: ActiveWhen,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, parameter: Parameter) -> &mut Self {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = parameter;
        } else {
            self.entries.push((name, parameter));
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.insert(name, parameter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names and cells in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Float value of a parameter, or `default` when absent or mistyped.
    pub fn float_or(&self, name: &str, default: f32) -> f32 {
        self.get(name).and_then(Parameter::as_float).unwrap_or(default)
    }

    pub fn int_or(&self, name: &str, default: i32) -> i32 {
        self.get(name).and_then(Parameter::as_int).unwrap_or(default)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(Parameter::as_bool).unwrap_or(default)
    }

    pub fn vec3_or(&self, name: &str, default: Vec3) -> Vec3 {
        self.get(name).and_then(Parameter::as_vec3).unwrap_or(default)
    }

    /// Whether this group is currently active, resolving a conditional
    /// predicate against the group's own boolean parameters.
    pub fn is_active(&self) -> bool {
        match &self.active_when {
            ActiveWhen::AlwaysActive => true,
            ActiveWhen::ConditionalOn(flag) => self.bool_or(flag, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_writes_are_clamped() {
        let mut p = Parameter::float(0.5, 0.0, 1.0);
        p.set_float(7.0);
        assert_eq!(p.as_float(), Some(1.0));
        p.set_float(-3.0);
        assert_eq!(p.as_float(), Some(0.0));
    }

    #[test]
    fn mistyped_write_is_ignored() {
        let mut p = Parameter::bool(true);
        p.set_float(1.0);
        assert_eq!(p.as_bool(), Some(true));
    }

    #[test]
    fn insert_replaces_without_reordering() {
        let mut config = Configuration::new();
        config.insert("radius", Parameter::float(1.0, 0.0, 10.0));
        config.insert("rows", Parameter::int(16, 2, 256));
        config.insert("radius", Parameter::float(2.0, 0.0, 10.0));

        let names: Vec<&str> = config.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["radius", "rows"]);
        assert_eq!(config.float_or("radius", 0.0), 2.0);
    }

    #[test]
    fn typed_defaults_apply_when_missing() {
        let config = Configuration::new();
        assert_eq!(config.float_or("missing", 0.25), 0.25);
        assert_eq!(config.int_or("missing", 3), 3);
        assert!(config.bool_or("missing", true));
    }

    #[test]
    fn choice_selection_is_clamped_to_the_options() {
        let mut p = Parameter::choice(&["add", "multiply"], 0);
        p.set_choice(1);
        assert_eq!(p.as_choice(), Some(1));
        p.set_choice(7);
        assert_eq!(p.as_choice(), Some(1));

        let out_of_range = Parameter::choice(&["only"], 9);
        assert_eq!(out_of_range.as_choice(), Some(0));
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let p = Parameter::Gradient {
            stops: vec![
                GradientStop {
                    t: 0.0,
                    color: [0.0, 0.0, 0.0],
                },
                GradientStop {
                    t: 1.0,
                    color: [1.0, 0.5, 0.0],
                },
            ],
        };
        let mid = p.sample_gradient(0.5).unwrap();
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[1] - 0.25).abs() < 1e-6);
        assert_eq!(p.sample_gradient(-1.0).unwrap(), [0.0, 0.0, 0.0]);
        assert_eq!(p.sample_gradient(2.0).unwrap(), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn conditional_groups_resolve_their_flag() {
        let mut config = Configuration::new().with("enabled", Parameter::bool(false));
        config.active_when = ActiveWhen::ConditionalOn("enabled".into());
        assert!(!config.is_active());
        config.get_mut("enabled").unwrap().set_int(1); // mistyped, ignored
        assert!(!config.is_active());
        *config.get_mut("enabled").unwrap() = Parameter::bool(true);
        assert!(config.is_active());
    }
}
