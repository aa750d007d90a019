// tarmac_core/src/context.rs

use crate::config::{BehaviorKind, BehaviorProfile, GroundMaterial};

/// Immutable tables shared by every vehicle in a scene.
///
/// Held behind an `Arc` so vehicles never copy or mutate it.
#[derive(Debug, Clone)]
pub struct VehicleContext {
    ground_materials: Vec<GroundMaterial>,
    behaviors: Vec<BehaviorProfile>,
}

impl Default for VehicleContext {
    fn default() -> Self {
        Self::new(GroundMaterial::standard_set(), BehaviorProfile::presets())
    }
}

impl VehicleContext {
    pub fn new(ground_materials: Vec<GroundMaterial>, behaviors: Vec<BehaviorProfile>) -> Self {
        Self {
            ground_materials,
            behaviors,
        }
    }

    pub fn ground_materials(&self) -> &[GroundMaterial] {
        &self.ground_materials
    }

    /// The material at `index`, falling back to the default (index 0) for
    /// unknown indices reported mid-run.
    pub fn ground(&self, index: usize) -> Option<&GroundMaterial> {
        self.ground_materials
            .get(index)
            .or_else(|| self.ground_materials.first())
    }

    pub fn behavior(&self, kind: BehaviorKind) -> Option<&BehaviorProfile> {
        self.behaviors.iter().find(|b| b.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ground_index_falls_back_to_default() {
        let ctx = VehicleContext::default();
        assert_eq!(ctx.ground(99).map(|g| g.name.as_str()), Some("asphalt"));
        assert_eq!(ctx.ground(2).map(|g| g.name.as_str()), Some("sand"));
    }

    #[test]
    fn empty_context_has_no_ground() {
        let ctx = VehicleContext::new(Vec::new(), Vec::new());
        assert!(ctx.ground(0).is_none());
        assert!(ctx.behavior(BehaviorKind::Drift).is_none());
    }
}
