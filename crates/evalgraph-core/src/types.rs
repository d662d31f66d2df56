use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// # Panics
            ///
            /// If `index` does not fit in a `u32`.
            pub const fn from_index(index: usize) -> Self {
                match Self::try_from_index(index) {
                    Some(id) => id,
                    None => panic!("node table exceeds u32::MAX entries"),
                }
            }

            pub const fn try_from_index(index: usize) -> Option<Self> {
                if index > u32::MAX as usize {
                    None
                } else {
                    Some(Self(index as u32))
                }
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

index_handle!(
    /// Handle of an operation node inside its graph's operation table.
    OperationId,
    "op"
);
index_handle!(
    /// Handle of a component node inside its graph's component table.
    ComponentId,
    "component"
);
index_handle!(
    /// Handle of an entity node inside its graph's entity table.
    EntityId,
    "entity"
);

/// What an operation computes. Only a few kinds carry behaviour in the
/// propagation engine; the rest exist so policy tables can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Noop,
    Parameters,
    Animation,
    TransformLocal,
    TransformParent,
    TransformFinal,
    GeometryEval,
    ShadingEval,
    PoseInit,
    PoseIkSolver,
    PoseDone,
    BoneLocal,
    BonePoseParent,
    BoneDone,
    CopyOnWrite,
    ParticleSystemEval,
    ParticleSettingsEval,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Noop => "noop",
            OperationKind::Parameters => "parameters",
            OperationKind::Animation => "animation",
            OperationKind::TransformLocal => "transform_local",
            OperationKind::TransformParent => "transform_parent",
            OperationKind::TransformFinal => "transform_final",
            OperationKind::GeometryEval => "geometry_eval",
            OperationKind::ShadingEval => "shading_eval",
            OperationKind::PoseInit => "pose_init",
            OperationKind::PoseIkSolver => "pose_ik_solver",
            OperationKind::PoseDone => "pose_done",
            OperationKind::BoneLocal => "bone_local",
            OperationKind::BonePoseParent => "bone_pose_parent",
            OperationKind::BoneDone => "bone_done",
            OperationKind::CopyOnWrite => "copy_on_write",
            OperationKind::ParticleSystemEval => "particle_system_eval",
            OperationKind::ParticleSettingsEval => "particle_settings_eval",
        };
        f.write_str(s)
    }
}

/// Evaluation aspect a component groups operations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Parameters,
    Animation,
    Transform,
    Geometry,
    Shading,
    EvalPose,
    Bone,
    CopyOnWrite,
    ParticleSystem,
    ParticleSettings,
}

impl ComponentKind {
    /// Whether components of this kind read from the entity's copy-on-write
    /// proxy, and so invalidate it when they change.
    pub fn depends_on_cow(self) -> bool {
        !matches!(self, ComponentKind::CopyOnWrite)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Parameters => "parameters",
            ComponentKind::Animation => "animation",
            ComponentKind::Transform => "transform",
            ComponentKind::Geometry => "geometry",
            ComponentKind::Shading => "shading",
            ComponentKind::EvalPose => "eval_pose",
            ComponentKind::Bone => "bone",
            ComponentKind::CopyOnWrite => "copy_on_write",
            ComponentKind::ParticleSystem => "particle_system",
            ComponentKind::ParticleSettings => "particle_settings",
        };
        f.write_str(s)
    }
}

/// Key of a component inside its entity. Most kinds occur once per entity and
/// use an empty name; bones are keyed by bone name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub kind: ComponentKind,
    pub name: String,
}

impl ComponentKey {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: String::new(),
        }
    }

    pub fn named(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl From<ComponentKind> for ComponentKey {
    fn from(kind: ComponentKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}[{}]", self.kind, self.name)
        }
    }
}

/// Per-operation flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OperationFlags(u8);

impl OperationFlags {
    /// Operation must be re-evaluated in the coming evaluation.
    pub const NEEDS_UPDATE: Self = Self(1 << 0);
    /// Operation was tagged by an external change rather than by propagation.
    pub const DIRECTLY_MODIFIED: Self = Self(1 << 1);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for OperationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OperationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Progress of a component within one flush. Only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentState {
    #[default]
    None,
    Scheduled,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_flags_insert_and_remove() {
        let mut flags = OperationFlags::empty();
        assert!(flags.is_empty());

        flags.insert(OperationFlags::NEEDS_UPDATE);
        assert!(flags.contains(OperationFlags::NEEDS_UPDATE));
        assert!(!flags.contains(OperationFlags::DIRECTLY_MODIFIED));

        flags |= OperationFlags::DIRECTLY_MODIFIED;
        assert!(flags.contains(OperationFlags::NEEDS_UPDATE | OperationFlags::DIRECTLY_MODIFIED));

        flags.remove(OperationFlags::NEEDS_UPDATE | OperationFlags::DIRECTLY_MODIFIED);
        assert!(flags.is_empty());
    }

    #[test]
    fn component_state_is_ordered() {
        assert!(ComponentState::None < ComponentState::Scheduled);
        assert!(ComponentState::Scheduled < ComponentState::Done);
        assert_eq!(ComponentState::default(), ComponentState::None);
    }

    #[test]
    fn only_copy_on_write_is_independent_of_the_proxy() {
        assert!(!ComponentKind::CopyOnWrite.depends_on_cow());
        assert!(ComponentKind::Geometry.depends_on_cow());
        assert!(ComponentKind::Bone.depends_on_cow());
    }

    #[test]
    fn component_key_display() {
        assert_eq!(ComponentKey::new(ComponentKind::EvalPose).to_string(), "eval_pose");
        assert_eq!(
            ComponentKey::named(ComponentKind::Bone, "forearm").to_string(),
            "bone[forearm]"
        );
        assert_eq!(OperationId::from_index(3).to_string(), "op#3");
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn handles_past_u32_range_are_refused() {
        let last = u32::MAX as usize;
        assert_eq!(ComponentId::try_from_index(last).map(ComponentId::index), Some(last));
        assert_eq!(ComponentId::try_from_index(last + 1), None);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "exceeds u32::MAX")]
    fn from_index_panics_instead_of_wrapping() {
        let _ = EntityId::from_index(u32::MAX as usize + 1);
    }
}
