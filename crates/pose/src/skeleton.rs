use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use skinview_common::BONE_COUNT;

/// Fixed enumeration of avatar bones. The discriminant is the bone's slot in
/// the pose buffer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BoneId {
    Root = 0,
    Body,
    Head,
    Ears,
    RightArm,
    LeftArm,
    RightLeg,
    LeftLeg,
    Cape,
    Elytra,
    LeftWing,
    RightWing,
}

impl BoneId {
    /// All bones in slot order. This order is also parent-before-child for
    /// the standard skeleton.
    pub const ALL: [BoneId; BONE_COUNT] = [
        BoneId::Root,
        BoneId::Body,
        BoneId::Head,
        BoneId::Ears,
        BoneId::RightArm,
        BoneId::LeftArm,
        BoneId::RightLeg,
        BoneId::LeftLeg,
        BoneId::Cape,
        BoneId::Elytra,
        BoneId::LeftWing,
        BoneId::RightWing,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            BoneId::Root => "root",
            BoneId::Body => "body",
            BoneId::Head => "head",
            BoneId::Ears => "ears",
            BoneId::RightArm => "right_arm",
            BoneId::LeftArm => "left_arm",
            BoneId::RightLeg => "right_leg",
            BoneId::LeftLeg => "left_leg",
            BoneId::Cape => "cape",
            BoneId::Elytra => "elytra",
            BoneId::LeftWing => "left_wing",
            BoneId::RightWing => "right_wing",
        }
    }
}

/// Body model variant. Only the arms differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinVariant {
    #[default]
    Classic,
    Slim,
}

impl SkinVariant {
    pub const fn arm_width(self) -> f32 {
        match self {
            SkinVariant::Classic => 4.0,
            SkinVariant::Slim => 3.0,
        }
    }

    /// Distance of the arm origin from the body's center line.
    pub const fn arm_offset_x(self) -> f32 {
        match self {
            SkinVariant::Classic => 6.0,
            SkinVariant::Slim => 5.5,
        }
    }
}

/// Which wing of the elytra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WingSide {
    Left,
    Right,
}

/// Folded elytra pose held while no animation drives the wings.
pub fn wing_rest_rotation(side: WingSide) -> Quat {
    let spread = 15.0_f32.to_radians();
    match side {
        WingSide::Left => Quat::from_euler(EulerRot::XYZ, spread, 0.0, spread),
        WingSide::Right => Quat::from_euler(EulerRot::XYZ, spread, 0.0, -spread),
    }
}

/// A node of the skeleton tree: rest pose plus the animated deltas.
///
/// Identity and parent are fixed at construction; the tree only changes
/// through [`Skeleton::from_bones`].
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    id: BoneId,
    parent: Option<BoneId>,
    /// Translation from the parent's origin.
    pub rest_position: Vec3,
    /// Rotation center in the bone's local frame.
    pub pivot: Vec3,
    /// Extent of the geometry attached to this bone.
    pub size: Vec3,
    /// Rotation restored by [`Bone::reset`].
    pub default_rotation: Quat,
    pub rotation: Quat,
    pub position_offset: Vec3,
}

impl Bone {
    pub fn new(id: BoneId, parent: Option<BoneId>, rest_position: Vec3) -> Self {
        Self {
            id,
            parent,
            rest_position,
            pivot: Vec3::ZERO,
            size: Vec3::ZERO,
            default_rotation: Quat::IDENTITY,
            rotation: Quat::IDENTITY,
            position_offset: Vec3::ZERO,
        }
    }

    pub fn id(&self) -> BoneId {
        self.id
    }

    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    pub fn with_pivot(mut self, pivot: Vec3) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_size(mut self, size: Vec3) -> Self {
        self.size = size;
        self
    }

    /// Set the rest rotation; the current rotation starts there too.
    pub fn with_default_rotation(mut self, rotation: Quat) -> Self {
        self.default_rotation = rotation;
        self.rotation = rotation;
        self
    }

    /// Return to the rest pose.
    pub fn reset(&mut self) {
        self.rotation = self.default_rotation;
        self.position_offset = Vec3::ZERO;
    }

    /// `T(rest + offset) * T(pivot) * R(rotation) * T(-pivot)`.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.rest_position + self.position_offset)
            * Mat4::from_translation(self.pivot)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_translation(-self.pivot)
    }
}

/// Errors from skeleton construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkeletonError {
    #[error("bone {0:?} declared more than once")]
    Duplicate(BoneId),
    #[error("bone {0:?} is missing")]
    Missing(BoneId),
    #[error("expected exactly one root bone, found {0}")]
    RootCount(usize),
    #[error("bone {0:?} is its own parent")]
    SelfParent(BoneId),
    #[error("bone {0:?} is not reachable from the root (parent cycle)")]
    Cycle(BoneId),
}

/// The avatar skeleton: one [`Bone`] per [`BoneId`] and a traversal order in
/// which every bone follows its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
    order: Vec<BoneId>,
}

impl Skeleton {
    /// Build the standard humanoid skeleton for a variant.
    pub fn new(variant: SkinVariant) -> Self {
        Self {
            bones: standard_bones(variant),
            order: BoneId::ALL.to_vec(),
        }
    }

    /// Validate an arbitrary bone set and bake its traversal order.
    ///
    /// Bones may be given in any order; the traversal order is breadth-first
    /// from the root, siblings in slot order.
    pub fn from_bones(bones: Vec<Bone>) -> Result<Self, SkeletonError> {
        let mut slots: Vec<Option<Bone>> = vec![None; BONE_COUNT];
        for bone in bones {
            let slot = &mut slots[bone.id.index()];
            if slot.is_some() {
                return Err(SkeletonError::Duplicate(bone.id));
            }
            *slot = Some(bone);
        }

        let mut ordered = Vec::with_capacity(BONE_COUNT);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(bone) => ordered.push(bone),
                None => return Err(SkeletonError::Missing(BoneId::ALL[index])),
            }
        }

        let roots: Vec<BoneId> = ordered
            .iter()
            .filter(|b| b.parent.is_none())
            .map(|b| b.id)
            .collect();
        if roots.len() != 1 {
            return Err(SkeletonError::RootCount(roots.len()));
        }
        if let Some(bone) = ordered.iter().find(|b| b.parent == Some(b.id)) {
            return Err(SkeletonError::SelfParent(bone.id));
        }

        let mut order = Vec::with_capacity(BONE_COUNT);
        let mut visited = [false; BONE_COUNT];
        order.push(roots[0]);
        visited[roots[0].index()] = true;
        let mut cursor = 0;
        while cursor < order.len() {
            let current = order[cursor];
            for bone in &ordered {
                if bone.parent == Some(current) && !visited[bone.id.index()] {
                    visited[bone.id.index()] = true;
                    order.push(bone.id);
                }
            }
            cursor += 1;
        }

        if let Some(index) = visited.iter().position(|v| !v) {
            return Err(SkeletonError::Cycle(BoneId::ALL[index]));
        }

        Ok(Self {
            bones: ordered,
            order,
        })
    }

    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.index()]
    }

    pub fn bone_mut(&mut self, id: BoneId) -> &mut Bone {
        &mut self.bones[id.index()]
    }

    /// Bones in slot order.
    pub fn bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    /// Parent-before-child traversal order.
    pub fn order(&self) -> &[BoneId] {
        &self.order
    }

    /// Chain of ancestors, nearest first.
    pub fn ancestors(&self, id: BoneId) -> impl Iterator<Item = BoneId> + '_ {
        std::iter::successors(self.bone(id).parent, move |p| self.bone(*p).parent)
    }

    pub fn depth(&self, id: BoneId) -> usize {
        self.ancestors(id).count()
    }

    /// Reset every bone to its rest pose.
    pub fn reset_pose(&mut self) {
        for bone in &mut self.bones {
            bone.reset();
        }
    }

    /// Adjust the arm bones from one variant's dimensions to another's.
    ///
    /// Arm width and shoulder offset move by the difference between the two
    /// variants, so customized arms keep their own adjustments.
    pub fn swap_arm_variant(&mut self, from: SkinVariant, to: SkinVariant) {
        let width = to.arm_width() - from.arm_width();
        let offset = to.arm_offset_x() - from.arm_offset_x();
        for (id, side) in [(BoneId::RightArm, -1.0), (BoneId::LeftArm, 1.0)] {
            let arm = self.bone_mut(id);
            arm.size.x += width;
            arm.rest_position.x += side * offset;
        }
    }

    /// True when no bone deviates from its rest pose.
    pub fn is_at_rest(&self) -> bool {
        self.bones
            .iter()
            .all(|b| b.rotation == b.default_rotation && b.position_offset == Vec3::ZERO)
    }
}

/// Bones of the standard humanoid, in slot order. Units are skin pixels,
/// Y up, facing +Z; the feet stand on the root's origin.
pub fn standard_bones(variant: SkinVariant) -> Vec<Bone> {
    let arm_x = variant.arm_offset_x();
    let arm_size = Vec3::new(variant.arm_width(), 12.0, 4.0);
    let shoulder = Vec3::new(0.0, -2.0, 0.0);
    let wing_size = Vec3::new(12.0, 22.0, 4.0);

    vec![
        Bone::new(BoneId::Root, None, Vec3::ZERO),
        Bone::new(BoneId::Body, Some(BoneId::Root), Vec3::new(0.0, 12.0, 0.0))
            .with_size(Vec3::new(8.0, 12.0, 4.0)),
        Bone::new(BoneId::Head, Some(BoneId::Body), Vec3::new(0.0, 12.0, 0.0))
            .with_size(Vec3::new(8.0, 8.0, 8.0)),
        Bone::new(BoneId::Ears, Some(BoneId::Head), Vec3::new(0.0, 8.0, 0.0))
            .with_size(Vec3::new(14.0, 7.0, 1.0)),
        Bone::new(BoneId::RightArm, Some(BoneId::Body), Vec3::new(-arm_x, 12.0, 0.0))
            .with_pivot(shoulder)
            .with_size(arm_size),
        Bone::new(BoneId::LeftArm, Some(BoneId::Body), Vec3::new(arm_x, 12.0, 0.0))
            .with_pivot(shoulder)
            .with_size(arm_size),
        Bone::new(BoneId::RightLeg, Some(BoneId::Root), Vec3::new(-2.0, 12.0, 0.0))
            .with_size(Vec3::new(4.0, 12.0, 4.0)),
        Bone::new(BoneId::LeftLeg, Some(BoneId::Root), Vec3::new(2.0, 12.0, 0.0))
            .with_size(Vec3::new(4.0, 12.0, 4.0)),
        Bone::new(BoneId::Cape, Some(BoneId::Body), Vec3::new(0.0, 12.0, -2.0))
            .with_size(Vec3::new(10.0, 16.0, 1.0)),
        Bone::new(BoneId::Elytra, Some(BoneId::Body), Vec3::new(0.0, 12.0, -2.0)),
        Bone::new(BoneId::LeftWing, Some(BoneId::Elytra), Vec3::new(5.0, 0.0, 0.0))
            .with_pivot(Vec3::new(-5.0, 0.0, 0.0))
            .with_size(wing_size)
            .with_default_rotation(wing_rest_rotation(WingSide::Left)),
        Bone::new(BoneId::RightWing, Some(BoneId::Elytra), Vec3::new(-5.0, 0.0, 0.0))
            .with_pivot(Vec3::new(5.0, 0.0, 0.0))
            .with_size(wing_size)
            .with_default_rotation(wing_rest_rotation(WingSide::Right)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parent_first(skeleton: &Skeleton) {
        let order = skeleton.order();
        assert_eq!(order.len(), BONE_COUNT);
        for (pos, id) in order.iter().enumerate() {
            if let Some(parent) = skeleton.bone(*id).parent() {
                let parent_pos = order.iter().position(|b| *b == parent).unwrap();
                assert!(parent_pos < pos, "{id:?} precedes its parent {parent:?}");
            }
        }
    }

    #[test]
    fn bone_ids_match_slots() {
        for (i, id) in BoneId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(BoneId::from_index(i), Some(*id));
        }
        assert_eq!(BoneId::from_index(BONE_COUNT), None);
    }

    #[test]
    fn standard_skeleton_is_parent_first() {
        for variant in [SkinVariant::Classic, SkinVariant::Slim] {
            assert_parent_first(&Skeleton::new(variant));
        }
    }

    #[test]
    fn standard_bones_pass_validation() {
        for variant in [SkinVariant::Classic, SkinVariant::Slim] {
            let validated = Skeleton::from_bones(standard_bones(variant)).unwrap();
            assert_parent_first(&validated);
            assert_eq!(validated.order()[0], BoneId::Root);
        }
    }

    #[test]
    fn shuffled_bones_get_parent_first_order() {
        let mut bones = standard_bones(SkinVariant::Classic);
        bones.reverse();
        let skeleton = Skeleton::from_bones(bones).unwrap();
        assert_parent_first(&skeleton);
    }

    #[test]
    fn variants_differ_only_in_arms() {
        let classic = Skeleton::new(SkinVariant::Classic);
        let slim = Skeleton::new(SkinVariant::Slim);
        for id in BoneId::ALL {
            let (a, b) = (classic.bone(id), slim.bone(id));
            match id {
                BoneId::RightArm | BoneId::LeftArm => {
                    assert_ne!(a.size.x, b.size.x);
                    assert_ne!(a.rest_position.x, b.rest_position.x);
                    assert_eq!(a.rest_position.y, b.rest_position.y);
                }
                _ => assert_eq!(a, b),
            }
        }
    }

    #[test]
    fn swapping_arm_variant_matches_standard_skeleton() {
        let mut skeleton = Skeleton::new(SkinVariant::Classic);
        skeleton.swap_arm_variant(SkinVariant::Classic, SkinVariant::Slim);
        assert_eq!(skeleton, Skeleton::new(SkinVariant::Slim));
        skeleton.swap_arm_variant(SkinVariant::Slim, SkinVariant::Classic);
        assert_eq!(skeleton, Skeleton::new(SkinVariant::Classic));
    }

    #[test]
    fn posing_through_bone_mut_keeps_topology() {
        let mut skeleton = Skeleton::new(SkinVariant::Classic);
        let order = skeleton.order().to_vec();
        let ears = skeleton.bone_mut(BoneId::Ears);
        ears.rotation = Quat::from_rotation_x(1.0);
        ears.rest_position = Vec3::ONE;
        assert_eq!(skeleton.bone(BoneId::Ears).id(), BoneId::Ears);
        assert_eq!(skeleton.bone(BoneId::Ears).parent(), Some(BoneId::Head));
        assert_eq!(
            skeleton.ancestors(BoneId::Ears).collect::<Vec<_>>(),
            vec![BoneId::Head, BoneId::Body, BoneId::Root]
        );
        assert_eq!(skeleton.order(), order.as_slice());
    }

    #[test]
    fn missing_bone_rejected() {
        let mut bones = standard_bones(SkinVariant::Classic);
        bones.retain(|b| b.id != BoneId::Cape);
        assert_eq!(
            Skeleton::from_bones(bones),
            Err(SkeletonError::Missing(BoneId::Cape))
        );
    }

    #[test]
    fn duplicate_bone_rejected() {
        let mut bones = standard_bones(SkinVariant::Classic);
        bones.push(Bone::new(BoneId::Head, Some(BoneId::Body), Vec3::ZERO));
        assert_eq!(
            Skeleton::from_bones(bones),
            Err(SkeletonError::Duplicate(BoneId::Head))
        );
    }

    #[test]
    fn two_roots_rejected() {
        let mut bones = standard_bones(SkinVariant::Classic);
        bones[BoneId::Cape.index()].parent = None;
        assert_eq!(
            Skeleton::from_bones(bones),
            Err(SkeletonError::RootCount(2))
        );
    }

    #[test]
    fn self_parent_rejected() {
        let mut bones = standard_bones(SkinVariant::Classic);
        bones[BoneId::Ears.index()].parent = Some(BoneId::Ears);
        assert_eq!(
            Skeleton::from_bones(bones),
            Err(SkeletonError::SelfParent(BoneId::Ears))
        );
    }

    #[test]
    fn cycle_rejected() {
        let mut bones = standard_bones(SkinVariant::Classic);
        bones[BoneId::Head.index()].parent = Some(BoneId::Ears);
        assert!(matches!(
            Skeleton::from_bones(bones),
            Err(SkeletonError::Cycle(_))
        ));
    }

    #[test]
    fn reset_restores_default_rotation() {
        let mut skeleton = Skeleton::new(SkinVariant::Classic);
        assert!(skeleton.is_at_rest());
        skeleton.bone_mut(BoneId::LeftWing).rotation = Quat::IDENTITY;
        skeleton.bone_mut(BoneId::Head).position_offset = Vec3::X;
        assert!(!skeleton.is_at_rest());

        skeleton.reset_pose();
        assert!(skeleton.is_at_rest());
        assert_eq!(
            skeleton.bone(BoneId::LeftWing).rotation,
            wing_rest_rotation(WingSide::Left)
        );
        assert_eq!(skeleton.bone(BoneId::Head).rotation, Quat::IDENTITY);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let skeleton = Skeleton::new(SkinVariant::Classic);
        let chain: Vec<BoneId> = skeleton.ancestors(BoneId::Ears).collect();
        assert_eq!(chain, vec![BoneId::Head, BoneId::Body, BoneId::Root]);
        assert_eq!(skeleton.depth(BoneId::Root), 0);
    }

    #[test]
    fn bone_id_serde_names() {
        let json = serde_json::to_string(&BoneId::RightArm).unwrap();
        assert_eq!(json, "\"right_arm\"");
        assert_eq!(BoneId::RightArm.name(), "right_arm");
    }
}
