use std::collections::HashMap;

use glam::{Vec3, Vec4};
use tracing::trace;

/// Uniform names the ray-marching shader reads. These are the binding
/// contract with the fragment shader and must not be renamed.
pub mod names {
    pub const NEAR: &str = "near";
    pub const FAR: &str = "far";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const ASPECT_RATIO: &str = "aspectRatio";
    pub const EPSILON: &str = "epsilon";
    pub const MAX_STEPS: &str = "maxSteps";
    pub const CAM_UP: &str = "camUp";
    pub const CAM_RIGHT: &str = "camRight";
    pub const CAM_FRONT: &str = "camFront";
    pub const EYE: &str = "eye";
    pub const FOCAL_LENGTH: &str = "focalLength";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Vec4,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        match self {
            UniformValue::Int(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Float(v) => dst.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec3(v) => dst.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => dst.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
        }
    }

    fn read_from(kind: UniformKind, src: &[u8]) -> Self {
        match kind {
            UniformKind::Int => UniformValue::Int(bytemuck::pod_read_unaligned(src)),
            UniformKind::Float => UniformValue::Float(bytemuck::pod_read_unaligned(src)),
            UniformKind::Vec3 => {
                UniformValue::Vec3(Vec3::from_array(bytemuck::pod_read_unaligned(src)))
            }
            UniformKind::Vec4 => {
                UniformValue::Vec4(Vec4::from_array(bytemuck::pod_read_unaligned(src)))
            }
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

/// Anything that accepts named uniform values.
pub trait UniformSink {
    fn write_uniform(&mut self, name: &str, value: UniformValue);

    fn set_uniform<V: Into<UniformValue>>(&mut self, name: &str, value: V)
    where
        Self: Sized,
    {
        self.write_uniform(name, value.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// Name -> slot table of a uniform block, usually reflected from the shaders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    slots: HashMap<String, UniformSlot>,
    size: u32,
}

impl UniformLayout {
    pub fn new(size: u32) -> Self {
        Self {
            slots: HashMap::new(),
            size,
        }
    }

    pub fn with_slot(mut self, name: &str, offset: u32, kind: UniformKind) -> Self {
        self.insert(name, UniformSlot { offset, kind });
        self
    }

    pub fn insert(&mut self, name: &str, slot: UniformSlot) {
        let end = slot.offset + slot.kind.size() as u32;
        self.size = self.size.max(end);
        self.slots.insert(name.to_string(), slot);
    }

    /// Take the slots of `other` that this layout does not know yet
    pub fn merge(&mut self, other: &UniformLayout) {
        for (name, slot) in &other.slots {
            if !self.slots.contains_key(name) {
                self.insert(name, *slot);
            }
        }
        self.size = self.size.max(other.size);
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

/// CPU staging copy of the uniform buffer.
///
/// Writes land in the staging bytes; `flush` uploads them when anything
/// changed. Names missing from the layout, or written with the wrong kind,
/// are ignored the same way a driver ignores an inactive uniform location.
pub struct UniformBlock {
    layout: UniformLayout,
    staging: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        // uniform bindings must be at least 16 bytes and 16-byte sized
        let size = (layout.size().max(16) as usize).next_multiple_of(16);
        Self {
            layout,
            staging: vec![0; size],
            dirty: true,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.staging
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        let slot = self.layout.slot(name)?;
        let start = slot.offset as usize;
        let src = self.staging.get(start..start + slot.kind.size())?;
        Some(UniformValue::read_from(slot.kind, src))
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raymarch_uniform_buffer"),
            size: self.staging.len() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Upload the staging bytes if anything changed since the last flush
    pub fn flush(&mut self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        if self.dirty {
            queue.write_buffer(buffer, 0, &self.staging);
            self.dirty = false;
        }
    }
}

impl UniformSink for UniformBlock {
    fn write_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(slot) = self.layout.slot(name) else {
            trace!(name, "uniform not active, ignoring");
            return;
        };
        if slot.kind != value.kind() {
            trace!(name, expected = ?slot.kind, got = ?value.kind(), "uniform kind mismatch, ignoring");
            return;
        }
        let start = slot.offset as usize;
        let Some(dst) = self.staging.get_mut(start..start + slot.kind.size()) else {
            return;
        };
        value.write_to(dst);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_layout() -> UniformLayout {
        UniformLayout::new(0)
            .with_slot("camUp", 0, UniformKind::Vec3)
            .with_slot("near", 12, UniformKind::Float)
            .with_slot("maxSteps", 16, UniformKind::Int)
            .with_slot("tint", 32, UniformKind::Vec4)
    }

    #[test]
    fn staging_is_sized_to_sixteen_byte_multiples() {
        let block = UniformBlock::new(test_layout());
        assert_eq!(block.layout().size(), 48);
        assert_eq!(block.bytes().len(), 48);

        let block = UniformBlock::new(UniformLayout::new(0).with_slot("x", 0, UniformKind::Float));
        assert_eq!(block.bytes().len(), 16);
    }

    #[test]
    fn all_four_kinds_round_through_staging() {
        let mut block = UniformBlock::new(test_layout());
        assert!(block.is_dirty());
        block.set_uniform("camUp", Vec3::new(1.0, 2.0, 3.0));
        block.set_uniform("near", 0.5f32);
        block.set_uniform("maxSteps", -3);
        block.set_uniform("tint", Vec4::new(0.1, 0.2, 0.3, 0.4));

        assert_eq!(block.get("camUp"), Some(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0))));
        assert_eq!(block.get("near"), Some(UniformValue::Float(0.5)));
        assert_eq!(block.get("maxSteps"), Some(UniformValue::Int(-3)));
        assert_eq!(
            block.get("tint"),
            Some(UniformValue::Vec4(Vec4::new(0.1, 0.2, 0.3, 0.4)))
        );
        // float sits right after the vec3 in the same 16-byte row
        assert_eq!(&block.bytes()[12..16], &0.5f32.to_ne_bytes());
    }

    #[test]
    fn unknown_names_and_wrong_kinds_are_ignored() {
        let mut block = UniformBlock::new(test_layout());
        block.dirty = false;
        let before = block.bytes().to_vec();

        block.set_uniform("doesNotExist", 1.0f32);
        block.set_uniform("maxSteps", 2.0f32);
        block.set_uniform("near", 7);

        assert_eq!(block.bytes(), &before[..]);
        assert!(!block.is_dirty());

        block.set_uniform("near", 2.0f32);
        assert!(block.is_dirty());
    }

    #[test]
    fn merge_keeps_existing_slots() {
        let mut layout = UniformLayout::new(0).with_slot("near", 12, UniformKind::Float);
        let other = UniformLayout::new(64)
            .with_slot("near", 0, UniformKind::Float)
            .with_slot("far", 4, UniformKind::Float);
        layout.merge(&other);

        assert_eq!(layout.slot("near").map(|s| s.offset), Some(12));
        assert_eq!(layout.slot("far").map(|s| s.offset), Some(4));
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.size(), 64);
    }
}
