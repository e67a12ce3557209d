//! Integer handles for GPU textures owned by a pipeline.
//!
//! Callers hold `TextureHandle`s; the textures themselves never leave the
//! arena, so replacing a slot's texture (e.g. a new image size) does not
//! invalidate the handle.

use crate::texture::GpuTexture;

/// Index of a texture slot in a [`TextureArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owner of a fixed set of texture slots.
#[derive(Default)]
pub struct TextureArena {
    slots: Vec<Option<GpuTexture>>,
}

impl TextureArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a texture in a new slot.
    pub fn insert(&mut self, texture: GpuTexture) -> TextureHandle {
        let handle = TextureHandle(self.slots.len() as u32);
        self.slots.push(Some(texture));
        handle
    }

    /// Texture currently in a slot.
    pub fn get(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Swap the texture in a slot, returning the previous one.
    pub fn replace(&mut self, handle: TextureHandle, texture: GpuTexture) -> Option<GpuTexture> {
        self.slots
            .get_mut(handle.index())
            .and_then(|slot| slot.replace(texture))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total texture memory held.
    pub fn memory_usage(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(GpuTexture::memory_size)
            .sum()
    }

    /// Drop every texture. Handles stay valid but resolve to nothing.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}
