use std::collections::{HashMap, hash_map};

use crate::id::ResourceId;

#[derive(Debug)]
struct Entry<B> {
    pipeline: ResourceId,
    group: B,
}

/// Texture bind groups keyed by texture id.
///
/// Each entry remembers the pipeline whose layout built it; asking from a
/// different pipeline rebuilds the entry.
#[derive(Debug)]
pub struct BindGroupCache<B> {
    entries: HashMap<ResourceId, Entry<B>>,
    builds: u64,
}

impl<B> Default for BindGroupCache<B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            builds: 0,
        }
    }
}

impl<B> BindGroupCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &mut self,
        texture: ResourceId,
        pipeline: ResourceId,
        build: impl FnOnce() -> B,
    ) -> &B {
        let entry = match self.entries.entry(texture) {
            hash_map::Entry::Occupied(occupied) if occupied.get().pipeline == pipeline => {
                occupied.into_mut()
            }
            hash_map::Entry::Occupied(mut occupied) => {
                tracing::debug!(%texture, %pipeline, "rebuilding texture bind group for new pipeline");
                self.builds += 1;
                occupied.insert(Entry {
                    pipeline,
                    group: build(),
                });
                occupied.into_mut()
            }
            hash_map::Entry::Vacant(vacant) => {
                tracing::debug!(%texture, %pipeline, "building texture bind group");
                self.builds += 1;
                vacant.insert(Entry {
                    pipeline,
                    group: build(),
                })
            }
        };
        &entry.group
    }

    /// Drop the entry for `texture`. Returns whether one existed.
    pub fn invalidate(&mut self, texture: ResourceId) -> bool {
        self.entries.remove(&texture).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bind groups built.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_reuses_entry() {
        let mut cache = BindGroupCache::new();
        assert_eq!(*cache.get_or_build(ResourceId(1), ResourceId(1), || "a"), "a");
        assert_eq!(*cache.get_or_build(ResourceId(1), ResourceId(1), || "b"), "a");
        assert_eq!(cache.builds(), 1);
    }

    #[test]
    fn other_pipeline_rebuilds() {
        let mut cache = BindGroupCache::new();
        cache.get_or_build(ResourceId(1), ResourceId(1), || 1);
        assert_eq!(*cache.get_or_build(ResourceId(1), ResourceId(2), || 2), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.builds(), 2);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let mut cache = BindGroupCache::new();
        cache.get_or_build(ResourceId(3), ResourceId(1), || 1);
        assert!(cache.invalidate(ResourceId(3)));
        assert!(!cache.invalidate(ResourceId(3)));
        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_build(ResourceId(3), ResourceId(1), || 9), 9);
    }
}
