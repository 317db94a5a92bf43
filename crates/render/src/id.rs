use std::fmt;

/// Identity of a GPU resource, unique per kind within one renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counter(u64);

impl Counter {
    fn next(&mut self) -> ResourceId {
        self.0 += 1;
        ResourceId(self.0)
    }
}

/// Per-renderer id counters. Ids start at 1 and only grow.
#[derive(Debug, Clone, Default)]
pub struct ResourceIds {
    buffers: Counter,
    textures: Counter,
    pipelines: Counter,
}

impl ResourceIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_buffer(&mut self) -> ResourceId {
        self.buffers.next()
    }

    pub fn next_texture(&mut self) -> ResourceId {
        self.textures.next()
    }

    pub fn next_pipeline(&mut self) -> ResourceId {
        self.pipelines.next()
    }
}
