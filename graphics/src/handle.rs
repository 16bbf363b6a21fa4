//! Opaque render handles.
//!
//! A [`RenderHandle`] is a plain 64-bit token: the top byte stores the
//! [`RenderHandleType`], the rest is a backend-defined index.
//! [`RenderHandleReference`] additionally keeps the resource alive; the
//! owning manager may reclaim a resource once its reference count drops to
//! one (its own copy).

use std::fmt;
use std::sync::Arc;

const TYPE_SHIFT: u32 = 56;
const INDEX_MASK: u64 = (1 << TYPE_SHIFT) - 1;

/// Kind of resource a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RenderHandleType {
    Undefined = 0,
    GpuBuffer = 1,
    GpuImage = 2,
    GpuSampler = 3,
    Shader = 4,
    GraphicsState = 5,
    RenderNodeGraph = 6,
}

impl RenderHandleType {
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::GpuBuffer,
            2 => Self::GpuImage,
            3 => Self::GpuSampler,
            4 => Self::Shader,
            5 => Self::GraphicsState,
            6 => Self::RenderNodeGraph,
            _ => Self::Undefined,
        }
    }
}

/// Opaque, copyable 64-bit resource token.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle {
    id: u64,
}

impl RenderHandle {
    /// The invalid handle.
    pub const INVALID: Self = Self { id: u64::MAX };

    /// Creates a handle of `handle_type` with backend index `index`.
    pub fn new(handle_type: RenderHandleType, index: u64) -> Self {
        Self {
            id: ((handle_type as u64) << TYPE_SHIFT) | (index & INDEX_MASK),
        }
    }

    /// Raw 64-bit id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Backend index.
    pub fn index(&self) -> u64 {
        self.id & INDEX_MASK
    }

    /// Resource kind. Invalid handles report [`RenderHandleType::Undefined`].
    pub fn handle_type(&self) -> RenderHandleType {
        if !self.is_valid() {
            return RenderHandleType::Undefined;
        }
        RenderHandleType::from_bits((self.id >> TYPE_SHIFT) as u8)
    }

    /// Returns `true` unless this is [`RenderHandle::INVALID`].
    pub fn is_valid(&self) -> bool {
        self.id != u64::MAX
    }
}

impl Default for RenderHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "RenderHandle({:?}#{})", self.handle_type(), self.index())
        } else {
            write!(f, "RenderHandle(invalid)")
        }
    }
}

/// Reference-counted render handle.
///
/// Cloning shares the count. Equality compares the underlying handle only.
#[derive(Clone, Default)]
pub struct RenderHandleReference {
    handle: RenderHandle,
    counter: Option<Arc<()>>,
}

impl RenderHandleReference {
    /// Wraps `handle` in a fresh reference count.
    pub fn new(handle: RenderHandle) -> Self {
        Self {
            handle,
            counter: handle.is_valid().then(|| Arc::new(())),
        }
    }

    /// The wrapped handle.
    pub fn handle(&self) -> RenderHandle {
        self.handle
    }

    /// Resource kind of the wrapped handle.
    pub fn handle_type(&self) -> RenderHandleType {
        self.handle.handle_type()
    }

    /// Returns `true` if the wrapped handle is valid.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Number of live references, `0` for invalid handles.
    pub fn ref_count(&self) -> usize {
        self.counter.as_ref().map_or(0, Arc::strong_count)
    }
}

impl PartialEq for RenderHandleReference {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for RenderHandleReference {}

impl fmt::Debug for RenderHandleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (refs: {})", self.handle, self.ref_count())
    }
}

static_assertions::assert_impl_all!(RenderHandleReference: Send, Sync);
