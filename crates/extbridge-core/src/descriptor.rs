//! Type descriptors and handles for wrapped native data.
//!
//! A [`TypeDescriptor`] names the native struct shape carried by a wrapped
//! host object; a [`DataHandle`] is the opaque payload itself. The bridge
//! stores the pair and reads it back — it never interprets or frees the
//! handle, and it never validates descriptors on unwrap. Callers that need
//! safety check [`TypeDescriptor::compatible_with`] before dereferencing.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use xxhash_rust::xxh64::xxh64;

/// Domain constant mixed into descriptor identity keys, so descriptor keys
/// can never collide with other xxh64-derived identities.
const DATA_DOMAIN: u64 = 0x6fd2c3a9184b07e5;

bitflags! {
    /// Lifecycle flags declared by a native type descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorFlags: u32 {
        /// The native side frees the payload as soon as the owning object
        /// dies, without deferral.
        const FREE_IMMEDIATELY = 1 << 0;
        /// The payload participates in the host's write-barrier protocol.
        const WRITE_BARRIER_PROTECTED = 1 << 1;
        /// The payload may be shared across host execution contexts once
        /// the owner is frozen.
        const FROZEN_SHAREABLE = 1 << 2;
    }
}

/// Describes the native shape of wrapped data.
///
/// Identity is the xxh64 key of the descriptor name; descriptors form a
/// single-inheritance chain via `parent`, and a child descriptor is
/// compatible with any ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    flags: DescriptorFlags,
    parent: Option<Arc<TypeDescriptor>>,
    key: u64,
}

impl TypeDescriptor {
    /// Create a descriptor for the named native shape.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = xxh64(name.as_bytes(), DATA_DOMAIN);
        Self {
            name,
            flags: DescriptorFlags::empty(),
            parent: None,
            key,
        }
    }

    /// Set lifecycle flags.
    pub fn with_flags(mut self, flags: DescriptorFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the parent descriptor.
    pub fn with_parent(mut self, parent: Arc<TypeDescriptor>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The native shape's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared lifecycle flags.
    pub fn flags(&self) -> DescriptorFlags {
        self.flags
    }

    /// Identity key of this descriptor.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Whether data described by `self` may be interpreted as `expected`.
    ///
    /// True when `expected` is this descriptor or any ancestor in the
    /// parent chain.
    pub fn compatible_with(&self, expected: &TypeDescriptor) -> bool {
        let mut current = Some(self);
        while let Some(descriptor) = current {
            if descriptor.key == expected.key {
                return true;
            }
            current = descriptor.parent.as_deref();
        }
        false
    }
}

/// Opaque handle to native data.
///
/// Cloning shares the payload; equality is payload identity. The bridge
/// only stores and returns handles — ownership stays with whoever created
/// the payload.
#[derive(Clone)]
pub struct DataHandle(Arc<dyn Any + Send + Sync>);

impl DataHandle {
    /// Wrap a native payload.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Arc::new(payload))
    }

    /// Borrow the payload as `T`, if that is its actual type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &DataHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for DataHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for DataHandle {}

impl fmt::Debug for DataHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_identity_is_name_based() {
        let a = TypeDescriptor::new("Point");
        let b = TypeDescriptor::new("Point");
        let c = TypeDescriptor::new("Line");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn compatibility_walks_parent_chain() {
        let base = Arc::new(TypeDescriptor::new("Shape"));
        let mid = Arc::new(TypeDescriptor::new("Polygon").with_parent(Arc::clone(&base)));
        let leaf = TypeDescriptor::new("Triangle").with_parent(Arc::clone(&mid));

        assert!(leaf.compatible_with(&leaf));
        assert!(leaf.compatible_with(&mid));
        assert!(leaf.compatible_with(&base));
        assert!(!base.compatible_with(&leaf));
        assert!(!leaf.compatible_with(&TypeDescriptor::new("Circle")));
    }

    #[test]
    fn flags_round_trip() {
        let descriptor = TypeDescriptor::new("Buffer")
            .with_flags(DescriptorFlags::FREE_IMMEDIATELY | DescriptorFlags::FROZEN_SHAREABLE);
        assert!(descriptor.flags().contains(DescriptorFlags::FREE_IMMEDIATELY));
        assert!(!descriptor
            .flags()
            .contains(DescriptorFlags::WRITE_BARRIER_PROTECTED));
    }

    #[test]
    fn handle_equality_is_identity() {
        let a = DataHandle::new(vec![1u8, 2, 3]);
        let b = a.clone();
        let c = DataHandle::new(vec![1u8, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn handle_downcast() {
        let handle = DataHandle::new(String::from("payload"));
        assert_eq!(handle.downcast_ref::<String>().unwrap(), "payload");
        assert!(handle.downcast_ref::<u32>().is_none());
    }
}
