//! Index handles into the host heap's arenas.
//!
//! Every aggregate host value is stored in an arena on [`HostHeap`] and
//! referenced by one of these copyable ids. Ids are never reused: the heap
//! only grows, so a handle stays valid for the life of the heap.
//!
//! [`HostHeap`]: crate::heap::HostHeap

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Raw arena index.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

arena_id! {
    /// Handle to an interned symbol.
    SymbolId
}
arena_id! {
    /// Handle to a mutable host string.
    StringId
}
arena_id! {
    /// Handle to a host regexp (source and options; compilation is the
    /// regexp subsystem's concern, not the bridge's).
    RegexpId
}
arena_id! {
    /// Handle to a host array.
    ArrayId
}
arena_id! {
    /// Handle to a host hash table.
    HashId
}
arena_id! {
    /// Handle to a host struct instance.
    StructId
}
arena_id! {
    /// Handle to a host file object.
    FileId
}
arena_id! {
    /// Handle to a plain object instance.
    ObjectId
}
arena_id! {
    /// Handle to a host class.
    ClassId
}
arena_id! {
    /// Handle to a host module.
    ModuleId
}
