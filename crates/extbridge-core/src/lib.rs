//! Core types for the native extension bridge.
//!
//! This crate holds everything the bridge facade builds on: the closed
//! host [`Value`] model, the ABI [`TypeTag`] classifier, the
//! [`HostHeap`] object space with its class/module tables, native
//! [`EntryPoint`]s with their argument packaging, offset-addressed
//! [`ArrayView`]s over host arrays, and the descriptor/handle pair types
//! for wrapped native data.
//!
//! Nothing here crosses the foreign-call boundary on its own; invoking
//! entry points is the facade crate's job, behind its caller seam.

mod descriptor;
mod entry_point;
mod error;
mod ids;
mod tag;
mod value;
mod view;
mod visibility;

pub mod heap;

pub use descriptor::{DataHandle, DescriptorFlags, TypeDescriptor};
pub use entry_point::{Arity, EntryPoint, ForeignCall, NativeCallable, PackagedArgs};
pub use error::{BridgeError, ForeignError, Result};
pub use heap::{
    ClassDef, FileHandle, HostHeap, Instance, MethodEntry, MethodTable, ModuleDef, RegexpSource,
    ScopeRef, StructInstance, TrampolineBinding, WellKnown, WrappedData,
};
pub use ids::{
    ArrayId, ClassId, FileId, HashId, ModuleId, ObjectId, RegexpId, StringId, StructId, SymbolId,
};
pub use tag::{classify, has_tag, require_tag, TypeTag, TAG_MASK};
pub use value::{Complex, Rational, Value};
pub use view::{ArrayView, SLOT_STRIDE};
pub use visibility::{FrameVisibility, Visibility, VisibilityContext};
