//! A compatibility bridge between C-style native extension modules and a
//! dynamically-typed host object runtime.
//!
//! Native code expects stable numeric type tags, raw pointer-style access
//! to arrays, and directly-invokable entry points. The host exposes
//! introspectable, garbage-collected objects reached through method
//! dispatch. This crate provides the machinery between the two:
//!
//! - **classification** — [`classify`]/[`has_tag`]/[`require_tag`] map
//!   host values into the ABI's [`TypeTag`] space,
//! - **trampolines** — the [`Bridge`]'s `define_*` family installs host
//!   methods whose bodies package arguments and cross into native
//!   [`EntryPoint`]s through the [`ForeignCaller`] seam,
//! - **pointer views** — [`ArrayView`] gives offset-addressed, slot-strided
//!   access over host arrays,
//! - **opaque wrapping** — [`Bridge::wrap`]/[`Bridge::unwrap`] attach a
//!   [`TypeDescriptor`]/[`DataHandle`] pair to a host object with fixed
//!   identity,
//! - **attributes** — [`Bridge::install_attribute`] defines accessors with
//!   the visibility declared by the embedder's [`VisibilityContext`].
//!
//! The bridge is synchronous and reentrant: it spawns no threads, holds no
//! locks, and blocks the calling thread for the duration of each foreign
//! call. Registration is expected to be single-threaded at extension-load
//! time. All bindings are in-memory; processes rebuild them by replaying
//! registration calls.
//!
//! # Example
//!
//! ```
//! use extbridge::{Arity, Bridge, EntryPoint, ForeignCall, ScopeRef, Value};
//!
//! let mut bridge = Bridge::new();
//! let object = bridge.well_known().object;
//!
//! let (geo, _) = bridge
//!     .define_module_under(ScopeRef::Class(object), "Geo")
//!     .unwrap();
//! let (point, _) = bridge
//!     .define_class_under(ScopeRef::Module(geo), "Point", object)
//!     .unwrap();
//! bridge
//!     .define_method(
//!         ScopeRef::Class(point),
//!         "magnitude",
//!         EntryPoint::new(|_call: ForeignCall<'_>| Ok(Value::float(5.0))),
//!         Arity::Fixed(0),
//!     )
//!     .unwrap();
//!
//! let instance = bridge.allocate(point).unwrap();
//! let result = bridge.call_method(&instance, "magnitude", vec![]).unwrap();
//! assert_eq!(result, Value::float(5.0));
//! ```

mod attributes;
mod bridge;
mod foreign;
mod wrap;

pub use bridge::{Bridge, DefineOutcome};
pub use foreign::{DirectCaller, ForeignCaller};

pub use extbridge_core::{
    classify, has_tag, require_tag, Arity, ArrayId, ArrayView, BridgeError, ClassDef, ClassId,
    Complex, DataHandle, DescriptorFlags, EntryPoint, FileHandle, FileId, ForeignCall,
    ForeignError, FrameVisibility, HashId, HostHeap, Instance, MethodEntry, MethodTable, ModuleDef,
    ModuleId, NativeCallable, ObjectId, PackagedArgs, Rational, RegexpId, RegexpSource, Result,
    ScopeRef, StringId, StructId, StructInstance, SymbolId, TrampolineBinding, TypeDescriptor,
    TypeTag, Value, Visibility, VisibilityContext, WellKnown, WrappedData, SLOT_STRIDE, TAG_MASK,
};
