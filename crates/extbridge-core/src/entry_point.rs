//! Native entry points and the argument packaging that crosses the
//! foreign-call boundary.
//!
//! An [`EntryPoint`] is a type-erased callable implementing behavior
//! outside the host object system. The bridge owns none of them — it only
//! invokes. What an entry point receives is a [`ForeignCall`]: heap access
//! plus the arguments packaged according to the binding's declared
//! [`Arity`].

use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeError, ForeignError, Result};
use crate::heap::HostHeap;
use crate::value::Value;
use crate::view::{ArrayView, SLOT_STRIDE};

/// Declared arity of a native entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many positional arguments.
    Fixed(u8),
    /// The variable-arity calling convention: the entry point receives
    /// `(count, view, receiver)`.
    Variadic,
}

impl Arity {
    /// The ABI's variable-arity sentinel.
    pub const VARIADIC_SENTINEL: i32 = -1;

    /// Largest fixed arity the ABI accepts.
    pub const MAX_FIXED: u8 = 15;

    /// Decode a declared arity from the ABI's integer encoding.
    pub fn from_declared(declared: i32) -> Result<Self> {
        match declared {
            Self::VARIADIC_SENTINEL => Ok(Arity::Variadic),
            n if (0..=Self::MAX_FIXED as i32).contains(&n) => Ok(Arity::Fixed(n as u8)),
            other => Err(BridgeError::InvalidArity(other)),
        }
    }

    /// The ABI integer encoding of this arity.
    pub fn declared(self) -> i32 {
        match self {
            Arity::Fixed(n) => n as i32,
            Arity::Variadic => Self::VARIADIC_SENTINEL,
        }
    }

    /// Whether this is the variable-arity convention.
    pub fn is_variadic(self) -> bool {
        matches!(self, Arity::Variadic)
    }
}

/// Arguments packaged for a foreign call.
///
/// Fixed-arity bindings deliver the receiver followed by the positional
/// arguments; variadic bindings deliver the native varargs triple of
/// argument count, a view over the argument array, and the receiver.
#[derive(Debug, Clone)]
pub enum PackagedArgs {
    /// `(receiver, ...args)` packaging.
    Positional {
        receiver: Value,
        args: Vec<Value>,
    },
    /// `(count, view, receiver)` packaging.
    Variadic {
        count: usize,
        view: ArrayView,
        receiver: Value,
    },
}

impl PackagedArgs {
    /// The receiver of the call.
    pub fn receiver(&self) -> &Value {
        match self {
            PackagedArgs::Positional { receiver, .. } => receiver,
            PackagedArgs::Variadic { receiver, .. } => receiver,
        }
    }

    /// Number of arguments (excluding the receiver).
    pub fn count(&self) -> usize {
        match self {
            PackagedArgs::Positional { args, .. } => args.len(),
            PackagedArgs::Variadic { count, .. } => *count,
        }
    }
}

/// Everything a native entry point receives for one call: the host heap
/// and the packaged arguments. Lives for the duration of that call only.
pub struct ForeignCall<'h> {
    /// The host heap, for allocating and inspecting host values.
    pub heap: &'h mut HostHeap,
    /// The packaged arguments.
    pub args: PackagedArgs,
}

impl<'h> ForeignCall<'h> {
    /// Assemble a call.
    pub fn new(heap: &'h mut HostHeap, args: PackagedArgs) -> Self {
        Self { heap, args }
    }

    /// The receiver of the call.
    pub fn receiver(&self) -> &Value {
        self.args.receiver()
    }

    /// Number of arguments (excluding the receiver).
    pub fn arg_count(&self) -> usize {
        self.args.count()
    }

    /// Read the argument at `index`, nil past the end.
    pub fn arg(&self, index: usize) -> Value {
        match &self.args {
            PackagedArgs::Positional { args, .. } => {
                args.get(index).cloned().unwrap_or(Value::Nil)
            }
            PackagedArgs::Variadic { view, .. } => view.get(self.heap, index * SLOT_STRIDE),
        }
    }
}

/// A callable native entry point.
///
/// The `call` body runs on the native side of the boundary; whatever it
/// returns or raises crosses back unmodified.
pub trait NativeCallable {
    /// Execute the entry point.
    fn call(&self, call: ForeignCall<'_>) -> std::result::Result<Value, ForeignError>;
}

impl<F> NativeCallable for F
where
    F: Fn(ForeignCall<'_>) -> std::result::Result<Value, ForeignError>,
{
    fn call(&self, call: ForeignCall<'_>) -> std::result::Result<Value, ForeignError> {
        (self)(call)
    }
}

/// Type-erased, shareable handle to a native entry point.
///
/// Cloning shares the underlying callable. The bridge never frees an entry
/// point; it lives as long as any binding that references it.
pub struct EntryPoint {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl EntryPoint {
    /// Wrap a callable.
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Cross the boundary: execute the entry point.
    pub fn call(&self, call: ForeignCall<'_>) -> std::result::Result<Value, ForeignError> {
        self.inner.call(call)
    }
}

impl Clone for EntryPoint {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_decoding() {
        assert_eq!(Arity::from_declared(-1).unwrap(), Arity::Variadic);
        assert_eq!(Arity::from_declared(0).unwrap(), Arity::Fixed(0));
        assert_eq!(Arity::from_declared(15).unwrap(), Arity::Fixed(15));
        assert_eq!(
            Arity::from_declared(16),
            Err(BridgeError::InvalidArity(16))
        );
        assert_eq!(
            Arity::from_declared(-2),
            Err(BridgeError::InvalidArity(-2))
        );
    }

    #[test]
    fn arity_round_trip() {
        for declared in [-1, 0, 1, 2, 15] {
            assert_eq!(Arity::from_declared(declared).unwrap().declared(), declared);
        }
    }

    #[test]
    fn positional_args_access() {
        let mut heap = HostHeap::new();
        let call = ForeignCall::new(
            &mut heap,
            PackagedArgs::Positional {
                receiver: Value::Fixnum(7),
                args: vec![Value::True, Value::Fixnum(2)],
            },
        );
        assert_eq!(call.receiver(), &Value::Fixnum(7));
        assert_eq!(call.arg_count(), 2);
        assert_eq!(call.arg(0), Value::True);
        assert_eq!(call.arg(1), Value::Fixnum(2));
        assert_eq!(call.arg(5), Value::Nil);
    }

    #[test]
    fn variadic_args_go_through_the_view() {
        let mut heap = HostHeap::new();
        let args = heap.new_array(vec![Value::Fixnum(10), Value::Fixnum(20)]);
        let Value::Array(id) = args else { unreachable!() };
        let call = ForeignCall::new(
            &mut heap,
            PackagedArgs::Variadic {
                count: 2,
                view: ArrayView::new(id),
                receiver: Value::Nil,
            },
        );
        assert_eq!(call.arg_count(), 2);
        assert_eq!(call.arg(0), Value::Fixnum(10));
        assert_eq!(call.arg(1), Value::Fixnum(20));
    }

    #[test]
    fn entry_point_invokes_closure() {
        let entry = EntryPoint::new(|call: ForeignCall<'_>| {
            let lhs = call.arg(0).as_fixnum().unwrap_or(0);
            let rhs = call.arg(1).as_fixnum().unwrap_or(0);
            Ok(Value::Fixnum(lhs + rhs))
        });

        let mut heap = HostHeap::new();
        let call = ForeignCall::new(
            &mut heap,
            PackagedArgs::Positional {
                receiver: Value::Nil,
                args: vec![Value::Fixnum(2), Value::Fixnum(3)],
            },
        );
        assert_eq!(entry.call(call).unwrap(), Value::Fixnum(5));
    }

    #[test]
    fn entry_point_clone_shares_callable() {
        let entry = EntryPoint::new(|_call: ForeignCall<'_>| Ok(Value::Nil));
        let copy = entry.clone();
        assert!(Arc::ptr_eq(&entry.inner, &copy.inner));
    }
}
