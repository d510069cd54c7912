//! The foreign-call seam.
//!
//! Every crossing into native code funnels through one
//! [`ForeignCaller::invoke`] choke point. The default [`DirectCaller`]
//! executes the entry point in-process; embedders substitute their own
//! caller to route calls through an isolation layer, count crossings in
//! tests, or marshal across a process boundary. Argument order is
//! preserved and native failures propagate back unmodified.

use extbridge_core::{EntryPoint, ForeignCall, ForeignError, Value};

/// Executes native entry points.
pub trait ForeignCaller {
    /// Cross the boundary: run `entry` with `call`.
    ///
    /// Blocks the calling thread until the native side returns. Whatever
    /// the native side returns or raises is handed back as-is.
    fn invoke(
        &self,
        entry: &EntryPoint,
        call: ForeignCall<'_>,
    ) -> Result<Value, ForeignError>;
}

/// The in-process executor: invokes the entry point directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCaller;

impl ForeignCaller for DirectCaller {
    fn invoke(
        &self,
        entry: &EntryPoint,
        call: ForeignCall<'_>,
    ) -> Result<Value, ForeignError> {
        entry.call(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extbridge_core::{HostHeap, PackagedArgs};

    #[test]
    fn direct_caller_executes_entry() {
        let entry = EntryPoint::new(|call: ForeignCall<'_>| {
            Ok(Value::Fixnum(call.arg_count() as i64))
        });
        let mut heap = HostHeap::new();
        let call = ForeignCall::new(
            &mut heap,
            PackagedArgs::Positional {
                receiver: Value::Nil,
                args: vec![Value::True, Value::False],
            },
        );
        assert_eq!(DirectCaller.invoke(&entry, call).unwrap(), Value::Fixnum(2));
    }

    #[test]
    fn native_failure_propagates_opaquely() {
        let entry = EntryPoint::new(|_call: ForeignCall<'_>| {
            Err(ForeignError::Raised("domain error".to_string()))
        });
        let mut heap = HostHeap::new();
        let call = ForeignCall::new(
            &mut heap,
            PackagedArgs::Positional {
                receiver: Value::Nil,
                args: Vec::new(),
            },
        );
        assert_eq!(
            DirectCaller.invoke(&entry, call),
            Err(ForeignError::Raised("domain error".to_string()))
        );
    }
}
