//! Wrapping native data inside host objects.
//!
//! A wrapped object is allocated through the raw path — user-overridable
//! construction and allocator overrides are both bypassed — and carries
//! its descriptor/handle pair from that moment on. The pair is fixed for
//! the object's lifetime and two wraps never alias.

use std::sync::Arc;

use extbridge_core::{
    classify, BridgeError, ClassId, DataHandle, Result, TypeDescriptor, TypeTag, Value,
    WrappedData,
};

use crate::bridge::Bridge;

impl Bridge {
    /// Allocate an instance of `class` and attach the descriptor/handle
    /// pair to it.
    pub fn wrap(
        &mut self,
        class: ClassId,
        descriptor: Arc<TypeDescriptor>,
        handle: DataHandle,
    ) -> Value {
        let object = self.heap_mut().allocate_raw(class);
        self.heap_mut().instance_mut(object).wrapped = Some(WrappedData { descriptor, handle });
        Value::Data(object)
    }

    /// Read the descriptor/handle pair back out of a wrapped value.
    ///
    /// No descriptor validation happens here: callers check
    /// [`TypeDescriptor::compatible_with`] themselves before interpreting
    /// the handle.
    pub fn unwrap(&self, value: &Value) -> Result<(Arc<TypeDescriptor>, DataHandle)> {
        let object = match value {
            Value::Data(id) => *id,
            other => {
                return Err(BridgeError::TypeMismatch {
                    expected: TypeTag::Data,
                    actual: classify(other),
                });
            }
        };
        match &self.heap().instance(object).wrapped {
            Some(data) => Ok((Arc::clone(&data.descriptor), data.handle.clone())),
            None => Err(BridgeError::TypeMismatch {
                expected: TypeTag::Data,
                actual: TypeTag::Object,
            }),
        }
    }
}
