//! Integration tests exercising the full bridge surface: registration,
//! dispatch across the foreign-call seam, wrapping, and classification.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use extbridge::{
    classify, has_tag, require_tag, Arity, Bridge, BridgeError, DataHandle, DefineOutcome,
    DirectCaller, EntryPoint, ForeignCall, ForeignCaller, ForeignError, HostHeap, ScopeRef,
    TypeDescriptor, TypeTag, Value, VisibilityContext,
};

/// Counts boundary crossings, delegating execution to the direct caller.
#[derive(Clone)]
struct CountingCaller {
    crossings: Arc<AtomicUsize>,
}

impl CountingCaller {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let crossings = Arc::new(AtomicUsize::new(0));
        (
            Self {
                crossings: Arc::clone(&crossings),
            },
            crossings,
        )
    }
}

impl ForeignCaller for CountingCaller {
    fn invoke(
        &self,
        entry: &EntryPoint,
        call: ForeignCall<'_>,
    ) -> Result<Value, ForeignError> {
        self.crossings.fetch_add(1, Ordering::SeqCst);
        DirectCaller.invoke(entry, call)
    }
}

#[test]
fn point_magnitude_end_to_end() {
    let (caller, crossings) = CountingCaller::new();
    let mut bridge = Bridge::with_caller(caller);
    let object = bridge.well_known().object;

    // Register Geo::Point with no existing binding.
    let (geo, outcome) = bridge
        .define_module_under(ScopeRef::Class(object), "Geo")
        .unwrap();
    assert_eq!(outcome, DefineOutcome::Created);
    let (point, outcome) = bridge
        .define_class_under(ScopeRef::Module(geo), "Point", object)
        .unwrap();
    assert_eq!(outcome, DefineOutcome::Created);

    // Allocator seeds the coordinates.
    bridge
        .define_alloc_func(
            point,
            EntryPoint::new(|call: ForeignCall<'_>| {
                let &Value::Class(class) = call.receiver() else {
                    return Err(ForeignError::Raised("allocator expects a class".into()));
                };
                let object = call.heap.allocate_raw(class);
                let x = call.heap.intern("@x");
                let y = call.heap.intern("@y");
                call.heap.ivar_set(object, x, Value::float(3.0));
                call.heap.ivar_set(object, y, Value::float(4.0));
                Ok(Value::Object(object))
            }),
        )
        .unwrap();

    // magnitude: fixed arity 0, reads the coordinates back.
    bridge
        .define_method(
            ScopeRef::Class(point),
            "magnitude",
            EntryPoint::new(|call: ForeignCall<'_>| {
                let Some(object) = call.receiver().object_id() else {
                    return Err(ForeignError::Raised("expected an instance".into()));
                };
                let x = call.heap.intern("@x");
                let y = call.heap.intern("@y");
                let x = call.heap.ivar_lookup(object, x, Value::float(0.0));
                let y = call.heap.ivar_lookup(object, y, Value::float(0.0));
                let (Some(x), Some(y)) = (x.as_float(), y.as_float()) else {
                    return Err(ForeignError::Raised("coordinates must be floats".into()));
                };
                Ok(Value::float((x * x + y * y).sqrt()))
            }),
            Arity::Fixed(0),
        )
        .unwrap();

    let instance = bridge.allocate(point).unwrap();
    let before = crossings.load(Ordering::SeqCst);

    let result = bridge.call_method(&instance, "magnitude", vec![]).unwrap();

    // The native result comes back unchanged, and the invocation crossed
    // the boundary exactly once.
    assert_eq!(result, Value::float(5.0));
    assert_eq!(crossings.load(Ordering::SeqCst), before + 1);

    // The registered class is reachable by constant path.
    assert_eq!(
        bridge.heap().lookup_path("Geo::Point"),
        Some(Value::Class(point))
    );
}

#[test]
fn redefinition_safety_sequence() {
    let mut bridge = Bridge::new();
    let object = bridge.well_known().object;
    let string = bridge.well_known().string;
    let root = ScopeRef::Class(object);

    let (first, first_outcome) = bridge.define_class_under(root, "X", string).unwrap();
    let (second, second_outcome) = bridge.define_class_under(root, "X", string).unwrap();
    assert_eq!(first, second);
    assert_eq!(first_outcome, DefineOutcome::Created);
    assert_eq!(second_outcome, DefineOutcome::Reused);

    let err = bridge.define_class_under(root, "X", object).unwrap_err();
    assert_eq!(
        err,
        BridgeError::SuperclassMismatch {
            name: "X".to_string()
        }
    );
}

#[test]
fn variadic_and_fixed_packaging_contract() {
    let mut bridge = Bridge::new();
    let object = bridge.well_known().object;
    let class = bridge.heap_mut().define_class("Packaging", Some(object));
    let scope = ScopeRef::Class(class);

    // Variadic: [a, b, c] arrives as (3, view, receiver).
    bridge
        .define_method(
            scope,
            "var",
            EntryPoint::new(|call: ForeignCall<'_>| {
                let extbridge::PackagedArgs::Variadic { count, view, receiver } = &call.args
                else {
                    return Err(ForeignError::Raised("expected varargs".into()));
                };
                assert_eq!(*count, 3);
                assert!(matches!(receiver, Value::Object(_)));
                let first = view.get(call.heap, 0);
                let third = view.get(call.heap, 2 * extbridge::SLOT_STRIDE);
                assert_eq!(first, Value::Fixnum(10));
                Ok(third)
            }),
            Arity::Variadic,
        )
        .unwrap();

    // Fixed 2: arrives as (receiver, a, b).
    bridge
        .define_method(
            scope,
            "fixed",
            EntryPoint::new(|call: ForeignCall<'_>| {
                let extbridge::PackagedArgs::Positional { args, .. } = &call.args else {
                    return Err(ForeignError::Raised("expected positional".into()));
                };
                assert_eq!(args.len(), 2);
                Ok(args[1].clone())
            }),
            Arity::Fixed(2),
        )
        .unwrap();

    let receiver = bridge.allocate(class).unwrap();
    assert_eq!(
        bridge
            .call_method(
                &receiver,
                "var",
                vec![Value::Fixnum(10), Value::Fixnum(20), Value::Fixnum(30)]
            )
            .unwrap(),
        Value::Fixnum(30)
    );
    assert_eq!(
        bridge
            .call_method(&receiver, "fixed", vec![Value::True, Value::False])
            .unwrap(),
        Value::False
    );
}

#[test]
fn wrapped_data_flows_through_methods() {
    struct Buffer {
        bytes: Vec<u8>,
    }

    let mut bridge = Bridge::new();
    let object = bridge.well_known().object;
    let (blob, _) = bridge
        .define_class_under(ScopeRef::Class(object), "Blob", object)
        .unwrap();

    let descriptor = Arc::new(TypeDescriptor::new("Blob"));
    bridge
        .define_method(
            ScopeRef::Class(blob),
            "size",
            EntryPoint::new(|call: ForeignCall<'_>| {
                let Some(object) = call.receiver().object_id() else {
                    return Err(ForeignError::Raised("expected an instance".into()));
                };
                let Some(data) = call.heap.instance(object).wrapped.clone() else {
                    return Err(ForeignError::Raised("no wrapped payload".into()));
                };
                let Some(buffer) = data.handle.downcast_ref::<Buffer>() else {
                    return Err(ForeignError::Raised("wrong payload shape".into()));
                };
                Ok(Value::Fixnum(buffer.bytes.len() as i64))
            }),
            Arity::Fixed(0),
        )
        .unwrap();

    let wrapped = bridge.wrap(
        blob,
        Arc::clone(&descriptor),
        DataHandle::new(Buffer {
            bytes: vec![1, 2, 3, 4],
        }),
    );
    assert_eq!(classify(&wrapped), TypeTag::Data);
    assert_eq!(
        bridge.call_method(&wrapped, "size", vec![]).unwrap(),
        Value::Fixnum(4)
    );

    let (got_descriptor, _handle) = bridge.unwrap(&wrapped).unwrap();
    assert!(got_descriptor.compatible_with(&descriptor));
}

#[test]
fn attribute_and_trampoline_share_a_class() {
    let mut bridge = Bridge::new();
    let object = bridge.well_known().object;
    let (counter, _) = bridge
        .define_class_under(ScopeRef::Class(object), "Counter", object)
        .unwrap();
    let scope = ScopeRef::Class(counter);

    bridge
        .install_attribute(scope, "count", true, true, VisibilityContext::Default)
        .unwrap();
    bridge
        .define_method(
            scope,
            "bump",
            EntryPoint::new(|call: ForeignCall<'_>| {
                let Some(object) = call.receiver().object_id() else {
                    return Err(ForeignError::Raised("expected an instance".into()));
                };
                let ivar = call.heap.intern("@count");
                let current = call
                    .heap
                    .ivar_lookup(object, ivar, Value::Fixnum(0))
                    .as_fixnum()
                    .unwrap_or(0);
                call.heap.ivar_set(object, ivar, Value::Fixnum(current + 1));
                Ok(Value::Fixnum(current + 1))
            }),
            Arity::Fixed(0),
        )
        .unwrap();

    let instance = bridge.allocate(counter).unwrap();
    bridge
        .call_method(&instance, "count=", vec![Value::Fixnum(5)])
        .unwrap();
    assert_eq!(
        bridge.call_method(&instance, "bump", vec![]).unwrap(),
        Value::Fixnum(6)
    );
    assert_eq!(
        bridge.call_method(&instance, "count", vec![]).unwrap(),
        Value::Fixnum(6)
    );
}

mod classifier_properties {
    use super::*;
    use proptest::prelude::*;

    /// Build a value of the category selected by `kind` inside `heap`.
    fn value_for(heap: &mut HostHeap, kind: u8, n: i64, f: f64) -> Value {
        match kind % 18 {
            0 => Value::Nil,
            1 => Value::True,
            2 => Value::False,
            3 => Value::Undef,
            4 => Value::Fixnum(n),
            5 => Value::Bignum(i128::from(n) << 3),
            6 => Value::float(f),
            7 => heap.new_string(format!("s{n}")),
            8 => {
                let sym = heap.intern("probe");
                Value::Symbol(sym)
            }
            9 => heap.new_regexp("a+", 0),
            10 => heap.new_array(vec![Value::Fixnum(n)]),
            11 => heap.new_hash(),
            12 => heap.new_struct(Vec::new()),
            13 => heap.new_file("/tmp/probe"),
            14 => Value::Complex(extbridge::Complex::new(f, f)),
            15 => Value::Rational(extbridge::Rational::new(n, n.max(1))),
            16 => {
                let class = heap.well_known().object;
                Value::Object(heap.allocate_raw(class))
            }
            _ => Value::Class(heap.well_known().object),
        }
    }

    proptest! {
        #[test]
        fn classify_is_total_and_idempotent(kind in any::<u8>(), n in any::<i64>(), f in any::<f64>()) {
            let mut heap = HostHeap::new();
            let value = value_for(&mut heap, kind, n, f);
            let tag = classify(&value);
            prop_assert_eq!(classify(&value), tag);
            prop_assert!(require_tag(&value, tag).is_ok());
        }

        #[test]
        fn membership_is_sound_on_supported_tags(kind in any::<u8>(), n in any::<i64>(), f in any::<f64>()) {
            let mut heap = HostHeap::new();
            let value = value_for(&mut heap, kind, n, f);
            let tag = classify(&value);
            if tag.supports_membership() {
                prop_assert_eq!(has_tag(&value, tag), Ok(true));
            } else {
                prop_assert_eq!(has_tag(&value, tag), Err(BridgeError::UnsupportedTag(tag)));
            }
        }

        #[test]
        fn mismatched_requirement_reports_both_tags(n in any::<i64>()) {
            let value = Value::Fixnum(n);
            let err = require_tag(&value, TypeTag::String).unwrap_err();
            prop_assert_eq!(err, BridgeError::TypeMismatch {
                expected: TypeTag::String,
                actual: TypeTag::Fixnum,
            });
        }
    }
}
