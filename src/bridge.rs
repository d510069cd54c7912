//! The bridge facade: registration surface and the dispatch path.
//!
//! [`Bridge`] owns the host heap and the foreign caller. Native
//! initialization code drives the `define_*` family to mirror its
//! struct-level class layout into the host, and every later invocation of
//! a registered method funnels through [`Bridge::call_method`], across the
//! caller seam, and back.
//!
//! Registration is assumed single-threaded at extension-load time; all
//! methods take `&mut self` and perform no locking. Re-registration of the
//! same (target, name) pair is last-writer-wins.

use std::fmt;

use extbridge_core::{
    classify, Arity, ArrayView, BridgeError, ClassId, EntryPoint, ForeignCall, HostHeap,
    MethodEntry, ModuleId, PackagedArgs, Result, ScopeRef, SymbolId, TrampolineBinding, TypeTag,
    Value, Visibility, WellKnown,
};

use crate::foreign::{DirectCaller, ForeignCaller};

/// Outcome of a lookup-or-create registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineOutcome {
    /// A new binding was created under the scope.
    Created,
    /// An existing, compatible binding was reused; nothing was mutated.
    Reused,
}

/// The extension bridge.
pub struct Bridge {
    heap: HostHeap,
    caller: Box<dyn ForeignCaller>,
}

impl Bridge {
    /// A bridge executing entry points in-process.
    pub fn new() -> Self {
        Self::with_caller(DirectCaller)
    }

    /// A bridge routing every crossing through `caller`.
    pub fn with_caller(caller: impl ForeignCaller + 'static) -> Self {
        Self {
            heap: HostHeap::new(),
            caller: Box::new(caller),
        }
    }

    /// The host heap.
    pub fn heap(&self) -> &HostHeap {
        &self.heap
    }

    /// The host heap, mutably.
    pub fn heap_mut(&mut self) -> &mut HostHeap {
        &mut self.heap
    }

    /// The heap's well-known bindings.
    pub fn well_known(&self) -> &WellKnown {
        self.heap.well_known()
    }

    // ==========================================================================
    // Method registration
    // ==========================================================================

    /// Install a public trampoline for `name` on `target`.
    ///
    /// At call time the trampoline packages arguments according to `arity`
    /// and crosses into `entry`. An existing entry of the same name is
    /// replaced.
    pub fn define_method(
        &mut self,
        target: ScopeRef,
        name: &str,
        entry: EntryPoint,
        arity: Arity,
    ) -> Result<()> {
        self.check_mutable(target)?;
        let sym = self.heap.intern(name);
        self.heap
            .methods_mut(target)
            .insert(sym, MethodEntry::Trampoline(TrampolineBinding::new(entry, arity)));
        Ok(())
    }

    /// [`define_method`](Self::define_method), then mark the entry private.
    pub fn define_private_method(
        &mut self,
        target: ScopeRef,
        name: &str,
        entry: EntryPoint,
        arity: Arity,
    ) -> Result<()> {
        self.define_method(target, name, entry, arity)?;
        self.set_method_visibility(target, name, Visibility::Private)
    }

    /// [`define_method`](Self::define_method), then mark the entry protected.
    pub fn define_protected_method(
        &mut self,
        target: ScopeRef,
        name: &str,
        entry: EntryPoint,
        arity: Arity,
    ) -> Result<()> {
        self.define_method(target, name, entry, arity)?;
        self.set_method_visibility(target, name, Visibility::Protected)
    }

    /// Install a module function: a private instance copy plus a public
    /// copy on the module's singleton table.
    pub fn define_module_function(
        &mut self,
        module: ModuleId,
        name: &str,
        entry: EntryPoint,
        arity: Arity,
    ) -> Result<()> {
        self.define_method(ScopeRef::Module(module), name, entry, arity)?;
        let sym = self.heap.intern(name);
        self.promote_module_function(module, sym)
    }

    /// Apply the module-function rule to an already installed method.
    pub fn module_function(&mut self, module: ModuleId, name: &str) -> Result<()> {
        let sym = self.heap.intern(name);
        self.promote_module_function(module, sym)
    }

    fn promote_module_function(&mut self, module: ModuleId, name: SymbolId) -> Result<()> {
        let missing = BridgeError::MethodNotFound {
            name: self.heap.symbol_name(name).to_string(),
            owner: self.heap.module(module).name.clone(),
        };
        let scope = ScopeRef::Module(module);
        let copied = {
            let Some(entry) = self.heap.methods_mut(scope).get_mut(&name) else {
                return Err(missing);
            };
            entry.set_visibility(Visibility::Private);
            let mut copy = entry.clone();
            copy.set_visibility(Visibility::Public);
            copy
        };
        self.heap.singleton_methods_mut(scope).insert(name, copied);
        Ok(())
    }

    /// Install a trampoline on the receiver's singleton: class-level
    /// methods for classes, module functions for modules, per-object
    /// methods for instances. Immediate values have no singleton.
    pub fn define_singleton_method(
        &mut self,
        receiver: &Value,
        name: &str,
        entry: EntryPoint,
        arity: Arity,
    ) -> Result<()> {
        let binding = MethodEntry::Trampoline(TrampolineBinding::new(entry, arity));
        match receiver {
            Value::Class(id) => {
                let scope = ScopeRef::Class(*id);
                self.check_mutable(scope)?;
                let sym = self.heap.intern(name);
                self.heap.singleton_methods_mut(scope).insert(sym, binding);
                Ok(())
            }
            Value::Module(id) => {
                let scope = ScopeRef::Module(*id);
                self.check_mutable(scope)?;
                let sym = self.heap.intern(name);
                self.heap.singleton_methods_mut(scope).insert(sym, binding);
                Ok(())
            }
            Value::Object(id) | Value::Data(id) => {
                let id = *id;
                let sym = self.heap.intern(name);
                self.heap
                    .instance_mut(id)
                    .singleton_methods
                    .insert(sym, binding);
                Ok(())
            }
            other => Err(BridgeError::NoSingleton(classify(other))),
        }
    }

    /// Override `class`'s low-level allocation path. Every future
    /// [`allocate`](Self::allocate) of the class crosses into `entry`,
    /// which receives the class itself and returns the new instance.
    pub fn define_alloc_func(&mut self, class: ClassId, entry: EntryPoint) -> Result<()> {
        self.check_mutable(ScopeRef::Class(class))?;
        self.heap.class_mut(class).allocator = Some(entry);
        Ok(())
    }

    /// Allocate an instance of `class`: through the installed allocator
    /// override if there is one, otherwise through the raw path.
    pub fn allocate(&mut self, class: ClassId) -> Result<Value> {
        match self.heap.class(class).allocator.clone() {
            Some(entry) => {
                let call = ForeignCall::new(
                    &mut self.heap,
                    PackagedArgs::Positional {
                        receiver: Value::Class(class),
                        args: Vec::new(),
                    },
                );
                self.caller.invoke(&entry, call).map_err(BridgeError::from)
            }
            None => Ok(Value::Object(self.heap.allocate_raw(class))),
        }
    }

    // ==========================================================================
    // Class and module registration
    // ==========================================================================

    /// Look up or create the class `name` under `scope` with the given
    /// superclass.
    ///
    /// An existing binding is reused only if it is a class with exactly
    /// the requested superclass; reuse mutates nothing. A binding of the
    /// wrong kind or with a different superclass is a conflict, never a
    /// silent reuse.
    pub fn define_class_under(
        &mut self,
        scope: ScopeRef,
        name: &str,
        superclass: ClassId,
    ) -> Result<(ClassId, DefineOutcome)> {
        if let Some(existing) = self.heap.const_get(scope, name) {
            return match existing {
                Value::Class(id) => {
                    if self.heap.class(id).superclass == Some(superclass) {
                        Ok((id, DefineOutcome::Reused))
                    } else {
                        Err(BridgeError::SuperclassMismatch {
                            name: name.to_string(),
                        })
                    }
                }
                _ => Err(BridgeError::RedefinitionKind {
                    path: self.qualified_name(scope, name),
                    expected: "class",
                }),
            };
        }
        self.check_mutable(scope)?;
        let qualified = self.qualified_name(scope, name);
        let id = self.heap.define_class(qualified, Some(superclass));
        self.heap.const_set(scope, name, Value::Class(id));
        Ok((id, DefineOutcome::Created))
    }

    /// Look up or create the module `name` under `scope`.
    ///
    /// Same reuse contract as [`define_class_under`](Self::define_class_under),
    /// minus the superclass check.
    pub fn define_module_under(
        &mut self,
        scope: ScopeRef,
        name: &str,
    ) -> Result<(ModuleId, DefineOutcome)> {
        if let Some(existing) = self.heap.const_get(scope, name) {
            return match existing {
                Value::Module(id) => Ok((id, DefineOutcome::Reused)),
                _ => Err(BridgeError::RedefinitionKind {
                    path: self.qualified_name(scope, name),
                    expected: "module",
                }),
            };
        }
        self.check_mutable(scope)?;
        let qualified = self.qualified_name(scope, name);
        let id = self.heap.define_module(qualified);
        self.heap.const_set(scope, name, Value::Module(id));
        Ok((id, DefineOutcome::Created))
    }

    /// Copy the binding of `old_name` to `new_name` on `target`.
    pub fn alias_method(&mut self, target: ScopeRef, new_name: &str, old_name: &str) -> Result<()> {
        self.check_mutable(target)?;
        let old_sym = self.heap.intern(old_name);
        let new_sym = self.heap.intern(new_name);
        let entry = match self.heap.methods(target).get(&old_sym) {
            Some(entry) if !entry.is_undefined() => entry.clone(),
            _ => {
                return Err(BridgeError::MethodNotFound {
                    name: old_name.to_string(),
                    owner: self.heap.scope_name(target).to_string(),
                });
            }
        };
        self.heap.methods_mut(target).insert(new_sym, entry);
        Ok(())
    }

    /// Undefine `name` on `target`.
    ///
    /// Frozen targets fail. If the method is currently defined (anywhere
    /// on a class's chain), an undef marker is installed on `target`
    /// itself, terminating the binding. A name that is absent on a
    /// mutable target is silently left alone — nothing reports "nothing
    /// to undefine".
    pub fn undef_method(&mut self, target: ScopeRef, name: &str) -> Result<()> {
        self.check_mutable(target)?;
        let sym = self.heap.intern(name);
        if self.heap.method_defined(target, sym) {
            self.heap.methods_mut(target).insert(sym, MethodEntry::Undefined);
        }
        Ok(())
    }

    // ==========================================================================
    // Dispatch
    // ==========================================================================

    /// Invoke `name` on `receiver`, the way host-side callers reach
    /// registered bindings.
    ///
    /// Visibility is recorded but not enforced here, matching the
    /// host-internal dispatch the bridge mirrors. Trampolines cross the
    /// foreign boundary exactly once and their result is returned without
    /// conversion.
    pub fn call_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value> {
        let sym = self.heap.intern(name);
        let resolved = self.heap.resolve_method(receiver, sym).cloned();
        match resolved {
            None => Err(BridgeError::MethodNotFound {
                name: name.to_string(),
                owner: self.heap.describe(receiver),
            }),
            Some(MethodEntry::Undefined) => Err(BridgeError::MethodUndefined {
                name: name.to_string(),
                owner: self.heap.describe(receiver),
            }),
            Some(MethodEntry::Reader { ivar, .. }) => Ok(match receiver.object_id() {
                Some(object) => self.heap.ivar_lookup(object, ivar, Value::Nil),
                None => Value::Nil,
            }),
            Some(MethodEntry::Writer { ivar, .. }) => {
                let value = args.into_iter().next().unwrap_or(Value::Nil);
                if let Some(object) = receiver.object_id() {
                    self.heap.ivar_set(object, ivar, value.clone());
                }
                Ok(value)
            }
            Some(MethodEntry::Trampoline(binding)) => {
                let packaged = match binding.arity {
                    Arity::Variadic => {
                        let count = args.len();
                        let argv = self.heap.new_array(args);
                        let view = self.array_view(&argv)?;
                        PackagedArgs::Variadic {
                            count,
                            view,
                            receiver: receiver.clone(),
                        }
                    }
                    Arity::Fixed(_) => PackagedArgs::Positional {
                        receiver: receiver.clone(),
                        args,
                    },
                };
                let call = ForeignCall::new(&mut self.heap, packaged);
                self.caller
                    .invoke(&binding.entry, call)
                    .map_err(BridgeError::from)
            }
        }
    }

    /// Offset-addressed view over a host array value.
    ///
    /// The view is only valid for the duration of the current native call.
    pub fn array_view(&self, value: &Value) -> Result<ArrayView> {
        match value {
            Value::Array(id) => Ok(ArrayView::new(*id)),
            other => Err(BridgeError::TypeMismatch {
                expected: TypeTag::Array,
                actual: classify(other),
            }),
        }
    }

    /// Recorded visibility of an instance method, if the name is bound.
    pub fn method_visibility(&self, target: ScopeRef, name: &str) -> Option<Visibility> {
        let sym = self.heap.symbol(name)?;
        self.heap.methods(target).get(&sym).and_then(MethodEntry::visibility)
    }

    /// Recorded visibility of a singleton method, if the name is bound.
    pub fn singleton_method_visibility(&self, target: ScopeRef, name: &str) -> Option<Visibility> {
        let sym = self.heap.symbol(name)?;
        self.heap
            .singleton_methods(target)
            .get(&sym)
            .and_then(MethodEntry::visibility)
    }

    // ==========================================================================
    // Internal helpers
    // ==========================================================================

    pub(crate) fn check_mutable(&self, target: ScopeRef) -> Result<()> {
        if self.heap.is_frozen(target) {
            Err(BridgeError::FrozenTarget {
                name: self.heap.scope_name(target).to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn set_method_visibility(
        &mut self,
        target: ScopeRef,
        name: &str,
        visibility: Visibility,
    ) -> Result<()> {
        let sym = self.heap.intern(name);
        if let Some(entry) = self.heap.methods_mut(target).get_mut(&sym) {
            entry.set_visibility(visibility);
        }
        Ok(())
    }

    fn qualified_name(&self, scope: ScopeRef, name: &str) -> String {
        if scope == ScopeRef::Class(self.heap.well_known().object) {
            name.to_string()
        } else {
            format!("{}::{}", self.heap.scope_name(scope), name)
        }
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}
