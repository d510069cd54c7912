//! Definitions stored in the host heap: classes, modules, instances and
//! their method tables.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{DataHandle, TypeDescriptor};
use crate::entry_point::{Arity, EntryPoint};
use crate::ids::{ClassId, ModuleId, SymbolId};
use crate::value::Value;
use crate::visibility::Visibility;

/// A method table: name symbol to entry.
pub type MethodTable = FxHashMap<SymbolId, MethodEntry>;

/// One entry in a method table.
///
/// A trampoline binding moves through exactly these states: registered by a
/// `define_*` call, transiently invoked (one cycle per call, suspended
/// across the foreign boundary), and either idle again or terminally
/// replaced by the `Undefined` marker. Entries are never collected; they
/// live as long as the owning type.
#[derive(Debug, Clone)]
pub enum MethodEntry {
    /// Delegates to a native entry point.
    Trampoline(TrampolineBinding),
    /// Reads the named instance variable.
    Reader {
        ivar: SymbolId,
        visibility: Visibility,
    },
    /// Writes the named instance variable.
    Writer {
        ivar: SymbolId,
        visibility: Visibility,
    },
    /// Explicit undef marker; dispatch stops here.
    Undefined,
}

impl MethodEntry {
    /// Visibility of this entry, if it is callable.
    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            MethodEntry::Trampoline(binding) => Some(binding.visibility),
            MethodEntry::Reader { visibility, .. } | MethodEntry::Writer { visibility, .. } => {
                Some(*visibility)
            }
            MethodEntry::Undefined => None,
        }
    }

    /// Replace this entry's visibility, if it is callable.
    pub fn set_visibility(&mut self, new: Visibility) {
        match self {
            MethodEntry::Trampoline(binding) => binding.visibility = new,
            MethodEntry::Reader { visibility, .. } | MethodEntry::Writer { visibility, .. } => {
                *visibility = new;
            }
            MethodEntry::Undefined => {}
        }
    }

    /// Whether this is the undef marker.
    pub fn is_undefined(&self) -> bool {
        matches!(self, MethodEntry::Undefined)
    }
}

/// Associates a method name on a type with a native entry point.
#[derive(Debug, Clone)]
pub struct TrampolineBinding {
    /// The native entry point to cross into.
    pub entry: EntryPoint,
    /// Declared arity; selects the argument packaging.
    pub arity: Arity,
    /// Visibility recorded at registration time.
    pub visibility: Visibility,
}

impl TrampolineBinding {
    /// Create a public binding.
    pub fn new(entry: EntryPoint, arity: Arity) -> Self {
        Self {
            entry,
            arity,
            visibility: Visibility::Public,
        }
    }
}

/// A host class.
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Qualified name, as registered.
    pub name: String,
    /// Superclass; `None` only for the root class.
    pub superclass: Option<ClassId>,
    /// Constants bound under this class.
    pub constants: FxHashMap<String, Value>,
    /// Instance method table.
    pub methods: MethodTable,
    /// Singleton (class-level) method table.
    pub singleton_methods: MethodTable,
    /// Allocation override installed by native code; `None` means the raw
    /// allocation path.
    pub allocator: Option<EntryPoint>,
    /// Frozen against further mutation.
    pub frozen: bool,
}

impl ClassDef {
    pub(crate) fn new(name: impl Into<String>, superclass: Option<ClassId>) -> Self {
        Self {
            name: name.into(),
            superclass,
            constants: FxHashMap::default(),
            methods: MethodTable::default(),
            singleton_methods: MethodTable::default(),
            allocator: None,
            frozen: false,
        }
    }
}

/// A host module.
#[derive(Debug, Clone)]
pub struct ModuleDef {
    /// Qualified name, as registered.
    pub name: String,
    /// Constants bound under this module.
    pub constants: FxHashMap<String, Value>,
    /// Instance method table (methods gained by including the module).
    pub methods: MethodTable,
    /// Singleton method table (module functions and singleton methods).
    pub singleton_methods: MethodTable,
    /// Frozen against further mutation.
    pub frozen: bool,
}

impl ModuleDef {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constants: FxHashMap::default(),
            methods: MethodTable::default(),
            singleton_methods: MethodTable::default(),
            frozen: false,
        }
    }
}

/// An object instance.
#[derive(Debug, Clone)]
pub struct Instance {
    /// The instance's class.
    pub class: ClassId,
    /// Instance variables.
    pub ivars: FxHashMap<SymbolId, Value>,
    /// Per-object singleton methods.
    pub singleton_methods: MethodTable,
    /// Native data attached at wrap time. Immutable for the life of the
    /// object once set.
    pub wrapped: Option<WrappedData>,
}

impl Instance {
    pub(crate) fn new(class: ClassId) -> Self {
        Self {
            class,
            ivars: FxHashMap::default(),
            singleton_methods: MethodTable::default(),
            wrapped: None,
        }
    }
}

/// The descriptor/handle pair carried by a wrapped object.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedData {
    /// Identifies the native shape of the payload.
    pub descriptor: Arc<TypeDescriptor>,
    /// The opaque payload.
    pub handle: DataHandle,
}

/// A struct instance: ordered named fields.
#[derive(Debug, Clone, Default)]
pub struct StructInstance {
    pub fields: Vec<(SymbolId, Value)>,
}

impl StructInstance {
    /// Field value by name.
    pub fn field(&self, name: SymbolId) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

/// A host file object. Only the identity matters to the bridge; IO goes
/// through the host runtime.
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub path: String,
}

/// Regexp source and options. Compilation belongs to the host's regexp
/// subsystem.
#[derive(Debug, Clone)]
pub struct RegexpSource {
    pub source: String,
    pub options: u32,
}

/// A registration target: a class or a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeRef {
    Class(ClassId),
    Module(ModuleId),
}

impl From<ClassId> for ScopeRef {
    fn from(id: ClassId) -> Self {
        ScopeRef::Class(id)
    }
}

impl From<ModuleId> for ScopeRef {
    fn from(id: ModuleId) -> Self {
        ScopeRef::Module(id)
    }
}

impl ScopeRef {
    /// The scope as a host value.
    pub fn to_value(self) -> Value {
        match self {
            ScopeRef::Class(id) => Value::Class(id),
            ScopeRef::Module(id) => Value::Module(id),
        }
    }
}
