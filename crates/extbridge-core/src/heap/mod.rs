//! The host runtime's object space.
//!
//! [`HostHeap`] owns every aggregate host value: one arena per kind, plus
//! the class and module tables the bridge registers into. Arenas only
//! grow — ids are never reused, so a handle stays valid for the life of
//! the heap and object identity is simply id equality.
//!
//! # Thread safety
//!
//! The heap is **not thread-safe by design**. Registration happens
//! single-threaded at extension-load time and dispatch takes `&mut self`;
//! concurrent registration of the same (type, name) pair is last-writer-
//! wins. Embedders that need cross-thread access wrap the heap in their
//! own synchronization.

mod entries;

pub use entries::{
    ClassDef, FileHandle, Instance, MethodEntry, MethodTable, ModuleDef, RegexpSource, ScopeRef,
    StructInstance, TrampolineBinding, WrappedData,
};

use rustc_hash::FxHashMap;

use crate::ids::{
    ArrayId, ClassId, FileId, HashId, ModuleId, ObjectId, RegexpId, StringId, StructId, SymbolId,
};
use crate::value::Value;

/// The host object space.
#[derive(Debug)]
pub struct HostHeap {
    symbol_names: Vec<String>,
    symbol_ids: FxHashMap<String, SymbolId>,
    strings: Vec<String>,
    regexps: Vec<RegexpSource>,
    arrays: Vec<Vec<Value>>,
    hashes: Vec<FxHashMap<Value, Value>>,
    structs: Vec<StructInstance>,
    files: Vec<FileHandle>,
    objects: Vec<Instance>,
    classes: Vec<ClassDef>,
    modules: Vec<ModuleDef>,
    well_known: WellKnown,
}

impl HostHeap {
    /// Create a heap with the well-known classes and modules bootstrapped.
    pub fn new() -> Self {
        let mut heap = HostHeap {
            symbol_names: Vec::new(),
            symbol_ids: FxHashMap::default(),
            strings: Vec::new(),
            regexps: Vec::new(),
            arrays: Vec::new(),
            hashes: Vec::new(),
            structs: Vec::new(),
            files: Vec::new(),
            objects: Vec::new(),
            classes: Vec::new(),
            modules: Vec::new(),
            well_known: WellKnown::placeholder(),
        };
        heap.well_known = WellKnown::bootstrap(&mut heap);
        heap
    }

    /// The well-known bindings table.
    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    // ==========================================================================
    // Symbols
    // ==========================================================================

    /// Intern a symbol, returning its id.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.symbol_ids.get(name) {
            return id;
        }
        let id = SymbolId::from_index(self.symbol_names.len());
        self.symbol_names.push(name.to_string());
        self.symbol_ids.insert(name.to_string(), id);
        id
    }

    /// Look a symbol up without interning it.
    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbol_ids.get(name).copied()
    }

    /// The name of an interned symbol.
    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.symbol_names[id.index()]
    }

    // ==========================================================================
    // Strings, regexps, files
    // ==========================================================================

    /// Allocate a host string.
    pub fn new_string(&mut self, contents: impl Into<String>) -> Value {
        let id = StringId::from_index(self.strings.len());
        self.strings.push(contents.into());
        Value::Str(id)
    }

    /// Borrow a string's contents.
    pub fn string(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    /// Mutably borrow a string's contents.
    pub fn string_mut(&mut self, id: StringId) -> &mut String {
        &mut self.strings[id.index()]
    }

    /// Allocate a host regexp from its source and option bits.
    pub fn new_regexp(&mut self, source: impl Into<String>, options: u32) -> Value {
        let id = RegexpId::from_index(self.regexps.len());
        self.regexps.push(RegexpSource {
            source: source.into(),
            options,
        });
        Value::Regexp(id)
    }

    /// Borrow a regexp's source.
    pub fn regexp(&self, id: RegexpId) -> &RegexpSource {
        &self.regexps[id.index()]
    }

    /// Allocate a host file object.
    pub fn new_file(&mut self, path: impl Into<String>) -> Value {
        let id = FileId::from_index(self.files.len());
        self.files.push(FileHandle { path: path.into() });
        Value::File(id)
    }

    /// Borrow a file object.
    pub fn file(&self, id: FileId) -> &FileHandle {
        &self.files[id.index()]
    }

    // ==========================================================================
    // Arrays
    // ==========================================================================

    /// Allocate a host array.
    pub fn new_array(&mut self, values: Vec<Value>) -> Value {
        let id = ArrayId::from_index(self.arrays.len());
        self.arrays.push(values);
        Value::Array(id)
    }

    /// Borrow an array's elements.
    pub fn array(&self, id: ArrayId) -> &[Value] {
        &self.arrays[id.index()]
    }

    /// Element count.
    pub fn array_len(&self, id: ArrayId) -> usize {
        self.arrays[id.index()].len()
    }

    /// Indexed read; nil past the end (the host array policy).
    pub fn array_get(&self, id: ArrayId, index: usize) -> Value {
        self.arrays[id.index()].get(index).cloned().unwrap_or(Value::Nil)
    }

    /// Indexed write; extends with nils past the end (the host array
    /// policy).
    pub fn array_set(&mut self, id: ArrayId, index: usize, value: Value) {
        let array = &mut self.arrays[id.index()];
        if index >= array.len() {
            array.resize(index + 1, Value::Nil);
        }
        array[index] = value;
    }

    /// Append an element.
    pub fn array_push(&mut self, id: ArrayId, value: Value) {
        self.arrays[id.index()].push(value);
    }

    // ==========================================================================
    // Hashes, structs
    // ==========================================================================

    /// Allocate an empty host hash.
    pub fn new_hash(&mut self) -> Value {
        let id = HashId::from_index(self.hashes.len());
        self.hashes.push(FxHashMap::default());
        Value::Hash(id)
    }

    /// Keyed read; nil for a missing key.
    pub fn hash_get(&self, id: HashId, key: &Value) -> Value {
        self.hashes[id.index()].get(key).cloned().unwrap_or(Value::Nil)
    }

    /// Keyed write.
    pub fn hash_set(&mut self, id: HashId, key: Value, value: Value) {
        self.hashes[id.index()].insert(key, value);
    }

    /// Entry count.
    pub fn hash_len(&self, id: HashId) -> usize {
        self.hashes[id.index()].len()
    }

    /// Allocate a struct instance.
    pub fn new_struct(&mut self, fields: Vec<(SymbolId, Value)>) -> Value {
        let id = StructId::from_index(self.structs.len());
        self.structs.push(StructInstance { fields });
        Value::Struct(id)
    }

    /// Borrow a struct instance.
    pub fn struct_instance(&self, id: StructId) -> &StructInstance {
        &self.structs[id.index()]
    }

    // ==========================================================================
    // Objects and instance variables
    // ==========================================================================

    /// Allocate an instance of `class` through the raw path, bypassing any
    /// allocator override and user-level construction.
    pub fn allocate_raw(&mut self, class: ClassId) -> ObjectId {
        let id = ObjectId::from_index(self.objects.len());
        self.objects.push(Instance::new(class));
        id
    }

    /// Borrow an instance.
    pub fn instance(&self, id: ObjectId) -> &Instance {
        &self.objects[id.index()]
    }

    /// Mutably borrow an instance.
    pub fn instance_mut(&mut self, id: ObjectId) -> &mut Instance {
        &mut self.objects[id.index()]
    }

    /// Read an instance variable.
    pub fn ivar_get(&self, object: ObjectId, name: SymbolId) -> Option<Value> {
        self.objects[object.index()].ivars.get(&name).cloned()
    }

    /// Read an instance variable, with a fallback for the unset case.
    pub fn ivar_lookup(&self, object: ObjectId, name: SymbolId, default: Value) -> Value {
        self.ivar_get(object, name).unwrap_or(default)
    }

    /// Write an instance variable.
    pub fn ivar_set(&mut self, object: ObjectId, name: SymbolId, value: Value) {
        self.objects[object.index()].ivars.insert(name, value);
    }

    /// Whether an instance variable is set.
    pub fn ivar_defined(&self, object: ObjectId, name: SymbolId) -> bool {
        self.objects[object.index()].ivars.contains_key(&name)
    }

    // ==========================================================================
    // Classes and modules
    // ==========================================================================

    /// Define a class. Low-level: registers no constant anywhere.
    pub fn define_class(&mut self, name: impl Into<String>, superclass: Option<ClassId>) -> ClassId {
        let id = ClassId::from_index(self.classes.len());
        self.classes.push(ClassDef::new(name, superclass));
        id
    }

    /// Define a module. Low-level: registers no constant anywhere.
    pub fn define_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = ModuleId::from_index(self.modules.len());
        self.modules.push(ModuleDef::new(name));
        id
    }

    /// Borrow a class.
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    /// Mutably borrow a class.
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.index()]
    }

    /// Borrow a module.
    pub fn module(&self, id: ModuleId) -> &ModuleDef {
        &self.modules[id.index()]
    }

    /// Mutably borrow a module.
    pub fn module_mut(&mut self, id: ModuleId) -> &mut ModuleDef {
        &mut self.modules[id.index()]
    }

    // ==========================================================================
    // Scope helpers
    // ==========================================================================

    /// Name of a scope.
    pub fn scope_name(&self, scope: ScopeRef) -> &str {
        match scope {
            ScopeRef::Class(id) => &self.class(id).name,
            ScopeRef::Module(id) => &self.module(id).name,
        }
    }

    /// Read a constant bound directly under a scope.
    pub fn const_get(&self, scope: ScopeRef, name: &str) -> Option<Value> {
        let constants = match scope {
            ScopeRef::Class(id) => &self.class(id).constants,
            ScopeRef::Module(id) => &self.module(id).constants,
        };
        constants.get(name).cloned()
    }

    /// Bind a constant directly under a scope.
    pub fn const_set(&mut self, scope: ScopeRef, name: &str, value: Value) {
        let constants = match scope {
            ScopeRef::Class(id) => &mut self.class_mut(id).constants,
            ScopeRef::Module(id) => &mut self.module_mut(id).constants,
        };
        constants.insert(name.to_string(), value);
    }

    /// Whether a constant is bound directly under a scope.
    pub fn const_defined(&self, scope: ScopeRef, name: &str) -> bool {
        self.const_get(scope, name).is_some()
    }

    /// Resolve a `"Geo::Point"`-style constant path, starting at the root
    /// class's constants.
    pub fn lookup_path(&self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split("::").filter(|s| !s.is_empty()).collect();
        let mut scope = ScopeRef::Class(self.well_known.object);
        let mut resolved = None;
        for (position, segment) in segments.iter().enumerate() {
            let value = self.const_get(scope, segment)?;
            if position + 1 < segments.len() {
                // Only scopes can be descended into.
                scope = match &value {
                    Value::Class(id) => ScopeRef::Class(*id),
                    Value::Module(id) => ScopeRef::Module(*id),
                    _ => return None,
                };
            }
            resolved = Some(value);
        }
        resolved
    }

    /// Freeze a scope against further mutation.
    pub fn freeze(&mut self, scope: ScopeRef) {
        match scope {
            ScopeRef::Class(id) => self.class_mut(id).frozen = true,
            ScopeRef::Module(id) => self.module_mut(id).frozen = true,
        }
    }

    /// Whether a scope is frozen.
    pub fn is_frozen(&self, scope: ScopeRef) -> bool {
        match scope {
            ScopeRef::Class(id) => self.class(id).frozen,
            ScopeRef::Module(id) => self.module(id).frozen,
        }
    }

    /// Borrow a scope's instance method table.
    pub fn methods(&self, scope: ScopeRef) -> &MethodTable {
        match scope {
            ScopeRef::Class(id) => &self.class(id).methods,
            ScopeRef::Module(id) => &self.module(id).methods,
        }
    }

    /// Mutably borrow a scope's instance method table.
    pub fn methods_mut(&mut self, scope: ScopeRef) -> &mut MethodTable {
        match scope {
            ScopeRef::Class(id) => &mut self.class_mut(id).methods,
            ScopeRef::Module(id) => &mut self.module_mut(id).methods,
        }
    }

    /// Borrow a scope's singleton method table.
    pub fn singleton_methods(&self, scope: ScopeRef) -> &MethodTable {
        match scope {
            ScopeRef::Class(id) => &self.class(id).singleton_methods,
            ScopeRef::Module(id) => &self.module(id).singleton_methods,
        }
    }

    /// Mutably borrow a scope's singleton method table.
    pub fn singleton_methods_mut(&mut self, scope: ScopeRef) -> &mut MethodTable {
        match scope {
            ScopeRef::Class(id) => &mut self.class_mut(id).singleton_methods,
            ScopeRef::Module(id) => &mut self.module_mut(id).singleton_methods,
        }
    }

    // ==========================================================================
    // Classification support
    // ==========================================================================

    /// The class of a value.
    pub fn class_of(&self, value: &Value) -> ClassId {
        let wk = &self.well_known;
        match value {
            // Undef never reaches user dispatch; treat it as a bare object.
            Value::Undef => wk.object,
            Value::Nil => wk.nil_class,
            Value::True => wk.true_class,
            Value::False => wk.false_class,
            Value::Fixnum(_) | Value::Bignum(_) => wk.integer,
            Value::Float(_) => wk.float,
            Value::Str(_) => wk.string,
            Value::Symbol(_) => wk.symbol,
            Value::Regexp(_) => wk.regexp,
            Value::Array(_) => wk.array,
            Value::Hash(_) => wk.hash,
            Value::Struct(_) => wk.struct_class,
            Value::File(_) => wk.file,
            Value::Complex(_) => wk.complex,
            Value::Rational(_) => wk.rational,
            Value::Object(id) | Value::Data(id) => self.instance(*id).class,
            Value::Class(_) => wk.class_class,
            Value::Module(_) => wk.module_class,
        }
    }

    /// Whether `value` is a direct instance of `class` (no ancestor walk).
    pub fn is_instance_of(&self, value: &Value, class: ClassId) -> bool {
        self.class_of(value) == class
    }

    /// Describe a value's type for diagnostics.
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Class(id) => self.class(*id).name.clone(),
            Value::Module(id) => self.module(*id).name.clone(),
            other => format!("an instance of {}", self.class(self.class_of(other)).name),
        }
    }

    // ==========================================================================
    // Method resolution
    // ==========================================================================

    /// Resolve the method `name` would dispatch to on `receiver`.
    ///
    /// Objects consult their singleton table first, then the class chain.
    /// Class receivers resolve through the singleton chain; module
    /// receivers through their singleton table. Primitive receivers
    /// resolve through their well-known class. An `Undefined` marker is
    /// returned as found — dispatch stops there.
    pub fn resolve_method(&self, receiver: &Value, name: SymbolId) -> Option<&MethodEntry> {
        match receiver {
            Value::Object(id) | Value::Data(id) => {
                let instance = self.instance(*id);
                if let Some(entry) = instance.singleton_methods.get(&name) {
                    return Some(entry);
                }
                self.resolve_instance_method(instance.class, name)
            }
            Value::Class(id) => self.resolve_singleton_method(*id, name),
            Value::Module(id) => self.module(*id).singleton_methods.get(&name),
            other => self.resolve_instance_method(self.class_of(other), name),
        }
    }

    /// Whether `name` is currently defined on a scope: for classes the
    /// whole superclass chain counts, for modules only the module's own
    /// table. Undef markers do not count as defined.
    pub fn method_defined(&self, scope: ScopeRef, name: SymbolId) -> bool {
        let entry = match scope {
            ScopeRef::Class(id) => self.resolve_instance_method(id, name),
            ScopeRef::Module(id) => self.module(id).methods.get(&name),
        };
        entry.is_some_and(|entry| !entry.is_undefined())
    }

    fn resolve_instance_method(&self, class: ClassId, name: SymbolId) -> Option<&MethodEntry> {
        let mut current = Some(class);
        while let Some(id) = current {
            let def = self.class(id);
            if let Some(entry) = def.methods.get(&name) {
                return Some(entry);
            }
            current = def.superclass;
        }
        None
    }

    fn resolve_singleton_method(&self, class: ClassId, name: SymbolId) -> Option<&MethodEntry> {
        let mut current = Some(class);
        while let Some(id) = current {
            let def = self.class(id);
            if let Some(entry) = def.singleton_methods.get(&name) {
                return Some(entry);
            }
            current = def.superclass;
        }
        None
    }
}

/// Classes and modules every heap starts with.
///
/// The wider catalogue of built-in constants lives in the host runtime;
/// the bridge needs only these, reachable by field or by name.
#[derive(Debug, Clone)]
pub struct WellKnown {
    pub object: ClassId,
    pub module_class: ClassId,
    pub class_class: ClassId,
    pub numeric: ClassId,
    pub integer: ClassId,
    pub float: ClassId,
    pub complex: ClassId,
    pub rational: ClassId,
    pub string: ClassId,
    pub symbol: ClassId,
    pub regexp: ClassId,
    pub array: ClassId,
    pub hash: ClassId,
    pub struct_class: ClassId,
    pub io: ClassId,
    pub file: ClassId,
    pub data: ClassId,
    pub nil_class: ClassId,
    pub true_class: ClassId,
    pub false_class: ClassId,
    pub kernel: ModuleId,
    pub comparable: ModuleId,
    pub enumerable: ModuleId,
}

impl WellKnown {
    fn placeholder() -> Self {
        let class = ClassId::from_index(0);
        let module = ModuleId::from_index(0);
        Self {
            object: class,
            module_class: class,
            class_class: class,
            numeric: class,
            integer: class,
            float: class,
            complex: class,
            rational: class,
            string: class,
            symbol: class,
            regexp: class,
            array: class,
            hash: class,
            struct_class: class,
            io: class,
            file: class,
            data: class,
            nil_class: class,
            true_class: class,
            false_class: class,
            kernel: module,
            comparable: module,
            enumerable: module,
        }
    }

    fn bootstrap(heap: &mut HostHeap) -> Self {
        let object = heap.define_class("Object", None);
        let module_class = heap.define_class("Module", Some(object));
        let class_class = heap.define_class("Class", Some(module_class));
        let numeric = heap.define_class("Numeric", Some(object));
        let integer = heap.define_class("Integer", Some(numeric));
        let float = heap.define_class("Float", Some(numeric));
        let complex = heap.define_class("Complex", Some(numeric));
        let rational = heap.define_class("Rational", Some(numeric));
        let string = heap.define_class("String", Some(object));
        let symbol = heap.define_class("Symbol", Some(object));
        let regexp = heap.define_class("Regexp", Some(object));
        let array = heap.define_class("Array", Some(object));
        let hash = heap.define_class("Hash", Some(object));
        let struct_class = heap.define_class("Struct", Some(object));
        let io = heap.define_class("IO", Some(object));
        let file = heap.define_class("File", Some(io));
        let data = heap.define_class("Data", Some(object));
        let nil_class = heap.define_class("NilClass", Some(object));
        let true_class = heap.define_class("TrueClass", Some(object));
        let false_class = heap.define_class("FalseClass", Some(object));
        let kernel = heap.define_module("Kernel");
        let comparable = heap.define_module("Comparable");
        let enumerable = heap.define_module("Enumerable");

        let root = ScopeRef::Class(object);
        let class_bindings: [(&str, ClassId); 20] = [
            ("Object", object),
            ("Module", module_class),
            ("Class", class_class),
            ("Numeric", numeric),
            ("Integer", integer),
            ("Float", float),
            ("Complex", complex),
            ("Rational", rational),
            ("String", string),
            ("Symbol", symbol),
            ("Regexp", regexp),
            ("Array", array),
            ("Hash", hash),
            ("Struct", struct_class),
            ("IO", io),
            ("File", file),
            ("Data", data),
            ("NilClass", nil_class),
            ("TrueClass", true_class),
            ("FalseClass", false_class),
        ];
        for (name, id) in class_bindings {
            heap.const_set(root, name, Value::Class(id));
        }
        for (name, id) in [
            ("Kernel", kernel),
            ("Comparable", comparable),
            ("Enumerable", enumerable),
        ] {
            heap.const_set(root, name, Value::Module(id));
        }

        Self {
            object,
            module_class,
            class_class,
            numeric,
            integer,
            float,
            complex,
            rational,
            string,
            symbol,
            regexp,
            array,
            hash,
            struct_class,
            io,
            file,
            data,
            nil_class,
            true_class,
            false_class,
            kernel,
            comparable,
            enumerable,
        }
    }

    /// Look a well-known binding up by name.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let value = match name {
            "Object" => Value::Class(self.object),
            "Module" => Value::Class(self.module_class),
            "Class" => Value::Class(self.class_class),
            "Numeric" => Value::Class(self.numeric),
            "Integer" => Value::Class(self.integer),
            "Float" => Value::Class(self.float),
            "Complex" => Value::Class(self.complex),
            "Rational" => Value::Class(self.rational),
            "String" => Value::Class(self.string),
            "Symbol" => Value::Class(self.symbol),
            "Regexp" => Value::Class(self.regexp),
            "Array" => Value::Class(self.array),
            "Hash" => Value::Class(self.hash),
            "Struct" => Value::Class(self.struct_class),
            "IO" => Value::Class(self.io),
            "File" => Value::Class(self.file),
            "Data" => Value::Class(self.data),
            "NilClass" => Value::Class(self.nil_class),
            "TrueClass" => Value::Class(self.true_class),
            "FalseClass" => Value::Class(self.false_class),
            "Kernel" => Value::Module(self.kernel),
            "Comparable" => Value::Module(self.comparable),
            "Enumerable" => Value::Module(self.enumerable),
            _ => return None,
        };
        Some(value)
    }
}

impl Default for HostHeap {
    fn default() -> Self {
        Self::new()
    }
}
