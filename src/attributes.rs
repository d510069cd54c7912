//! Attribute installation with declared visibility.
//!
//! An attribute is up to two method-table entries — `name` reading the
//! backing instance variable and `name=` writing it — installed with the
//! visibility mode the embedder declares for the registration site. The
//! mode arrives as an explicit [`VisibilityContext`] value and is consumed
//! by the call; nothing is retained.

use extbridge_core::{
    MethodEntry, ModuleId, Result, ScopeRef, SymbolId, Visibility, VisibilityContext,
};

use crate::bridge::Bridge;

impl Bridge {
    /// Install reader and/or writer methods for `name` on `target`.
    ///
    /// `context` carries the registration site's declared visibility:
    /// `Default` installs public accessors, `Private`/`Protected`
    /// propagate to both accessors, and `ModuleFunction` (meaningful for
    /// module targets) additionally copies each accessor to the module's
    /// singleton table and leaves the instance copy private.
    pub fn install_attribute(
        &mut self,
        target: ScopeRef,
        name: &str,
        reader: bool,
        writer: bool,
        context: VisibilityContext,
    ) -> Result<()> {
        self.check_mutable(target)?;
        let visibility = context.method_visibility();
        let ivar = self.heap_mut().intern(&format!("@{name}"));
        let mut installed: Vec<SymbolId> = Vec::new();

        if reader {
            let sym = self.heap_mut().intern(name);
            self.heap_mut()
                .methods_mut(target)
                .insert(sym, MethodEntry::Reader { ivar, visibility });
            installed.push(sym);
        }
        if writer {
            let sym = self.heap_mut().intern(&format!("{name}="));
            self.heap_mut()
                .methods_mut(target)
                .insert(sym, MethodEntry::Writer { ivar, visibility });
            installed.push(sym);
        }

        if context.is_module_function() {
            if let ScopeRef::Module(module) = target {
                for sym in installed {
                    self.promote_accessor(module, sym);
                }
            }
        }
        Ok(())
    }

    fn promote_accessor(&mut self, module: ModuleId, name: SymbolId) {
        let scope = ScopeRef::Module(module);
        let copied = {
            let Some(entry) = self.heap_mut().methods_mut(scope).get_mut(&name) else {
                return;
            };
            entry.set_visibility(Visibility::Private);
            let mut copy = entry.clone();
            copy.set_visibility(Visibility::Public);
            copy
        };
        self.heap_mut().singleton_methods_mut(scope).insert(name, copied);
    }
}
