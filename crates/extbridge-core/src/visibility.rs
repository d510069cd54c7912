//! Visibility modifiers for installed methods.

use std::fmt;

/// Visibility of an entry in a method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// The visibility mode declared at an attribute's registration site.
///
/// The embedder passes this explicitly to registration calls instead of the
/// bridge inspecting the calling frame. A context is consumed by the call
/// it is passed to and never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisibilityContext {
    /// No modifier in effect; installed methods are public.
    #[default]
    Default,
    /// A `private` section is in effect.
    Private,
    /// A `protected` section is in effect.
    Protected,
    /// A `module_function` section is in effect: the instance copy becomes
    /// private and a public copy is added to the scope's singleton table.
    ModuleFunction,
}

impl VisibilityContext {
    /// Snapshot the declared mode of the current registration site from an
    /// embedder-provided inspector.
    ///
    /// Modes are probed in declaration-precedence order; the first one the
    /// inspector reports wins.
    pub fn capture_from(inspector: &dyn FrameVisibility) -> Self {
        for mode in [
            VisibilityContext::Private,
            VisibilityContext::Protected,
            VisibilityContext::ModuleFunction,
        ] {
            if inspector.declared(mode) {
                return mode;
            }
        }
        VisibilityContext::Default
    }

    /// The method-table visibility this mode maps to.
    pub fn method_visibility(self) -> Visibility {
        match self {
            VisibilityContext::Default => Visibility::Public,
            VisibilityContext::Private => Visibility::Private,
            VisibilityContext::Protected => Visibility::Protected,
            VisibilityContext::ModuleFunction => Visibility::Private,
        }
    }

    /// Whether the module-function copy rule applies.
    pub fn is_module_function(self) -> bool {
        matches!(self, VisibilityContext::ModuleFunction)
    }
}

/// Capability for querying the declared visibility mode of an enclosing
/// registration frame.
///
/// Host runtimes that can introspect their call stack implement this and
/// hand the snapshot to the bridge via
/// [`VisibilityContext::capture_from`]; everyone else constructs a
/// [`VisibilityContext`] directly.
pub trait FrameVisibility {
    /// Does the enclosing frame declare itself in `mode`?
    fn declared(&self, mode: VisibilityContext) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Visibility::Public.to_string(), "public");
        assert_eq!(Visibility::Protected.to_string(), "protected");
        assert_eq!(Visibility::Private.to_string(), "private");
    }

    #[test]
    fn context_maps_to_visibility() {
        assert_eq!(
            VisibilityContext::Default.method_visibility(),
            Visibility::Public
        );
        assert_eq!(
            VisibilityContext::Private.method_visibility(),
            Visibility::Private
        );
        assert_eq!(
            VisibilityContext::Protected.method_visibility(),
            Visibility::Protected
        );
        assert_eq!(
            VisibilityContext::ModuleFunction.method_visibility(),
            Visibility::Private
        );
        assert!(VisibilityContext::ModuleFunction.is_module_function());
        assert!(!VisibilityContext::Private.is_module_function());
    }

    struct FixedInspector(VisibilityContext);

    impl FrameVisibility for FixedInspector {
        fn declared(&self, mode: VisibilityContext) -> bool {
            mode == self.0
        }
    }

    #[test]
    fn capture_from_inspector() {
        let ctx = VisibilityContext::capture_from(&FixedInspector(VisibilityContext::Protected));
        assert_eq!(ctx, VisibilityContext::Protected);

        let ctx = VisibilityContext::capture_from(&FixedInspector(VisibilityContext::Default));
        assert_eq!(ctx, VisibilityContext::Default);
    }
}
