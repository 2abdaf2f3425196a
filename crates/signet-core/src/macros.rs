//! Macro descriptors and the registry discovery consults.

use std::collections::HashMap;

/// Name of the wrapper macro that signs a whole subtree
pub const SIGN_MACRO: &str = "sign";

/// Priority macros get unless they ask for another one
pub const DEFAULT_PRIORITY: i32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MacroKind {
    /// Body is code executed by a script engine
    Script,
    /// Body is markup elevated as a whole by one signature
    SignWrapper,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroDescriptor {
    pub name: String,
    pub kind: MacroKind,
    /// Lower runs first
    pub priority: i32,
    pub description: String,
    pub supports_inline: bool,
}

impl MacroDescriptor {
    pub fn new(name: impl Into<String>, kind: MacroKind) -> Self {
        Self {
            name: name.into(),
            kind,
            priority: DEFAULT_PRIORITY,
            description: String::new(),
            supports_inline: false,
        }
    }

    pub fn script(name: impl Into<String>) -> Self {
        Self::new(name, MacroKind::Script).with_description("Execute a script")
    }

    /// The sign wrapper runs before the macros it contains
    pub fn sign_wrapper() -> Self {
        Self::new(SIGN_MACRO, MacroKind::SignWrapper)
            .with_priority(10)
            .with_description("Sign all the included content")
            .inline()
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inline(mut self) -> Self {
        self.supports_inline = true;
        self
    }

    /// Script macros and the sign wrapper can carry a signature
    pub fn signable(&self) -> bool {
        matches!(self.kind, MacroKind::Script | MacroKind::SignWrapper)
    }
}

/// Case-insensitive macro lookup
#[derive(Clone, Debug)]
pub struct MacroRegistry {
    macros: HashMap<String, MacroDescriptor>,
}

impl MacroRegistry {
    /// Registry with no macros at all
    pub fn empty() -> Self {
        Self {
            macros: HashMap::new(),
        }
    }

    /// Register a descriptor, returning the one it replaces
    pub fn register(&mut self, descriptor: MacroDescriptor) -> Option<MacroDescriptor> {
        self.macros
            .insert(descriptor.name.to_lowercase(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDescriptor> {
        self.macros.get(&name.to_lowercase())
    }

    /// Unknown macros are not signable
    pub fn is_signable(&self, name: &str) -> bool {
        self.get(name).map(MacroDescriptor::signable).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

impl Default for MacroRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for name in ["groovy", "velocity", "python", "ruby", "php", "script"] {
            registry.register(MacroDescriptor::script(name));
        }
        registry.register(MacroDescriptor::sign_wrapper());
        for name in ["html", "include", "code", "box", "info", "warning"] {
            registry.register(MacroDescriptor::new(name, MacroKind::Other));
        }
        registry
    }
}
