//! The runtime: class namespace, override registry, configuration and tracer.
//!
//! A [`Runtime`] is the explicit owner of all state that outlives a single
//! call. Nothing here is global; two runtimes in one process never share
//! classes or override subclasses. Share a runtime across threads by
//! reference or through an `Arc`.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    class::{Class, ClassId, ClassKind, ClassRef, MethodTable},
    config::{ROOT_CLASS_NAME, RuntimeConfig},
    eigen::Eigen,
    error::{RegistrationError, RegistrationFailure},
    method::Method,
    namespace::Namespace,
    object::ObjectRef,
    registry::SubclassRegistry,
    selector::Selector,
    tracer::{EigenTracer, NoopTracer},
};

/// Class ids are unique per process so a class from one runtime can never be
/// mistaken for a class of another.
static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

fn next_class_id() -> ClassId {
    ClassId::new(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
}

/// Owner of classes and override subclasses.
///
/// Every runtime starts with a root class named `Object` implementing:
///
/// | Selector | Signature | Result |
/// |----------|-----------|--------|
/// | `class_name` | `*@:` | name of the receiver's current class |
/// | `description` | `*@:` | `<ClassName #id>` |
/// | `responds_to:` | `B@::` | whether the receiver answers a selector |
#[derive(Debug)]
pub struct Runtime<Tr: EigenTracer = NoopTracer> {
    config: RuntimeConfig,
    namespace: Namespace,
    registry: SubclassRegistry,
    root: ClassRef,
    tracer: Tr,
}

impl Runtime<NoopTracer> {
    /// Creates a runtime with the default configuration and no tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracer(RuntimeConfig::new(), NoopTracer)
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_tracer(config, NoopTracer)
    }
}

impl Default for Runtime<NoopTracer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tr: EigenTracer> Runtime<Tr> {
    #[must_use]
    pub fn with_tracer(config: RuntimeConfig, tracer: Tr) -> Self {
        let root: ClassRef = Arc::new(Class::new(
            next_class_id(),
            Arc::from(ROOT_CLASS_NAME),
            None,
            ClassKind::Defined,
            root_methods(),
        ));
        tracer.on_class_registered(&root);
        Self {
            config,
            namespace: Namespace::with_class(&root),
            registry: SubclassRegistry::new(),
            root,
            tracer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    /// The `Object` class every class descends from.
    #[must_use]
    pub fn root_class(&self) -> &ClassRef {
        &self.root
    }

    /// Looks up a registered class (defined or synthesized) by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<ClassRef> {
        self.namespace.get(name)
    }

    /// Every registered class, oldest first.
    #[must_use]
    pub fn classes(&self) -> Vec<ClassRef> {
        self.namespace.classes()
    }

    /// Whether a class with `name` is registered.
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.namespace.contains(name)
    }

    #[must_use]
    pub fn registry(&self) -> &SubclassRegistry {
        &self.registry
    }

    /// The override subclass for `original`, created on first use.
    pub fn subclass_for(&self, original: &ClassRef) -> Result<ClassRef, RegistrationError> {
        self.registry.subclass_for(self, original)
    }

    /// Binds `object` to its override subclass; see [`Eigen::bind`].
    pub fn eigen(&self, object: &ObjectRef) -> Result<Eigen<'_, Tr>, RegistrationError> {
        Eigen::bind(self, object)
    }

    /// Snapshot of the runtime's classes and overrides.
    #[must_use]
    pub fn stats(&self) -> RuntimeStats {
        let overrides_by_class = self
            .registry
            .synthesized()
            .iter()
            .map(|class| (class.name().to_owned(), class.own_method_count()))
            .collect();
        RuntimeStats {
            classes: self.namespace.len(),
            synthesized_subclasses: self.registry.len(),
            failed_registrations: self.registry.failed_count(),
            overrides_by_class,
        }
    }

    /// Creates a class and adds it to the namespace.
    ///
    /// Override subclasses are leaves: no class may inherit from one, so
    /// overrides never reach instances that were not bound.
    pub(crate) fn create_class(
        &self,
        name: &str,
        superclass: Option<ClassRef>,
        kind: ClassKind,
        methods: MethodTable,
    ) -> Result<ClassRef, RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::new(name, RegistrationFailure::EmptyName));
        }
        if let Some(parent) = &superclass
            && parent.is_synthesized()
        {
            return Err(RegistrationError::new(
                name,
                RegistrationFailure::SynthesizedSuperclass {
                    superclass: parent.name().to_owned(),
                },
            ));
        }
        let depth = superclass.as_ref().map_or(0, |parent| parent.depth() + 1);
        if let Some(limit) = self.config.max_inheritance_depth
            && depth > limit
        {
            return Err(RegistrationError::new(
                name,
                RegistrationFailure::InheritanceTooDeep { limit },
            ));
        }
        let class = Arc::new(Class::new(next_class_id(), Arc::from(name), superclass, kind, methods));
        self.namespace.insert(&class)?;
        self.tracer.on_class_registered(&class);
        Ok(class)
    }
}

fn root_methods() -> MethodTable {
    let mut table = MethodTable::default();
    let methods = [
        Method::typed(Selector::new("class_name"), |this: &ObjectRef| {
            this.class().name().to_owned()
        }),
        Method::typed(Selector::new("description"), |this: &ObjectRef| {
            format!("<{} #{}>", this.class().name(), this.id())
        }),
        Method::typed(Selector::new("responds_to:"), |this: &ObjectRef, selector: Selector| {
            this.responds_to(&selector)
        }),
    ];
    for method in methods {
        table.insert(method.selector().clone(), method);
    }
    table
}

/// Snapshot of a runtime's classes and overrides.
///
/// `overrides_by_class` maps each override subclass name to the number of
/// methods installed on it, in a `BTreeMap` for deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RuntimeStats {
    /// Registered classes, including the root and every override subclass.
    pub classes: usize,
    pub synthesized_subclasses: usize,
    /// Original classes whose override subclass could not be registered.
    pub failed_registrations: usize,
    pub overrides_by_class: BTreeMap<String, usize>,
}

impl RuntimeStats {
    /// Renders the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
