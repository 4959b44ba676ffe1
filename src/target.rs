// ext-fuzzing/src/target.rs
//! Model of the loaded target module
//!
//! The module under test is injected into the harness as a ready-made
//! namespace: named exports, an optional default-export sub-tree, nested
//! namespaces, and types carrying static members and instance methods.
//! Target functions take JSON argument lists and either return immediately
//! or hand back a future the executor awaits.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

/// Opaque instance state for a constructed target type
pub type Instance = Box<dyn Any + Send>;

/// A free or static target function
pub type FreeFn = Arc<dyn Fn(&[Value]) -> TargetReturn + Send + Sync>;

/// An instance method; receives the owning instance's state
pub type MethodFn = Arc<dyn Fn(&mut (dyn Any + Send), &[Value]) -> TargetReturn + Send + Sync>;

/// Zero-argument constructor for a target type
pub type Constructor = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Outcome of invoking a target function: settled, or still pending
pub enum TargetReturn {
    /// The function returned synchronously
    Ready(Result<Value, String>),
    /// The function returned an awaitable; the executor suspends on it
    Pending(BoxFuture<'static, Result<Value, String>>),
}

/// One named export of the target module
pub enum Export {
    /// A directly invocable function
    Function(FreeFn),
    /// A nested namespace of further exports
    Namespace(HashMap<String, Export>),
    /// A type with static members and instance methods
    Type(TypeDescriptor),
}

/// A target type: optional zero-argument constructor, static members, and
/// instance methods keyed by the dotted path after the type name.
pub struct TypeDescriptor {
    construct: Option<Constructor>,
    statics: HashMap<String, Export>,
    methods: HashMap<String, MethodFn>,
}

impl TypeDescriptor {
    /// A type the harness cannot instantiate (constructor needs arguments).
    /// Its statics resolve; its instance methods do not.
    pub fn opaque() -> Self {
        Self {
            construct: None,
            statics: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    /// A type with a zero-argument constructor producing fresh state
    pub fn constructible<T, F>(construct: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            construct: Some(Arc::new(move || Box::new(construct()) as Instance)),
            statics: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    /// Add a static member (function or nested namespace)
    pub fn static_member(mut self, name: &str, export: Export) -> Self {
        self.statics.insert(name.to_string(), export);
        self
    }

    /// Add an instance method under `path` (dotted for method groups)
    pub fn method(mut self, path: &str, method: MethodFn) -> Self {
        self.methods.insert(path.to_string(), method);
        self
    }

    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.construct.as_ref()
    }

    pub(crate) fn statics(&self) -> &HashMap<String, Export> {
        &self.statics
    }

    pub(crate) fn methods(&self) -> &HashMap<String, MethodFn> {
        &self.methods
    }
}

/// The injected target namespace
pub struct TargetModule {
    exports: HashMap<String, Export>,
    default_export: HashMap<String, Export>,
}

impl TargetModule {
    pub fn new() -> Self {
        Self {
            exports: HashMap::new(),
            default_export: HashMap::new(),
        }
    }

    /// Add a named export
    pub fn export(mut self, name: &str, export: Export) -> Self {
        self.exports.insert(name.to_string(), export);
        self
    }

    /// Add an entry under the default-export sub-tree
    pub fn default_export(mut self, name: &str, export: Export) -> Self {
        self.default_export.insert(name.to_string(), export);
        self
    }

    pub(crate) fn exports(&self) -> &HashMap<String, Export> {
        &self.exports
    }

    pub(crate) fn defaults(&self) -> &HashMap<String, Export> {
        &self.default_export
    }
}

impl Default for TargetModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a synchronous function as an export
pub fn sync_fn<F>(f: F) -> Export
where
    F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
{
    Export::Function(Arc::new(move |args| TargetReturn::Ready(f(args))))
}

/// Wrap an asynchronous function as an export. The argument list is cloned
/// into the future so the executor can await it without borrowing the case.
pub fn async_fn<F, Fut>(f: F) -> Export
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, String>> + Send + 'static,
{
    Export::Function(Arc::new(move |args| {
        TargetReturn::Pending(Box::pin(f(args.to_vec())))
    }))
}

/// Wrap a namespace of exports
pub fn namespace(entries: Vec<(&str, Export)>) -> Export {
    Export::Namespace(
        entries
            .into_iter()
            .map(|(name, export)| (name.to_string(), export))
            .collect(),
    )
}

/// Wrap a typed instance method. Dispatch fails cleanly if the registry
/// ever binds it to the wrong instance type.
pub fn method_fn<T, F>(f: F) -> MethodFn
where
    T: Any + Send,
    F: Fn(&mut T, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
{
    Arc::new(move |instance, args| match instance.downcast_mut::<T>() {
        Some(state) => TargetReturn::Ready(f(state, args)),
        None => TargetReturn::Ready(Err("method bound to wrong instance type".to_string())),
    })
}
