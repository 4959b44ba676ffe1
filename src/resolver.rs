// ext-fuzzing/src/resolver.rs
//! Symbol resolution for dotted fuzz-case names
//!
//! A registry is built once at startup by walking the target module's
//! export graph; resolving a case is then a single map lookup plus a tagged
//! dispatch. Precedence, highest first: directly reachable functions (named
//! exports before the default-export sub-tree), static type members, then
//! instance methods. Instance entries construct a fresh instance on every
//! resolution; nothing is cached. Types without a zero-argument constructor
//! keep their statics but their instance methods stay unresolvable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;
use serde_json::Value;

use crate::target::{Constructor, Export, FreeFn, Instance, MethodFn, TargetModule, TargetReturn};

enum Callable {
    /// Free or namespace-qualified function, reachable as a property chain
    Free(FreeFn),
    /// Static member of a type
    Static(FreeFn),
    /// Instance method; resolving constructs the owning type anew
    Instance {
        construct: Constructor,
        method: MethodFn,
    },
}

/// A callable produced by one resolution. Repeated invocations of the same
/// `Bound` share its instance (it is the bound method); resolving the same
/// name again yields an independent instance.
pub struct Bound {
    call: Box<dyn Fn(&[Value]) -> TargetReturn + Send + Sync>,
}

impl Bound {
    pub fn invoke(&self, args: &[Value]) -> TargetReturn {
        (self.call)(args)
    }
}

/// Name -> callable registry for one target module
pub struct Resolver {
    entries: HashMap<String, Callable>,
}

impl Resolver {
    /// Introspect the module's exported symbol graph and build the registry
    pub fn from_module(module: &TargetModule) -> Self {
        let mut entries = HashMap::new();

        // Directly reachable functions win over everything else; named
        // exports win over the default-export sub-tree.
        collect_functions("", module.exports(), &mut entries);
        collect_functions("", module.defaults(), &mut entries);

        // Static members of top-level types, named exports first
        for exports in [module.exports(), module.defaults()] {
            for (name, export) in exports {
                if let Export::Type(ty) = export {
                    collect_statics(name, ty.statics(), &mut entries);
                }
            }
        }

        // Instance methods last; only for types the harness can construct
        for exports in [module.exports(), module.defaults()] {
            for (name, export) in exports {
                if let Export::Type(ty) = export {
                    let Some(construct) = ty.constructor() else {
                        if !ty.methods().is_empty() {
                            debug!(
                                "type {} has no zero-argument constructor; \
                                 skipping {} instance method(s)",
                                name,
                                ty.methods().len()
                            );
                        }
                        continue;
                    };
                    for (path, method) in ty.methods() {
                        let key = format!("{}.{}", name, path);
                        entries.entry(key).or_insert_with(|| Callable::Instance {
                            construct: Arc::clone(construct),
                            method: Arc::clone(method),
                        });
                    }
                }
            }
        }

        Self { entries }
    }

    /// Resolve a dotted name to a callable, or `None` if the name does not
    /// reach anything invocable.
    pub fn resolve(&self, name: &str) -> Option<Bound> {
        match self.entries.get(name)? {
            Callable::Free(f) | Callable::Static(f) => {
                let f = Arc::clone(f);
                Some(Bound {
                    call: Box::new(move |args| f(args)),
                })
            }
            Callable::Instance { construct, method } => {
                // Fresh instance per resolution, shared by calls through
                // this particular binding only.
                let instance: Arc<Mutex<Instance>> = Arc::new(Mutex::new(construct()));
                let method = Arc::clone(method);
                Some(Bound {
                    call: Box::new(move |args| {
                        let mut guard = match instance.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        method(&mut **guard, args)
                    }),
                })
            }
        }
    }

    /// All resolvable names, sorted for stable logging
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

fn collect_functions(prefix: &str, exports: &HashMap<String, Export>, out: &mut HashMap<String, Callable>) {
    for (name, export) in exports {
        let path = join(prefix, name);
        match export {
            Export::Function(f) => {
                out.entry(path).or_insert_with(|| Callable::Free(Arc::clone(f)));
            }
            Export::Namespace(inner) => collect_functions(&path, inner, out),
            // Types are handled in the later passes; a bare type name is
            // not itself invocable.
            Export::Type(_) => {}
        }
    }
}

fn collect_statics(prefix: &str, statics: &HashMap<String, Export>, out: &mut HashMap<String, Callable>) {
    for (name, export) in statics {
        let path = join(prefix, name);
        match export {
            Export::Function(f) => {
                out.entry(path).or_insert_with(|| Callable::Static(Arc::clone(f)));
            }
            Export::Namespace(inner) => collect_statics(&path, inner, out),
            Export::Type(_) => {}
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
