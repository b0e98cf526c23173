use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;

use dec_reflect::TypeHandle;
use dec_reflect::diagnostics::{Category, Location};
use dec_reflect::document::{Document, NodeId};
use dec_reflect::walker::{Env, ReadCx};
use dec_utils::TypeIdMap;
use dec_utils::WorkList;
use dec_utils::hash::{HashMap, HashSet};

use crate::def::AnyDef;
use crate::hierarchy::{Hierarchy, TypeTraitDef};

// -----------------------------------------------------------------------------
// Sources

/// A parsed definition document.
pub(crate) struct Source {
    pub doc: Document,
    /// The document name, prefixed with its module outside `core`.
    pub name: String,
    pub module: usize,
}

impl Source {
    #[inline]
    pub fn location(&self, node: NodeId) -> Location {
        self.doc.location(node, &self.name)
    }
}

// -----------------------------------------------------------------------------
// Declarations

/// One node declaring a definition.
pub(crate) struct Layer {
    pub module: usize,
    pub source: usize,
    pub node: NodeId,
    pub ty: TypeHandle,
    pub def_trait: TypeTraitDef,
    pub is_abstract: Option<bool>,
    pub parent: Option<String>,
}

/// Every node declaring one definition, in module order.
///
/// Later modules patch what earlier ones declared: their content is read
/// after the earlier nodes, and the `abstract` and `parent` attributes they
/// set replace the earlier ones.
pub(crate) struct Declaration {
    pub name: String,
    pub root: TypeHandle,
    pub layers: Vec<Layer>,
}

impl Declaration {
    /// The layer whose `parent` applies, if any sets one.
    pub fn parent(&self) -> Option<(&str, &Layer)> {
        let layer = self.layers.iter().rev().find(|l| l.parent.is_some())?;
        let parent = layer.parent.as_deref()?;
        (!parent.is_empty()).then_some((parent, layer))
    }

    pub fn is_abstract(&self) -> bool {
        self.layers
            .iter()
            .rev()
            .find_map(|l| l.is_abstract)
            .unwrap_or(false)
    }

    /// The layer whose type the definition takes: the most derived one.
    ///
    /// Layers of unrelated types are reported, the later one wins.
    pub fn type_layer(&self, hierarchy: &Hierarchy, sources: &[Source], env: Env<'_>) -> &Layer {
        let mut chosen = &self.layers[0];
        for layer in &self.layers[1..] {
            let (new, old) = (layer.ty.id(), chosen.ty.id());
            if new == old || hierarchy.derives_from(&old, &new) {
                continue;
            }
            if !hierarchy.derives_from(&new, &old) {
                env.reporter.error(
                    Category::Configuration,
                    &sources[layer.source].location(layer.node),
                    format!(
                        "definition `{}` is declared as `{}` and `{}`, which do not derive from \
                         each other; using `{}`",
                        self.name,
                        chosen.ty.type_path(),
                        layer.ty.type_path(),
                        layer.ty.type_path()
                    ),
                );
            }
            chosen = layer;
        }
        chosen
    }
}

/// Declared definitions, keyed by hierarchy root and name, in order of
/// first declaration.
#[derive(Default)]
pub(crate) struct Declarations {
    index: TypeIdMap<HashMap<String, usize>>,
    list: Vec<Declaration>,
}

/// What [`Declarations::insert`] did with a layer.
pub(crate) enum Inserted {
    /// A new definition.
    New,
    /// Added to a definition of earlier modules.
    Layered { over: usize },
    /// Replaced the layer of the same module.
    Duplicate,
}

impl Declarations {
    /// Records a layer. Within one module the last layer wins.
    pub fn insert(&mut self, root: TypeHandle, name: &str, layer: Layer) -> Inserted {
        let names = self.index.get_or_insert(root.id(), HashMap::default);
        let Some(&index) = names.get(name) else {
            names.insert(String::from(name), self.list.len());
            self.list.push(Declaration {
                name: String::from(name),
                root,
                layers: alloc::vec![layer],
            });
            return Inserted::New;
        };

        let layers = &mut self.list[index].layers;
        if let Some(same) = layers.iter().position(|l| l.module == layer.module) {
            layers[same] = layer;
            return Inserted::Duplicate;
        }
        let over = layers[layers.len() - 1].module;
        let at = layers.partition_point(|l| l.module < layer.module);
        layers.insert(at, layer);
        Inserted::Layered { over }
    }

    pub fn get(&self, root: TypeId, name: &str) -> Option<&Declaration> {
        let index = *self.index.get(&root)?.get(name)?;
        Some(&self.list[index])
    }

    #[inline]
    pub fn at(&self, index: usize) -> &Declaration {
        &self.list[index]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Declaration)> {
        self.list.iter().enumerate()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }
}

// -----------------------------------------------------------------------------
// LoadTask

/// Pending work of the second loading pass.
pub(crate) enum LoadTask {
    /// Read one node into a definition.
    Populate {
        def: Rc<dyn AnyDef>,
        source: usize,
        node: NodeId,
    },
    /// Resolve the parent chain of a declaration into `Populate` tasks.
    Inherit { def: Rc<dyn AnyDef>, decl: usize },
}

/// Runs the second pass over `tasks`, in order.
pub(crate) fn run(env: Env<'_>, sources: &[Source], decls: &Declarations, tasks: Vec<LoadTask>) {
    let mut list = WorkList::new();
    for task in tasks.into_iter().rev() {
        list.push(task);
    }

    list.drain(|list, task| match task {
        LoadTask::Populate { def, source, node } => {
            let Source { doc, name, .. } = &sources[source];
            let mut cx = ReadCx::new(env, doc, name);
            def.read_node(&mut cx, node);
        }
        LoadTask::Inherit { def, decl } => {
            let own = decls.at(decl);
            let chain = parent_chain(env, sources, decls, &def, own);
            // Last pushed runs first: the chain's root, down to the
            // definition itself, each declaration in module order.
            for declaration in core::iter::once(own).chain(chain) {
                for layer in declaration.layers.iter().rev() {
                    list.push(LoadTask::Populate {
                        def: Rc::clone(&def),
                        source: layer.source,
                        node: layer.node,
                    });
                }
            }
        }
    });
}

/// Collects the parent declarations of `own`, nearest parent first.
///
/// A missing parent or a loop ends the chain with an error; the
/// declarations found before it still apply.
fn parent_chain<'d>(
    env: Env<'_>,
    sources: &[Source],
    decls: &'d Declarations,
    def: &Rc<dyn AnyDef>,
    own: &'d Declaration,
) -> Vec<&'d Declaration> {
    let mut chain = Vec::new();
    let mut visited: HashSet<&str> = HashSet::default();
    visited.insert(own.name.as_str());

    let mut next = own.parent();
    while let Some((name, layer)) = next.take() {
        let location = sources[layer.source].location(layer.node);
        if !visited.insert(name) {
            env.reporter.error(
                Category::Reference,
                &location,
                format!(
                    "parent chain of `{}` loops back to `{name}`, the chain stops there",
                    def.info().name()
                ),
            );
            break;
        }
        let Some(found) = decls.get(own.root.id(), name) else {
            env.reporter.error(
                Category::Reference,
                &location,
                format!(
                    "`{}` uses parent `{name}`, but no such definition exists",
                    def.info().name()
                ),
            );
            break;
        };
        chain.push(found);
        next = found.parent();
    }
    chain
}
