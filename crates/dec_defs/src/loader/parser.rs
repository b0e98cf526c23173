use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use std::path::Path;

use dec_reflect::TypeHandle;
use dec_reflect::diagnostics::{Category, Location, Reporter};
use dec_reflect::document::{Document, NodeId};
use dec_reflect::registry::TypeDirectory;

use crate::engine::{Engine, EngineStatus};
use crate::hierarchy::{Hierarchy, TypeTraitDef};
use crate::loader::inheritance::{Declarations, Inserted, Layer, LoadTask, Source, run};
use crate::loader::{CORE_MODULE, DEFS_TAG, validate_name};

// -----------------------------------------------------------------------------
// DefParser

/// Loads definition documents into an [`Engine`].
///
/// Created by [`Engine::parser`]. Documents are added with
/// [`add_string`](Self::add_string) or [`add_file`](Self::add_file), or to
/// a named module through [`module`](Self::module). Then
/// [`finish`](Self::finish) creates every definition, fills it in and runs
/// the finalize hooks.
pub struct DefParser<'e> {
    engine: &'e mut Engine,
    modules: Vec<String>,
    sources: Vec<Source>,
    declarations: Declarations,
}

impl<'e> DefParser<'e> {
    pub(crate) fn new(engine: &'e mut Engine) -> Self {
        Self {
            engine,
            modules: alloc::vec![String::from(CORE_MODULE)],
            sources: Vec::new(),
            declarations: Declarations::default(),
        }
    }

    /// Adds a document to the `core` module.
    ///
    /// `source` names the document in diagnostics, usually its file name.
    #[inline]
    pub fn add_string(&mut self, input: &str, source: &str) {
        self.add_source(0, input, source);
    }

    /// Reads a file and adds it to the `core` module, named by its file name.
    #[inline]
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        self.add_path(0, path.as_ref())
    }

    /// Opens the module `name`, creating it after the existing ones.
    ///
    /// Modules apply in creation order, whatever order their documents
    /// are added in. A definition declared again in a later module patches
    /// the earlier declaration instead of replacing it: its content is read
    /// on top, and the `parent` and `abstract` attributes it sets take over.
    /// Its type may change to a type derived from the earlier one.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut parser = engine.parser();
    /// parser.add_file("defs/items.xml")?;
    /// parser.module("Expansion").add_file("expansion/items.xml")?;
    /// parser.finish();
    /// ```
    pub fn module(&mut self, name: &str) -> DefModule<'_, 'e> {
        let module = match self.modules.iter().position(|m| m == name) {
            Some(index) => index,
            None => {
                self.modules.push(String::from(name));
                self.modules.len() - 1
            }
        };
        DefModule {
            parser: self,
            module,
        }
    }

    fn add_path(&mut self, module: usize, path: &Path) -> std::io::Result<()> {
        let input = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
        log::debug!(
            "loading definitions of `{}` from `{}`",
            self.modules[module],
            path.display()
        );
        self.add_source(module, &input, &name);
        Ok(())
    }

    fn add_source(&mut self, module: usize, input: &str, source: &str) {
        let name = match module {
            0 => String::from(source),
            _ => format!("{}:{source}", self.modules[module]),
        };

        let reporter = &self.engine.reporter;
        if input.trim_end().ends_with(".xml") {
            reporter.error(
                Category::Structural,
                &Location::new(name.as_str(), None),
                format!(
                    "the input looks like a file name (`{}`); pass the content, or use `add_file`",
                    input.trim()
                ),
            );
        }

        let Some(doc) = Document::from_xml(input, &name, reporter) else {
            return;
        };
        self.sources.push(Source { doc, name, module });
        self.register(self.sources.len() - 1);
    }

    /// First pass over one document.
    fn register(&mut self, index: usize) {
        let Self {
            engine,
            modules,
            sources,
            declarations,
        } = self;
        let Source { doc, name: source, module } = &sources[index];
        let env = Pass1 {
            directory: &engine.directory,
            hierarchy: engine.database.hierarchy(),
            reporter: &engine.reporter,
            modules,
            doc,
            source,
        };

        let roots = doc.roots();
        if roots.len() > 1 {
            env.error(
                Category::Structural,
                roots[1],
                format!("found {} root elements instead of 1", roots.len()),
            );
        }
        for &root in roots {
            if doc.tag(root) != DEFS_TAG {
                env.reporter.warn(
                    Category::Structural,
                    &env.location(root),
                    format!("root element should be <{DEFS_TAG}>, found <{}>", doc.tag(root)),
                );
            }
            if doc.text(root).is_some_and(|t| !t.trim().is_empty()) {
                env.error(Category::Structural, root, "text directly inside the root element is ignored");
            }
            for &node in doc.children(root) {
                register_node(&env, declarations, *module, index, node);
            }
        }
    }

    /// Creates the declared definitions, runs the second pass and the
    /// finalize hooks.
    pub fn finish(self) {
        let Self {
            engine,
            sources,
            declarations,
            ..
        } = self;

        let mut created = Vec::with_capacity(declarations.len());
        {
            let env = engine.env();
            for (index, decl) in declarations.iter() {
                if decl.is_abstract() {
                    continue;
                }
                let layer = decl.type_layer(engine.database.hierarchy(), &sources, env);
                let location = sources[layer.source].location(layer.node);
                let Some(def) = layer.def_trait.make() else {
                    env.reporter.error(
                        Category::Configuration,
                        &location,
                        format!(
                            "`{}` is an abstract type and cannot be instantiated",
                            layer.ty.type_path()
                        ),
                    );
                    continue;
                };
                def.info().set_name(&decl.name);
                def.info().set_location(location);
                created.push((decl.root.id(), index, def));
            }
        }

        let mut tasks = Vec::with_capacity(created.len());
        for (root, index, def) in created {
            engine.database.insert(root, Rc::clone(&def));
            let decl = declarations.at(index);
            if decl.parent().is_some() {
                tasks.push(LoadTask::Inherit { def, decl: index });
                continue;
            }
            for layer in &decl.layers {
                tasks.push(LoadTask::Populate {
                    def: Rc::clone(&def),
                    source: layer.source,
                    node: layer.node,
                });
            }
        }

        log::debug!(
            "populating {} definitions from {} documents",
            engine.database.len(),
            sources.len()
        );
        run(engine.env(), &sources, &declarations, tasks);

        let mut errors = Vec::new();
        for def in engine.database.iter() {
            def.config_errors(&mut errors);
            report_all(&engine.reporter, &**def, &mut errors);
        }
        for def in engine.database.iter() {
            def.post_load(&mut errors);
            report_all(&engine.reporter, &**def, &mut errors);
        }

        engine.set_status(EngineStatus::Finished);
    }
}

fn report_all(reporter: &Reporter, def: &dyn crate::def::AnyDef, errors: &mut Vec<String>) {
    for error in errors.drain(..) {
        reporter.error(
            Category::Configuration,
            &def.info().location(),
            format!("{} `{}`: {error}", def.def_type().type_path(), def.info().name()),
        );
    }
}

// -----------------------------------------------------------------------------
// DefModule

/// A named module of a [`DefParser`], from [`DefParser::module`].
pub struct DefModule<'p, 'e> {
    parser: &'p mut DefParser<'e>,
    module: usize,
}

impl DefModule<'_, '_> {
    /// Adds a document to this module.
    ///
    /// Diagnostics name it `module:source`.
    #[inline]
    pub fn add_string(&mut self, input: &str, source: &str) {
        self.parser.add_source(self.module, input, source);
    }

    /// Reads a file and adds it to this module.
    #[inline]
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        self.parser.add_path(self.module, path.as_ref())
    }

    /// The module name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.parser.modules[self.module]
    }
}

// -----------------------------------------------------------------------------
// First pass

struct Pass1<'a> {
    directory: &'a TypeDirectory,
    hierarchy: &'a Hierarchy,
    reporter: &'a Reporter,
    modules: &'a [String],
    doc: &'a Document,
    source: &'a str,
}

impl Pass1<'_> {
    #[inline]
    fn location(&self, node: NodeId) -> Location {
        self.doc.location(node, self.source)
    }

    #[inline]
    fn error(&self, category: Category, node: NodeId, message: impl Into<String>) {
        self.reporter.error(category, &self.location(node), message);
    }
}

fn register_node(
    env: &Pass1<'_>,
    declarations: &mut Declarations,
    module: usize,
    source: usize,
    node: NodeId,
) {
    let doc = env.doc;
    let tag = doc.tag(node);
    let location = env.location(node);

    let Some(meta) = env.directory.resolve_reported(tag, env.reporter, &location) else {
        return;
    };
    let Some(def_trait) = meta.get_trait::<TypeTraitDef>() else {
        env.error(
            Category::Reference,
            node,
            format!("`{tag}` is not a definition type"),
        );
        return;
    };

    let Some(name) = doc.attr(node, "defName") else {
        env.error(Category::Shape, node, format!("<{tag}> has no `defName`"));
        return;
    };
    if let Err(hint) = validate_name(name) {
        env.error(
            Category::Shape,
            node,
            format!("definition name `{name}` is not a valid identifier; {hint}"),
        );
        return;
    }

    let is_abstract = match doc.attr(node, "abstract") {
        None => None,
        Some(text) if text.eq_ignore_ascii_case("true") => Some(true),
        Some(text) if text.eq_ignore_ascii_case("false") => Some(false),
        Some(text) => {
            env.error(
                Category::Shape,
                node,
                format!("invalid `abstract` value `{text}`, expected `true` or `false`"),
            );
            None
        }
    };

    let Some(root) = env.hierarchy.root(&meta.id()) else {
        env.error(
            Category::Configuration,
            node,
            format!("`{tag}` has no valid hierarchy root, the definition is skipped"),
        );
        return;
    };

    let layer = Layer {
        module,
        source,
        node,
        ty: TypeHandle::from_meta(meta),
        def_trait: *def_trait,
        is_abstract,
        parent: doc.attr(node, "parent").map(String::from),
    };
    match declarations.insert(root, name, layer) {
        Inserted::New => {}
        Inserted::Layered { over } => log::debug!(
            "module `{}` patches `{}:{name}` of module `{}`",
            env.modules[module],
            root.type_path(),
            env.modules[over]
        ),
        Inserted::Duplicate => env.error(
            Category::Shape,
            node,
            format!("definition `{}:{name}` is defined twice, the last one wins", root.type_path()),
        ),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use crate::engine::EngineStatus;
    use crate::fixtures::{BaseDef, Fixture, ItemDef, ThingDef};

    #[test]
    fn parents_apply_root_first() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Base defName="B" abstract="true"><v>1</v></Base>
                <Thing parent="B" defName="T"><w>2</w></Thing>
            </Defs>"#,
        );
        fx.assert_clean();

        let thing = fx.engine.get::<ThingDef>("T").unwrap();
        assert_eq!((thing.borrow().base.v, thing.borrow().w), (1, 2));
        assert!(fx.engine.get::<BaseDef>("B").is_none());
        assert!(fx.engine.get::<ThingDef>("B").is_none());
        assert_eq!(fx.engine.database.len(), 1);
    }

    #[test]
    fn children_override_only_what_they_name() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Thing defName="Grand" abstract="true"><v>3</v><w>42</w></Thing>
                <Thing defName="Mid" parent="Grand"><label>mid</label></Thing>
                <Thing defName="Child" parent="Mid"><w>60</w></Thing>
            </Defs>"#,
        );
        fx.assert_clean();

        let child = fx.engine.get::<ThingDef>("Child").unwrap();
        let child = child.borrow();
        assert_eq!((child.base.v, child.w), (3, 60));
        assert_eq!(child.base.label, "mid");

        let mid = fx.engine.get::<ThingDef>("Mid").unwrap();
        assert_eq!((mid.borrow().base.v, mid.borrow().w), (3, 42));
    }

    #[test]
    fn parents_may_come_later() {
        let mut fx = Fixture::new();
        fx.load_all(&[
            r#"<Defs><Thing defName="Late" parent="Early"><w>2</w></Thing></Defs>"#,
            r#"<Defs><Base defName="Early" abstract="true"><v>7</v></Base></Defs>"#,
        ]);
        fx.assert_clean();

        let late = fx.engine.get::<ThingDef>("Late").unwrap();
        assert_eq!((late.borrow().base.v, late.borrow().w), (7, 2));
    }

    #[test]
    fn duplicate_names_keep_the_last() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Item defName="Sword"><damage>1</damage></Item>
                <Item defName="Shield" />
                <Item defName="Sword"><damage>2</damage></Item>
            </Defs>"#,
        );

        assert!(fx.collected.has_error("defined twice"));
        let sword = fx.engine.get::<ItemDef>("Sword").unwrap();
        assert_eq!(sword.borrow().damage, 2);
        assert_eq!(sword.info().index(), 0);

        let names: Vec<String> = fx
            .engine
            .database
            .iter()
            .map(|d| String::from(&*d.info().name()))
            .collect();
        assert_eq!(names, ["Sword", "Shield"]);
    }

    #[test]
    fn unknown_fields_do_not_block_siblings() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Item defName="Sword" colour="red"><damage>5</damage><Weight>2</Weight><weight>3</weight></Item>
            </Defs>"#,
        );

        assert!(fx.collected.has_error("unknown attribute `colour`"));
        assert!(fx.collected.has_error("did you mean `weight`?"));
        let sword = fx.engine.get::<ItemDef>("Sword").unwrap();
        assert_eq!((sword.borrow().damage, sword.borrow().weight), (5, 3));
    }

    #[test]
    fn broken_chains_keep_what_they_found() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Thing defName="Orphan" parent="Nobody"><w>1</w></Thing>
                <Thing defName="A" parent="B"><v>1</v></Thing>
                <Thing defName="B" parent="A"><w>2</w></Thing>
            </Defs>"#,
        );

        assert!(fx.collected.has_error("no such definition exists"));
        assert!(fx.collected.has_error("loops back to"));
        assert_eq!(fx.engine.get::<ThingDef>("Orphan").unwrap().borrow().w, 1);

        let a = fx.engine.get::<ThingDef>("A").unwrap();
        assert_eq!((a.borrow().base.v, a.borrow().w), (1, 2));
    }

    #[test]
    fn bad_declarations_are_skipped() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Item defName="Iron Sword" />
                <Item />
                <Unknown defName="X" />
                <i32 defName="Y" />
                <Item defName="Fine" abstract="maybe" />
            </Defs>"#,
        );

        assert!(fx.collected.has_error("consider removing spaces"));
        assert!(fx.collected.has_error("has no `defName`"));
        assert!(fx.collected.has_error("`Unknown`"));
        assert!(fx.collected.has_error("`i32` is not a definition type"));
        assert!(fx.collected.has_error("invalid `abstract` value"));
        assert_eq!(fx.engine.database.len(), 1);
        assert!(fx.engine.get::<ItemDef>("Fine").is_some());
    }

    #[test]
    fn references_resolve_in_any_order() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Item defName="Sword"><upgrade>Blade</upgrade></Item>
                <Item defName="Blade"><upgrade>Sword</upgrade></Item>
            </Defs>"#,
        );
        fx.assert_clean();

        let sword = fx.engine.get::<ItemDef>("Sword").unwrap();
        let blade = fx.engine.get::<ItemDef>("Blade").unwrap();
        assert_eq!(sword.borrow().upgrade.get(), Some(&blade));
        assert_eq!(blade.borrow().upgrade.get(), Some(&sword));

        // Break the cycle.
        blade.borrow_mut().upgrade.0 = None;
    }

    #[test]
    fn finalize_validates_then_sets_up() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Item defName="Heavy"><weight>500</weight></Item>
                <Item defName="Light"><weight>1</weight></Item>
            </Defs>"#,
        );

        let errors = fx.collected.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("`Heavy`: weight 500 is over 100"));
        assert_eq!(errors[0].location.line, Some(2));

        let light = fx.engine.get::<ItemDef>("Light").unwrap();
        assert_eq!(light.borrow().setup_order, Some(1));
        let heavy = fx.engine.get::<ItemDef>("Heavy").unwrap();
        assert_eq!(heavy.borrow().setup_order, Some(0));
        assert_eq!(fx.engine.status(), EngineStatus::Finished);
    }

    #[test]
    fn a_finished_engine_needs_clear() {
        let mut fx = Fixture::new();
        fx.load(r#"<Defs><Item defName="A" /></Defs>"#);
        fx.assert_clean();

        fx.load(r#"<Defs><Item defName="B" /></Defs>"#);
        assert!(fx.collected.has_error("call `clear` first"));

        fx.collected.clear();
        fx.engine.clear();
        assert_eq!(fx.engine.status(), EngineStatus::Uninitialized);
        assert!(fx.engine.database.is_empty());
        fx.load(r#"<Defs><Item defName="C" /></Defs>"#);
        fx.assert_clean();
        assert_eq!(fx.engine.database.len(), 1);
    }

    #[test]
    fn file_names_are_caught() {
        let mut fx = Fixture::new();
        let mut parser = fx.engine.parser();
        parser.add_string("items.xml", "items");
        parser.finish();
        assert!(fx.collected.has_error("looks like a file name"));
    }

    #[test]
    fn later_modules_patch_earlier_definitions() {
        let mut fx = Fixture::new();
        let mut parser = fx.engine.parser();
        parser.add_string(
            r#"<Defs><Item defName="Sword"><damage>5</damage><weight>3</weight></Item></Defs>"#,
            "items.xml",
        );
        parser.module("Expansion").add_string(
            r#"<Defs>
                <Item defName="Sword"><damage>9</damage></Item>
                <Item defName="Axe"><damage>4</damage></Item>
            </Defs>"#,
            "items.xml",
        );
        parser.finish();
        fx.assert_clean();

        let sword = fx.engine.get::<ItemDef>("Sword").unwrap();
        assert_eq!((sword.borrow().damage, sword.borrow().weight), (9, 3));
        assert_eq!(sword.info().location().source, "items.xml");

        let names: Vec<String> = fx
            .engine
            .database
            .iter()
            .map(|d| String::from(&*d.info().name()))
            .collect();
        assert_eq!(names, ["Sword", "Axe"]);
    }

    #[test]
    fn modules_apply_in_creation_order() {
        let mut fx = Fixture::new();
        let mut parser = fx.engine.parser();
        parser.module("Expansion").add_string(
            r#"<Defs><Item defName="Sword"><damage>9</damage></Item></Defs>"#,
            "late.xml",
        );
        parser.add_string(
            r#"<Defs><Item defName="Sword"><damage>5</damage><weight>3</weight></Item></Defs>"#,
            "core.xml",
        );
        assert_eq!(parser.module("Expansion").name(), "Expansion");
        parser.finish();
        fx.assert_clean();

        let sword = fx.engine.get::<ItemDef>("Sword").unwrap();
        assert_eq!((sword.borrow().damage, sword.borrow().weight), (9, 3));
    }

    #[test]
    fn later_modules_may_change_parent_type_and_abstract() {
        let mut fx = Fixture::new();
        let mut parser = fx.engine.parser();
        parser.add_string(
            r#"<Defs>
                <Base defName="Template" abstract="true"><v>4</v><label>template</label></Base>
                <Base defName="Lamp"><v>1</v></Base>
                <Item defName="Prop" />
            </Defs>"#,
            "core.xml",
        );
        parser.module("Lighting").add_string(
            r#"<Defs>
                <Thing defName="Lamp" parent="Template"><w>2</w></Thing>
                <Item defName="Prop" abstract="true" />
            </Defs>"#,
            "lamps.xml",
        );
        parser.finish();
        fx.assert_clean();

        let lamp = fx.engine.get::<ThingDef>("Lamp").unwrap();
        let lamp = lamp.borrow();
        assert_eq!((lamp.base.v, lamp.w), (1, 2));
        assert_eq!(lamp.base.label, "template");
        assert!(fx.engine.get::<ItemDef>("Prop").is_none());
    }

    #[test]
    fn duplicates_within_a_module_are_still_reported() {
        let mut fx = Fixture::new();
        let mut parser = fx.engine.parser();
        parser.add_string(r#"<Defs><Item defName="Sword" /></Defs>"#, "core.xml");
        let mut expansion = parser.module("Expansion");
        expansion.add_string(r#"<Defs><Item defName="Sword"><damage>2</damage></Item></Defs>"#, "a.xml");
        expansion.add_string(r#"<Defs><Item defName="Sword"><damage>3</damage></Item></Defs>"#, "b.xml");
        parser.finish();

        let errors = fx.collected.errors();
        assert_eq!(errors.len(), 1, "{:?}", fx.collected);
        assert!(errors[0].message.contains("defined twice"));
        assert_eq!(errors[0].location.source, "Expansion:b.xml");
        assert_eq!(fx.engine.get::<ItemDef>("Sword").unwrap().borrow().damage, 3);
    }
}
