//! Whole recorded graphs.
//!
//! A recorded graph is one document:
//!
//! ```xml
//! <Record>
//!   <recordFormatVersion>1</recordFormatVersion>
//!   <refs>
//!     <Ref id="ref00000" class="Monster">...</Ref>
//!   </refs>
//!   <data>...</data>
//! </Record>
//! ```
//!
//! `refs` is left out when nothing is shared. Reading creates a stub per
//! reference record first, then fills each one, then reads `data`.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use dec_utils::hash::HashMap;

use crate::diagnostics::{Category, Location};
use crate::document::{Document, NodeId};
use crate::reflection::Reflect;
use crate::refs::{REF_TAG, StubSeed, Stub, StubTable};
use crate::registry::TypeTraitShared;
use crate::walker::{Env, ReadCx, WriteCx, read_value, write_value};

/// Root tag of a recorded graph.
pub const RECORD_TAG: &str = "Record";
/// Tag holding the format version.
pub const VERSION_TAG: &str = "recordFormatVersion";
/// Tag holding the reference records.
pub const REFS_TAG: &str = "refs";
/// Tag holding the root value.
pub const DATA_TAG: &str = "data";
/// The only format version this crate reads and writes.
pub const FORMAT_VERSION: u32 = 1;

const CLONE_SOURCE: &str = "<clone>";

// -----------------------------------------------------------------------------
// Write

/// Writes `value` as a recorded graph.
pub fn write<T: Reflect>(env: Env<'_>, value: &mut T, pretty: bool) -> String {
    compose_document(env, value).to_xml(pretty)
}

/// Writes `value` as a recorded graph, without serializing it to text.
pub fn compose_document<T: Reflect>(env: Env<'_>, value: &mut T) -> Document {
    compose(env, value, true).0
}

fn compose<T: Reflect>(env: Env<'_>, value: &mut T, require_names: bool) -> (Document, Vec<StubSeed>) {
    let mut cx = WriteCx::recording(env);

    let doc = cx.doc_mut();
    let root = doc.add_root(RECORD_TAG);
    let version = doc.add_child(root, VERSION_TAG);
    doc.set_text(version, format!("{FORMAT_VERSION}"));
    let refs = doc.add_child(root, REFS_TAG);
    let data = doc.add_child(root, DATA_TAG);

    write_value(&mut cx, value, data);

    let (mut doc, tracker) = cx.into_parts();
    let seeds = match tracker {
        Some(mut tracker) => tracker.finish(&mut doc, refs, data, env, require_names),
        None => Vec::new(),
    };
    if doc.children(refs).is_empty() {
        doc.remove_child(root, refs);
    }
    (doc, seeds)
}

// -----------------------------------------------------------------------------
// Read

/// Reads a recorded graph from text.
///
/// Returns `None` if the text is not well-formed or was written by an
/// unsupported format version. Any other problem is reported and read
/// around.
pub fn read<T: Reflect>(env: Env<'_>, input: &str, source: &str) -> Option<T> {
    let doc = Document::from_xml(input, source, env.reporter)?;
    read_document(env, &doc, source)
}

/// Reads a recorded graph from a parsed document.
pub fn read_document<T: Reflect>(env: Env<'_>, doc: &Document, source: &str) -> Option<T> {
    read_with(env, doc, source, StubSource::Directory)
}

enum StubSource<'s> {
    /// Stubs are created from the `class` names.
    Directory,
    /// Stubs are created from the write-side factories, by reference id.
    Seeds(&'s HashMap<&'s str, (TypeTraitShared, &'static str)>),
}

fn read_with<T: Reflect>(env: Env<'_>, doc: &Document, source: &str, stubs: StubSource<'_>) -> Option<T> {
    let location = |node: NodeId| doc.location(node, source);

    let Some(root) = doc.root() else {
        env.reporter.error(
            Category::Structural,
            &Location::new(source, None),
            "document has no root element",
        );
        return None;
    };
    if doc.roots().len() > 1 {
        env.reporter.error(
            Category::Structural,
            &location(doc.roots()[1]),
            "document has more than one root element, only the first is read",
        );
    }
    if doc.tag(root) != RECORD_TAG {
        env.reporter.warn(
            Category::Structural,
            &location(root),
            format!("root element should be <{RECORD_TAG}>, found <{}>", doc.tag(root)),
        );
    }

    match doc.child_named(root, VERSION_TAG) {
        None => env.reporter.warn(
            Category::Structural,
            &location(root),
            format!("missing <{VERSION_TAG}>, assuming {FORMAT_VERSION}"),
        ),
        Some(node) => {
            let text = doc.text(node).unwrap_or("").trim();
            if text.parse::<u32>().ok() != Some(FORMAT_VERSION) {
                env.reporter.error(
                    Category::Structural,
                    &location(node),
                    format!("unsupported format version `{text}`, expected {FORMAT_VERSION}"),
                );
                return None;
            }
        }
    }

    let mut table = StubTable::new();
    let mut pending: Vec<(NodeId, String)> = Vec::new();
    if let Some(refs) = doc.child_named(root, REFS_TAG) {
        for &node in doc.children(refs) {
            if let Some((id, stub)) = create_stub(env, doc, source, node, &stubs) {
                if table.insert(id.clone(), stub) {
                    pending.push((node, id));
                } else {
                    env.reporter.error(
                        Category::Reference,
                        &location(node),
                        format!("reference id `{id}` is used twice, the first one is kept"),
                    );
                }
            }
        }
    }

    let mut cx = ReadCx::new(env, doc, source).with_stubs(table);
    for (node, id) in pending {
        let Some(stub) = cx.stubs().and_then(|t| t.get(&id)).cloned() else {
            continue;
        };
        if let Some(held) = (stub.fill)(Rc::clone(&stub.value), &mut cx, node)
            && !Rc::ptr_eq(&held, &stub.value)
        {
            cx.error(
                Category::Integrity,
                node,
                format!("reference `{id}` was replaced while reading it"),
            );
        }
    }

    let Some(data) = doc.child_named(root, DATA_TAG) else {
        env.reporter.error(
            Category::Structural,
            &location(root),
            format!("missing <{DATA_TAG}>"),
        );
        return None;
    };

    let mut value = T::create();
    read_value(&mut cx, data, &mut value);
    Some(value)
}

fn create_stub(
    env: Env<'_>,
    doc: &Document,
    source: &str,
    node: NodeId,
    stubs: &StubSource<'_>,
) -> Option<(String, Stub)> {
    let location = doc.location(node, source);
    if doc.tag(node) != REF_TAG {
        env.reporter.warn(
            Category::Structural,
            &location,
            format!("reference records should be <{REF_TAG}>, found <{}>", doc.tag(node)),
        );
    }

    let Some(id) = doc.attr(node, "id") else {
        env.reporter.error(Category::Reference, &location, "reference record without `id`");
        return None;
    };

    let (shared, type_path) = match stubs {
        StubSource::Seeds(seeds) => *seeds.get(id)?,
        StubSource::Directory => {
            let Some(class) = doc.attr(node, "class") else {
                env.reporter.error(
                    Category::Reference,
                    &location,
                    format!("reference `{id}` has no `class`"),
                );
                return None;
            };
            let meta = env.directory.resolve_reported(class, env.reporter, &location)?;
            let Some(shared) = meta.get_trait::<TypeTraitShared>() else {
                env.reporter.error(
                    Category::Reference,
                    &location,
                    format!("`{class}` is a value type and cannot be a reference target"),
                );
                return None;
            };
            (*shared, meta.type_path())
        }
    };

    let stub = Stub {
        value: shared.make_stub(),
        fill: shared.fill_fn(),
        type_path,
    };
    Some((String::from(id), stub))
}

// -----------------------------------------------------------------------------
// Clone

/// Copies a graph by writing and reading it, sharing and cycles included.
///
/// Types do not need to be registered in the directory.
pub fn deep_clone<T: Reflect>(env: Env<'_>, value: &mut T) -> T {
    let (doc, seeds) = compose(env, value, false);
    let seeds: HashMap<&str, (TypeTraitShared, &'static str)> = seeds
        .iter()
        .map(|s| (s.id.as_str(), (s.shared, s.type_path)))
        .collect();
    read_with(env, &doc, CLONE_SOURCE, StubSource::Seeds(&seeds)).unwrap_or_else(T::create)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use dec_utils::hash::{HashMap, HashSet};

    use crate::diagnostics::{Collected, ConvertError, Reporter};
    use crate::registry::{ConverterRegistry, TextConverter, TypeDirectory};
    use crate::walker::{Env, Factories, Limits};
    use crate::{Converted, Object, Recordable, Recorder, Shared, shared};
    use crate::{impl_reflect_record, impl_reflect_struct};

    #[derive(Default)]
    struct Monster {
        name: String,
        hp: i32,
        target: Option<Shared<Monster>>,
    }

    impl Recordable for Monster {
        fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
            recorder.record(&mut self.name, "name");
            recorder.record(&mut self.hp, "hp");
            recorder.record(&mut self.target, "target");
        }
    }

    #[derive(Default)]
    struct World {
        monsters: Vec<Shared<Monster>>,
        boss: Option<Shared<Monster>>,
    }

    impl Recordable for World {
        fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
            recorder.record(&mut self.monsters, "monsters");
            recorder.record(&mut self.boss, "boss");
        }
    }

    #[derive(Default)]
    struct Link {
        value: u32,
        next: Option<Shared<Link>>,
    }

    impl Recordable for Link {
        fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
            recorder.record(&mut self.value, "value");
            recorder.record(&mut self.next, "next");
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Shapes {
        prices: BTreeMap<String, i32>,
        names: std::collections::HashMap<u32, String>,
        tags: BTreeSet<String>,
        seen: HashSet<i64>,
        queue: VecDeque<u8>,
        grid: [[i32; 2]; 2],
        nested: Vec<Vec<i16>>,
        pair: (bool, char, f32),
        blank: Option<String>,
        absent: Option<String>,
        quoted: String,
    }

    impl Recordable for Shapes {
        fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
            recorder.record(&mut self.prices, "prices");
            recorder.record(&mut self.names, "names");
            recorder.record(&mut self.tags, "tags");
            recorder.record(&mut self.seen, "seen");
            recorder.record(&mut self.queue, "queue");
            recorder.record(&mut self.grid, "grid");
            recorder.record(&mut self.nested, "nested");
            recorder.record(&mut self.pair, "pair");
            recorder.record(&mut self.blank, "blank");
            recorder.record(&mut self.absent, "absent");
            recorder.record(&mut self.quoted, "quoted");
        }
    }

    #[derive(Default)]
    struct Roster {
        by_id: HashMap<u32, Shared<Monster>>,
        order: Vec<Shared<Monster>>,
    }

    impl Recordable for Roster {
        fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
            recorder.record(&mut self.order, "order");
            recorder.record(&mut self.by_id, "by_id");
        }
    }

    #[derive(Default)]
    struct Party {
        members: Vec<Monster>,
        leader: Option<Shared<Monster>>,
        pet: Option<Box<dyn Object>>,
        reserves: Vec<Monster>,
    }

    impl Recordable for Party {
        fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
            let veterans = Factories::new().with(|| Monster {
                name: String::from("veteran"),
                hp: 50,
                target: None,
            });
            recorder.record_with(&mut self.members, "members", &veterans);
            recorder.record_with(&mut self.leader, "leader", &veterans);
            recorder.record_with(&mut self.pet, "pet", &veterans);
            recorder.record(&mut self.reserves, "reserves");
        }
    }

    #[derive(Default)]
    struct Described {
        power: i32,
    }

    impl_reflect_record!(Monster, World, Link, Shapes, Roster, Party);
    impl_reflect_struct!(Described { power });

    struct Fixture {
        directory: TypeDirectory,
        converters: ConverterRegistry,
        reporter: Reporter,
        collected: Collected,
    }

    impl Fixture {
        fn new() -> Self {
            let (reporter, collected) = Reporter::collecting();
            let mut directory = TypeDirectory::new();
            directory.register_as::<Monster>("Monster");
            directory.register_as::<World>("World");
            directory.register_as::<Link>("Link");
            Self {
                directory,
                converters: ConverterRegistry::empty(),
                reporter,
                collected,
            }
        }

        fn env(&self) -> Env<'_> {
            Env::new(&self.directory, &self.converters, &self.reporter)
        }

        fn assert_clean(&self) {
            assert!(self.collected.errors().is_empty(), "{:?}", self.collected);
        }
    }

    fn monster(name: &str, hp: i32) -> Shared<Monster> {
        shared(Monster {
            name: String::from(name),
            hp,
            target: None,
        })
    }

    fn unlink(head: Shared<Link>) {
        let mut next = head.borrow_mut().next.take();
        while let Some(link) = next {
            next = link.borrow_mut().next.take();
        }
    }

    #[test]
    fn plain_values_have_no_refs() {
        let fixture = Fixture::new();
        let mut imp = Monster {
            name: String::from("Imp"),
            hp: 3,
            target: None,
        };
        let text = super::write(fixture.env(), &mut imp, false);
        assert_eq!(
            text,
            "<Record><recordFormatVersion>1</recordFormatVersion>\
             <data><name>Imp</name><hp>3</hp><target null=\"true\" /></data></Record>"
        );

        let back: Monster = super::read(fixture.env(), &text, "imp.xml").unwrap();
        assert_eq!(back.name, "Imp");
        assert_eq!(back.hp, 3);
        assert!(back.target.is_none());
        fixture.assert_clean();
    }

    #[test]
    fn shared_objects_keep_identity_and_cycles() {
        let fixture = Fixture::new();
        let a = monster("a", 1);
        let b = monster("b", 2);
        a.borrow_mut().target = Some(Rc::clone(&b));
        b.borrow_mut().target = Some(Rc::clone(&a));
        let mut world = World {
            monsters: vec![Rc::clone(&a), Rc::clone(&b)],
            boss: Some(Rc::clone(&a)),
        };

        let text = super::write(fixture.env(), &mut world, true);
        assert!(text.contains("<Ref id=\"ref00000\" class=\"Monster\">"));
        assert!(text.contains("<Ref id=\"ref00001\" class=\"Monster\">"));

        let back: World = super::read(fixture.env(), &text, "world.xml").unwrap();
        fixture.assert_clean();

        let first = &back.monsters[0];
        let second = &back.monsters[1];
        assert_eq!(first.borrow().name, "a");
        assert_eq!(second.borrow().hp, 2);
        assert!(Rc::ptr_eq(back.boss.as_ref().unwrap(), first));
        assert!(Rc::ptr_eq(first.borrow().target.as_ref().unwrap(), second));
        assert!(Rc::ptr_eq(second.borrow().target.as_ref().unwrap(), first));

        // Break the cycles so both graphs are freed.
        for m in world.monsters.iter().chain(back.monsters.iter()) {
            m.borrow_mut().target = None;
        }
    }

    #[test]
    fn deep_chains_are_split() {
        let fixture = Fixture::new();
        let mut head = shared(Link::default());
        for value in 1..10_000 {
            head = shared(Link {
                value,
                next: Some(head),
            });
        }

        let text = super::write(fixture.env(), &mut head, false);
        fixture.assert_clean();
        assert!(text.contains("<refs>"));

        let back: Shared<Link> = super::read(fixture.env(), &text, "chain.xml").unwrap();
        fixture.assert_clean();

        let mut expected = 9_999;
        let mut count = 0;
        let mut cursor = Some(Rc::clone(&back));
        while let Some(link) = cursor {
            assert_eq!(link.borrow().value, expected);
            expected = expected.wrapping_sub(1);
            count += 1;
            cursor = link.borrow().next.clone();
        }
        assert_eq!(count, 10_000);

        unlink(head);
        unlink(back);
    }

    #[test]
    fn unsupported_version_is_refused() {
        let fixture = Fixture::new();
        let text = "<Record><recordFormatVersion>2</recordFormatVersion><data>1</data></Record>";
        let back: Option<i32> = super::read(fixture.env(), text, "v2.xml");
        assert!(back.is_none());
        assert!(fixture.collected.has_error("unsupported format version"));
    }

    #[test]
    fn float_payloads_survive() {
        let fixture = Fixture::new();
        let mut value = f64::from_bits(0x7FF8_0000_0000_00AB);
        let text = super::write(fixture.env(), &mut value, false);
        assert!(text.contains("NaNbox"));
        let back: f64 = super::read(fixture.env(), &text, "nan.xml").unwrap();
        assert_eq!(back.to_bits(), value.to_bits());
    }

    #[test]
    fn bad_references_are_reported() {
        let fixture = Fixture::new();
        let text = "<Record><recordFormatVersion>1</recordFormatVersion>\
                    <refs>\
                    <Ref id=\"ref00000\" class=\"i32\">5</Ref>\
                    <Ref id=\"ref00001\" class=\"Monster\"><hp>4</hp></Ref>\
                    </refs>\
                    <data><monsters><li ref=\"ref00009\" /><li ref=\"ref00001\" /></monsters>\
                    <boss ref=\"ref00001\" /></data></Record>";
        let back: World = super::read(fixture.env(), text, "bad.xml").unwrap();

        assert!(fixture.collected.has_error("value type"));
        assert!(fixture.collected.has_error("unknown reference `ref00009`"));
        assert_eq!(back.monsters.len(), 2);
        assert_eq!(back.monsters[1].borrow().hp, 4);
        assert!(Rc::ptr_eq(back.boss.as_ref().unwrap(), &back.monsters[1]));
    }

    #[test]
    fn reference_type_mismatch_is_reported() {
        let fixture = Fixture::new();
        let text = "<Record><recordFormatVersion>1</recordFormatVersion>\
                    <refs><Ref id=\"ref00000\" class=\"Monster\" /></refs>\
                    <data ref=\"ref00000\" /></Record>";
        let back: Option<Shared<Link>> = super::read(fixture.env(), text, "mismatch.xml");
        assert!(back.is_some());
        assert!(fixture.collected.has_error("cannot be assigned"));
    }

    #[test]
    fn field_descriptors_are_refused() {
        let fixture = Fixture::new();
        let mut described = Described { power: 9 };
        let text = super::write(fixture.env(), &mut described, false);
        assert!(!text.contains("power"));
        assert!(fixture.collected.has_error("field descriptors"));
    }

    #[test]
    fn polymorphic_slots_use_class() {
        let fixture = Fixture::new();
        let mut slot: Box<dyn Object> = Box::new(Monster {
            name: String::from("Ogre"),
            hp: 30,
            target: None,
        });
        let text = super::write(fixture.env(), &mut slot, false);
        assert!(text.contains("<data class=\"Monster\">"));

        let back: Box<dyn Object> = super::read(fixture.env(), &text, "slot.xml").unwrap();
        fixture.assert_clean();
        let ogre = back.downcast_ref::<Monster>().unwrap();
        assert_eq!(ogre.hp, 30);
    }

    #[test]
    fn deep_clone_copies_sharing() {
        let fixture = Fixture {
            directory: TypeDirectory::new(),
            ..Fixture::new()
        };
        let a = monster("a", 1);
        a.borrow_mut().target = Some(Rc::clone(&a));
        let mut world = World {
            monsters: vec![Rc::clone(&a)],
            boss: Some(Rc::clone(&a)),
        };

        let copy = super::deep_clone(fixture.env(), &mut world);
        fixture.assert_clean();

        let copied = &copy.monsters[0];
        assert!(!Rc::ptr_eq(copied, &a));
        assert!(Rc::ptr_eq(copy.boss.as_ref().unwrap(), copied));
        assert!(Rc::ptr_eq(copied.borrow().target.as_ref().unwrap(), copied));

        a.borrow_mut().target = None;
        copied.borrow_mut().target = None;
    }

    #[test]
    fn clones_need_no_registration() {
        let directory = TypeDirectory::new();
        let converters = ConverterRegistry::empty();
        let reporter = Reporter::strict();
        let env = Env::new(&directory, &converters, &reporter);

        let a = monster("a", 1);
        let b = monster("b", 2);
        b.borrow_mut().target = Some(Rc::clone(&a));
        let mut world = World {
            monsters: vec![Rc::clone(&a), Rc::clone(&b), Rc::clone(&a)],
            boss: Some(Rc::clone(&b)),
        };

        let copy = super::deep_clone(env, &mut world);
        assert_eq!(copy.monsters.len(), 3);
        assert!(Rc::ptr_eq(&copy.monsters[0], &copy.monsters[2]));
        assert!(Rc::ptr_eq(copy.boss.as_ref().unwrap(), &copy.monsters[1]));
        let target = copy.monsters[1].borrow().target.clone().unwrap();
        assert!(Rc::ptr_eq(&target, &copy.monsters[0]));
        assert_eq!(target.borrow().name, "a");
    }

    #[test]
    fn collection_shapes_survive_a_round_trip() {
        let fixture = Fixture::new();
        let mut shapes = Shapes {
            grid: [[1, -2], [3, 4]],
            nested: vec![vec![], vec![7, 8]],
            pair: (true, '<', 1.5),
            blank: Some(String::new()),
            quoted: String::from("a <b> & \"c\" 'd'"),
            ..Shapes::default()
        };
        shapes.prices.insert(String::from("iron ore"), 4);
        shapes.prices.insert(String::new(), -1);
        shapes.names.insert(7, String::from("seven"));
        shapes.names.insert(11, String::from("eleven"));
        shapes.tags.insert(String::from("rare"));
        shapes.tags.insert(String::from("heavy"));
        shapes.seen.insert(-3);
        shapes.seen.insert(1 << 40);
        shapes.queue.extend([3, 1, 2]);

        let text = super::write(fixture.env(), &mut shapes, true);
        let back: Shapes = super::read(fixture.env(), &text, "shapes.xml").unwrap();
        fixture.assert_clean();
        assert_eq!(back, shapes);
        assert_eq!(back.blank.as_deref(), Some(""));
        assert!(back.absent.is_none());
    }

    #[test]
    fn long_chains_number_references_in_order() {
        let fixture = Fixture::new();
        let limits = Limits {
            depth_limit: 3,
            max_recursion_depth: 100,
        };
        let env = fixture.env().with_limits(limits);

        let mut head = shared(Link::default());
        for value in 1..3_000 {
            head = shared(Link {
                value,
                next: Some(head),
            });
        }

        let doc = super::compose_document(env, &mut head);
        fixture.assert_clean();
        let root = doc.root().unwrap();
        let refs = doc.child_named(root, super::REFS_TAG).unwrap();
        let records = doc.children(refs);
        assert!(records.len() > 500);
        for (index, &record) in records.iter().enumerate() {
            let expected = alloc::format!("ref{index:05}");
            assert_eq!(doc.attr(record, "id"), Some(expected.as_str()));
        }

        let back: Shared<Link> = super::read_document(env, &doc, "chain.xml").unwrap();
        fixture.assert_clean();
        assert_eq!(back.borrow().value, 2_999);

        unlink(head);
        unlink(back);
    }

    #[test]
    fn fixed_hash_maps_write_the_same_text() {
        let fixture = Fixture::new();
        let roster = || {
            let mut roster = Roster::default();
            for id in 0..32 {
                let m = monster(&alloc::format!("m{id}"), id as i32);
                roster.by_id.insert(id, Rc::clone(&m));
                roster.order.push(m);
            }
            roster
        };

        let first = super::write(fixture.env(), &mut roster(), false);
        let second = super::write(fixture.env(), &mut roster(), false);
        fixture.assert_clean();
        assert!(first.contains("ref00031"));
        assert_eq!(first, second);
    }

    #[test]
    fn factories_create_values_below_their_field() {
        let fixture = Fixture::new();
        let text = "<Record><recordFormatVersion>1</recordFormatVersion><data>\
                    <members>\
                    <li><name>a</name><target><name>t</name></target></li>\
                    <li><hp>7</hp></li>\
                    </members>\
                    <leader><name>b</name></leader>\
                    <pet class=\"Monster\"><name>p</name></pet>\
                    <reserves><li><name>c</name></li></reserves>\
                    </data></Record>";
        let party: Party = super::read(fixture.env(), text, "party.xml").unwrap();
        fixture.assert_clean();

        let first = &party.members[0];
        assert_eq!((first.name.as_str(), first.hp), ("a", 50));
        let target = first.target.as_ref().unwrap().borrow();
        assert_eq!((target.name.as_str(), target.hp), ("t", 0));
        let second = &party.members[1];
        assert_eq!((second.name.as_str(), second.hp), ("veteran", 7));

        let leader = party.leader.as_ref().unwrap().borrow();
        assert_eq!((leader.name.as_str(), leader.hp), ("b", 50));

        let pet = party.pet.as_ref().unwrap().downcast_ref::<Monster>().unwrap();
        assert_eq!((pet.name.as_str(), pet.hp), ("p", 50));

        assert_eq!(party.reserves[0].hp, 0);
    }

    #[derive(Debug, Default, PartialEq)]
    struct Point(i32, i32);

    struct PointText;

    impl TextConverter for PointText {
        type Target = Point;

        fn to_text(&self, value: &Point) -> String {
            alloc::format!("{},{}", value.0, value.1)
        }

        fn from_text(&self, text: &str) -> Result<Point, ConvertError> {
            let (x, y) = text.split_once(',').ok_or_else(|| ConvertError::new("missing `,`"))?;
            let x = x.trim().parse().map_err(|_| ConvertError::new("bad x"))?;
            let y = y.trim().parse().map_err(|_| ConvertError::new("bad y"))?;
            Ok(Point(x, y))
        }
    }

    struct MonsterText;

    impl TextConverter for MonsterText {
        type Target = Monster;

        fn to_text(&self, value: &Monster) -> String {
            value.name.clone()
        }

        fn from_text(&self, text: &str) -> Result<Monster, ConvertError> {
            Ok(Monster {
                name: String::from(text),
                hp: 99,
                target: None,
            })
        }
    }

    #[test]
    fn converters_take_priority() {
        let mut fixture = Fixture::new();
        fixture.converters = ConverterRegistry::builder()
            .text(PointText)
            .text(MonsterText)
            .build()
            .unwrap();

        let mut point = Converted(Point(3, -4));
        let text = super::write(fixture.env(), &mut point, false);
        assert!(text.contains("<data>3,-4</data>"));
        let back: Converted<Point> = super::read(fixture.env(), &text, "p.xml").unwrap();
        assert_eq!(back.0, Point(3, -4));

        let mut imp = Monster {
            name: String::from("Imp"),
            hp: 1,
            target: None,
        };
        let text = super::write(fixture.env(), &mut imp, false);
        assert!(text.contains("<data>Imp</data>"));
        let back: Monster = super::read(fixture.env(), &text, "m.xml").unwrap();
        assert_eq!(back.hp, 99);
        fixture.assert_clean();

        let text = "<Record><recordFormatVersion>1</recordFormatVersion><data>3</data></Record>";
        let _: Option<Converted<Point>> = super::read(fixture.env(), text, "bad.xml");
        assert!(fixture.collected.has_error("missing `,`"));
    }

    #[test]
    fn conflicting_converters_are_rejected() {
        let result = ConverterRegistry::builder()
            .text(PointText)
            .text(PointText)
            .build();
        assert!(matches!(
            result,
            Err(crate::diagnostics::SetupError::ConflictingConverters { .. })
        ));
    }
}
