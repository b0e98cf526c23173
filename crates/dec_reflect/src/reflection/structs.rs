use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use dec_utils::hash::{HashMap, HashSet};

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{Object, ParseMode, Reflect};
use crate::walker::{ReadCx, WriteCx};

// -----------------------------------------------------------------------------
// Struct

/// A type described by field descriptors.
///
/// Implemented by [`impl_reflect_struct!`](crate::impl_reflect_struct).
/// Descriptors are only allowed in definition documents; recorded graphs
/// refuse them so that persisted formats are always spelled out by hand.
pub trait Struct: Reflect {
    fn struct_info() -> &'static StructInfo<Self>;
}

/// Type-erased field access, used to flatten a base struct's fields
/// into the struct embedding it.
pub trait FieldSet {
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Object>;
}

impl<S: Struct> FieldSet for S {
    #[inline]
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Object> {
        S::struct_info().field_mut(self, index)
    }
}

// -----------------------------------------------------------------------------
// StructInfo

enum FieldSlot<S> {
    Own(fn(&mut S) -> &mut dyn Object),
    Base {
        get: fn(&mut S) -> &mut dyn FieldSet,
        index: usize,
    },
}

struct FieldInfo<S> {
    name: &'static str,
    slot: FieldSlot<S>,
}

/// Field descriptors of a struct: base fields first, then own fields.
pub struct StructInfo<S> {
    fields: Vec<FieldInfo<S>>,
    index: HashMap<&'static str, usize>,
    duplicates: Vec<&'static str>,
}

impl<S: 'static> StructInfo<S> {
    #[inline]
    pub fn builder() -> StructInfoBuilder<S> {
        StructInfoBuilder {
            info: StructInfo {
                fields: Vec::new(),
                index: HashMap::default(),
                duplicates: Vec::new(),
            },
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in write order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Returns the index of a field, the last declaration wins.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names declared more than once, including through a base.
    #[inline]
    pub fn duplicates(&self) -> &[&'static str] {
        &self.duplicates
    }

    /// Returns the field at `index` of `target`.
    pub fn field_mut<'a>(&self, target: &'a mut S, index: usize) -> Option<&'a mut dyn Object> {
        match self.fields.get(index)?.slot {
            FieldSlot::Own(get) => Some(get(target)),
            FieldSlot::Base { get, index } => get(target).field_mut(index),
        }
    }

    /// Finds a field whose name only differs in case or underscores.
    pub fn suggest(&self, name: &str) -> Option<&'static str> {
        let wanted = loose_name(name);
        self.fields
            .iter()
            .map(|f| f.name)
            .find(|candidate| loose_name(candidate) == wanted)
    }
}

fn loose_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds a [`StructInfo`].
pub struct StructInfoBuilder<S> {
    info: StructInfo<S>,
}

impl<S: 'static> StructInfoBuilder<S> {
    /// Flattens the fields of base struct `B`, reached through `get`.
    pub fn base<B: Struct>(mut self, get: fn(&mut S) -> &mut dyn FieldSet) -> Self {
        for (index, name) in B::struct_info().names().enumerate() {
            self.push(name, FieldSlot::Base { get, index });
        }
        self
    }

    /// Adds an own field.
    pub fn field(mut self, name: &'static str, get: fn(&mut S) -> &mut dyn Object) -> Self {
        self.push(name, FieldSlot::Own(get));
        self
    }

    fn push(&mut self, name: &'static str, slot: FieldSlot<S>) {
        let index = self.info.fields.len();
        if self.info.index.insert(name, index).is_some() {
            self.info.duplicates.push(name);
        }
        self.info.fields.push(FieldInfo { name, slot });
    }

    #[inline]
    pub fn build(self) -> StructInfo<S> {
        self.info
    }
}

// -----------------------------------------------------------------------------
// Walk

fn refuse<S: Reflect>(allowed: bool) -> Option<String> {
    (!allowed).then(|| {
        format!(
            "`{}` uses field descriptors, which recorded graphs refuse; implement `Recordable` or register a converter",
            S::type_path()
        )
    })
}

/// Writes every field of a [`Struct`], in declaration order.
pub fn compose_struct<S: Struct>(value: &mut S, cx: &mut WriteCx<'_>, node: NodeId) {
    if let Some(message) = refuse::<S>(cx.reflection_allowed()) {
        cx.error(Category::Configuration, node, message);
        return;
    }

    let info = S::struct_info();
    if !info.duplicates().is_empty() {
        cx.error(
            Category::Configuration,
            node,
            format!(
                "`{}` declares duplicate fields: {}",
                S::type_path(),
                info.duplicates().join(", ")
            ),
        );
    }

    for (index, name) in info.names().enumerate() {
        if info.index_of(name) != Some(index) {
            continue;
        }
        let child = cx.doc_mut().add_child(node, name);
        if let Some(field) = info.field_mut(value, index) {
            field.write_object(cx, child);
        }
    }
}

/// Reads the fields named by the children of `node`.
///
/// Fields without a child keep their value, unknown children are reported
/// with a spelling hint.
pub fn parse_struct<S: Struct>(target: &mut S, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
    if let Some(message) = refuse::<S>(cx.reflection_allowed()) {
        cx.error(Category::Configuration, node, message);
        return;
    }

    cx.check_mode(node, mode, &[ParseMode::Patch]);
    cx.reject_text(node, S::type_path());

    let info = S::struct_info();
    if !info.duplicates().is_empty() {
        cx.error(
            Category::Configuration,
            node,
            format!(
                "`{}` declares duplicate fields: {}",
                S::type_path(),
                info.duplicates().join(", ")
            ),
        );
    }

    let doc = cx.doc();
    let mut seen: HashSet<&str> = HashSet::default();
    for &child in doc.children(node) {
        let name = doc.tag(child);
        if !seen.insert(name) {
            cx.error(
                Category::Shape,
                child,
                format!("field `{name}` appears twice, the last one wins"),
            );
        }

        match info.index_of(name) {
            Some(index) => {
                if let Some(field) = info.field_mut(target, index) {
                    field.read_object(cx, child);
                }
            }
            None => {
                let hint = info
                    .suggest(name)
                    .map(|s| format!(", did you mean `{s}`?"))
                    .unwrap_or_default();
                cx.error(
                    Category::Shape,
                    child,
                    format!("`{}` has no field `{name}`{hint}", S::type_path()),
                );
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Macro

/// Implements [`Reflect`](crate::Reflect) and
/// [`Struct`](crate::reflection::Struct) with field descriptors.
///
/// A leading `..field: Type` flattens the fields of a base struct, which
/// must itself use this macro. The type must implement [`Default`].
///
/// # Examples
///
/// ```
/// use dec_reflect::impl_reflect_struct;
///
/// #[derive(Default)]
/// struct Base {
///     label: String,
/// }
///
/// #[derive(Default)]
/// struct Derived {
///     base: Base,
///     power: f32,
/// }
///
/// impl_reflect_struct!(Base { label });
/// impl_reflect_struct!(Derived { ..base: Base, power });
///
/// use dec_reflect::reflection::Struct;
/// let names: Vec<_> = Derived::struct_info().names().collect();
/// assert_eq!(names, ["label", "power"]);
/// ```
#[macro_export]
macro_rules! impl_reflect_struct {
    ($ty:ident { $(.. $base:ident : $base_ty:ty ,)? $($field:ident),* $(,)? }) => {
        impl $crate::Reflect for $ty {
            const KIND: $crate::ReflectKind = $crate::ReflectKind::Struct;

            fn create() -> Self {
                <Self as ::core::default::Default>::default()
            }

            fn compose(
                &mut self,
                cx: &mut $crate::walker::WriteCx<'_>,
                node: $crate::document::NodeId,
            ) {
                $crate::reflection::compose_struct(self, cx, node);
            }

            fn parse(
                &mut self,
                cx: &mut $crate::walker::ReadCx<'_>,
                node: $crate::document::NodeId,
                mode: $crate::ParseMode,
            ) {
                $crate::reflection::parse_struct(self, cx, node, mode);
            }
        }

        impl $crate::reflection::Struct for $ty {
            fn struct_info() -> &'static $crate::reflection::StructInfo<Self> {
                static INFO: $crate::__macro_exports::OnceLock<$crate::reflection::StructInfo<$ty>> =
                    $crate::__macro_exports::OnceLock::new();
                INFO.get_or_init(|| {
                    $crate::reflection::StructInfo::<$ty>::builder()
                        $( .base::<$base_ty>(|s| &mut s.$base) )?
                        $( .field(::core::stringify!($field), |s| &mut s.$field) )*
                        .build()
                })
            }
        }
    };
}
