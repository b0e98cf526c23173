use alloc::boxed::Box;
use alloc::format;
use core::any::{Any, TypeId};

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::registry::TypeMeta;
use crate::walker::{ReadCx, WriteCx, dispatch_compose, dispatch_parse, read_value, write_value};

// -----------------------------------------------------------------------------
// ReflectKind

/// How a type is laid out in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectKind {
    /// Numbers, `bool`, `char` and `()`, as text.
    Primitive,
    String,
    /// Fieldless enums, as the variant name.
    Enum,
    /// A [`TypeHandle`](crate::TypeHandle), as a type name.
    Type,
    /// A reference to a named definition, as its name.
    DefRef,
    /// A value handled only by its converter.
    Converted,
    /// A [`Recordable`](crate::Recordable) type.
    Record,
    /// A type with field descriptors.
    Struct,
    List,
    Array,
    Map,
    Set,
    Tuple,
    Option,
    /// A [`Shared`](crate::Shared) object, with identity.
    Shared,
    /// A polymorphic `Box<dyn Object>`.
    Object,
}

impl ReflectKind {
    /// Returns `true` for kinds a registered converter may take over.
    #[inline]
    pub const fn converter_eligible(self) -> bool {
        matches!(
            self,
            Self::Record
                | Self::Struct
                | Self::List
                | Self::Array
                | Self::Map
                | Self::Set
                | Self::Tuple
        )
    }

    /// Returns `true` for kinds written as plain text, which cannot be
    /// reference targets.
    #[inline]
    pub const fn is_value(self) -> bool {
        matches!(self, Self::Primitive | Self::String | Self::Enum | Self::Type)
    }
}

// -----------------------------------------------------------------------------
// ParseMode

/// How a node combines with the value it is read into, from `mode="..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// The kind's own default.
    #[default]
    Default,
    /// Discards the current value first.
    Replace,
    /// Only overrides the named parts.
    Patch,
    /// Adds to a collection.
    Append,
}

impl ParseMode {
    /// Parses the attribute value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "replace" => Some(Self::Replace),
            "patch" => Some(Self::Patch),
            "append" => Some(Self::Append),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Replace => "replace",
            Self::Patch => "patch",
            Self::Append => "append",
        }
    }
}

// -----------------------------------------------------------------------------
// Reflect

/// A type the walker can read and write.
///
/// Implemented for primitives, strings, collections, options, tuples,
/// [`Shared`](crate::Shared) and `Box<dyn Object>`. User types get it from
/// [`impl_reflect_record!`], [`impl_reflect_struct!`] or
/// [`impl_reflect_enum!`].
///
/// `parse` treats `self` as the override target: whatever the node does
/// not mention keeps its current value.
///
/// The walker handles metadata before calling `parse`. The defaults of
/// the metadata hooks report an error and keep the current value.
///
/// [`impl_reflect_record!`]: crate::impl_reflect_record
/// [`impl_reflect_struct!`]: crate::impl_reflect_struct
/// [`impl_reflect_enum!`]: crate::impl_reflect_enum
pub trait Reflect: Sized + 'static {
    const KIND: ReflectKind;

    /// The Rust type path, used for names and diagnostics.
    fn type_path() -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Creates the value a missing node reads as.
    fn create() -> Self;

    /// Creates a value while reading, through the
    /// [`Factories`](crate::walker::Factories) active in `cx`.
    fn create_in(cx: &ReadCx<'_>) -> Self {
        cx.factories()
            .and_then(|factories| factories.make::<Self>())
            .unwrap_or_else(Self::create)
    }

    /// Writes the content of `self` into `node`.
    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId);

    /// Reads the content of `node` into `self`.
    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode);

    /// Handles `null="true"`.
    fn parse_null(&mut self, cx: &mut ReadCx<'_>, node: NodeId) {
        cx.error(
            Category::Shape,
            node,
            format!("`{}` cannot be null", Self::type_path()),
        );
    }

    /// Handles `ref="id"`.
    fn from_ref(cx: &mut ReadCx<'_>, node: NodeId, id: &str) -> Option<Self> {
        cx.error(
            Category::Reference,
            node,
            format!(
                "`{}` cannot be a reference, `ref=\"{id}\"` ignored",
                Self::type_path()
            ),
        );
        None
    }

    /// Handles `class="Type"`, after the name was resolved.
    fn apply_class(&mut self, cx: &mut ReadCx<'_>, node: NodeId, meta: &TypeMeta) {
        if meta.id() != TypeId::of::<Self>() {
            cx.error(
                Category::Reference,
                node,
                format!(
                    "explicit type `{}` cannot be assigned to expected type `{}`",
                    meta.path(),
                    Self::type_path()
                ),
            );
        }
    }

    /// Reads a map key or set element from a tag name, as in
    /// `<Sword>3</Sword>`.
    fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
        cx.error(
            Category::Shape,
            node,
            format!(
                "`{}` cannot be a shorthand key, found `<{text}>`; use `<li><key>..</key><value>..</value></li>`",
                Self::type_path()
            ),
        );
        None
    }
}

// -----------------------------------------------------------------------------
// Object

/// Object-safe access to a [`Reflect`] value.
///
/// Every `Reflect` type is an `Object`. `Box<dyn Object>` is itself a
/// `Reflect` type holding any registered value, written with `class`.
pub trait Object: Any {
    /// The [`TypeId`] of the concrete value.
    fn object_type_id(&self) -> TypeId;

    fn object_type_path(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// [`read_value`] on the concrete type, metadata included.
    fn read_object(&mut self, cx: &mut ReadCx<'_>, node: NodeId);

    /// [`write_value`] on the concrete type.
    fn write_object(&mut self, cx: &mut WriteCx<'_>, node: NodeId);

    /// [`dispatch_parse`] on the concrete type, metadata excluded.
    fn parse_object(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode);

    /// [`dispatch_compose`] on the concrete type.
    fn compose_object(&mut self, cx: &mut WriteCx<'_>, node: NodeId);
}

impl<T: Reflect> Object for T {
    #[inline]
    fn object_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    #[inline]
    fn object_type_path(&self) -> &'static str {
        T::type_path()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn read_object(&mut self, cx: &mut ReadCx<'_>, node: NodeId) {
        read_value(cx, node, self);
    }

    fn write_object(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        write_value(cx, self, node);
    }

    fn parse_object(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        dispatch_parse(cx, node, self, mode);
    }

    fn compose_object(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        dispatch_compose(cx, self, node);
    }
}

impl dyn Object {
    /// Returns `true` if the concrete value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.object_type_id() == TypeId::of::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Takes the concrete value out of a box.
    pub fn take<T: Any>(self: Box<Self>) -> Option<Box<T>> {
        let any: Box<dyn Any> = self;
        any.downcast::<T>().ok()
    }
}

impl core::fmt::Debug for dyn Object {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Object({})", self.object_type_path())
    }
}
