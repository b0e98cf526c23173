use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use dec_utils::TypeIdMap;

use crate::diagnostics::{Category, ConvertError, SetupError};
use crate::document::NodeId;
use crate::reflection::{ParseMode, Recorder};
use crate::walker::{ReadCx, WriteCx};

// -----------------------------------------------------------------------------
// TypeClaim

/// A type a converter takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeClaim {
    pub id: TypeId,
    pub type_path: &'static str,
}

impl TypeClaim {
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
        }
    }
}

// -----------------------------------------------------------------------------
// Converter

/// Type-erased custom serialization for one or more types.
///
/// Most converters are written against [`TextConverter`] or
/// [`RecordConverter`] and added through the [`ConverterRegistryBuilder`].
/// Implement this trait directly to claim several types at once.
pub trait Converter: 'static {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// The types handled by this converter.
    fn claims(&self) -> Vec<TypeClaim>;

    /// Writes `value` into `node`.
    fn compose(&self, value: &mut dyn Any, cx: &mut WriteCx<'_>, node: NodeId);

    /// Reads `node` into `value`.
    fn parse(&self, value: &mut dyn Any, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode);
}

/// A converter between a type and a single string.
///
/// # Examples
///
/// ```
/// use dec_reflect::diagnostics::ConvertError;
/// use dec_reflect::registry::{ConverterRegistry, TextConverter};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point(i32, i32);
///
/// struct PointText;
///
/// impl TextConverter for PointText {
///     type Target = Point;
///
///     fn to_text(&self, value: &Point) -> String {
///         format!("{},{}", value.0, value.1)
///     }
///
///     fn from_text(&self, text: &str) -> Result<Point, ConvertError> {
///         let (x, y) = text.split_once(',').ok_or_else(|| ConvertError::new("missing `,`"))?;
///         let x = x.trim().parse().map_err(|_| ConvertError::new("bad x"))?;
///         let y = y.trim().parse().map_err(|_| ConvertError::new("bad y"))?;
///         Ok(Point(x, y))
///     }
/// }
///
/// let registry = ConverterRegistry::builder().text(PointText).build().unwrap();
/// assert!(registry.contains(&std::any::TypeId::of::<Point>()));
/// ```
pub trait TextConverter: 'static {
    type Target: Any;

    fn to_text(&self, value: &Self::Target) -> String;

    fn from_text(&self, text: &str) -> Result<Self::Target, ConvertError>;
}

/// A converter which records a type field by field, like
/// [`Recordable`](crate::Recordable) but for types it cannot be
/// implemented on.
pub trait RecordConverter: 'static {
    type Target: Any;

    fn record(&self, value: &mut Self::Target, recorder: &mut Recorder<'_, '_>);
}

// -----------------------------------------------------------------------------
// Adapters

struct TextAdapter<C>(C);

impl<C: TextConverter> Converter for TextAdapter<C> {
    fn name(&self) -> &'static str {
        core::any::type_name::<C>()
    }

    fn claims(&self) -> Vec<TypeClaim> {
        vec![TypeClaim::of::<C::Target>()]
    }

    fn compose(&self, value: &mut dyn Any, cx: &mut WriteCx<'_>, node: NodeId) {
        match value.downcast_ref::<C::Target>() {
            Some(value) => {
                let text = self.0.to_text(value);
                cx.doc_mut().set_text(node, text);
            }
            None => mismatch_on_write(cx, node, self.name()),
        }
    }

    fn parse(&self, value: &mut dyn Any, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Replace]);
        let text = cx.expect_text(node, self.name());
        match self.0.from_text(text) {
            Ok(parsed) => match value.downcast_mut::<C::Target>() {
                Some(slot) => *slot = parsed,
                None => mismatch_on_read(cx, node, self.name()),
            },
            Err(err) => cx.error(
                Category::Shape,
                node,
                format!("`{}` failed to read `{text}`: {err}", self.name()),
            ),
        }
    }
}

struct RecordAdapter<C>(C);

impl<C: RecordConverter> Converter for RecordAdapter<C> {
    fn name(&self) -> &'static str {
        core::any::type_name::<C>()
    }

    fn claims(&self) -> Vec<TypeClaim> {
        vec![TypeClaim::of::<C::Target>()]
    }

    fn compose(&self, value: &mut dyn Any, cx: &mut WriteCx<'_>, node: NodeId) {
        let Some(value) = value.downcast_mut::<C::Target>() else {
            return mismatch_on_write(cx, node, self.name());
        };
        cx.enter_record();
        self.0.record(value, &mut Recorder::writing(cx, node));
        cx.leave_record();
    }

    fn parse(&self, value: &mut dyn Any, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Patch]);
        let Some(value) = value.downcast_mut::<C::Target>() else {
            return mismatch_on_read(cx, node, self.name());
        };
        cx.enter_record();
        self.0.record(value, &mut Recorder::reading(cx, node));
        cx.leave_record();
    }
}

#[cold]
fn mismatch_on_write(cx: &WriteCx<'_>, node: NodeId, name: &str) {
    cx.error(
        Category::Integrity,
        node,
        format!("converter `{name}` was given a value of another type"),
    );
}

#[cold]
fn mismatch_on_read(cx: &ReadCx<'_>, node: NodeId, name: &str) {
    cx.error(
        Category::Integrity,
        node,
        format!("converter `{name}` was given a value of another type"),
    );
}

// -----------------------------------------------------------------------------
// ConverterRegistry

/// Type to converter lookup.
///
/// Built once through [`ConverterRegistry::builder`], which rejects two
/// converters claiming the same type.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    by_type: TypeIdMap<Rc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Creates a registry without converters.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn builder() -> ConverterRegistryBuilder {
        ConverterRegistryBuilder {
            converters: Vec::new(),
        }
    }

    /// Returns the converter claiming `id`.
    #[inline]
    pub fn get(&self, id: &TypeId) -> Option<&dyn Converter> {
        self.by_type.get(id).map(|c| &**c)
    }

    #[inline]
    pub fn contains(&self, id: &TypeId) -> bool {
        self.by_type.contains(id)
    }

    /// Returns the number of claimed types.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_type.clear();
    }
}

impl core::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.by_type.values().map(|c| c.name()))
            .finish()
    }
}

/// Collects converters for a [`ConverterRegistry`].
pub struct ConverterRegistryBuilder {
    converters: Vec<Rc<dyn Converter>>,
}

impl ConverterRegistryBuilder {
    /// Adds a [`TextConverter`].
    pub fn text<C: TextConverter>(self, converter: C) -> Self {
        self.converter(TextAdapter(converter))
    }

    /// Adds a [`RecordConverter`].
    pub fn record<C: RecordConverter>(self, converter: C) -> Self {
        self.converter(RecordAdapter(converter))
    }

    /// Adds a raw [`Converter`].
    pub fn converter(mut self, converter: impl Converter) -> Self {
        self.converters.push(Rc::new(converter));
        self
    }

    /// Adds a boxed [`Converter`].
    pub fn boxed(mut self, converter: Box<dyn Converter>) -> Self {
        self.converters.push(Rc::from(converter));
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// - [`SetupError::EmptyClaim`] if a converter claims no type.
    /// - [`SetupError::ConflictingConverters`] if two converters claim the
    ///   same type.
    pub fn build(self) -> Result<ConverterRegistry, SetupError> {
        let mut by_type: TypeIdMap<Rc<dyn Converter>> = TypeIdMap::new();
        for converter in self.converters {
            let claims = converter.claims();
            if claims.is_empty() {
                return Err(SetupError::EmptyClaim {
                    converter: converter.name(),
                });
            }
            for claim in claims {
                if let Some(first) = by_type.get(&claim.id) {
                    if Rc::ptr_eq(first, &converter) {
                        continue;
                    }
                    return Err(SetupError::ConflictingConverters {
                        target: claim.type_path,
                        first: first.name(),
                        second: converter.name(),
                    });
                }
                by_type.insert(claim.id, Rc::clone(&converter));
            }
        }
        log::debug!("converter registry built with {} claimed types", by_type.len());
        Ok(ConverterRegistry { by_type })
    }
}
