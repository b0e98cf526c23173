use alloc::format;
use core::any::{Any, TypeId};
use core::ops::{Deref, DerefMut};

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx};

/// A value only a registered converter knows how to walk.
///
/// Wrap foreign types in `Converted` and register a
/// [`TextConverter`](crate::registry::TextConverter) or
/// [`RecordConverter`](crate::registry::RecordConverter) for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Converted<T>(pub T);

impl<T> Deref for Converted<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Converted<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[cold]
fn missing(type_path: &str) -> alloc::string::String {
    format!("no converter is registered for `{type_path}`")
}

impl<T: Any + Default> Reflect for Converted<T> {
    const KIND: ReflectKind = ReflectKind::Converted;

    fn create() -> Self {
        Self(T::default())
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        let converters = cx.env().converters;
        match converters.get(&TypeId::of::<T>()) {
            Some(converter) => converter.compose(&mut self.0, cx, node),
            None => cx.error(
                Category::Configuration,
                node,
                missing(core::any::type_name::<T>()),
            ),
        }
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        let converters = cx.env().converters;
        match converters.get(&TypeId::of::<T>()) {
            Some(converter) => converter.parse(&mut self.0, cx, node, mode),
            None => cx.error(
                Category::Configuration,
                node,
                missing(core::any::type_name::<T>()),
            ),
        }
    }
}
