use alloc::format;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect};
use crate::walker::ReadCx;

/// Reads a variant name into `target`.
pub fn parse_enum<E: Reflect>(
    target: &mut E,
    cx: &mut ReadCx<'_>,
    node: NodeId,
    mode: ParseMode,
    lookup: fn(&str) -> Option<E>,
    names: &[&str],
) {
    cx.check_mode(node, mode, &[ParseMode::Replace]);
    let text = cx.expect_text(node, E::type_path());
    if let Some(value) = enum_from_text(cx, node, text, lookup, names) {
        *target = value;
    }
}

/// Looks a variant up by name, reporting unknown names.
pub fn enum_from_text<E: Reflect>(
    cx: &mut ReadCx<'_>,
    node: NodeId,
    text: &str,
    lookup: fn(&str) -> Option<E>,
    names: &[&str],
) -> Option<E> {
    let text = text.trim();
    let found = lookup(text);
    if found.is_none() {
        cx.error(
            Category::Shape,
            node,
            format!(
                "`{text}` is not a variant of `{}`, expected one of: {}",
                E::type_path(),
                names.join(", ")
            ),
        );
    }
    found
}

/// Implements [`Reflect`](crate::Reflect) for a fieldless enum, written
/// as its variant name.
///
/// The first variant is the default value. Enums can be map keys in the
/// `<Variant>value</Variant>` shorthand.
///
/// # Examples
///
/// ```
/// use dec_reflect::impl_reflect_enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Element {
///     Fire,
///     Ice,
/// }
///
/// impl_reflect_enum!(Element { Fire, Ice });
/// ```
#[macro_export]
macro_rules! impl_reflect_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::Reflect for $ty {
            const KIND: $crate::ReflectKind = $crate::ReflectKind::Enum;

            fn create() -> Self {
                $crate::impl_reflect_enum!(@first $ty; $($variant),+)
            }

            fn compose(
                &mut self,
                cx: &mut $crate::walker::WriteCx<'_>,
                node: $crate::document::NodeId,
            ) {
                let name = match self {
                    $( $ty::$variant => ::core::stringify!($variant), )+
                };
                cx.doc_mut().set_text(node, name);
            }

            fn parse(
                &mut self,
                cx: &mut $crate::walker::ReadCx<'_>,
                node: $crate::document::NodeId,
                mode: $crate::ParseMode,
            ) {
                $crate::reflection::parse_enum(
                    self,
                    cx,
                    node,
                    mode,
                    |name| $crate::impl_reflect_enum!(@lookup $ty; name; $($variant),+),
                    &[$(::core::stringify!($variant)),+],
                );
            }

            fn from_key_text(
                cx: &mut $crate::walker::ReadCx<'_>,
                node: $crate::document::NodeId,
                text: &str,
            ) -> ::core::option::Option<Self> {
                $crate::reflection::enum_from_text(
                    cx,
                    node,
                    text,
                    |name| $crate::impl_reflect_enum!(@lookup $ty; name; $($variant),+),
                    &[$(::core::stringify!($variant)),+],
                )
            }
        }
    };
    (@first $ty:ident; $first:ident $(, $rest:ident)*) => {
        $ty::$first
    };
    (@lookup $ty:ident; $name:ident; $($variant:ident),+) => {{
        $(
            if $name == ::core::stringify!($variant) {
                return ::core::option::Option::Some($ty::$variant);
            }
        )+
        ::core::option::Option::None
    }};
}
