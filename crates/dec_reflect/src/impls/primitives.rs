use alloc::format;
use alloc::string::{String, ToString};
use core::fmt::Display;
use core::str::FromStr;

use crate::compat;
use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect, ReflectKind};
use crate::walker::{ReadCx, WriteCx};

// -----------------------------------------------------------------------------
// Helpers

fn read_text<T: Reflect>(
    cx: &ReadCx<'_>,
    node: NodeId,
    text: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        cx.error(
            Category::Shape,
            node,
            format!("empty text cannot be read as `{}`", T::type_path()),
        );
        return None;
    }
    match parse(trimmed) {
        Ok(value) => Some(value),
        Err(err) => {
            cx.error(
                Category::Shape,
                node,
                format!("`{trimmed}` cannot be read as `{}`: {err}", T::type_path()),
            );
            None
        }
    }
}

#[inline]
fn from_str<T: FromStr>(text: &str) -> Result<T, String>
where
    T::Err: Display,
{
    text.parse::<T>().map_err(|e| e.to_string())
}

fn parse_leaf<T: Reflect>(
    target: &mut T,
    cx: &mut ReadCx<'_>,
    node: NodeId,
    mode: ParseMode,
    parse: impl FnOnce(&str) -> Result<T, String>,
) {
    cx.check_mode(node, mode, &[ParseMode::Replace]);
    let text = cx.expect_text(node, T::type_path());
    if let Some(value) = read_text(cx, node, text, parse) {
        *target = value;
    }
}

// -----------------------------------------------------------------------------
// Integers

macro_rules! impl_reflect_integer {
    ($($ty:ident),*) => {$(
        impl Reflect for $ty {
            const KIND: ReflectKind = ReflectKind::Primitive;

            fn type_path() -> &'static str {
                stringify!($ty)
            }

            fn create() -> Self {
                0
            }

            fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
                cx.doc_mut().set_text(node, self.to_string());
            }

            fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
                parse_leaf(self, cx, node, mode, from_str::<$ty>);
            }

            fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
                read_text(cx, node, text, from_str::<$ty>)
            }
        }
    )*};
}

impl_reflect_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// -----------------------------------------------------------------------------
// Floats

macro_rules! impl_reflect_float {
    ($ty:ident, $to_text:path, $from_text:path) => {
        impl Reflect for $ty {
            const KIND: ReflectKind = ReflectKind::Primitive;

            fn type_path() -> &'static str {
                stringify!($ty)
            }

            fn create() -> Self {
                0.0
            }

            fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
                cx.doc_mut().set_text(node, $to_text(*self));
            }

            fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
                parse_leaf(self, cx, node, mode, $from_text);
            }

            fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
                read_text(cx, node, text, $from_text)
            }
        }
    };
}

impl_reflect_float!(f32, compat::f32_to_text, compat::f32_from_text);
impl_reflect_float!(f64, compat::f64_to_text, compat::f64_from_text);

// -----------------------------------------------------------------------------
// bool, char, ()

fn bool_from_text(text: &str) -> Result<bool, String> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(String::from("expected `true` or `false`"))
    }
}

impl Reflect for bool {
    const KIND: ReflectKind = ReflectKind::Primitive;

    fn type_path() -> &'static str {
        "bool"
    }

    fn create() -> Self {
        false
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        cx.doc_mut().set_text(node, if *self { "true" } else { "false" });
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        parse_leaf(self, cx, node, mode, bool_from_text);
    }

    fn from_key_text(cx: &mut ReadCx<'_>, node: NodeId, text: &str) -> Option<Self> {
        read_text(cx, node, text, bool_from_text)
    }
}

fn char_from_text(text: &str) -> Result<char, String> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(String::from("expected exactly one character")),
    }
}

impl Reflect for char {
    const KIND: ReflectKind = ReflectKind::Primitive;

    fn type_path() -> &'static str {
        "char"
    }

    fn create() -> Self {
        '\0'
    }

    fn compose(&mut self, cx: &mut WriteCx<'_>, node: NodeId) {
        cx.doc_mut().set_text(node, self.to_string());
    }

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, mode: ParseMode) {
        cx.check_mode(node, mode, &[ParseMode::Replace]);
        // Whitespace is a valid char, so the text is not trimmed.
        let text = cx.expect_text(node, "char");
        match char_from_text(text) {
            Ok(c) => *self = c,
            Err(err) => cx.error(
                Category::Shape,
                node,
                format!("`{text}` cannot be read as `char`: {err}"),
            ),
        }
    }
}

impl Reflect for () {
    const KIND: ReflectKind = ReflectKind::Primitive;

    fn type_path() -> &'static str {
        "()"
    }

    fn create() -> Self {}

    fn compose(&mut self, _: &mut WriteCx<'_>, _: NodeId) {}

    fn parse(&mut self, cx: &mut ReadCx<'_>, node: NodeId, _: ParseMode) {
        let n = cx.doc().node(node);
        if n.has_children() || n.text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
            cx.error(Category::Shape, node, "`()` expects an empty node");
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{bool_from_text, char_from_text};

    #[test]
    fn bool_is_case_insensitive() {
        assert_eq!(bool_from_text("TRUE"), Ok(true));
        assert_eq!(bool_from_text("False"), Ok(false));
        assert!(bool_from_text("yes").is_err());
    }

    #[test]
    fn char_needs_one_character() {
        assert_eq!(char_from_text(" "), Ok(' '));
        assert!(char_from_text("ab").is_err());
        assert!(char_from_text("").is_err());
    }
}
