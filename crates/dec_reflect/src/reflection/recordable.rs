use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::diagnostics::Category;
use crate::document::NodeId;
use crate::reflection::{ParseMode, Reflect};
use crate::walker::{Factories, ReadCx, WriteCx, dispatch_compose, dispatch_parse, read_value, write_value};

// -----------------------------------------------------------------------------
// Recordable

/// A self-describing type.
///
/// One `record` function describes the fields in both directions: when
/// writing, each [`Recorder::record`] call emits a child node, when reading
/// it fills the field from the child of the same name.
///
/// Pair it with [`impl_reflect_record!`](crate::impl_reflect_record).
///
/// # Examples
///
/// ```
/// use dec_reflect::{Recordable, Recorder, impl_reflect_record};
///
/// #[derive(Default)]
/// struct Stats {
///     health: i32,
///     name: String,
/// }
///
/// impl Recordable for Stats {
///     fn record(&mut self, recorder: &mut Recorder<'_, '_>) {
///         recorder.record(&mut self.health, "health");
///         recorder.record(&mut self.name, "name");
///     }
/// }
///
/// impl_reflect_record!(Stats);
/// ```
pub trait Recordable: 'static {
    fn record(&mut self, recorder: &mut Recorder<'_, '_>);
}

/// Implements [`Reflect`](crate::Reflect) for [`Recordable`] types.
///
/// The types must implement [`Default`], used for missing nodes.
#[macro_export]
macro_rules! impl_reflect_record {
    ($($ty:ident),+ $(,)?) => {$(
        impl $crate::Reflect for $ty {
            const KIND: $crate::ReflectKind = $crate::ReflectKind::Record;

            fn create() -> Self {
                <Self as ::core::default::Default>::default()
            }

            fn compose(
                &mut self,
                cx: &mut $crate::walker::WriteCx<'_>,
                node: $crate::document::NodeId,
            ) {
                $crate::reflection::compose_record(self, cx, node);
            }

            fn parse(
                &mut self,
                cx: &mut $crate::walker::ReadCx<'_>,
                node: $crate::document::NodeId,
                mode: $crate::ParseMode,
            ) {
                $crate::reflection::parse_record(self, cx, node, mode);
            }
        }
    )+};
}

/// Writes a [`Recordable`] value.
pub fn compose_record<R: Recordable>(value: &mut R, cx: &mut WriteCx<'_>, node: NodeId) {
    cx.enter_record();
    value.record(&mut Recorder::writing(cx, node));
    cx.leave_record();
}

/// Reads a [`Recordable`] value.
pub fn parse_record<R: Recordable + Reflect>(
    value: &mut R,
    cx: &mut ReadCx<'_>,
    node: NodeId,
    mode: ParseMode,
) {
    cx.check_mode(node, mode, &[ParseMode::Patch]);
    cx.reject_text(node, R::type_path());
    cx.enter_record();
    let outer = cx.swap_factories(None);
    value.record(&mut Recorder::reading(cx, node));
    cx.swap_factories(outer);
    cx.leave_record();
}

// -----------------------------------------------------------------------------
// Recorder

/// Which way a [`Recorder`] is walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

enum Access<'r, 'cx> {
    Read(&'r mut ReadCx<'cx>),
    Write(&'r mut WriteCx<'cx>),
}

/// The two-way field visitor given to [`Recordable::record`].
pub struct Recorder<'r, 'cx> {
    access: Access<'r, 'cx>,
    node: NodeId,
    labels: Vec<String>,
    as_this: bool,
}

impl<'r, 'cx> Recorder<'r, 'cx> {
    pub(crate) fn reading(cx: &'r mut ReadCx<'cx>, node: NodeId) -> Self {
        Self {
            access: Access::Read(cx),
            node,
            labels: Vec::new(),
            as_this: false,
        }
    }

    pub(crate) fn writing(cx: &'r mut WriteCx<'cx>, node: NodeId) -> Self {
        Self {
            access: Access::Write(cx),
            node,
            labels: Vec::new(),
            as_this: false,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        match self.access {
            Access::Read(_) => Direction::Read,
            Access::Write(_) => Direction::Write,
        }
    }

    /// The node being recorded.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Records `value` as the child named `label`.
    ///
    /// On read, a missing child leaves `value` unchanged. Labels must be
    /// unique within one record.
    pub fn record<T: Reflect>(&mut self, value: &mut T, label: &str) {
        self.record_inner(value, label, None);
    }

    /// Records `value` like [`record`](Self::record), creating new values
    /// below it with `factories`.
    ///
    /// Writing ignores `factories`.
    pub fn record_with<T: Reflect>(&mut self, value: &mut T, label: &str, factories: &Factories) {
        self.record_inner(value, label, Some(factories));
    }

    fn record_inner<T: Reflect>(&mut self, value: &mut T, label: &str, factories: Option<&Factories>) {
        if self.as_this {
            self.error(format!(
                "`{label}` recorded after `record_as_this`, it is ignored"
            ));
            return;
        }
        if self.labels.iter().any(|l| l == label) {
            self.error(format!("field `{label}` recorded twice"));
            return;
        }
        self.labels.push(String::from(label));

        match &mut self.access {
            Access::Write(cx) => {
                let child = cx.doc_mut().add_child(self.node, label);
                write_value(cx, value, child);
            }
            Access::Read(cx) => {
                let Some(child) = cx.doc().child_named(self.node, label) else {
                    return;
                };
                match factories {
                    Some(factories) => {
                        let outer = cx.swap_factories(Some(factories.clone()));
                        read_value(cx, child, value);
                        cx.swap_factories(outer);
                    }
                    None => read_value(cx, child, value),
                }
            }
        }
    }

    /// Records `value` as the node itself, for wrapper types.
    ///
    /// Must be the only call of the record.
    pub fn record_as_this<T: Reflect>(&mut self, value: &mut T) {
        if self.as_this || !self.labels.is_empty() {
            self.error("`record_as_this` must be the only field of a record");
            return;
        }
        self.as_this = true;

        match &mut self.access {
            Access::Write(cx) => dispatch_compose(cx, value, self.node),
            Access::Read(cx) => dispatch_parse(cx, self.node, value, ParseMode::Default),
        }
    }

    /// Reports an error at the recorded node.
    pub fn error(&self, message: impl Into<String>) {
        match &self.access {
            Access::Read(cx) => cx.error(Category::Shape, self.node, message),
            Access::Write(cx) => cx.error(Category::Shape, self.node, message),
        }
    }

    /// Reports a warning at the recorded node.
    pub fn warn(&self, message: impl Into<String>) {
        match &self.access {
            Access::Read(cx) => cx.warn(Category::Shape, self.node, message),
            Access::Write(cx) => cx.warn(Category::Shape, self.node, message),
        }
    }
}
