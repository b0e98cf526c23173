//! A thread-local [`Engine`] for hosts which want a single one.
//!
//! ```
//! use dec_defs::{Engine, EngineConfig, global};
//!
//! global::install(Engine::new(EngineConfig::lenient()));
//! assert!(global::is_installed());
//! let status = global::with(|engine| engine.status());
//! assert!(status.is_some());
//! global::clear();
//! assert!(!global::is_installed());
//! ```
//!
//! Engines hold `Rc` handles and stay on the thread which installed them.

use core::cell::RefCell;

use crate::engine::Engine;

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
}

/// Installs `engine`, returning the one it replaces.
pub fn install(engine: Engine) -> Option<Engine> {
    log::debug!("installing the global engine");
    ENGINE.with_borrow_mut(|slot| slot.replace(engine))
}

/// Removes the installed engine.
pub fn take() -> Option<Engine> {
    ENGINE.with_borrow_mut(Option::take)
}

/// Drops the installed engine with every loaded definition.
pub fn clear() {
    if take().is_some() {
        log::debug!("global engine cleared");
    }
}

#[inline]
pub fn is_installed() -> bool {
    ENGINE.with_borrow(Option::is_some)
}

/// Runs `f` with the installed engine, or returns `None` without one.
///
/// # Panics
///
/// Panics if called from inside [`with_mut`].
pub fn with<R>(f: impl FnOnce(&Engine) -> R) -> Option<R> {
    ENGINE.with_borrow(|slot| slot.as_ref().map(f))
}

/// Runs `f` with the installed engine mutably, or returns `None` without one.
///
/// # Panics
///
/// Panics if called from inside [`with`] or [`with_mut`].
pub fn with_mut<R>(f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
    ENGINE.with_borrow_mut(|slot| slot.as_mut().map(f))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::fixtures::{Fixture, ItemDef};

    #[test]
    fn installed_engine_is_shared_by_the_thread() {
        assert!(super::with(|_| ()).is_none());

        let fx = Fixture::new();
        let collected = fx.collected.clone();
        assert!(super::install(fx.engine).is_none());

        super::with_mut(|engine| {
            let mut parser = engine.parser();
            parser.add_string(r#"<Defs><Item defName="Torch" /></Defs>"#, "items");
            parser.finish();
        });
        assert!(collected.errors().is_empty(), "{collected:?}");

        let found = super::with(|engine| engine.get::<ItemDef>("Torch").is_some());
        assert_eq!(found, Some(true));

        let engine = super::take().unwrap();
        assert_eq!(engine.database.len(), 1);
        assert!(!super::is_installed());
        super::clear();
    }
}
