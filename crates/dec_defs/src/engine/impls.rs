use core::fmt::Debug;

use dec_reflect::diagnostics::Reporter;
use dec_reflect::registry::{ConverterRegistry, TypeDirectory};
use dec_reflect::walker::Env;

use crate::config::EngineConfig;
use crate::database::Database;

/// Loading state of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineStatus {
    /// No definitions were loaded since creation or the last clear.
    #[default]
    Uninitialized,
    /// A [`DefParser`](crate::DefParser) is collecting documents.
    Processing,
    /// Definitions are loaded and finalized.
    Finished,
}

/// Everything a load, a write or a read works against: registered types,
/// converters, loaded definitions and the diagnostics callbacks.
///
/// Hosts usually keep one engine for the lifetime of the program, see
/// [`global`](crate::global). Nothing prevents several engines from
/// coexisting, for example in tests.
pub struct Engine {
    pub config: EngineConfig,
    pub directory: TypeDirectory,
    pub converters: ConverterRegistry,
    pub database: Database,
    pub reporter: Reporter,
    status: EngineStatus,
}

impl Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("directory", &self.directory)
            .field("converters", &self.converters)
            .field("database", &self.database)
            .field("reporter", &self.reporter)
            .finish()
    }
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Creates an engine with builtin types only and no converter.
    ///
    /// The reporter panics on errors if `config.strict` is set, and only
    /// logs them otherwise.
    pub fn new(config: EngineConfig) -> Self {
        let reporter = if config.strict {
            Reporter::strict()
        } else {
            Reporter::logging()
        };
        let mut directory = TypeDirectory::new();
        directory.set_prefixes(config.namespace_prefixes.iter().cloned());
        Self {
            config,
            directory,
            converters: ConverterRegistry::empty(),
            database: Database::new(),
            reporter,
            status: EngineStatus::Uninitialized,
        }
    }

    /// Replaces the diagnostics callbacks.
    #[inline]
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the converters.
    #[inline]
    pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    #[inline]
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: EngineStatus) {
        log::debug!("engine status: {:?} -> {status:?}", self.status);
        self.status = status;
    }

    /// The walk environment, with definition lookups enabled.
    #[inline]
    pub fn env(&self) -> Env<'_> {
        Env::new(&self.directory, &self.converters, &self.reporter)
            .with_defs(&self.database)
            .with_limits(self.config.limits())
    }
}
