use crate::config::Flags;
use crate::flag::NamedFlagSets;
use clap::{Arg, ArgAction};
use components_core::log::LogOptions;
use components_core::BoxError;
use std::cell::RefCell;
use std::rc::Rc;

/// Options an [`App`](crate::App) or [`Command`](crate::Command) parses
/// from its flags.
///
/// The lifecycle is `flags` → `apply` → `complete` → `validate`. Every error
/// `validate` returns is reported, wrapped in one aggregate.
pub trait CliOptions {
    /// Flag definitions, grouped into help sections.
    fn flags(&self) -> NamedFlagSets;

    /// Copy resolved flag values into the options.
    fn apply(&mut self, flags: &Flags<'_>) -> anyhow::Result<()>;

    fn validate(&self) -> Vec<BoxError>;

    /// Fill in derived values once flags are applied.
    fn complete(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// One-line rendering logged at startup.
    fn summary(&self) -> Option<String> {
        None
    }

    /// Logging settings the app installs before running.
    fn log_options(&self) -> Option<LogOptions> {
        None
    }
}

/// Shared options: the command owns one handle, its run closure another.
impl<T: CliOptions + ?Sized> CliOptions for Rc<RefCell<T>> {
    fn flags(&self) -> NamedFlagSets {
        self.borrow().flags()
    }

    fn apply(&mut self, flags: &Flags<'_>) -> anyhow::Result<()> {
        self.borrow_mut().apply(flags)
    }

    fn validate(&self) -> Vec<BoxError> {
        self.borrow().validate()
    }

    fn complete(&mut self) -> anyhow::Result<()> {
        self.borrow_mut().complete()
    }

    fn summary(&self) -> Option<String> {
        self.borrow().summary()
    }

    fn log_options(&self) -> Option<LogOptions> {
        self.borrow().log_options()
    }
}

// ---------------------------------------------------------------------------
// Log flags
// ---------------------------------------------------------------------------

pub const LOG_LEVEL: &str = "log.level";
pub const LOG_FORMAT: &str = "log.format";
pub const LOG_DISABLE_CALLER: &str = "log.disable-caller";
pub const LOG_ENABLE_COLOR: &str = "log.enable-color";
pub const LOG_OUTPUT_PATHS: &str = "log.output-paths";
pub const LOG_NAME: &str = "log.name";

impl CliOptions for LogOptions {
    fn flags(&self) -> NamedFlagSets {
        let mut name = Arg::new(LOG_NAME)
            .long(LOG_NAME)
            .value_name("NAME")
            .help("Name of the default logger.");
        if !self.name.is_empty() {
            name = name.default_value(self.name.clone());
        }

        let mut fss = NamedFlagSets::new();
        fss.flag_set("log").extend([
            Arg::new(LOG_LEVEL)
                .long(LOG_LEVEL)
                .value_name("LEVEL")
                .default_value(self.level.clone())
                .help("Minimum log level: trace, debug, info, warn, error."),
            Arg::new(LOG_FORMAT)
                .long(LOG_FORMAT)
                .value_name("FORMAT")
                .default_value(self.format.clone())
                .help("Log format: console or json."),
            Arg::new(LOG_DISABLE_CALLER)
                .long(LOG_DISABLE_CALLER)
                .action(ArgAction::SetTrue)
                .help("Omit the source file and line from log events."),
            Arg::new(LOG_ENABLE_COLOR)
                .long(LOG_ENABLE_COLOR)
                .action(ArgAction::SetTrue)
                .help("Colorize console log output."),
            Arg::new(LOG_OUTPUT_PATHS)
                .long(LOG_OUTPUT_PATHS)
                .value_name("PATHS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_values(self.output_paths.clone())
                .help("Log destinations: stdout, stderr or file paths."),
            name,
        ]);
        fss
    }

    fn apply(&mut self, flags: &Flags<'_>) -> anyhow::Result<()> {
        if let Some(level) = flags.string(LOG_LEVEL) {
            self.level = level;
        }
        if let Some(format) = flags.string(LOG_FORMAT) {
            self.format = format;
        }
        self.disable_caller = flags.bool(LOG_DISABLE_CALLER);
        self.enable_color = flags.bool(LOG_ENABLE_COLOR);
        let paths = flags.strings(LOG_OUTPUT_PATHS);
        if !paths.is_empty() {
            self.output_paths = paths;
        }
        if let Some(name) = flags.string(LOG_NAME) {
            self.name = name;
        }
        Ok(())
    }

    fn validate(&self) -> Vec<BoxError> {
        LogOptions::validate(self)
            .into_iter()
            .map(|e| Box::new(e) as BoxError)
            .collect()
    }

    fn summary(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn log_options(&self) -> Option<LogOptions> {
        Some(self.clone())
    }
}
