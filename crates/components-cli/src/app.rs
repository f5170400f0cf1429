use crate::command::{self, Command};
use crate::config::{self, Flags};
use crate::flag;
use crate::help::{self, CONFIG_ID};
use crate::options::CliOptions;
use crate::output::{print_error, progress_message};
use anyhow::{bail, Context};
use clap::ArgMatches;
use components_core::{log, new_aggregate, ComponentsError};
use std::ffi::OsString;

pub type RunFn = Box<dyn FnMut(&str) -> anyhow::Result<()>>;

/// Checks the positional arguments given to the root command.
pub type ValidArgsFn = Box<dyn Fn(&str, &[String]) -> anyhow::Result<()>>;

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// A command-line application: root flags, optional config file, logging
/// setup and a tree of [`Command`]s.
pub struct App {
    basename: String,
    name: String,
    description: String,
    version: String,
    options: Option<Box<dyn CliOptions>>,
    run: Option<RunFn>,
    silence: bool,
    no_version: bool,
    no_config: bool,
    valid_args: Option<ValidArgsFn>,
    commands: Vec<Command>,
}

impl App {
    /// `name` is the display name, `basename` the binary name used for the
    /// config file and its environment variable.
    pub fn new(name: impl Into<String>, basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            name: name.into(),
            description: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            options: None,
            run: None,
            silence: false,
            no_version: false,
            no_config: false,
            valid_args: None,
            commands: Vec::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_options(mut self, options: impl CliOptions + 'static) -> Self {
        self.options = Some(Box::new(options));
        self
    }

    /// The function run once options are applied. It receives the basename.
    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: FnMut(&str) -> anyhow::Result<()> + 'static,
    {
        self.run = Some(Box::new(run));
        self
    }

    /// Skip the startup banners and options summary.
    pub fn with_silence(mut self) -> Self {
        self.silence = true;
        self
    }

    pub fn with_no_version(mut self) -> Self {
        self.no_version = true;
        self
    }

    pub fn with_no_config(mut self) -> Self {
        self.no_config = true;
        self
    }

    pub fn with_valid_args<F>(mut self, valid: F) -> Self
    where
        F: Fn(&str, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.valid_args = Some(Box::new(valid));
        self
    }

    /// Reject any positional argument.
    pub fn with_default_valid_args(self) -> Self {
        self.with_valid_args(|path, args| {
            if !args.is_empty() {
                bail!("{path:?} does not take any arguments, got {args:?}");
            }
            Ok(())
        })
    }

    pub fn add_command(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn add_commands(&mut self, cmds: impl IntoIterator<Item = Command>) {
        self.commands.extend(cmds);
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// The clap command tree this app parses with.
    pub fn command(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.basename.clone())
            .about(self.name.clone())
            .disable_help_flag(true)
            .disable_help_subcommand(self.commands.is_empty())
            .arg(help::app_help_flag(&self.name))
            .arg(help::positional_args());
        if !self.description.is_empty() {
            cmd = cmd.long_about(self.description.clone());
        }
        if self.no_version {
            cmd = cmd.disable_version_flag(true);
        } else {
            cmd = cmd.version(self.version.clone());
        }
        if !self.no_config {
            cmd = cmd.arg(help::config_flag(&self.basename));
        }
        if let Some(options) = &self.options {
            cmd = cmd.args(options.flags().into_args());
        }
        if !self.commands.is_empty() {
            cmd = cmd.args_conflicts_with_subcommands(true);
        }
        for child in &self.commands {
            cmd = cmd.subcommand(child.clap_command());
        }
        cmd
    }

    /// Parse `args` (program name first) and run. Help and version requests
    /// print and return `Ok`.
    pub fn execute<I, T>(&mut self, args: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = match self.command().try_get_matches_from(flag::normalize_args(args)) {
            Ok(matches) => matches,
            Err(e) if !e.use_stderr() => {
                e.print()?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some((name, sub)) = matches.subcommand() {
            let Some(child) = self.commands.iter_mut().find(|c| c.name() == name) else {
                bail!("unknown command {name:?} for {:?}", self.basename);
            };
            return child.execute(sub);
        }
        self.run_root(&matches)
    }

    /// Run with the process arguments, exiting 1 on failure.
    pub fn run(mut self) {
        if let Err(e) = self.execute(std::env::args_os()) {
            if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
                clap_err.exit();
            }
            print_error(&e);
            std::process::exit(1);
        }
    }

    fn run_root(&mut self, matches: &ArgMatches) -> anyhow::Result<()> {
        let args = command::positional(matches);
        if let Some(valid) = &self.valid_args {
            valid(&self.basename, &args)?;
        }

        let config = if self.no_config {
            None
        } else {
            let explicit = matches.try_get_one::<String>(CONFIG_ID).ok().flatten();
            config::load(explicit.map(String::as_str), &self.basename)?
        };

        if let Some(options) = self.options.as_mut() {
            let flags = Flags::new(matches, config.as_ref().map(|c| &c.value));
            options.apply(&flags)?;
            options.complete().context("failed to complete options")?;
            if let Some(agg) = new_aggregate(options.validate()) {
                return Err(agg.into());
            }
            if let Some(log_opts) = options.log_options() {
                init_logging(&log_opts)?;
            }
        }

        print_working_dir();
        flag::print_flags(matches);

        if !self.silence {
            let logger = log::from_context(None);
            logger.info(format_args!("{} Starting {} ...", progress_message(), self.name));
            if !self.no_version {
                logger.info(format_args!("{} Version: `{}`", progress_message(), self.version));
            }
            if !self.no_config {
                let used = config
                    .as_ref()
                    .map(|c| c.path.display().to_string())
                    .unwrap_or_default();
                logger.info(format_args!("{} Config file used: `{}`", progress_message(), used));
            }
            if let Some(summary) = self.options.as_ref().and_then(|o| o.summary()) {
                logger.info(format_args!("{} Config: `{}`", progress_message(), summary));
            }
        }

        match self.run.as_mut() {
            Some(run) => run(&self.basename),
            None => {
                self.command().print_help()?;
                Ok(())
            }
        }
    }
}

/// Install the global logger unless something already did.
fn init_logging(opts: &log::LogOptions) -> anyhow::Result<()> {
    if log::global().is_some() {
        return Ok(());
    }
    match log::init(opts) {
        Ok(_) | Err(ComponentsError::LogInit(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn print_working_dir() {
    if let Ok(wd) = std::env::current_dir() {
        tracing::debug!("{} WorkingDir: {}", progress_message(), wd.display());
    }
}

/// Binary name as used for config lookup: lowercase without `.exe` on Windows.
pub fn format_base_name(basename: &str) -> String {
    if cfg!(windows) {
        let lower = basename.to_lowercase();
        lower.strip_suffix(".exe").unwrap_or(&lower).to_string()
    } else {
        basename.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::NamedFlagSets;
    use clap::Arg;
    use components_core::BoxError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct PortOptions {
        port: i64,
        max_conns: u32,
        completed: bool,
    }

    impl CliOptions for PortOptions {
        fn flags(&self) -> NamedFlagSets {
            let mut fss = NamedFlagSets::new();
            fss.flag_set("server").extend([
                Arg::new("server.port").long("server.port").default_value("80"),
                Arg::new("server.max-conns")
                    .long("server.max_conns")
                    .default_value("1"),
            ]);
            fss
        }

        fn apply(&mut self, flags: &Flags<'_>) -> anyhow::Result<()> {
            self.port = flags.parse("server.port")?.unwrap_or_default();
            self.max_conns = flags.parse("server.max-conns")?.unwrap_or_default();
            Ok(())
        }

        fn complete(&mut self) -> anyhow::Result<()> {
            self.completed = true;
            Ok(())
        }

        fn validate(&self) -> Vec<BoxError> {
            let mut errs: Vec<BoxError> = Vec::new();
            if self.port < 0 {
                errs.push("port is negative".into());
            }
            if self.port > 65535 {
                errs.push("port is too large".into());
            }
            if self.port == 13 {
                errs.push("unlucky port".into());
                errs.push("port is reserved".into());
            }
            errs
        }
    }

    fn app(opts: &Rc<RefCell<PortOptions>>) -> App {
        App::new("Test server", "testsrv")
            .with_options(Rc::clone(opts))
            .with_silence()
            .with_default_valid_args()
            .with_run(|_| Ok(()))
    }

    #[test]
    fn options_flow_through_apply_and_complete() {
        let opts = Rc::new(RefCell::new(PortOptions::default()));
        let mut testsrv = app(&opts).with_no_config();
        assert_eq!(testsrv.basename(), "testsrv");
        testsrv.execute(["testsrv", "--server.port=8080"]).unwrap();
        assert_eq!(opts.borrow().port, 8080);
        assert!(opts.borrow().completed);
    }

    #[test]
    fn underscore_flags_are_accepted() {
        let opts = Rc::new(RefCell::new(PortOptions::default()));
        app(&opts)
            .with_no_config()
            .execute(["testsrv", "--server.max_conns", "5"])
            .unwrap();
        assert_eq!(opts.borrow().max_conns, 5);
    }

    #[test]
    fn every_validation_failure_is_reported() {
        let opts = Rc::new(RefCell::new(PortOptions::default()));
        let err = app(&opts)
            .with_no_config()
            .execute(["testsrv", "--server.port", "13"])
            .unwrap_err();
        assert_eq!(err.to_string(), "[unlucky port, port is reserved]");
    }

    #[test]
    fn positional_args_are_rejected_by_default() {
        let opts = Rc::new(RefCell::new(PortOptions::default()));
        let err = app(&opts)
            .with_no_config()
            .execute(["testsrv", "extra"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"testsrv\" does not take any arguments, got [\"extra\"]"
        );
    }

    #[test]
    fn config_file_fills_unset_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("testsrv.yaml");
        std::fs::write(&path, "server:\n  port: 9090\n").unwrap();
        let opts = Rc::new(RefCell::new(PortOptions::default()));
        app(&opts)
            .execute(["testsrv", "-c", path.to_str().unwrap()])
            .unwrap();
        assert_eq!(opts.borrow().port, 9090);
    }

    #[test]
    fn run_receives_basename() {
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);
        App::new("Test", "testsrv")
            .with_no_config()
            .with_silence()
            .with_run(move |basename| {
                sink.borrow_mut().push_str(basename);
                Ok(())
            })
            .execute(["testsrv"])
            .unwrap();
        assert_eq!(*seen.borrow(), "testsrv");
    }

    #[test]
    fn subcommands_dispatch() {
        let hits = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hits);
        let mut app = App::new("Test", "testsrv").with_no_config();
        app.add_command(Command::new("ping", "Ping").with_run(move |_| {
            *sink.borrow_mut() += 1;
            Ok(())
        }));
        app.execute(["testsrv", "ping"]).unwrap();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn help_uses_named_sections() {
        let opts = Rc::new(RefCell::new(PortOptions::default()));
        let help = app(&opts).command().render_help().to_string();
        assert!(help.contains("Server flags:"));
        assert!(help.contains("--server.port"));
        assert!(help.contains("--server.max-conns"));
        assert!(help.contains("Global flags:"));
        assert!(help.contains("-H, --help"));
        assert!(help.contains("--config <FILE>"));
    }

    #[test]
    fn base_name_is_unchanged_off_windows() {
        if !cfg!(windows) {
            assert_eq!(format_base_name("Tool.exe"), "Tool.exe");
        } else {
            assert_eq!(format_base_name("Tool.EXE"), "tool");
        }
    }
}
