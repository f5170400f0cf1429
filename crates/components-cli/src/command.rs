use crate::config::Flags;
use crate::help::{self, ARGS_ID};
use crate::options::CliOptions;
use anyhow::bail;
use clap::ArgMatches;
use components_core::new_aggregate;

pub type RunCommandFn = Box<dyn FnMut(&[String]) -> anyhow::Result<()>>;

/// A subcommand of an [`App`](crate::App), possibly with subcommands of its own.
pub struct Command {
    usage: String,
    desc: String,
    options: Option<Box<dyn CliOptions>>,
    commands: Vec<Command>,
    run: Option<RunCommandFn>,
}

impl Command {
    /// `usage` starts with the command name, e.g. `"render <message>..."`.
    pub fn new(usage: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            desc: desc.into(),
            options: None,
            commands: Vec::new(),
            run: None,
        }
    }

    pub fn with_options(mut self, options: impl CliOptions + 'static) -> Self {
        self.options = Some(Box::new(options));
        self
    }

    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: FnMut(&[String]) -> anyhow::Result<()> + 'static,
    {
        self.run = Some(Box::new(run));
        self
    }

    pub fn add_command(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn add_commands(&mut self, cmds: impl IntoIterator<Item = Command>) {
        self.commands.extend(cmds);
    }

    pub fn name(&self) -> &str {
        self.usage.split_whitespace().next().unwrap_or_default()
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub(crate) fn clap_command(&self) -> clap::Command {
        let name = self.name().to_string();
        let mut cmd = clap::Command::new(name.clone())
            .about(self.desc.clone())
            .disable_help_flag(true)
            .arg(help::command_help_flag(&name));

        if let Some(options) = &self.options {
            cmd = cmd.args(options.flags().into_args());
        }
        if self.run.is_some() {
            cmd = cmd.arg(help::positional_args());
            if !self.commands.is_empty() {
                cmd = cmd.args_conflicts_with_subcommands(true);
            }
        }
        for child in &self.commands {
            cmd = cmd.subcommand(child.clap_command());
        }
        cmd
    }

    /// Run the command, or the subcommand `matches` selected.
    pub(crate) fn execute(&mut self, matches: &ArgMatches) -> anyhow::Result<()> {
        if let Some((name, sub)) = matches.subcommand() {
            let Some(child) = self.commands.iter_mut().find(|c| c.name() == name) else {
                bail!("unknown command {name:?} for {:?}", self.name());
            };
            return child.execute(sub);
        }

        if let Some(options) = self.options.as_mut() {
            options.apply(&Flags::new(matches, None))?;
            options.complete()?;
            if let Some(agg) = new_aggregate(options.validate()) {
                return Err(agg.into());
            }
        }

        match self.run.as_mut() {
            Some(run) => run(&positional(matches)),
            None => {
                self.clap_command().print_help()?;
                Ok(())
            }
        }
    }
}

pub(crate) fn positional(matches: &ArgMatches) -> Vec<String> {
    matches
        .try_get_many::<String>(ARGS_ID)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
