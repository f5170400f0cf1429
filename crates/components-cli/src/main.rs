use anyhow::{bail, Context};
use clap::{Arg, ArgAction};
use components_cli::output::{print_json, print_table};
use components_cli::{format_base_name, App, CliOptions, Command, Flags, NamedFlagSets};
use components_core::errors::{
    count_messages, create_aggregate_from_message_count_map, new_aggregate, BoxError,
};
use components_core::log::LogOptions;
use components_core::net::is_valid_port;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Root options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ServerOptions {
    bind_address: String,
    port: i64,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Options {
    log: LogOptions,
    server: ServerOptions,
}

impl CliOptions for Options {
    fn flags(&self) -> NamedFlagSets {
        let mut fss = self.log.flags();
        fss.flag_set("server").extend([
            Arg::new("server.bind-address")
                .long("server.bind-address")
                .value_name("IP")
                .default_value(self.server.bind_address.clone())
                .help("Address to listen on."),
            Arg::new("server.port")
                .long("server.port")
                .value_name("PORT")
                .default_value(self.server.port.to_string())
                .help("Port to listen on, 1-65534."),
        ]);
        fss
    }

    fn apply(&mut self, flags: &Flags<'_>) -> anyhow::Result<()> {
        self.log.apply(flags)?;
        if let Some(addr) = flags.string("server.bind-address") {
            self.server.bind_address = addr;
        }
        if let Some(port) = flags.parse("server.port")? {
            self.server.port = port;
        }
        Ok(())
    }

    fn validate(&self) -> Vec<BoxError> {
        let mut errs = CliOptions::validate(&self.log);
        if !is_valid_port(self.server.port) {
            errs.push(
                format!(
                    "--server.port {} must be between 1 and 65534, inclusive",
                    self.server.port
                )
                .into(),
            );
        }
        errs
    }

    fn summary(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    fn log_options(&self) -> Option<LogOptions> {
        Some(self.log.clone())
    }
}

// ---------------------------------------------------------------------------
// errors render
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RenderOptions {
    count: bool,
}

impl CliOptions for RenderOptions {
    fn flags(&self) -> NamedFlagSets {
        let mut fss = NamedFlagSets::new();
        fss.flag_set("render").push(
            Arg::new("count")
                .long("count")
                .action(ArgAction::SetTrue)
                .help("Collapse repeated messages and show how often each occurred."),
        );
        fss
    }

    fn apply(&mut self, flags: &Flags<'_>) -> anyhow::Result<()> {
        self.count = flags.bool("count");
        Ok(())
    }

    fn validate(&self) -> Vec<BoxError> {
        Vec::new()
    }
}

fn errors_command() -> Command {
    let opts = Rc::new(RefCell::new(RenderOptions::default()));
    let render_opts = Rc::clone(&opts);
    let render = Command::new("render <message>...", "Render messages as one aggregate error")
        .with_options(opts)
        .with_run(move |args| {
            let errs: Vec<BoxError> = args.iter().map(|m| BoxError::from(m.clone())).collect();
            if render_opts.borrow().count {
                let counts = count_messages(&errs);
                let rows = counts
                    .iter()
                    .map(|(msg, n)| vec![msg.clone(), n.to_string()])
                    .collect();
                print_table(&["MESSAGE", "COUNT"], rows);
                if let Some(agg) = create_aggregate_from_message_count_map(&counts) {
                    println!("{agg}");
                }
                return Ok(());
            }
            match new_aggregate(errs) {
                Some(agg) => println!("{agg}"),
                None => println!("no errors"),
            }
            Ok(())
        });

    let mut errors = Command::new("errors", "Error aggregation helpers");
    errors.add_command(render);
    errors
}

// ---------------------------------------------------------------------------
// port check
// ---------------------------------------------------------------------------

fn port_command() -> Command {
    let check = Command::new("check <port>", "Check that a port number is usable").with_run(|args| {
        let [port] = args else {
            bail!("expected exactly one port, got {}", args.len());
        };
        let n: i64 = port
            .parse()
            .with_context(|| format!("{port:?} is not a number"))?;
        if !is_valid_port(n) {
            bail!("{n} is not a valid port");
        }
        println!("{n} is a valid port");
        Ok(())
    });

    let mut port = Command::new("port", "Port helpers");
    port.add_command(check);
    port
}

fn main() {
    let basename = std::env::args()
        .next()
        .as_deref()
        .and_then(|p| std::path::Path::new(p).file_name()?.to_str().map(format_base_name))
        .unwrap_or_else(|| "components".to_string());

    let opts = Rc::new(RefCell::new(Options::default()));
    let run_opts = Rc::clone(&opts);
    let mut app = App::new("Components demo", basename)
        .with_description("Demonstrates error aggregation, logging setup and command scaffolding.")
        .with_options(opts)
        .with_default_valid_args()
        .with_run(move |_| print_json(&*run_opts.borrow()));
    app.add_commands([errors_command(), port_command()]);
    app.run();
}
