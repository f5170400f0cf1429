use clap::{Arg, ArgMatches};
use std::ffi::OsString;

// ---------------------------------------------------------------------------
// NamedFlagSets
// ---------------------------------------------------------------------------

/// Flags grouped into named sections. Each section becomes its own heading
/// in help output, in the order the sections were first requested.
#[derive(Debug, Clone, Default)]
pub struct NamedFlagSets {
    order: Vec<String>,
    sets: Vec<Vec<Arg>>,
}

impl NamedFlagSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// The section called `name`, created empty on first use.
    pub fn flag_set(&mut self, name: &str) -> &mut Vec<Arg> {
        let idx = match self.order.iter().position(|n| n == name) {
            Some(idx) => idx,
            None => {
                self.order.push(name.to_string());
                self.sets.push(Vec::new());
                self.sets.len() - 1
            }
        };
        &mut self.sets[idx]
    }

    /// Section names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arg])> {
        self.order
            .iter()
            .map(String::as_str)
            .zip(self.sets.iter().map(Vec::as_slice))
    }

    /// Fold `other`'s sections into this one, appending to sections that
    /// share a name.
    pub fn merge(&mut self, other: NamedFlagSets) {
        for (name, args) in other.order.into_iter().zip(other.sets) {
            self.flag_set(&name).extend(args);
        }
    }

    /// Every flag with its section heading set and its long name normalized.
    pub fn into_args(self) -> Vec<Arg> {
        self.order
            .into_iter()
            .zip(self.sets)
            .flat_map(|(name, args)| {
                let heading = section_heading(&name);
                args.into_iter()
                    .map(move |arg| normalize_arg(arg).help_heading(heading.clone()))
            })
            .collect()
    }
}

/// "log" → "Log flags"; clap appends the colon.
fn section_heading(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{} flags", first.to_uppercase(), chars.as_str()),
        None => "Flags".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Flag names accept `_` and `-` interchangeably; `_` is stored as `-`.
pub fn word_sep_normalize(name: &str) -> String {
    name.replace('_', "-")
}

fn normalize_arg(arg: Arg) -> Arg {
    let normalized = arg
        .get_long()
        .filter(|long| long.contains('_'))
        .map(word_sep_normalize);
    match normalized {
        Some(long) => arg.long(long),
        None => arg,
    }
}

/// Rewrite `--some_flag[=value]` tokens to `--some-flag[=value]`. Values
/// and everything after a bare `--` pass through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(token) = arg.to_str() else {
                return arg;
            };
            if token == "--" {
                passthrough = true;
                return arg;
            }
            match token.strip_prefix("--") {
                Some(rest) => {
                    let (name, value) = match rest.split_once('=') {
                        Some((name, value)) => (name, Some(value)),
                        None => (rest, None),
                    };
                    let name = word_sep_normalize(name);
                    match value {
                        Some(value) => OsString::from(format!("--{name}={value}")),
                        None => OsString::from(format!("--{name}")),
                    }
                }
                None => arg,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

/// Log every flag clap resolved, one debug line each.
pub fn print_flags(matches: &ArgMatches) {
    for id in matches.ids() {
        let id = id.as_str();
        if let Ok(Some(raw)) = matches.try_get_raw(id) {
            let values: Vec<String> = raw.map(|v| v.to_string_lossy().into_owned()).collect();
            tracing::debug!("FLAG: --{}={:?}", id, values.join(","));
        }
    }
}
