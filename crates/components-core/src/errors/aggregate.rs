use super::sets::StringSet;
use super::{BoxError, WorkerPanicked};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

/// Occurrence count per distinct error message, iterated in message order.
pub type MessageCountMap = BTreeMap<String, usize>;

/// Predicate used by [`filter_out`]; returns true for errors to drop.
pub type Matcher<'a> = &'a dyn Fn(&(dyn Error + 'static)) -> bool;

/// A unit of work for [`aggregate_threads`].
pub type Task = Box<dyn FnOnce() -> Result<(), BoxError> + Send + 'static>;

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Several errors that happened together, presented as one error.
///
/// An `Aggregate` always holds at least one error: [`new_aggregate`] returns
/// `None` instead of an empty value. Elements may themselves be aggregates;
/// rendering and [`Aggregate::is`] walk the nesting, [`Aggregate::errors`]
/// does not.
#[derive(Debug)]
pub struct Aggregate {
    errors: Vec<BoxError>,
}

/// Wrap a list of errors. `None` entries are dropped; an empty result is `None`.
///
/// Accepts anything that converts into `Option<BoxError>`, so both
/// `Vec<BoxError>` and `Vec<Option<BoxError>>` work.
pub fn new_aggregate<I>(errs: I) -> Option<Aggregate>
where
    I: IntoIterator,
    I::Item: Into<Option<BoxError>>,
{
    let errors: Vec<BoxError> = errs.into_iter().filter_map(|e| e.into()).collect();
    if errors.is_empty() {
        None
    } else {
        Some(Aggregate { errors })
    }
}

/// Multi-error view of `err`, if it has one.
pub fn as_aggregate<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Aggregate> {
    err.downcast_ref::<Aggregate>()
}

impl Aggregate {
    /// The top-level elements, in insertion order. Nested aggregates are not
    /// expanded; see [`flatten`].
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if `target` equals any leaf error, or any error in a leaf's
    /// `source()` chain.
    pub fn is<E>(&self, target: &E) -> bool
    where
        E: Error + PartialEq + 'static,
    {
        self.is_match(|err| {
            std::iter::successors(Some(err), |&e| e.source())
                .any(|e| e.downcast_ref::<E>() == Some(target))
        })
    }

    /// True if `pred` holds for any leaf error.
    pub fn is_match<F>(&self, mut pred: F) -> bool
    where
        F: FnMut(&(dyn Error + 'static)) -> bool,
    {
        self.visit(&mut |err| pred(err))
    }

    /// Depth-first, left-to-right over leaf errors. Stops at the first `true`.
    fn visit(&self, f: &mut dyn FnMut(&(dyn Error + 'static)) -> bool) -> bool {
        for err in &self.errors {
            let matched = match err.downcast_ref::<Aggregate>() {
                Some(nested) => nested.visit(f),
                None => f(&**err),
            };
            if matched {
                return true;
            }
        }
        false
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "{only}"),
            _ => {
                let mut seen = StringSet::new();
                let mut messages: Vec<String> = Vec::new();
                self.visit(&mut |err| {
                    let msg = err.to_string();
                    if !seen.has(&msg) {
                        seen.insert([msg.as_str()]);
                        messages.push(msg);
                    }
                    false
                });
                if messages.len() == 1 {
                    f.write_str(&messages[0])
                } else {
                    write!(f, "[{}]", messages.join(", "))
                }
            }
        }
    }
}

impl Error for Aggregate {}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Remove every error matched by any of `matchers`.
///
/// A plain error is tested directly. An aggregate is rebuilt from the
/// elements that survive, recursing into nested aggregates (which stay
/// nested). Matchers never see aggregates themselves.
pub fn filter_out(err: Option<BoxError>, matchers: &[Matcher<'_>]) -> Option<BoxError> {
    let err = err?;
    match err.downcast::<Aggregate>() {
        Ok(agg) => {
            let survivors = agg
                .errors
                .into_iter()
                .filter_map(|e| filter_out(Some(e), matchers));
            new_aggregate(survivors).map(|a| Box::new(a) as BoxError)
        }
        Err(err) => {
            if matchers.iter().any(|m| m(&*err)) {
                None
            } else {
                Some(err)
            }
        }
    }
}

/// Collapse arbitrarily nested aggregates into one level of leaf errors,
/// in discovery order.
pub fn flatten(agg: Option<Aggregate>) -> Option<Aggregate> {
    let agg = agg?;
    let mut leaves = Vec::with_capacity(agg.errors.len());
    collect_leaves(agg.errors, &mut leaves);
    new_aggregate(leaves)
}

fn collect_leaves(errors: Vec<BoxError>, out: &mut Vec<BoxError>) {
    for err in errors {
        match err.downcast::<Aggregate>() {
            Ok(nested) => collect_leaves(nested.errors, out),
            Err(leaf) => out.push(leaf),
        }
    }
}

/// Unwrap a single-element aggregate to its element. Anything else is
/// returned as-is.
pub fn reduce(err: Option<BoxError>) -> Option<BoxError> {
    let err = err?;
    match err.downcast::<Aggregate>() {
        Ok(mut agg) => match agg.errors.len() {
            0 => None,
            1 => agg.errors.pop(),
            _ => Some(agg as BoxError),
        },
        Err(err) => Some(err),
    }
}

/// One synthetic error per message, suffixed with `(repeated N times)` when
/// the count is above one.
pub fn create_aggregate_from_message_count_map(m: &MessageCountMap) -> Option<Aggregate> {
    new_aggregate(m.iter().map(|(msg, count)| {
        let rendered = if *count > 1 {
            format!("{msg} (repeated {count} times)")
        } else {
            msg.clone()
        };
        BoxError::from(rendered)
    }))
}

/// Count rendered messages of `errs`.
pub fn count_messages(errs: &[BoxError]) -> MessageCountMap {
    let mut counts = MessageCountMap::new();
    for err in errs {
        *counts.entry(err.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Run every task on its own thread and aggregate the failures.
///
/// Blocks until all tasks have reported. There is no cancellation: a failing
/// task does not stop the others. Errors appear in completion order. A task
/// that panics is reported as [`WorkerPanicked`].
pub fn aggregate_threads<I>(funcs: I) -> Option<Aggregate>
where
    I: IntoIterator<Item = Task>,
{
    let funcs: Vec<Task> = funcs.into_iter().collect();
    let expected = funcs.len();
    let (tx, rx) = mpsc::sync_channel::<Result<(), BoxError>>(expected);

    for f in funcs {
        let tx = tx.clone();
        thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f))
                .unwrap_or_else(|payload| Err(WorkerPanicked::from_payload(payload).into()));
            let _ = tx.send(result);
        });
    }
    drop(tx);

    new_aggregate(rx.iter().take(expected).filter_map(Result::err))
}
