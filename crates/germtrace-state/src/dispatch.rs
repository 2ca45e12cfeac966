//! # Dispatch Boundary
//!
//! Routes a named operation with a flat, string-typed argument list to the
//! matching lifecycle function. This is the surface earlier ledger clients
//! called: the first argument is the record id (or the two range bounds),
//! and any remaining arguments are the stage payload in positional order.

use serde::Serialize;

use crate::error::LifecycleError;
use crate::ledger::Ledger;
use crate::lifecycle;
use crate::operation::Operation;
use crate::payload::field_count;
use crate::record::Record;

/// Successful result of a dispatched operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Response {
    /// The operation returns nothing (delete, purge).
    Unit,
    /// Answer to `exists`.
    Exists(bool),
    /// A single record snapshot.
    Record(Box<Record>),
    /// Range results or history, in order.
    Records(Vec<Record>),
}

/// Run `operation` against `ledger` with its positional arguments.
pub fn dispatch<L: Ledger + ?Sized>(
    ledger: &mut L,
    operation: Operation,
    args: &[String],
) -> Result<Response, LifecycleError> {
    macro_rules! with_payload {
        ($call:path) => {{
            let (id, payload) = split_id(operation, args)?;
            record($call(ledger, id, payload)?)
        }};
    }

    let response = match operation {
        Operation::Create => with_payload!(lifecycle::create),
        Operation::ModifyCreate => with_payload!(lifecycle::modify_create),
        Operation::Save => with_payload!(lifecycle::save),
        Operation::ModifySave => with_payload!(lifecycle::modify_save),
        Operation::Enter => with_payload!(lifecycle::enter),
        Operation::ModifyEnter => with_payload!(lifecycle::modify_enter),
        Operation::Share => with_payload!(lifecycle::share),
        Operation::ModifyShare => with_payload!(lifecycle::modify_share),
        Operation::RejectCreate => record(lifecycle::reject_create(ledger, only_id(operation, args)?)?),
        Operation::RejectSave => record(lifecycle::reject_save(ledger, only_id(operation, args)?)?),
        Operation::RejectEnter => record(lifecycle::reject_enter(ledger, only_id(operation, args)?)?),
        Operation::RejectShare => record(lifecycle::reject_share(ledger, only_id(operation, args)?)?),
        Operation::Commit => record(lifecycle::commit(ledger, only_id(operation, args)?)?),
        Operation::Delete => {
            lifecycle::delete(ledger, only_id(operation, args)?)?;
            Response::Unit
        }
        Operation::AdminPurge => {
            lifecycle::admin_purge(ledger, only_id(operation, args)?)?;
            Response::Unit
        }
        Operation::Exists => Response::Exists(lifecycle::exists(ledger, only_id(operation, args)?)?),
        Operation::Read => record(lifecycle::read(ledger, only_id(operation, args)?)?),
        Operation::ReadRange => {
            let [start, end] = args else {
                return Err(arity(operation, 2, args));
            };
            Response::Records(lifecycle::read_range(ledger, start, end)?)
        }
        Operation::ReadHistory => {
            let history = lifecycle::read_history(ledger, only_id(operation, args)?)?;
            Response::Records(history.collect::<Result<_, _>>()?)
        }
    };
    tracing::debug!(op = %operation, args = args.len(), "operation dispatched");
    Ok(response)
}

fn record(record: Record) -> Response {
    Response::Record(Box::new(record))
}

/// Split off the leading id. Payload arity is left to the payload binder so
/// its error names the stage.
fn split_id(operation: Operation, args: &[String]) -> Result<(&str, &[String]), LifecycleError> {
    match args.split_first() {
        Some((id, payload)) => Ok((id.as_str(), payload)),
        None => {
            let expected = 1 + operation.payload_stage().map_or(0, field_count);
            Err(arity(operation, expected, args))
        }
    }
}

fn only_id(operation: Operation, args: &[String]) -> Result<&str, LifecycleError> {
    match args {
        [id] => Ok(id.as_str()),
        _ => Err(arity(operation, 1, args)),
    }
}

fn arity(operation: Operation, expected: usize, args: &[String]) -> LifecycleError {
    LifecycleError::InvalidArgumentCount {
        target: operation.to_string(),
        expected,
        actual: args.len(),
    }
}
