//! Command payload creation.
//!
//! A payload creator turns the batch's logical command list into framed
//! protocol payloads. Exactly one creator is chosen per submission:
//!
//! - [`PayloadCreator::Batched`] when the server supports COM_MULTI;
//! - [`PayloadCreator::Single`] when every command is already prepared;
//! - [`PayloadCreator::Concatenated`] otherwise.
//!
//! All variants share one contract: `write_query` emits zero or more bytes
//! for the commands at the cursor and reports whether anything was written.

use mysql_protocol::multi::{begin_subcommand, finish_subcommand, SUBCOMMAND_HEADER_LEN};
use mysql_protocol::prepared::write_execute;
use mysql_protocol::query::write_query;
use mysql_protocol::{CommandKind, PayloadWriter};
use mysql_types::MySqlValue;

use crate::batch::{BatchCommand, BatchCommandKind};
use crate::error::{Error, Result};
use crate::session::ProcedureCache;
use crate::sql_text::{interpolate, literal};

/// Iteration state over a batch's command list.
///
/// `sub_position` addresses the per-statement handles of a prepared
/// multi-statement command; unprepared commands always emit in one step.
/// The high-level batch API manages the cursor itself; it is restartable
/// only for retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandCursor {
    /// Index of the current command in the batch.
    pub command_index: usize,
    /// Index of the next protocol command within the current command.
    pub sub_position: usize,
}

impl CommandCursor {
    /// A cursor positioned at the start of the batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Render the effective statement text of an unprepared command.
fn rendered_text(command: &BatchCommand, procedures: &ProcedureCache) -> Result<String> {
    match command.kind() {
        BatchCommandKind::Text => interpolate(command.text(), command.parameters()),
        BatchCommandKind::StoredProcedure => {
            let arguments: Vec<String> = command
                .parameters()
                .iter()
                .map(|p| literal(p.value()))
                .collect();
            match procedures.get(command.text()) {
                Some(Some(procedure)) => {
                    if procedure.parameters.len() != arguments.len() {
                        return Err(Error::InvalidOperation(format!(
                            "procedure {} expects {} arguments, {} supplied",
                            procedure.name,
                            procedure.parameters.len(),
                            arguments.len()
                        )));
                    }
                    Ok(procedure.call_text(&arguments))
                }
                // Tombstone or never looked up: call with the arguments as given.
                _ => Ok(format!("CALL {}({})", command.text(), arguments.join(","))),
            }
        }
    }
}

/// The three payload creation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadCreator {
    /// One protocol command per call: COM_QUERY for plain text or
    /// COM_STMT_EXECUTE for a prepared statement.
    Single,
    /// One COM_QUERY whose body is the semicolon-joined batch text.
    Concatenated,
    /// One COM_MULTI payload wrapping every command as a sub-command.
    Batched,
}

impl PayloadCreator {
    /// Choose the creator for a submission.
    #[must_use]
    pub fn select(supports_com_multi: bool, all_prepared: bool) -> Self {
        if supports_com_multi {
            Self::Batched
        } else if all_prepared {
            Self::Single
        } else {
            Self::Concatenated
        }
    }

    /// Emit payload bytes for the commands at `cursor`.
    ///
    /// Returns whether at least one command was written by this call. On
    /// error the cursor may be left mid-batch; the batch is considered
    /// failed and the cursor is not reused.
    pub fn write_query(
        &self,
        commands: &[BatchCommand],
        cursor: &mut CommandCursor,
        procedures: &ProcedureCache,
        writer: &mut PayloadWriter,
    ) -> Result<bool> {
        match self {
            Self::Single => write_single(commands, cursor, procedures, writer),
            Self::Concatenated => write_concatenated(commands, cursor, procedures, writer),
            Self::Batched => write_batched(commands, cursor, procedures, writer),
        }
    }
}

fn write_single(
    commands: &[BatchCommand],
    cursor: &mut CommandCursor,
    procedures: &ProcedureCache,
    writer: &mut PayloadWriter,
) -> Result<bool> {
    let Some(command) = commands.get(cursor.command_index) else {
        return Ok(false);
    };

    let Some(prepared) = command.prepared() else {
        let sql = rendered_text(command, procedures)?;
        write_query(writer, &sql)?;
        cursor.command_index += 1;
        cursor.sub_position = 0;
        return Ok(true);
    };

    if prepared.parameter_count() != command.parameters().len() {
        return Err(Error::InvalidOperation(format!(
            "command expects {} parameters, {} supplied",
            prepared.parameter_count(),
            command.parameters().len()
        )));
    }

    // Parameters are consumed across statements in declaration order.
    let offset: usize = prepared.statements[..cursor.sub_position]
        .iter()
        .map(|s| usize::from(s.parameter_count))
        .sum();
    let statement = &prepared.statements[cursor.sub_position];
    let values: Vec<MySqlValue> = command.parameters()
        [offset..offset + usize::from(statement.parameter_count)]
        .iter()
        .map(|p| p.value().clone())
        .collect();
    write_execute(writer, statement.statement_id, &values)?;

    cursor.sub_position += 1;
    if cursor.sub_position >= prepared.statements.len() {
        cursor.command_index += 1;
        cursor.sub_position = 0;
    }
    Ok(true)
}

fn write_concatenated(
    commands: &[BatchCommand],
    cursor: &mut CommandCursor,
    procedures: &ProcedureCache,
    writer: &mut PayloadWriter,
) -> Result<bool> {
    if cursor.command_index >= commands.len() {
        return Ok(false);
    }

    writer.put_u8(CommandKind::Query as u8)?;
    let mut first = true;
    for command in &commands[cursor.command_index..] {
        if !first {
            writer.write(b";")?;
        }
        first = false;
        let sql = rendered_text(command, procedures)?;
        writer.write(sql.as_bytes())?;
    }
    cursor.command_index = commands.len();
    cursor.sub_position = 0;
    Ok(true)
}

fn write_batched(
    commands: &[BatchCommand],
    cursor: &mut CommandCursor,
    procedures: &ProcedureCache,
    writer: &mut PayloadWriter,
) -> Result<bool> {
    writer.put_u8(CommandKind::Multi as u8)?;

    let mut first_result = None;
    loop {
        // Reserve room for the sub-command header, emit one command, then
        // patch the header with the measured inner length.
        let position = begin_subcommand(writer)?;
        let wrote = write_single(commands, cursor, procedures, writer)?;
        first_result.get_or_insert(wrote);
        finish_subcommand(writer, position);
        if !wrote {
            break;
        }
    }

    // Remove the header reserved for the command that wasn't there.
    writer.trim_end(SUBCOMMAND_HEADER_LEN);
    Ok(first_result.unwrap_or(false))
}
