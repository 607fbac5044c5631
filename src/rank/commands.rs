//! Spreadsheet commands and their emission.

use log::debug;

use serde::Serialize;
use serde_json::{json, Map, Value as JSValue};
use snafu::prelude::*;

use crate::rank::{RankResult, SerializingJsonSnafu};

/// The worksheet collecting one dated row per hotness run.
pub const AGGREGATE_WORKSHEET: &str = "Aggregate";

/// One instruction for the spreadsheet updater: an operation name and its
/// named arguments.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Command {
    pub command: String,
    pub args: Map<String, JSValue>,
}

impl Command {
    fn new(command: &str, args: JSValue) -> Command {
        let args = match args {
            JSValue::Object(m) => m,
            _ => Map::new(),
        };
        Command {
            command: command.to_string(),
            args,
        }
    }

    pub fn add_worksheet(title: &str) -> Command {
        Command::new("addWorksheet", json!({ "worksheetTitle": title }))
    }

    pub fn remove_worksheet(title: &str) -> Command {
        Command::new("removeWorksheet", json!({ "worksheetTitle": title }))
    }

    /// Writes a block of rows at `range`.
    pub fn update_data(title: &str, range: &str, data: Vec<Vec<String>>) -> Command {
        Command::new(
            "updateData",
            json!({
                "minCol": 1,
                "data": data,
                "range": range,
                "worksheetTitle": title,
            }),
        )
    }

    /// Appends rows after the last non-empty row of the worksheet.
    pub fn append_data(title: &str, data: Vec<Vec<String>>) -> Command {
        Command::new(
            "appendData",
            json!({
                "minCol": 1,
                "data": data,
                "worksheetTitle": title,
            }),
        )
    }

    pub fn get_data(title: &str, range: &str) -> Command {
        Command::new(
            "getData",
            json!({
                "minCol": 1,
                "range": range,
                "worksheetTitle": title,
            }),
        )
    }
}

/// A harmless read, for runs that have nothing to change. The consumer
/// rejects empty command lists.
pub fn placeholder() -> Command {
    Command::get_data(
        AGGREGATE_WORKSHEET,
        &format!("{}!AZ1", AGGREGATE_WORKSHEET),
    )
}

/// The five-column block starting at A1 that holds `rows` rows.
pub fn table_range(title: &str, rows: usize) -> String {
    format!("{}!A1:E{}", title, rows)
}

/// Frames the commands as a multi-line output variable:
///
/// ```text
/// data_array<<DELIMITER
/// [...]
/// DELIMITER
/// ```
pub fn render_output(commands: &[Command], delimiter: &str) -> RankResult<String> {
    let js = serde_json::to_string(commands).context(SerializingJsonSnafu {})?;
    debug!("render_output: {} commands", commands.len());
    Ok(format!("data_array<<{}\n{}\n{}\n", delimiter, js, delimiter))
}
