//! Rows of the `Virtual Devices Status` listing printed by `vsx stat -v`:
//!
//! ```text
//!  ID  | Type & Name        | Access Control Policy | Installed at    | SIC Stat
//! -----+--------------------+-----------------------+-----------------+---------
//!    1 | S fw-a_VS_dmz      | DMZ_Policy            | 13Mar2024 10:14 | Trust
//! ```

use vsx_core::VsxError;

use crate::SourceLine;

const COLUMN_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableRow {
    pub(crate) vsid: u32,
    pub(crate) vs_type: String,
    pub(crate) name: String,
    pub(crate) policy: String,
    pub(crate) installed_time: String,
    pub(crate) sic_status: String,
}

pub(crate) fn parse_table_row(line: &SourceLine<'_>) -> Result<TableRow, VsxError> {
    let columns: Vec<&str> = line.text.split('|').map(str::trim).collect();
    let [id, type_and_name, policy, installed_time, sic_status] = columns.as_slice() else {
        return Err(line.malformed_row(format!(
            "expected {COLUMN_COUNT} `|`-separated columns, found {}",
            columns.len()
        )));
    };

    let vsid = id
        .parse::<u32>()
        .map_err(|_| line.malformed_row(format!("VSID `{id}` is not a non-negative integer")))?;

    let mut tokens = type_and_name.split_whitespace();
    let (Some(vs_type), Some(name), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(line.malformed_row(format!(
            "type and name column `{type_and_name}` must hold exactly two tokens"
        )));
    };

    Ok(TableRow {
        vsid,
        vs_type: vs_type.to_string(),
        name: name.to_string(),
        policy: (*policy).to_string(),
        installed_time: (*installed_time).to_string(),
        sic_status: (*sic_status).to_string(),
    })
}
