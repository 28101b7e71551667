//! Table readiness waiter

use crate::config::WaiterConfig;
use std::thread;
use tablecopy_core::{Error, Result, TableCatalog, TableDescription};
use tracing::debug;

/// Poll `describe` until `table` is ACTIVE
///
/// Makes at most `config.max_attempts` describe calls (at least one),
/// sleeping `config.delay()` between them.
///
/// # Errors
///
/// `Error::WaiterTimeout` when the table never turns ACTIVE; describe
/// failures are returned as-is.
pub fn wait_until_active<C: TableCatalog + ?Sized>(
    catalog: &C,
    table: &str,
    config: &WaiterConfig,
) -> Result<TableDescription> {
    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        let description = catalog.describe(table)?;
        if description.is_active() {
            debug!(table, attempt, "table active");
            return Ok(description);
        }
        debug!(table, attempt, status = ?description.table_status, "waiting for table");
        if attempt < attempts {
            thread::sleep(config.delay());
        }
    }
    Err(Error::WaiterTimeout {
        table: table.to_string(),
        attempts,
    })
}
