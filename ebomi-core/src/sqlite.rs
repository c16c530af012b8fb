use rusqlite::Connection;

/// Pragmas for the preference database. It holds a handful of rows written
/// every few seconds, so WAL with relaxed syncing is enough; a read-only
/// handle must not try to switch the journal mode.
pub(crate) fn configure_connection(conn: &Connection, read_only: bool) -> rusqlite::Result<()> {
    if !read_only {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;\n\
             PRAGMA synchronous = NORMAL;\n",
        )?;
    }
    conn.execute_batch(
        "PRAGMA temp_store = MEMORY;\n\
         PRAGMA busy_timeout = 5000;\n",
    )
}
