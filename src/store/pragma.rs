use rusqlite::Connection;

/// WAL journal with NORMAL sync; one writer, many page-sized transactions
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    log::debug!("SQLite journal_mode={}", mode);
    Ok(())
}
