use rusqlite::Connection;

use crate::error::PlazaResult;

/// Initialize the database schema. Creates all tables if they don't exist.
///
/// List-valued primary fields that commands mutate atomically live in
/// join tables (`course_members`, `course_member_roles`, `group_members`,
/// `tenant_members`). Derived set fields are canonical-JSON text columns
/// so conditional updates can compare them against a fresh computation.
pub fn initialize(conn: &Connection) -> PlazaResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL,
            privileges TEXT NOT NULL DEFAULT '[]',
            badges TEXT NOT NULL DEFAULT '[]',
            groups TEXT NOT NULL DEFAULT '[]',
            tenants TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tenant_members (
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            admin INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (tenant_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS regions (
            id TEXT PRIMARY KEY NOT NULL,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            name TEXT NOT NULL,
            course_count INTEGER NOT NULL DEFAULT 0,
            future_event_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS groups (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS group_members (
            group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (group_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            region_id TEXT NOT NULL REFERENCES regions(id),
            tenant_id TEXT REFERENCES tenants(id),
            roles TEXT NOT NULL DEFAULT '[]',
            group_organizers TEXT NOT NULL DEFAULT '[]',
            groups TEXT NOT NULL DEFAULT '[]',
            editors TEXT NOT NULL DEFAULT '[]',
            interested INTEGER NOT NULL DEFAULT 0,
            next_event TEXT,
            last_event TEXT,
            future_events INTEGER NOT NULL DEFAULT 0,
            created_by TEXT NOT NULL REFERENCES users(id),
            time_created TEXT NOT NULL,
            time_lastedit TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS course_members (
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            comment TEXT,
            PRIMARY KEY (course_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS course_member_roles (
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            PRIMARY KEY (course_id, user_id, role)
        );

        CREATE TABLE IF NOT EXISTS course_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            user_id TEXT NOT NULL,
            data TEXT,
            time TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            region_id TEXT NOT NULL REFERENCES regions(id),
            tenant_id TEXT REFERENCES tenants(id),
            course_id TEXT,
            created_by TEXT NOT NULL REFERENCES users(id),
            start_at TEXT NOT NULL,
            end_at TEXT NOT NULL,
            group_organizers TEXT NOT NULL DEFAULT '[]',
            groups TEXT NOT NULL DEFAULT '[]',
            course_groups TEXT NOT NULL DEFAULT '[]',
            all_groups TEXT NOT NULL DEFAULT '[]',
            editors TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS command_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            track TEXT NOT NULL,
            rel TEXT NOT NULL DEFAULT '[]',
            body TEXT NOT NULL,
            ts TEXT NOT NULL,
            result TEXT,
            detail TEXT,
            finished_at TEXT
        );

        CREATE TABLE IF NOT EXISTS outbox (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payload TEXT NOT NULL,
            enqueued_at TEXT NOT NULL,
            done INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS join_notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            comment TEXT,
            recorded_at TEXT NOT NULL
        );

        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

/// Create an in-memory connection for testing. Available in test builds.
pub fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}
