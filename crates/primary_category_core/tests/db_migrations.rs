use primary_category_core::db::migrations::latest_version;
use primary_category_core::db::{open_db, open_db_in_memory, DbError};
use primary_category_core::{ContentItem, ContentStore, SqliteContentStore};
use rusqlite::Connection;

const HOST_TABLES: [&str; 6] = [
    "content_items",
    "item_meta",
    "taxonomies",
    "term_assignments",
    "terms",
    "transients",
];

#[test]
fn fresh_database_gets_the_full_host_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    assert_eq!(table_names(&conn), HOST_TABLES);
}

#[test]
fn reopening_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.db");

    let item = ContentItem::new("event", "jazz-night");
    {
        let conn = open_db(&path).unwrap();
        SqliteContentStore::new(&conn).create_item(&item).unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    let stored = SqliteContentStore::new(&conn).get_item(item.id).unwrap();
    assert_eq!(stored, Some(item));
}

#[test]
fn older_database_is_upgraded_to_the_latest_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("DROP TABLE transients; PRAGMA user_version = 2;")
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    assert!(table_names(&conn).contains(&"transients".to_string()));
}

#[test]
fn database_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 40;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 40);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let untouched = Connection::open(&path).unwrap();
    assert_eq!(user_version(&untouched), 40);
    assert!(table_names(&untouched).is_empty());
}

#[test]
fn meta_rows_require_an_existing_item() {
    let conn = open_db_in_memory().unwrap();

    let orphan = conn.execute(
        "INSERT INTO item_meta (item_uuid, meta_key, meta_value) VALUES ('missing', 'k', 'v');",
        [],
    );
    assert!(orphan.is_err());
}

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name;",
        )
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}
