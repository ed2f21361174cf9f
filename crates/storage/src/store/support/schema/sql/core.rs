#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS connections (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          tree_id INTEGER,
          user_id TEXT,
          timestamp INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transactions (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          connection_id INTEGER NOT NULL REFERENCES connections(id),
          description TEXT NOT NULL,
          "first" INTEGER,
          "last" INTEGER,
          undo INTEGER NOT NULL DEFAULT 0,
          timestamp INTEGER NOT NULL
        );
"#;
