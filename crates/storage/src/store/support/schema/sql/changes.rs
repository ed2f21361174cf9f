#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS changes (
          id INTEGER NOT NULL,
          connection_id INTEGER NOT NULL REFERENCES connections(id),
          obj_class TEXT NOT NULL,
          trans_type INTEGER NOT NULL,
          obj_handle TEXT NOT NULL,
          ref_handle TEXT,
          old_payload BLOB,
          new_payload BLOB,
          timestamp INTEGER NOT NULL,
          PRIMARY KEY (id, connection_id)
        );
"#;
