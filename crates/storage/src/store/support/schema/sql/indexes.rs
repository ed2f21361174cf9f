#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_connections_tree ON connections(tree_id);
        CREATE INDEX IF NOT EXISTS idx_connections_user ON connections(user_id);
        CREATE INDEX IF NOT EXISTS idx_connections_timestamp ON connections(timestamp);
        CREATE INDEX IF NOT EXISTS idx_transactions_connection ON transactions(connection_id, id);
        CREATE INDEX IF NOT EXISTS idx_transactions_timestamp ON transactions(timestamp);
        CREATE INDEX IF NOT EXISTS idx_changes_connection ON changes(connection_id, id);
        CREATE INDEX IF NOT EXISTS idx_changes_timestamp ON changes(timestamp);
"#;
