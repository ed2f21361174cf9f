#![forbid(unsafe_code)]

mod changes;
mod core;
mod indexes;

pub(super) fn full_schema_sql() -> String {
    let mut sql = String::new();
    sql.push_str(core::SQL);
    sql.push_str(changes::SQL);
    sql.push_str(indexes::SQL);
    sql
}
