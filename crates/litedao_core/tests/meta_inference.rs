use litedao_core::{Entity, FieldDef, MetaError, TableMeta};
use rusqlite::types::Value;
use rusqlite::Row;

macro_rules! stub_entity {
    ($name:ident, $type_name:expr, $table:expr, $fields:expr) => {
        struct $name;

        impl Entity for $name {
            type Key = i64;

            fn type_name() -> &'static str {
                $type_name
            }

            fn table_override() -> Option<&'static str> {
                $table
            }

            fn fields() -> &'static [FieldDef] {
                const FIELDS: &[FieldDef] = $fields;
                FIELDS
            }

            fn from_row(_row: &Row<'_>) -> Result<Self, rusqlite::Error> {
                unimplemented!("inference tests never touch rows")
            }

            fn insert_values(&self) -> Vec<(&'static str, Value)> {
                Vec::new()
            }

            fn set_generated_key(&mut self, _key: i64) {}

            fn key(&self) -> Option<i64> {
                None
            }
        }
    };
}

stub_entity!(
    UserAccount,
    "UserAccount",
    None,
    &[
        FieldDef::id("id"),
        FieldDef::new("user_name"),
        FieldDef::new("email"),
        FieldDef::transient("session_token"),
    ]
);

#[test]
fn table_name_is_derived_from_type_name() {
    let meta = TableMeta::infer::<UserAccount>().unwrap();
    assert_eq!(meta.table, "user_account");
    assert_eq!(meta.id_field, "id");
    assert_eq!(meta.id_column, "id");
}

#[test]
fn transient_fields_are_not_insertable() {
    let meta = TableMeta::infer::<UserAccount>().unwrap();
    let columns: Vec<&str> = meta
        .insert_columns
        .iter()
        .map(|c| c.column.as_str())
        .collect();
    assert_eq!(columns, vec!["user_name", "email"]);
}

stub_entity!(
    Renamed,
    "Renamed",
    Some("legacy_users"),
    &[FieldDef::id("userId").with_column("user_pk"), FieldDef::new("displayName")]
);

#[test]
fn overrides_win_over_convention() {
    let meta = TableMeta::infer::<Renamed>().unwrap();
    assert_eq!(meta.table, "legacy_users");
    assert_eq!(meta.id_field, "userId");
    assert_eq!(meta.id_column, "user_pk");
    assert_eq!(meta.insert_columns[0].column, "display_name");
}

stub_entity!(
    ConventionKey,
    "OrderLine",
    None,
    &[FieldDef::new("id"), FieldDef::new("quantity")]
);

#[test]
fn field_named_id_is_the_fallback_key() {
    let meta = TableMeta::infer::<ConventionKey>().unwrap();
    assert_eq!(meta.table, "order_line");
    assert_eq!(meta.id_field, "id");
    // The key is never part of the generated insert.
    assert_eq!(meta.insert_columns.len(), 1);
    assert_eq!(meta.insert_columns[0].column, "quantity");
}

stub_entity!(
    Keyless,
    "Keyless",
    None,
    &[FieldDef::new("name"), FieldDef::new("value")]
);

#[test]
fn missing_id_is_an_inference_error() {
    let err = TableMeta::infer::<Keyless>().unwrap_err();
    assert_eq!(err, MetaError::NoIdField { entity: "Keyless" });
}

stub_entity!(
    DoubleKey,
    "DoubleKey",
    None,
    &[FieldDef::id("a"), FieldDef::id("b")]
);

#[test]
fn duplicate_id_markers_are_rejected() {
    let err = TableMeta::infer::<DoubleKey>().unwrap_err();
    assert_eq!(err, MetaError::DuplicateIdField { entity: "DoubleKey" });
}

stub_entity!(
    Colliding,
    "Colliding",
    None,
    &[
        FieldDef::id("id"),
        FieldDef::new("userName"),
        FieldDef::new("user_name"),
    ]
);

#[test]
fn colliding_columns_are_rejected() {
    let err = TableMeta::infer::<Colliding>().unwrap_err();
    assert_eq!(
        err,
        MetaError::DuplicateColumn {
            entity: "Colliding",
            column: "user_name".to_string(),
        }
    );
}
