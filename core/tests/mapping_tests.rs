//! Integration tests for map building, fragments and conversion.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use tablemap_core::{
    CommandSink, Discriminant, Entity, FieldKind, FieldMapping, Map, MapEnum, MapError,
    MapperConfiguration, Member, MemoryRows, NameConvention, ParameterList, RowSource,
    StorageType, TypeDescriptor, Value, ValueError, ValueKind,
};
use uuid::Uuid;

/// Member names written the way a PascalCase schema names them.
#[derive(Debug, Default, PartialEq)]
struct TestUser {
    id: Uuid,
    email: String,
    created: NaiveDateTime,
    deleted: Option<NaiveDateTime>,
}

impl Entity for TestUser {
    fn describe() -> TypeDescriptor<Self> {
        TypeDescriptor::new("TestUser")
            .member(Member::new("Id", |u: &TestUser| &u.id, |u| &mut u.id))
            .member(Member::new("Email", |u: &TestUser| &u.email, |u| &mut u.email))
            .member(Member::new("Created", |u: &TestUser| &u.created, |u| &mut u.created))
            .member(Member::new("Deleted", |u: &TestUser| &u.deleted, |u| &mut u.deleted))
    }
}

fn user_configuration() -> MapperConfiguration {
    MapperConfiguration::new()
        .with_key_match(|name, ty| name == "Id" && ty.kind == ValueKind::Uuid)
        .with_calculated_match(|name, _| name == "Created" || name == "Deleted")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, MapEnum)]
enum Priority {
    #[default]
    Normal = 1,
    Urgent = 2,
}

#[derive(Debug, Default, PartialEq, Entity)]
#[map(table = "work_items")]
struct WorkItem {
    #[map(key)]
    id: i32,
    title: String,
    #[map(column = "estimate_minutes")]
    estimate: Option<i16>,
    priority: Priority,
    cost: Decimal,
    ratio: f64,
    done: bool,
    flags: u8,
    code: Vec<char>,
    payload: Vec<u8>,
    spent: TimeDelta,
    owner: Option<Uuid>,
    due: Option<NaiveDateTime>,
    #[map(skip)]
    scratch: std::collections::HashMap<String, String>,
    subtasks: Vec<WorkItem>,
}

#[test]
fn test_one_field_per_member_in_declaration_order() {
    let map = Map::<WorkItem>::build();
    let members: Vec<_> = map.fields().iter().map(|f| f.member()).collect();
    assert_eq!(
        members,
        [
            "id", "title", "estimate", "priority", "cost", "ratio", "done", "flags", "code",
            "payload", "spent", "owner", "due", "scratch", "subtasks",
        ]
    );

    let kinds: Vec<_> = map.fields().iter().map(|f| f.kind()).collect();
    assert_eq!(kinds[0], FieldKind::Key);
    assert!(kinds[1..13].iter().all(|k| *k == FieldKind::Map));
    assert_eq!(kinds[13], FieldKind::Ignore);
    assert_eq!(kinds[14], FieldKind::Ignore);
}

#[test]
fn test_storage_types_follow_the_type_table() {
    let map = Map::<WorkItem>::build();
    let storage = |member: &str| map.field(member).unwrap().storage_type();

    assert_eq!(storage("id"), StorageType::Int32);
    assert_eq!(storage("title"), StorageType::String);
    assert_eq!(storage("estimate"), StorageType::Int16);
    assert_eq!(storage("priority"), StorageType::Int32);
    assert_eq!(storage("cost"), StorageType::Decimal);
    assert_eq!(storage("ratio"), StorageType::Double);
    assert_eq!(storage("done"), StorageType::Boolean);
    assert_eq!(storage("flags"), StorageType::Byte);
    assert_eq!(storage("code"), StorageType::String);
    assert_eq!(storage("payload"), StorageType::Binary);
    assert_eq!(storage("spent"), StorageType::Time);
    assert_eq!(storage("owner"), StorageType::Guid);
    assert_eq!(storage("due"), StorageType::DateTime);
    assert_eq!(storage("scratch"), StorageType::Object);
    assert_eq!(storage("subtasks"), StorageType::Object);
}

#[test]
fn test_test_user_fragments() {
    let map = Map::<TestUser>::with_configuration(&user_configuration());

    assert_eq!(map.table_name(), "TestUser");
    assert_eq!(map.select_column_list(), "[Id], [Email], [Created], [Deleted]");
    assert_eq!(
        map.select_column_list_with_alias("u"),
        "u.[Id], u.[Email], u.[Created], u.[Deleted]"
    );
    assert_eq!(map.insert_column_list(), "[Email]");
    assert_eq!(map.insert_parameter_list(), "@Email");
    assert_eq!(map.update_set_clause(), "[Email] = @Email");
    assert_eq!(map.key_name().unwrap(), "Id");
    assert_eq!(map.key_where().unwrap(), "[Id] = @Id");

    assert_eq!(map.select_statement(), "SELECT [Id], [Email], [Created], [Deleted] FROM [TestUser]");
    assert_eq!(map.count_statement(), "SELECT COUNT(*) FROM [TestUser]");
    assert_eq!(
        map.insert_statement(),
        "INSERT INTO [TestUser] ([Email]) OUTPUT INSERTED.* VALUES (@Email)"
    );
    assert_eq!(
        map.update_statement().unwrap(),
        "UPDATE [TestUser] SET [Email] = @Email OUTPUT INSERTED.* WHERE [Id] = @Id"
    );
    assert_eq!(map.delete_statement().unwrap(), "DELETE FROM [TestUser] WHERE [Id] = @Id");
}

#[test]
fn test_fragments_are_cached() {
    let map = Map::<TestUser>::with_configuration(&user_configuration());
    let first = map.select_column_list();
    let second = map.select_column_list();
    assert!(std::ptr::eq(first, second));
    assert!(std::ptr::eq(map.update_set_clause(), map.update_set_clause()));
    assert!(std::ptr::eq(map.insert_statement(), map.insert_statement()));
}

#[test]
fn test_reconfiguration_invalidates_fragments() {
    let mut map = Map::<TestUser>::with_configuration(&user_configuration());
    assert_eq!(map.select_column_list(), "[Id], [Email], [Created], [Deleted]");
    assert_eq!(map.insert_statement(), "INSERT INTO [TestUser] ([Email]) OUTPUT INSERTED.* VALUES (@Email)");

    map.ignore(&["Deleted", "NoSuchMember"]);
    assert_eq!(map.select_column_list(), "[Id], [Email], [Created]");

    map.calculated(&["Email"]);
    assert_eq!(map.insert_column_list(), "");

    map.mapping(&[FieldMapping::new("Email", "EmailAddress", FieldKind::Map)]);
    assert_eq!(map.insert_statement(), "INSERT INTO [TestUser] ([EmailAddress]) OUTPUT INSERTED.* VALUES (@EmailAddress)");

    map.key(&["Email"]);
    assert!(matches!(map.key_name(), Err(MapError::CompositeKey { .. })));
    assert_eq!(map.key_where().unwrap(), "[Id] = @Id AND [EmailAddress] = @EmailAddress");
}

#[test]
fn test_naming_conventions_apply_to_tables_and_columns() {
    let config = user_configuration()
        .with_table_convention(NameConvention::SplitCaseLower)
        .with_column_convention(NameConvention::SplitCaseUpper);
    let map = Map::<TestUser>::with_configuration(&config);
    assert_eq!(map.table_name(), "test_user");
    assert_eq!(map.select_column_list(), "[ID], [EMAIL], [CREATED], [DELETED]");

    let config = MapperConfiguration::new().with_column_converter(|name| format!("col_{name}"));
    let map = Map::<WorkItem>::with_configuration(&config);
    assert_eq!(map.key_name().unwrap(), "col_id");
    // Declared columns beat converters.
    assert!(map.field_by_column("estimate_minutes").is_some());
}

#[test]
fn test_round_trip_through_parameters() {
    let map = Map::<WorkItem>::build();
    let item = WorkItem {
        id: 12,
        title: "Ship it".to_string(),
        estimate: Some(90),
        priority: Priority::Urgent,
        cost: Decimal::new(12_345, 2),
        ratio: 0.75,
        done: true,
        flags: 0b101,
        code: vec!['W', '1'],
        payload: vec![1, 2, 3],
        spent: TimeDelta::minutes(45),
        owner: Some(Uuid::new_v4()),
        due: Some(
            NaiveDate::from_ymd_opt(2024, 12, 24)
                .unwrap()
                .and_hms_opt(17, 0, 0)
                .unwrap(),
        ),
        ..WorkItem::default()
    };

    let mut params = ParameterList::new();
    map.bind_parameters(&item, &mut params, true);
    assert_eq!(params.len(), 13);
    assert_eq!(params.get("estimate_minutes").unwrap().value, Value::I16(90));
    assert_eq!(params.get("priority").unwrap().value, Value::I32(2));

    let mut rows = params.into_rows();
    assert!(rows.advance().unwrap());
    assert_eq!(map.create(&rows).unwrap(), item);
}

#[test]
fn test_tolerant_reads() {
    #[derive(Debug, Default, PartialEq, Entity)]
    struct Contact {
        #[map(key)]
        id: i64,
        email: String,
        extra: i32,
    }

    let map = Map::<Contact>::build();
    let rows = MemoryRows::new(["id", "email"])
        .with_row([Value::I64(1), Value::from("one@example.com")])
        .with_row([Value::I32(2), Value::Null]);

    let contacts = map.create_all(rows).unwrap();
    assert_eq!(
        contacts,
        [
            Contact {
                id: 1,
                email: "one@example.com".to_string(),
                extra: 0,
            },
            Contact {
                id: 2,
                email: String::new(),
                extra: 0,
            },
        ]
    );

    let mut reordered = MemoryRows::new(["unknown", "extra", "id"]).with_row([
        Value::from("ignored"),
        Value::from("7"),
        Value::U8(3),
    ]);
    assert!(reordered.advance().unwrap());
    let contact = map.create(&reordered).unwrap();
    assert_eq!((contact.id, contact.extra), (3, 7));
}

#[test]
fn test_absent_values_bind_as_null() {
    let map = Map::<WorkItem>::build();
    let mut params = ParameterList::new();
    map.bind_parameters(&WorkItem::default(), &mut params, false);

    for name in ["estimate_minutes", "owner", "due"] {
        let param = params.get(name).unwrap();
        assert_eq!(param.value, Value::Null, "{name}");
        assert_ne!(param.storage_type, StorageType::Object, "{name}");
    }
    assert!(params.get("id").is_none());
    assert!(params.get("scratch").is_none());
}

#[test]
fn test_ignored_members_can_be_mapped_again() {
    #[derive(Debug, Default, PartialEq, Entity)]
    struct Doc {
        #[map(key)]
        id: i64,
        #[map(ignore)]
        title: String,
    }

    let mut map = Map::<Doc>::build();
    assert_eq!(map.field("title").unwrap().kind(), FieldKind::Ignore);
    assert_eq!(map.insert_column_list(), "");

    map.mapping(&[FieldMapping::new("title", "title", FieldKind::Map)]);
    assert_eq!(map.insert_column_list(), "[title]");

    let doc = Doc {
        id: 1,
        title: "Draft".to_string(),
    };
    let mut params = ParameterList::new();
    map.bind_parameters(&doc, &mut params, true);
    assert_eq!(params.get("title").unwrap().value, Value::from("Draft"));

    let mut rows = params.into_rows();
    assert!(rows.advance().unwrap());
    assert_eq!(map.create(&rows).unwrap(), doc);
}

#[test]
fn test_unmappable_members_stay_ignored() {
    let mut map = Map::<WorkItem>::build();
    map.mapping(&[FieldMapping::new("scratch", "scratch", FieldKind::Map)])
        .key(&["subtasks"])
        .calculated(&["scratch"]);

    assert_eq!(map.field("scratch").unwrap().kind(), FieldKind::Ignore);
    assert_eq!(map.field("subtasks").unwrap().kind(), FieldKind::Ignore);
    assert!(!map.select_column_list().contains("[scratch]"));
    assert!(!map.key_where().unwrap().contains("subtasks"));

    let mut params = ParameterList::new();
    map.bind_parameters(&WorkItem::default(), &mut params, true);
    assert!(params.get("scratch").is_none());
    assert!(params.get("subtasks").is_none());

    let mut rows = MemoryRows::new(["id", "subtasks"]).with_row([Value::I32(5), Value::from("x")]);
    assert!(rows.advance().unwrap());
    let item = map.create(&rows).unwrap();
    assert_eq!(item.id, 5);
    assert!(item.subtasks.is_empty());
}

#[test]
fn test_undefined_enum_values_are_not_defaulted() {
    #[derive(Debug, Default, Entity)]
    struct Ticket {
        priority: Priority,
        raw_priority: Discriminant<Priority>,
        maybe_priority: Option<Priority>,
    }

    let map = Map::<Ticket>::build();
    let mut rows = MemoryRows::new(["raw_priority", "maybe_priority"])
        .with_row([Value::I32(9), Value::Null]);
    assert!(rows.advance().unwrap());
    let ticket = map.create(&rows).unwrap();
    assert_eq!(ticket.raw_priority, Discriminant::Undefined(9));
    assert_eq!(ticket.maybe_priority, None);

    let mut rows = MemoryRows::new(["priority"]).with_row([Value::I64(9)]);
    assert!(rows.advance().unwrap());
    match map.create(&rows) {
        Err(MapError::Value {
            member,
            source: ValueError::UndefinedDiscriminant { enum_name, value },
        }) => {
            assert_eq!(member, "priority");
            assert_eq!(enum_name, "Priority");
            assert_eq!(value, 9);
        }
        other => panic!("expected undefined discriminant, got {other:?}"),
    }

    let mut params = ParameterList::new();
    let ticket = Ticket {
        raw_priority: Discriminant::Undefined(9),
        ..Ticket::default()
    };
    map.bind_named_parameters(&ticket, &mut params, &["raw_priority"]);
    assert_eq!(params.get("raw_priority").unwrap().value, Value::I32(9));
}

#[test]
fn test_discriminants_outside_the_repr_are_rejected() {
    #[derive(Debug, Clone, Copy, Default, PartialEq, MapEnum)]
    #[repr(u8)]
    enum Shade {
        #[default]
        Light = 1,
        Dark = 2,
    }

    #[derive(Debug, Default, Entity)]
    struct Swatch {
        shade: Discriminant<Shade>,
    }

    let map = Map::<Swatch>::build();
    let mut rows = MemoryRows::new(["shade"]).with_row([Value::I64(200)]);
    assert!(rows.advance().unwrap());
    assert_eq!(map.create(&rows).unwrap().shade, Discriminant::Undefined(200));

    let mut rows = MemoryRows::new(["shade"]).with_row([Value::I64(300)]);
    assert!(rows.advance().unwrap());
    match map.create(&rows) {
        Err(MapError::Value {
            member,
            source: ValueError::OutOfRange { expected, value },
        }) => {
            assert_eq!(member, "shade");
            assert_eq!(expected, "Shade");
            assert_eq!(value, "300");
        }
        other => panic!("expected an out-of-range error, got {other:?}"),
    }
}

#[test]
fn test_sink_defaults() {
    let mut params = ParameterList::new();
    params.add_value("when", &None::<NaiveDateTime>);
    let param = params.get("when").unwrap();
    assert_eq!(param.storage_type, StorageType::DateTime);
    assert_eq!(param.value, Value::Null);
}

#[tokio::test]
async fn test_async_iteration_preserves_order() {
    let map = Map::<TestUser>::with_configuration(&user_configuration());
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let rows = ids.iter().fold(MemoryRows::new(["Id", "Email"]), |rows, id| {
        rows.with_row([Value::Uuid(*id), Value::from(format!("{id}@example.com"))])
    });

    let users = map.create_all_async(rows).await.unwrap();
    let read: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    assert_eq!(read, ids);
    assert!(users.iter().all(|u| u.deleted.is_none()));
}
