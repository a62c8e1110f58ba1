use crate::database::Ulid;

#[test]
fn test_ulid_string_roundtrip() {
    let id = Ulid::new();
    let parsed: Ulid = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn test_ulid_uuid_roundtrip() {
    let id = Ulid::new();
    let uuid: uuid::Uuid = id.into();
    assert_eq!(Ulid::from(uuid), id);
}

#[test]
fn test_ulid_serde_as_string() {
    let id = Ulid::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));

    let back: Ulid = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_nil_is_default() {
    assert_eq!(Ulid::default(), Ulid::nil());
}
