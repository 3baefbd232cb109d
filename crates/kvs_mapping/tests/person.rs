use kvs_mapping::{
    ClassMapping, CompositeMapping, KeyValueMap, KeyValueSerializer, Operation, SimpleMapping, property,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Date {
    year: u16,
    month: u8,
    day: u8,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    name: String,
    birthday: Date,
}

fn date_mapping() -> CompositeMapping<Date> {
    CompositeMapping::new()
        .component_with("Year", |d: &Date| d.year.to_string())
        .component_with("Month", |d: &Date| d.month.to_string())
        .component_with("Day", |d: &Date| d.day.to_string())
        .parser(|parts| {
            Some(Date {
                year: parts.parse("Year")?,
                month: parts.parse("Month")?,
                day: parts.parse("Day")?,
            })
        })
}

fn person_serializer() -> KeyValueSerializer<Person> {
    let person = ClassMapping::<Person>::new()
        .map(property!(Person, name => "Name"), SimpleMapping::parsed())
        .map(property!(Person, birthday => "Birthday"), date_mapping());
    KeyValueSerializer::new(person).expect("valid mapping")
}

fn data(pairs: &[(&str, &str)]) -> KeyValueMap {
    pairs.iter().copied().collect()
}

#[test]
fn deserializes_name_and_birthday() {
    let serializer = person_serializer();
    let input = data(&[
        ("Name", "Craig"),
        ("BirthdayYear", "1982"),
        ("BirthdayMonth", "4"),
        ("BirthdayDay", "6"),
    ]);

    let person = serializer.deserialize(&input).unwrap().unwrap();
    assert_eq!(person.name, "Craig");
    assert_eq!(person.birthday, Date { year: 1982, month: 4, day: 6 });
}

#[test]
fn round_trip() {
    let serializer = person_serializer();
    let person = Person {
        name: String::from("Craig"),
        birthday: Date { year: 1982, month: 4, day: 6 },
    };

    let output = serializer.serialize(&person).unwrap().unwrap();
    assert_eq!(
        output.to_sorted_vec(),
        [
            ("BirthdayDay", "6"),
            ("BirthdayMonth", "4"),
            ("BirthdayYear", "1982"),
            ("Name", "Craig"),
        ]
    );

    assert_eq!(serializer.deserialize(&output).unwrap(), Some(person));
}

#[test]
fn partial_composite_leaves_default() {
    let serializer = person_serializer();
    let input = data(&[("Name", "Craig"), ("BirthdayYear", "1982"), ("BirthdayDay", "6")]);

    let person = serializer.deserialize(&input).unwrap().unwrap();
    assert_eq!(person.name, "Craig");
    assert_eq!(person.birthday, Date::default());
}

#[test]
fn reads_and_writes_json_objects() {
    let serializer = person_serializer();

    let input: KeyValueMap = serde_json::from_str(
        r#"{ "Name": "Craig", "BirthdayYear": "1982", "BirthdayMonth": "4", "BirthdayDay": "6" }"#,
    )
    .unwrap();
    let person = serializer.deserialize(&input).unwrap().unwrap();
    assert_eq!(person.birthday.year, 1982);

    let output = serializer.serialize(&person).unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        serde_json::json!({
            "Name": "Craig",
            "BirthdayYear": "1982",
            "BirthdayMonth": "4",
            "BirthdayDay": "6",
        })
    );
}

#[test]
fn mandatory_missing_key_fails_deserialize() {
    let person = ClassMapping::<Person>::new()
        .map(property!(Person, name => "Name"), SimpleMapping::parsed().mandatory())
        .map(property!(Person, birthday => "Birthday"), date_mapping());
    let serializer = KeyValueSerializer::new(person).unwrap();

    let input = data(&[("BirthdayYear", "1982"), ("BirthdayMonth", "4"), ("BirthdayDay", "6")]);
    let error = serializer.deserialize(&input).unwrap_err();

    let mandatory = error.as_mandatory().unwrap();
    assert_eq!(mandatory.key(), "Name");
    assert_eq!(mandatory.operation(), Operation::Deserialize);
}

#[test]
fn mandatory_failing_renderer_fails_serialize() {
    let name = SimpleMapping::<String>::new()
        .parser(|s| Some(s.to_owned()))
        .renderer(|_| None)
        .mandatory();
    let person = ClassMapping::<Person>::new().map(property!(Person, name => "Name"), name);
    let serializer = KeyValueSerializer::new(person).unwrap();

    let error = serializer.serialize(&Person::default()).unwrap_err();
    assert_eq!(error.to_string(), "mandatory mapping for key `Name` failed to serialize");
    assert_eq!(error.as_mandatory().map(|e| e.operation()), Some(Operation::Serialize));
}

#[test]
fn optional_failing_renderer_omits_key() {
    let name = SimpleMapping::<String>::new()
        .parser(|s| Some(s.to_owned()))
        .renderer(|name| (!name.is_empty()).then(|| name.clone()));
    let person = ClassMapping::<Person>::new()
        .map(property!(Person, name => "Name"), name)
        .map(property!(Person, birthday => "Birthday"), date_mapping());
    let serializer = KeyValueSerializer::new(person).unwrap();

    let output = serializer.serialize(&Person::default()).unwrap().unwrap();
    assert!(!output.contains_key("Name"));
    assert_eq!(output.get("BirthdayYear"), Some("0"));
}
