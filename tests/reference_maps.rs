use anyhow::Result;
use csv_bind_rs::mapping::{ClassMap, Property, Reference};
use csv_bind_rs::reader::CsvReaderBuilder;
use csv_bind_rs::writer::CsvWriterBuilder;

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    street: String,
    city: String,
    state: String,
    zip: String,
    country: String,
}

fn address_map() -> Result<ClassMap<Address>> {
    let map = ClassMap::builder()
        .property(Property::new(
            "street",
            |a: &Address| a.street.clone(),
            |a: &mut Address, v| a.street = v,
        ))
        .property(Property::new(
            "city",
            |a: &Address| a.city.clone(),
            |a: &mut Address, v| a.city = v,
        ))
        .property(Property::new(
            "state",
            |a: &Address| a.state.clone(),
            |a: &mut Address, v| a.state = v,
        ))
        .property(Property::new(
            "zip",
            |a: &Address| a.zip.clone(),
            |a: &mut Address, v| a.zip = v,
        ))
        .property(Property::new(
            "country",
            |a: &Address| a.country.clone(),
            |a: &mut Address, v| a.country = v,
        ))
        .build()?;
    Ok(map)
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Customer {
    id: i64,
    address: Address,
}

fn customer_map() -> Result<ClassMap<Customer>> {
    let map = ClassMap::builder()
        .property(Property::new("id", |c: &Customer| c.id, |c: &mut Customer, v| c.id = v))
        .reference(Reference::new(
            "address",
            address_map()?,
            |c: &Customer| c.address.clone(),
            |c: &mut Customer, a| c.address = a,
        ))
        .build()?;
    Ok(map)
}

#[test]
fn a_nested_reference_claims_its_columns_from_the_same_row() -> Result<()> {
    let data = "id,street,city,state,zip,country\n\
                9,1 Main St,Boston,MA,02101,US\n";
    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .map(customer_map()?)
        .from_reader(data.as_bytes());

    let customer: Customer = reader.read()?.unwrap();
    assert_eq!(customer.id, 9);
    assert_eq!(customer.address.street, "1 Main St");
    assert_eq!(customer.address.city, "Boston");
    assert_eq!(customer.address.state, "MA");
    assert_eq!(customer.address.zip, "02101");
    assert_eq!(customer.address.country, "US");
    Ok(())
}

#[test]
fn flattening_splices_nested_fields_at_the_declared_position() -> Result<()> {
    let customer = Customer {
        id: 4,
        address: Address {
            street: "5 High St".to_owned(),
            city: "Concord".to_owned(),
            state: "NH".to_owned(),
            zip: "03301".to_owned(),
            country: "US".to_owned(),
        },
    };

    let mut writer = CsvWriterBuilder::new()
        .has_headers(true)
        .map(customer_map()?)
        .from_writer(vec![]);
    writer.write(&customer)?;

    let data = String::from_utf8(writer.into_inner()?).unwrap();
    assert_eq!(
        data,
        "id,street,city,state,zip,country\n4,5 High St,Concord,NH,03301,US\n"
    );
    Ok(())
}

#[test]
fn nested_reference_round_trips() -> Result<()> {
    let customer = Customer {
        id: 11,
        address: Address {
            street: "Quote \"Street\"".to_owned(),
            city: "a,b".to_owned(),
            state: "ZZ".to_owned(),
            zip: "00000".to_owned(),
            country: "XX".to_owned(),
        },
    };

    let mut writer = CsvWriterBuilder::new()
        .has_headers(true)
        .map(customer_map()?)
        .from_writer(vec![]);
    writer.write(&customer)?;
    let data = writer.into_inner()?;

    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .map(customer_map()?)
        .from_reader(data.as_slice());
    let read_back: Customer = reader.read()?.unwrap();
    assert_eq!(read_back, customer);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Phone {
    number: String,
    label: String,
}

fn phone_map() -> Result<ClassMap<Phone>> {
    let map = ClassMap::builder()
        .property(
            Property::new(
                "number",
                |p: &Phone| p.number.clone(),
                |p: &mut Phone, v| p.number = v,
            )
            .name("Phone"),
        )
        .property(
            Property::new(
                "label",
                |p: &Phone| p.label.clone(),
                |p: &mut Phone, v| p.label = v,
            )
            .name("Label"),
        )
        .build()?;
    Ok(map)
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Contact {
    name: String,
    phones: Vec<Phone>,
}

fn contact_map() -> Result<ClassMap<Contact>> {
    let map = ClassMap::builder()
        .property(Property::new(
            "name",
            |c: &Contact| c.name.clone(),
            |c: &mut Contact, v| c.name = v,
        ))
        .reference(Reference::collection(
            "phones",
            phone_map()?,
            |c: &Contact| c.phones.clone(),
            |c: &mut Contact, p| c.phones.push(p),
        ))
        .build()?;
    Ok(map)
}

#[test]
fn repeating_groups_populate_the_collection_until_one_is_absent() -> Result<()> {
    let data = "name,Phone1,Label1,Phone2,Label2,Phone3,Label3\n\
                Ada,555-0100,home,555-0101,work,555-0102,mobile\n";
    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .map(contact_map()?)
        .from_reader(data.as_bytes());

    let contact: Contact = reader.read()?.unwrap();
    assert_eq!(contact.name, "Ada");
    assert_eq!(contact.phones.len(), 3);
    assert_eq!(contact.phones[0].number, "555-0100");
    assert_eq!(contact.phones[2].label, "mobile");
    Ok(())
}

#[test]
fn a_group_cap_bounds_the_scan() -> Result<()> {
    let map = ClassMap::<Contact>::builder()
        .property(Property::new(
            "name",
            |c: &Contact| c.name.clone(),
            |c: &mut Contact, v| c.name = v,
        ))
        .reference(
            Reference::collection(
                "phones",
                phone_map()?,
                |c: &Contact| c.phones.clone(),
                |c: &mut Contact, p| c.phones.push(p),
            )
            .max_groups(2),
        )
        .build()?;

    let data = "name,Phone1,Label1,Phone2,Label2,Phone3,Label3\n\
                Ada,a,b,c,d,e,f\n";
    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .map(map)
        .from_reader(data.as_bytes());

    let contact: Contact = reader.read()?.unwrap();
    assert_eq!(contact.phones.len(), 2);
    Ok(())
}

#[test]
fn collection_headers_emit_the_configured_group_count() -> Result<()> {
    let map = ClassMap::<Contact>::builder()
        .property(Property::new(
            "name",
            |c: &Contact| c.name.clone(),
            |c: &mut Contact, v| c.name = v,
        ))
        .reference(
            Reference::collection(
                "phones",
                phone_map()?,
                |c: &Contact| c.phones.clone(),
                |c: &mut Contact, p| c.phones.push(p),
            )
            .max_groups(2),
        )
        .build()?;

    let mut writer = CsvWriterBuilder::new().map(map).from_writer(vec![]);
    writer.write_header::<Contact>()?;
    let data = String::from_utf8(writer.into_inner()?).unwrap();
    assert_eq!(data, "name,Phone1,Label1,Phone2,Label2\n");
    Ok(())
}

#[test]
fn collections_flatten_one_group_per_element() -> Result<()> {
    let contact = Contact {
        name: "Ada".to_owned(),
        phones: vec![
            Phone {
                number: "555-0100".to_owned(),
                label: "home".to_owned(),
            },
            Phone {
                number: "555-0101".to_owned(),
                label: "work".to_owned(),
            },
        ],
    };

    let mut writer = CsvWriterBuilder::new().map(contact_map()?).from_writer(vec![]);
    writer.write(&contact)?;
    let data = String::from_utf8(writer.into_inner()?).unwrap();
    assert_eq!(data, "Ada,555-0100,home,555-0101,work\n");
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Measure {
    value: i64,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Series {
    day: String,
    values: Vec<Measure>,
}

#[test]
fn index_bound_groups_advance_by_one_stride_per_group() -> Result<()> {
    let measure_map = ClassMap::<Measure>::builder()
        .property(
            Property::new("value", |m: &Measure| m.value, |m: &mut Measure, v| m.value = v)
                .index(1),
        )
        .build()?;

    let map = ClassMap::<Series>::builder()
        .property(
            Property::new("day", |s: &Series| s.day.clone(), |s: &mut Series, v| s.day = v)
                .index(0),
        )
        .reference(Reference::collection(
            "values",
            measure_map,
            |s: &Series| s.values.clone(),
            |s: &mut Series, m| s.values.push(m),
        ))
        .build()?;

    let mut reader = CsvReaderBuilder::new()
        .map(map)
        .from_reader("mon,4,8,15\n".as_bytes());
    let series: Series = reader.read()?.unwrap();
    assert_eq!(series.day, "mon");
    assert_eq!(
        series.values,
        vec![Measure { value: 4 }, Measure { value: 8 }, Measure { value: 15 }]
    );
    Ok(())
}
