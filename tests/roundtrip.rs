//! Encode/decode integration tests.
//!
//! Builds complete messages through the public encoder API and reads them back through the
//! zero-copy views, checking both the decoded values and the exact wire layout.

use linearbuffers::prelude::*;

/// Field layout of the scalar test table: (field index, offset within the fixed area).
const INT8: (u64, u64) = (0, 0);
const INT16: (u64, u64) = (1, 1);
const INT32: (u64, u64) = (2, 3);
const INT64: (u64, u64) = (3, 7);
const UINT8: (u64, u64) = (4, 15);
const UINT16: (u64, u64) = (5, 16);
const UINT32: (u64, u64) = (6, 18);
const UINT64: (u64, u64) = (7, 22);
const FLOAT: (u64, u64) = (8, 30);
const DOUBLE: (u64, u64) = (9, 34);
const STRING: (u64, u64) = (10, 42);

const FIELDS: u64 = 11;

/// Fixed area size for the given offset width: ten scalars plus one reference.
fn area_size(offset_type: OffsetType) -> u64 {
    42 + offset_type.size() as u64
}

struct Scalars<'a> {
    int8: i8,
    int16: i16,
    int32: i32,
    int64: i64,
    uint8: u8,
    uint16: u16,
    uint32: u32,
    uint64: u64,
    float: f32,
    double: f64,
    string: &'a str,
}

fn encode_scalars(
    count_type: CountType,
    offset_type: OffsetType,
    values: &Scalars<'_>,
) -> Result<(Vec<u8>, Handle)> {
    let mut encoder = Encoder::new();
    encoder.table_start(count_type, offset_type, FIELDS, area_size(offset_type))?;
    encoder.table_set(INT8.0, INT8.1, values.int8)?;
    encoder.table_set(INT16.0, INT16.1, values.int16)?;
    encoder.table_set(INT32.0, INT32.1, values.int32)?;
    encoder.table_set(INT64.0, INT64.1, values.int64)?;
    encoder.table_set(UINT8.0, UINT8.1, values.uint8)?;
    encoder.table_set(UINT16.0, UINT16.1, values.uint16)?;
    encoder.table_set(UINT32.0, UINT32.1, values.uint32)?;
    encoder.table_set(UINT64.0, UINT64.1, values.uint64)?;
    encoder.table_set(FLOAT.0, FLOAT.1, values.float)?;
    encoder.table_set(DOUBLE.0, DOUBLE.1, values.double)?;
    encoder.table_create_string(STRING.0, STRING.1, values.string)?;
    let root = encoder.table_end()?;

    Ok((encoder.linearized()?.to_vec(), root))
}

fn check_scalars(
    buffer: &[u8],
    root: Handle,
    count_type: CountType,
    offset_type: OffsetType,
    values: &Scalars<'_>,
) -> Result<()> {
    let table = TableView::new(buffer, root.offset, FIELDS, count_type, offset_type)?;
    assert_eq!(table.field::<i8>(INT8.0, INT8.1)?, Some(values.int8));
    assert_eq!(table.field::<i16>(INT16.0, INT16.1)?, Some(values.int16));
    assert_eq!(table.field::<i32>(INT32.0, INT32.1)?, Some(values.int32));
    assert_eq!(table.field::<i64>(INT64.0, INT64.1)?, Some(values.int64));
    assert_eq!(table.field::<u8>(UINT8.0, UINT8.1)?, Some(values.uint8));
    assert_eq!(table.field::<u16>(UINT16.0, UINT16.1)?, Some(values.uint16));
    assert_eq!(table.field::<u32>(UINT32.0, UINT32.1)?, Some(values.uint32));
    assert_eq!(table.field::<u64>(UINT64.0, UINT64.1)?, Some(values.uint64));
    assert_eq!(
        table.field::<f32>(FLOAT.0, FLOAT.1)?.map(f32::to_bits),
        Some(values.float.to_bits())
    );
    assert_eq!(
        table.field::<f64>(DOUBLE.0, DOUBLE.1)?.map(f64::to_bits),
        Some(values.double.to_bits())
    );
    assert_eq!(table.string(STRING.0, STRING.1)?, Some(values.string));
    Ok(())
}

#[test]
fn every_scalar_kind_with_default_widths() -> Result<()> {
    let values = Scalars {
        int8: 0,
        int16: 1,
        int32: 2,
        int64: 3,
        uint8: 4,
        uint16: 5,
        uint32: 6,
        uint64: 7,
        float: 0.8,
        double: 0.9,
        string: "1234567890",
    };

    let count_type = CountType::default();
    let offset_type = OffsetType::default();
    let (buffer, root) = encode_scalars(count_type, offset_type, &values)?;

    // header: 8-byte count, 2-byte bitmap; area: 42 + 8; string: 8-byte length + 10
    assert_eq!(root, Handle { offset: 0, size: 8 + 2 + 50 });
    assert_eq!(buffer.len(), 60 + 8 + 10);
    assert_eq!(&buffer[..8], &11u64.to_le_bytes());
    assert_eq!(&buffer[8..10], &[0xFF, 0x07]);
    assert_eq!(&buffer[10 + 42..10 + 50], &60u64.to_le_bytes());

    check_scalars(&buffer, root, count_type, offset_type, &values)
}

#[test]
fn scalar_limits_with_narrow_widths() -> Result<()> {
    for values in [
        Scalars {
            int8: i8::MIN,
            int16: i16::MIN,
            int32: i32::MIN,
            int64: i64::MIN,
            uint8: u8::MIN,
            uint16: u16::MIN,
            uint32: u32::MIN,
            uint64: u64::MIN,
            float: f32::MIN,
            double: f64::MIN,
            string: "",
        },
        Scalars {
            int8: i8::MAX,
            int16: i16::MAX,
            int32: i32::MAX,
            int64: i64::MAX,
            uint8: u8::MAX,
            uint16: u16::MAX,
            uint32: u32::MAX,
            uint64: u64::MAX,
            float: f32::MAX,
            double: f64::MAX,
            string: "1234567890",
        },
        Scalars {
            int8: -1,
            int16: -1,
            int32: -1,
            int64: -1,
            uint8: 1,
            uint16: 1,
            uint32: 1,
            uint64: 1,
            float: -1.0,
            double: -1.0,
            string: "-",
        },
    ] {
        let (buffer, root) = encode_scalars(CountType::Uint8, OffsetType::Uint8, &values)?;
        assert_eq!(root.size, 1 + 2 + 43);
        check_scalars(&buffer, root, CountType::Uint8, OffsetType::Uint8, &values)?;
    }
    Ok(())
}

#[test]
fn unset_fields_read_as_absent_and_zero() -> Result<()> {
    let mut encoder = Encoder::new();
    encoder.table_start(CountType::Uint16, OffsetType::Uint32, 4, 16)?;
    encoder.table_set::<u32>(1, 4, 0xDEAD_BEEF)?;
    encoder.table_end()?;

    let buffer = encoder.linearized()?;
    let table = TableView::new(buffer, 0, 4, CountType::Uint16, OffsetType::Uint32)?;

    assert_eq!(table.field::<u32>(0, 0)?, None);
    assert_eq!(table.get::<u32>(0)?, 0);
    assert_eq!(table.field::<u32>(1, 4)?, Some(0xDEAD_BEEF));
    assert_eq!(table.string(2, 8)?, None);
    assert!(table.vector(3, 12, ElementKind::Uint8)?.is_none());
    Ok(())
}

#[test]
fn presence_bitmap_matches_written_fields() -> Result<()> {
    const WIDE: u64 = 19;

    let written = [0u64, 3, 7, 8, 15, 18];
    let mut encoder = Encoder::new();
    encoder.table_start(CountType::Uint8, OffsetType::Uint8, WIDE, WIDE)?;
    for &field in &written {
        encoder.table_set::<u8>(field, field, field as u8 + 1)?;
    }
    // rewriting a field keeps its bit set
    encoder.table_set::<u8>(3, 3, 40)?;
    encoder.table_end()?;

    let buffer = encoder.linearized()?;
    // 1-byte count, ceil(19 / 8) = 3 bitmap bytes
    assert_eq!(&buffer[..4], &[19, 0b1000_1001, 0b1000_0001, 0b0000_0100]);

    let table = TableView::new(buffer, 0, WIDE, CountType::Uint8, OffsetType::Uint8)?;
    for field in 0..WIDE {
        assert_eq!(table.is_present(field), written.contains(&field), "field {field}");
    }
    assert_eq!(
        table.present_fields()?.iter().collect::<Vec<_>>(),
        vec![0, 3, 7, 8, 15, 18]
    );
    assert_eq!(table.field::<u8>(3, 3)?, Some(40));
    Ok(())
}

#[test]
fn scalar_vectors() -> Result<()> {
    let mut encoder = Encoder::new();
    let bytes = encoder.vector_create::<i8>(CountType::Uint8, OffsetType::Uint8, &[-1, 0, 1])?;
    let longs =
        encoder.vector_create::<u64>(CountType::Uint32, OffsetType::Uint8, &[u64::MAX, 0, 42])?;
    let doubles = encoder.vector_create::<f64>(CountType::Uint16, OffsetType::Uint8, &[])?;

    assert_eq!(bytes, Handle { offset: 0, size: 4 });
    assert_eq!(longs, Handle { offset: 4, size: 4 + 24 });
    assert_eq!(doubles, Handle { offset: 32, size: 2 });

    let buffer = encoder.linearized()?;
    let view = VectorView::new(
        buffer,
        bytes.offset,
        ElementKind::Int8,
        CountType::Uint8,
        OffsetType::Uint8,
    )?;
    assert_eq!(view.iter::<i8>().collect::<Result<Vec<_>>>()?, vec![-1, 0, 1]);

    let view = VectorView::new(
        buffer,
        longs.offset,
        ElementKind::Uint64,
        CountType::Uint32,
        OffsetType::Uint8,
    )?;
    assert_eq!(
        view.iter::<u64>().collect::<Result<Vec<_>>>()?,
        vec![u64::MAX, 0, 42]
    );

    let view = VectorView::new(
        buffer,
        doubles.offset,
        ElementKind::Double,
        CountType::Uint16,
        OffsetType::Uint8,
    )?;
    assert!(view.is_empty());
    Ok(())
}

#[test]
fn string_vectors_append_content_after_elements() -> Result<()> {
    let values = ["", "1234567890", "linear"];

    let mut encoder = Encoder::new();
    let handle = encoder.vector_create_string(CountType::Uint16, OffsetType::Uint16, &values)?;

    // count + 3 references
    assert_eq!(handle, Handle { offset: 0, size: 2 + 3 * 2 });
    assert_eq!(encoder.offset(), 8 + (2 + 0) + (2 + 10) + (2 + 6));

    let buffer = encoder.linearized()?;
    assert_eq!(&buffer[..8], &[3, 0, 8, 0, 10, 0, 22, 0]);

    let view = VectorView::new(
        buffer,
        0,
        ElementKind::String,
        CountType::Uint16,
        OffsetType::Uint16,
    )?;
    assert_eq!(view.strings().collect::<Result<Vec<_>>>()?, values);
    Ok(())
}

#[test]
fn standalone_strings() -> Result<()> {
    let mut encoder = Encoder::new();
    let empty = encoder.string_create(CountType::Uint8, "")?;
    let digits = encoder.string_create(CountType::Uint32, "1234567890")?;

    assert_eq!(empty, Handle { offset: 0, size: 1 });
    assert_eq!(digits, Handle { offset: 1, size: 14 });

    let buffer = encoder.linearized()?;
    assert_eq!(read_string(buffer, empty.offset, CountType::Uint8)?, "");
    assert_eq!(
        read_string(buffer, digits.offset, CountType::Uint32)?,
        "1234567890"
    );
    Ok(())
}

#[test]
fn nested_tables_and_vectors() -> Result<()> {
    const CT: CountType = CountType::Uint16;
    const OT: OffsetType = OffsetType::Uint32;

    // root { name: string @0, child: table @4, items: [table] @8, tags: [string] @12 }
    // child and items { value: u32 @0 }
    let mut encoder = Encoder::new();
    encoder.table_start(CT, OT, 4, 16)?;
    encoder.table_create_string(0, 0, "root")?;

    encoder.table_start(CT, OT, 1, 4)?;
    encoder.table_set::<u32>(0, 0, 100)?;
    let child = encoder.table_end()?;
    encoder.table_set_table(1, 4, child)?;

    let mut items = Vec::new();
    for value in 0..3u32 {
        encoder.table_start(CT, OT, 1, 4)?;
        encoder.table_set(0, 0, value * 10)?;
        items.push(encoder.table_end()?);
    }
    let items = encoder.vector_create_table(CT, OT, &items)?;
    encoder.table_set_vector(2, 8, items)?;

    encoder.vector_start(ElementKind::String, CT, OT)?;
    encoder.vector_push_string("a")?;
    encoder.vector_push_string("bc")?;
    let tags = encoder.vector_end(ElementKind::String)?;
    encoder.table_set_vector(3, 12, tags)?;

    let root = encoder.table_end()?;
    assert_eq!(encoder.depth(), 0);

    let buffer = encoder.linearized()?;
    let table = TableView::new(buffer, root.offset, 4, CT, OT)?;
    assert_eq!(table.string(0, 0)?, Some("root"));

    let child = table.table(1, 4, 1)?.ok_or(Error::OutOfBounds)?;
    assert_eq!(child.field::<u32>(0, 0)?, Some(100));

    let items = table.vector(2, 8, ElementKind::Table)?.ok_or(Error::OutOfBounds)?;
    assert_eq!(items.len(), 3);
    for index in 0..3 {
        let item = items.table(index, 1)?;
        assert_eq!(item.field::<u32>(0, 0)?, Some(index as u32 * 10));
    }

    let tags = table.vector(3, 12, ElementKind::String)?.ok_or(Error::OutOfBounds)?;
    assert_eq!(tags.strings().collect::<Result<Vec<_>>>()?, vec!["a", "bc"]);
    Ok(())
}

#[test]
fn vectors_of_vectors() -> Result<()> {
    let mut encoder = Encoder::new();
    let first = encoder.vector_create::<u16>(CountType::Uint8, OffsetType::Uint8, &[1, 2])?;
    let second = encoder.vector_create::<u16>(CountType::Uint8, OffsetType::Uint8, &[3])?;
    let outer =
        encoder.vector_create_vector(CountType::Uint8, OffsetType::Uint8, &[first, second])?;

    let buffer = encoder.linearized()?;
    assert_eq!(buffer, &[2, 1, 0, 2, 0, 1, 3, 0, 2, 0, 5][..]);

    let view = VectorView::new(
        buffer,
        outer.offset,
        ElementKind::Vector,
        CountType::Uint8,
        OffsetType::Uint8,
    )?;
    let inner = view.vector(0, ElementKind::Uint16)?;
    assert_eq!(inner.iter::<u16>().collect::<Result<Vec<_>>>()?, vec![1, 2]);
    let inner = view.vector(1, ElementKind::Uint16)?;
    assert_eq!(inner.iter::<u16>().collect::<Result<Vec<_>>>()?, vec![3]);
    Ok(())
}
