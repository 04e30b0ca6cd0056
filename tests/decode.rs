mod common;

use cassette::{
    DecodeOptions, Error, Strictness, decode_slice,
    wire::header::FileHeader,
};
use common::*;

fn decode(bytes: &[u8]) -> Result<cassette::ParsedFitData, Error> {
    decode_slice(bytes, &DecodeOptions::default())
}

#[test]
fn header_fields() {
    let bytes = [12, 1, 0, 0, 100, 0, 0, 0, b'.', b'F', b'I', b'T'];
    let header = FileHeader::decode(&bytes).unwrap();

    assert_eq!(header.header_size, 12);
    assert_eq!(header.protocol_version, 1);
    assert_eq!(header.profile_version, 0);
    assert_eq!(header.data_size, 100);
    assert_eq!(header.signature_str(), ".FIT");
    assert_eq!(header.crc, None);
}

#[test]
fn header_shorter_than_twelve_bytes_is_truncated() {
    let err = FileHeader::decode(&[12, 1, 0, 0, 100]).unwrap_err();
    assert!(matches!(err, Error::TruncatedBuffer { .. }));
    assert_eq!(err.reason(), "cannot parse file");
}

#[test]
fn header_size_below_twelve_is_rejected() {
    let bytes = [11, 1, 0, 0, 100, 0, 0, 0, b'.', b'F', b'I', b'T'];
    let err = FileHeader::decode(&bytes).unwrap_err();

    assert!(matches!(err, Error::UnknownHeaderLength(11)));
    assert_eq!(err.reason(), "not a valid FIT file");
}

#[test]
fn long_header_records_start_at_header_size() {
    let bytes = timestamp_power(FitBuilder::new().header_size(16), 0)
        .data(0, &ts_power(1000, 100))
        .build();

    let options = DecodeOptions::default().verify_crc(true);
    let parsed = decode_slice(&bytes, &options).unwrap();
    assert_eq!(parsed.header.header_size, 16);
    assert_eq!(parsed.header.records_start(), 16);
    assert_eq!(parsed.records[0].power, Some(100));
    assert_eq!(parsed.raw.messages[0].offset, 16 + 12);
}

#[test]
fn invalid_signature_is_rejected() {
    let mut bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .build();
    bytes[8] = b'X';

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidSignature(s) if &s == b"XFIT"));
    assert_eq!(err.reason(), "not a valid FIT file");
}

#[test]
fn definition_then_data() {
    let bytes = FitBuilder::new()
        .definition(0, 20, &[(7, 2, UINT16)])
        .data(0, &[0x64, 0x00])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].power, Some(100));
    assert_eq!(parsed.records[0].timestamp, None);
}

#[test]
fn short_header_documents_decode() {
    let bytes = FitBuilder::new()
        .short_header()
        .definition(0, 20, &[(7, 2, UINT16)])
        .data(0, &[0x64, 0x00])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.header.header_size, 12);
    assert_eq!(parsed.records[0].power, Some(100));
}

#[test]
fn big_endian_definition() {
    let bytes = FitBuilder::new()
        .definition_be(0, 20, &[(253, 4, UINT32), (7, 2, UINT16)])
        .data(0, &[0x00, 0x00, 0x03, 0xE8, 0x00, 0x64])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records[0].power, Some(100));
    assert_eq!(parsed.records[0].timestamp, Some(fit_ms(1000)));
}

#[test]
fn sentinel_power_is_absent() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 0xFFFF))
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].power, None);
    assert_eq!(parsed.summary.power, None);
}

#[test]
fn compressed_timestamp_wraps_forward() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .definition(1, 20, &[(7, 2, UINT16)])
        .data(0, &ts_power(1000, 200))
        .compressed(1, 5, &210u16.to_le_bytes())
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[1].timestamp, Some(fit_ms(1029)));
    assert_eq!(parsed.records[1].power, Some(210));
    assert_eq!(parsed.raw.messages[1].timestamp, Some(1029));
    assert_eq!(parsed.raw.messages[1].time_offset, Some(5));
}

#[test]
fn compressed_timestamp_does_not_move_base() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .definition(1, 20, &[(7, 2, UINT16)])
        .data(0, &ts_power(1000, 200))
        .compressed(1, 12, &201u16.to_le_bytes())
        .compressed(1, 10, &202u16.to_le_bytes())
        .build();

    let parsed = decode(&bytes).unwrap();
    let timestamps: Vec<_> = parsed.records.iter().map(|r| r.timestamp).collect();
    assert_eq!(
        timestamps,
        [Some(fit_ms(1000)), Some(fit_ms(1004)), Some(fit_ms(1002))]
    );
}

#[test]
fn compressed_timestamp_without_base_is_dropped() {
    let bytes = FitBuilder::new()
        .definition(1, 20, &[(7, 2, UINT16)])
        .compressed(1, 3, &150u16.to_le_bytes())
        .definition(0, 20, &[(253, 4, UINT32), (7, 2, UINT16)])
        .data(0, &ts_power(1000, 200))
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].power, Some(200));
    assert_eq!(parsed.diagnostics.dropped_messages, 1);
}

#[test]
fn redefinition_uses_new_layout() {
    let bytes = FitBuilder::new()
        .definition(0, 20, &[(7, 2, UINT16)])
        .data(0, &[100, 0])
        .definition(0, 20, &[(4, 1, UINT8), (7, 2, UINT16)])
        .data(0, &[150, 200, 0])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[0].power, Some(100));
    assert_eq!(parsed.records[0].heart_rate, None);
    assert_eq!(parsed.records[1].heart_rate, Some(150));
    assert_eq!(parsed.records[1].power, Some(200));
}

#[test]
fn stray_bytes_are_skipped() {
    let bytes = FitBuilder::new()
        .definition(0, 20, &[(7, 2, UINT16)])
        .raw(&[0x0F])
        .data(0, &[0x64, 0x00])
        .raw(&[0x0E])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].power, Some(100));
    assert_eq!(parsed.diagnostics.skipped_bytes, 2);
}

#[test]
fn undefined_compressed_header_is_skipped() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .compressed(1, 3, &[])
        .data(0, &ts_power(1001, 110))
        .build();

    let parsed = decode(&bytes).unwrap();
    let power: Vec<_> = parsed.records.iter().map(|r| r.power).collect();
    assert_eq!(power, [Some(100), Some(110)]);
    assert_eq!(parsed.diagnostics.skipped_bytes, 1);
    assert_eq!(parsed.diagnostics.dropped_messages, 0);
}

#[test]
fn strict_mode_aborts_on_stray_byte() {
    let bytes = FitBuilder::new()
        .definition(0, 20, &[(7, 2, UINT16)])
        .raw(&[0x0F])
        .data(0, &[0x64, 0x00])
        .build();

    let options = DecodeOptions::default().strictness(Strictness::Abort);
    let err = decode_slice(&bytes, &options).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownLocalType {
            local: 15,
            offset: 23
        }
    ));
}

#[test]
fn truncated_message_aborts() {
    let mut bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .build();
    bytes.truncate(bytes.len() - 3);

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::TruncatedBuffer { .. }));
}

#[test]
fn developer_fields_are_skipped() {
    let bytes = FitBuilder::new()
        .definition_dev(0, 20, &[(7, 2, UINT16)], &[(0, 3, 0)])
        .data(0, &[0x64, 0x00, 0xAA, 0xBB, 0xCC])
        .data(0, &[0x65, 0x00, 0xAA, 0xBB, 0xCC])
        .build();

    let parsed = decode(&bytes).unwrap();
    let power: Vec<_> = parsed.records.iter().map(|r| r.power).collect();
    assert_eq!(power, [Some(100), Some(101)]);
    assert_eq!(parsed.raw.messages[0].developer_fields.len(), 1);
}

#[test]
fn unsupported_base_type_is_consumed() {
    let bytes = FitBuilder::new()
        .definition(0, 20, &[(99, 2, 0x1F), (7, 2, UINT16)])
        .data(0, &[0x12, 0x34, 0x64, 0x00])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records[0].power, Some(100));
    assert_eq!(parsed.raw.messages[0].fields[0].value, None);
}

#[test]
fn duration_spans_timestamped_records() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(100, 200))
        .data(0, &ts_power(130, 210))
        .data(0, &ts_power(160, 220))
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.duration, 60.0);
    let elapsed: Vec<_> = parsed.records.iter().map(|r| r.elapsed_time).collect();
    assert_eq!(elapsed, [Some(0.0), Some(30.0), Some(60.0)]);

    let points = parsed.chart_points();
    assert_eq!(points[2].time, 1.0);
    assert_eq!(points[2].power, Some(220));
}

#[test]
fn duration_falls_back_to_session() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .definition(1, 18, &[(5, 1, ENUM), (7, 4, UINT32), (34, 2, UINT16)])
        .data(0, &ts_power(100, 200))
        .data(1, &[2, 0x80, 0xEE, 0x36, 0x00, 0xF5, 0x00])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.duration, 3600.0);

    let session = &parsed.sessions[0];
    assert_eq!(session.sport.as_deref(), Some("cycling"));
    assert_eq!(session.total_elapsed_time, Some(3600.0));
    assert_eq!(session.normalized_power, Some(245));
}

#[test]
fn laps_and_device_info() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .definition(1, 19, &[(2, 4, UINT32), (19, 2, UINT16), (20, 2, UINT16), (15, 1, UINT8)])
        .definition(2, 23, &[(2, 2, UINT16), (4, 2, UINT16), (3, 4, 0x8C)])
        .data(0, &ts_power(100, 200))
        .data(1, &[100, 0, 0, 0, 180, 0, 250, 0, 140])
        .data(1, &[200, 0, 0, 0, 190, 0, 0xFF, 0xFF, 150])
        .data(2, &[1, 0, 0x10, 0x0E, 0, 0, 0, 0])
        .data(2, &[32, 0, 0x39, 0x30, 0, 0, 0, 0])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.laps.len(), 2);
    assert_eq!(parsed.laps[0].start_time, Some(fit_ms(100)));
    assert_eq!(parsed.laps[0].avg_power, Some(180));
    assert_eq!(parsed.laps[0].max_power, Some(250));
    assert_eq!(parsed.laps[1].max_power, None);
    assert_eq!(parsed.laps[1].avg_heart_rate, Some(150));
    assert_eq!(parsed.summary.lap_count, 2);

    // Last device info wins; a zero `uint32z` serial number is invalid.
    let device = parsed.device_info.unwrap();
    assert_eq!(device.manufacturer, Some(32));
    assert_eq!(device.manufacturer_name(), Some("wahoo_fitness"));
    assert_eq!(device.product, Some(0x3039));
    assert_eq!(device.serial_number, None);
}

#[test]
fn record_fields_are_converted() {
    let bytes = FitBuilder::new()
        .definition(
            0,
            20,
            &[
                (253, 4, UINT32),
                (0, 4, 0x85),
                (2, 2, UINT16),
                (4, 1, UINT8),
                (3, 1, UINT8),
                (5, 4, UINT32),
                (13, 1, SINT8),
                (73, 4, UINT32),
            ],
        )
        .data(0, &{
            let mut v = 1000u32.to_le_bytes().to_vec();
            v.extend((1i32 << 30).to_le_bytes());
            v.extend(3000u16.to_le_bytes());
            v.extend([150, 230]);
            v.extend(123_456u32.to_le_bytes());
            v.extend((-5i8).to_le_bytes());
            v.extend(10_000u32.to_le_bytes());
            v
        })
        .build();

    let parsed = decode(&bytes).unwrap();
    let r = &parsed.records[0];
    assert_eq!(r.position_lat, Some(90.0));
    assert_eq!(r.altitude, Some(100.0));
    assert_eq!(r.heart_rate, Some(150));
    // Cadence of 230 rpm is implausible.
    assert_eq!(r.cadence, None);
    assert_eq!(r.distance, Some(1234.56));
    assert_eq!(r.temperature, Some(-5));
    assert_eq!(r.speed, Some(36.0));
}

#[test]
fn cadence_and_heart_rate_fields() {
    let bytes = FitBuilder::new()
        .definition(0, 20, &[(253, 4, UINT32), (3, 1, UINT8), (4, 1, UINT8)])
        .data(0, &[0xE8, 0x03, 0, 0, 90, 150])
        .data(0, &[0xE9, 0x03, 0, 0, 95, 205])
        .build();

    let parsed = decode(&bytes).unwrap();
    assert_eq!(parsed.records[0].cadence, Some(90));
    assert_eq!(parsed.records[0].heart_rate, Some(150));
    // The cadence bound does not apply to heart rate.
    assert_eq!(parsed.records[1].heart_rate, Some(205));
}

#[test]
fn no_valid_records() {
    let bytes = FitBuilder::new()
        .definition(0, 0, &[(0, 1, ENUM), (1, 2, UINT16)])
        .data(0, &[4, 1, 0])
        .build();

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::NoValidRecords));
    assert_eq!(err.reason(), "no valid data found");
}

#[test]
fn only_stray_bytes_is_no_valid_records() {
    let bytes = FitBuilder::new().raw(&[0x01, 0x02, 0x03]).build();

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::NoValidRecords));
}

#[test]
fn crc_verification() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .build();
    let options = DecodeOptions::default().verify_crc(true);
    assert!(decode_slice(&bytes, &options).is_ok());

    let mut corrupt = bytes.clone();
    let n = corrupt.len();
    corrupt[n - 4] ^= 0x01;
    assert!(matches!(
        decode_slice(&corrupt, &options),
        Err(Error::CyclicRedundancyCheck { .. })
    ));
    // Without verification the corrupt power value decodes.
    assert_eq!(decode(&corrupt).unwrap().records[0].power, Some(101));
}

#[test]
fn raw_tree_can_be_dropped() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .build();

    let parsed = decode_slice(&bytes, &DecodeOptions::default().retain_raw(false)).unwrap();
    assert!(parsed.raw.messages.is_empty());
    assert_eq!(parsed.raw.header, parsed.header);
}

#[test]
fn decode_reader_matches_slice() {
    let bytes = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .data(0, &ts_power(1001, 110))
        .build();

    let mut reader = std::io::Cursor::new(bytes.clone());
    let from_reader = cassette::decode_reader(&mut reader, &DecodeOptions::default()).unwrap();
    assert_eq!(from_reader, decode(&bytes).unwrap());
}

#[test]
fn concurrent_decodes_are_independent() {
    let a = timestamp_power(FitBuilder::new(), 0)
        .data(0, &ts_power(1000, 100))
        .data(0, &ts_power(1010, 100))
        .build();
    let b = FitBuilder::new()
        .definition(0, 20, &[(253, 4, UINT32), (4, 1, UINT8)])
        .data(0, &[0xE8, 0x03, 0, 0, 120])
        .definition(1, 20, &[(4, 1, UINT8)])
        .compressed(1, 20, &[130])
        .build();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let bytes = if i % 2 == 0 { &a } else { &b };
                s.spawn(move || decode(bytes).unwrap())
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let parsed = handle.join().unwrap();
            if i % 2 == 0 {
                assert_eq!(parsed.duration, 10.0);
                assert_eq!(parsed.records[0].heart_rate, None);
            } else {
                assert_eq!(parsed.records[1].timestamp, Some(fit_ms(1012)));
                assert_eq!(parsed.records[1].heart_rate, Some(130));
            }
        }
    });
}
