use e57_decoder::bitpack::pack;
use e57_decoder::paged_reader::logical_to_physical;
use e57_decoder::{
    Crc32, E57Reader, Error, ImageFormat, ReaderOptions, RecordDataType, RecordName,
    RecordValue,
};
use std::io::Cursor;

const XS: [f32; 3] = [0.5, -1.25, 2.0];
const YS: [f32; 3] = [10.0, 20.0, 30.0];
const ZS: [f32; 3] = [-3.0, 0.0, 3.0];
const INTENSITIES: [i64; 3] = [0, 512, 1023];
const IMAGE_DATA: &[u8] = b"JPEG-PAYLOAD";

/// Splits logical bytes into pages with CRC32C trailers.
fn paginate(logical: &[u8]) -> Vec<u8> {
    let crc = Crc32::new();
    let mut physical = Vec::new();
    for chunk in logical.chunks(1020) {
        let mut payload = chunk.to_vec();
        payload.resize(1020, 0);
        let checksum = crc.calculate(&payload);
        physical.extend_from_slice(&payload);
        physical.extend_from_slice(&checksum.to_be_bytes());
    }
    physical
}

fn data_packet(streams: &[Vec<u8>]) -> Vec<u8> {
    let payload: usize = streams.iter().map(|s| s.len()).sum();
    let mut length = 6 + streams.len() * 2 + payload;
    length += (4 - length % 4) % 4;
    let mut bytes = vec![1, 0];
    bytes.extend_from_slice(&((length - 1) as u16).to_le_bytes());
    bytes.extend_from_slice(&(streams.len() as u16).to_le_bytes());
    for s in streams {
        bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
    }
    for s in streams {
        bytes.extend_from_slice(s);
    }
    bytes.resize(length, 0);
    bytes
}

fn floats(values: &[f32]) -> Vec<u8> {
    let bits: Vec<u64> = values.iter().map(|v| v.to_bits() as u64).collect();
    pack(&bits, 32).unwrap()
}

/// Builds a complete E57 file with one point cloud of three points and one image.
/// The given XML is inserted into the point cloud structure.
fn build_file(pointcloud_xml: &str) -> Vec<u8> {
    let intensities: Vec<u64> = INTENSITIES.iter().map(|i| *i as u64).collect();
    let packet = data_packet(&[
        floats(&XS),
        floats(&YS),
        floats(&ZS),
        pack(&intensities, 10).unwrap(),
    ]);

    let mut logical = vec![0_u8; 48];

    let cv_offset = logical_to_physical(logical.len() as u64);
    let cv_length = 32 + packet.len() as u64;
    logical.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);
    logical.extend_from_slice(&cv_length.to_le_bytes());
    logical.extend_from_slice(&logical_to_physical(logical.len() as u64 + 16).to_le_bytes());
    logical.extend_from_slice(&0_u64.to_le_bytes());
    logical.extend_from_slice(&packet);

    let blob_offset = logical_to_physical(logical.len() as u64);
    logical.extend_from_slice(&[0; 8]);
    logical.extend_from_slice(&(16 + IMAGE_DATA.len() as u64).to_le_bytes());
    logical.extend_from_slice(IMAGE_DATA);

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<e57Root type="Structure" xmlns="http://www.astm.org/COMMIT/E57/2010-e57-v1.0" xmlns:ext="http://example.com/ext">
  <formatName type="String"><![CDATA[ASTM E57 3D Imaging Data File]]></formatName>
  <guid type="String"><![CDATA[{{root-guid}}]]></guid>
  <versionMajor type="Integer">1</versionMajor>
  <versionMinor type="Integer">0</versionMinor>
  <creationDateTime type="Structure">
    <dateTimeValue type="Float">1234.5</dateTimeValue>
    <isAtomicClockReferenced type="Integer">0</isAtomicClockReferenced>
  </creationDateTime>
  <data3D type="Vector" allowHeterogeneousChildren="1">
    <vectorChild type="Structure">
      <guid type="String"><![CDATA[{{pc-guid}}]]></guid>
      <name type="String"><![CDATA[scan]]></name>
      {pointcloud_xml}
      <pose type="Structure">
        <rotation type="Structure">
          <w type="Float">1</w>
          <x type="Float">0</x>
          <y type="Float">0</y>
          <z type="Float">0</z>
        </rotation>
        <translation type="Structure">
          <x type="Float">1</x>
          <y type="Float">2</y>
          <z type="Float">3</z>
        </translation>
      </pose>
      <points type="CompressedVector" fileOffset="{cv_offset}" recordCount="3">
        <prototype type="Structure">
          <cartesianX type="Float" precision="single"/>
          <cartesianY type="Float" precision="single"/>
          <cartesianZ type="Float" precision="single"/>
          <intensity type="Integer" minimum="0" maximum="1023"/>
        </prototype>
        <codecs type="Vector" allowHeterogeneousChildren="1"/>
      </points>
    </vectorChild>
  </data3D>
  <images2D type="Vector" allowHeterogeneousChildren="1">
    <vectorChild type="Structure">
      <guid type="String"><![CDATA[{{image-guid}}]]></guid>
      <associatedData3DGuid type="String"><![CDATA[{{pc-guid}}]]></associatedData3DGuid>
      <visualReferenceRepresentation type="Structure">
        <jpegImage type="Blob" fileOffset="{blob_offset}" length="{length}"/>
        <imageWidth type="Integer">4</imageWidth>
        <imageHeight type="Integer">3</imageHeight>
      </visualReferenceRepresentation>
    </vectorChild>
  </images2D>
</e57Root>
"#,
        length = IMAGE_DATA.len()
    );

    let xml_offset = logical_to_physical(logical.len() as u64);
    logical.extend_from_slice(xml.as_bytes());
    let pages = (logical.len() as u64).div_ceil(1020);

    let mut header = Vec::with_capacity(48);
    header.extend_from_slice(b"ASTM-E57");
    header.extend_from_slice(&1_u32.to_le_bytes());
    header.extend_from_slice(&0_u32.to_le_bytes());
    header.extend_from_slice(&(pages * 1024).to_le_bytes());
    header.extend_from_slice(&xml_offset.to_le_bytes());
    header.extend_from_slice(&(xml.len() as u64).to_le_bytes());
    header.extend_from_slice(&1024_u64.to_le_bytes());
    logical[..48].copy_from_slice(&header);

    paginate(&logical)
}

/// Applies a change to the logical bytes of page zero and fixes its checksum.
fn patch_first_page(file: &mut [u8], patch: impl FnOnce(&mut [u8])) {
    patch(&mut file[..1020]);
    let checksum = Crc32::new().calculate(&file[..1020]);
    file[1020..1024].copy_from_slice(&checksum.to_be_bytes());
}

#[test]
fn read_file_with_three_records() {
    let file = build_file("");
    let mut reader = E57Reader::new(Cursor::new(file.clone())).unwrap();

    let header = reader.header();
    assert_eq!(&header.signature, b"ASTM-E57");
    assert_eq!(header.page_size, 1024);
    assert_eq!(header.phys_length, file.len() as u64);
    assert_eq!(reader.xml().len() as u64, header.xml_length);

    let root = reader.root();
    assert_eq!(root.guid, "{root-guid}");
    assert_eq!(reader.format_name(), "ASTM E57 3D Imaging Data File");
    assert_eq!(root.creation.as_ref().unwrap().gps_time, 1234.5);
    assert_eq!(root.data3d.len(), 1);
    assert_eq!(root.data3d[0].records, 3);

    let extensions = reader.extensions();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].namespace, "ext");

    let pointclouds = reader.pointclouds();
    let pc = &pointclouds[0];
    assert_eq!(pc.guid, "{pc-guid}");
    assert_eq!(pc.name.as_deref(), Some("scan"));
    let translation = &pc.transform.as_ref().unwrap().translation;
    assert_eq!((translation.x, translation.y, translation.z), (1.0, 2.0, 3.0));
    let names: Vec<RecordName> = pc.prototype.iter().map(|r| r.name.clone()).collect();
    assert_eq!(
        names,
        [
            RecordName::CartesianX,
            RecordName::CartesianY,
            RecordName::CartesianZ,
            RecordName::Intensity
        ]
    );
    assert_eq!(
        pc.prototype[3].data_type,
        RecordDataType::Integer { min: 0, max: 1023 }
    );

    let fields = reader.read_fields(pc).unwrap();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0], XS.map(RecordValue::Single).to_vec());
    assert_eq!(fields[1], YS.map(RecordValue::Single).to_vec());
    assert_eq!(fields[2], ZS.map(RecordValue::Single).to_vec());
    assert_eq!(fields[3], INTENSITIES.map(RecordValue::Integer).to_vec());

    reader.verify_checksums().unwrap();
}

#[test]
fn read_image_blob() {
    let mut reader = E57Reader::new(Cursor::new(build_file(""))).unwrap();
    let images = reader.images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].pointcloud_guid.as_deref(), Some("{pc-guid}"));
    let visual = images[0].visual_reference.as_ref().unwrap();
    assert_eq!(visual.blob.format, ImageFormat::Jpeg);
    assert_eq!(visual.properties.width, 4);

    let mut data = Vec::new();
    let written = reader.blob(&visual.blob.data, &mut data).unwrap();
    assert_eq!(written, IMAGE_DATA.len() as u64);
    assert_eq!(data, IMAGE_DATA);
}

#[test]
fn xml_spanning_pages() {
    // A long description moves the end of the XML section into later pages
    let description = "x".repeat(3000);
    let file = build_file(&format!(
        "<description type=\"String\">{description}</description>"
    ));
    assert!(file.len() > 3 * 1024);
    let reader = E57Reader::new(Cursor::new(file.clone())).unwrap();
    let pointclouds = reader.pointclouds();
    let pc = &pointclouds[0];
    assert_eq!(pc.description.as_deref(), Some(description.as_str()));

    let raw = E57Reader::raw_xml(Cursor::new(file)).unwrap();
    assert_eq!(raw, reader.xml().as_bytes());
}

#[test]
fn validate_crc() {
    let file = build_file("");
    let pages = file.len() as u64 / 1024;
    assert_eq!(E57Reader::validate_crc(Cursor::new(file)).unwrap(), pages);
}

#[test]
fn detect_checksum_mismatch() {
    let mut file = build_file("");
    // Flip a bit in the zero padding of the last page, the content stays valid
    let last = file.len() - 5;
    file[last] ^= 0x01;
    let page_offset = (file.len() - 1024) as u64;

    let mut reader = E57Reader::new(Cursor::new(file.clone())).unwrap();
    match reader.verify_checksums() {
        Err(Error::ChecksumMismatch { offset, .. }) => assert_eq!(offset, page_offset),
        other => panic!("Unexpected result {other:?}"),
    }

    let options = ReaderOptions {
        verify_checksums: true,
        ..Default::default()
    };
    assert!(matches!(
        E57Reader::with_options(Cursor::new(file.clone()), options),
        Err(Error::ChecksumMismatch { .. })
    ));
    assert!(E57Reader::validate_crc(Cursor::new(file)).is_err());
}

#[test]
fn reject_bad_signature() {
    let mut file = build_file("");
    patch_first_page(&mut file, |page| page[0..8].copy_from_slice(b"ASTM-E58"));
    match E57Reader::new(Cursor::new(file)) {
        Err(Error::BadSignature { found }) => assert_eq!(&found, b"ASTM-E58"),
        other => panic!("Unexpected result {:?}", other.err()),
    }
}

#[test]
fn reject_unsupported_version() {
    let mut file = build_file("");
    patch_first_page(&mut file, |page| {
        page[8..12].copy_from_slice(&2_u32.to_le_bytes())
    });
    assert!(matches!(
        E57Reader::new(Cursor::new(file)),
        Err(Error::UnsupportedVersion { major: 2, minor: 0 })
    ));
}

#[test]
fn reject_unsupported_page_size() {
    let mut file = build_file("");
    patch_first_page(&mut file, |page| {
        page[40..48].copy_from_slice(&2048_u64.to_le_bytes())
    });
    assert!(matches!(
        E57Reader::new(Cursor::new(file)),
        Err(Error::UnsupportedPageSize { page_size: 2048 })
    ));
}

#[test]
fn reject_truncated_file() {
    let file = build_file(&format!(
        "<description type=\"String\">{}</description>",
        "y".repeat(2000)
    ));
    let truncated = file[..1024].to_vec();
    assert!(matches!(
        E57Reader::new(Cursor::new(truncated)),
        Err(Error::TruncatedStream { .. })
    ));
}

#[test]
fn reject_too_large_xml() {
    let options = ReaderOptions {
        max_xml_length: 100,
        ..Default::default()
    };
    assert!(matches!(
        E57Reader::with_options(Cursor::new(build_file("")), options),
        Err(Error::NotImplemented { .. })
    ));
}

#[test]
fn reject_humidity_above_hundred() {
    let file = build_file("<relativeHumidity type=\"Float\">150</relativeHumidity>");
    match E57Reader::new(Cursor::new(file)) {
        Err(Error::ConstraintViolation { field, actual, .. }) => {
            assert_eq!(field, "/data3D/0/relativeHumidity");
            assert_eq!(actual, "150");
        }
        other => panic!("Unexpected result {:?}", other.err()),
    }
}

#[test]
fn reject_temperature_below_absolute_zero() {
    let file = build_file("<temperature type=\"Float\">-300</temperature>");
    match E57Reader::new(Cursor::new(file)) {
        Err(Error::ConstraintViolation { field, actual, .. }) => {
            assert_eq!(field, "/data3D/0/temperature");
            assert_eq!(actual, "-300");
        }
        other => panic!("Unexpected result {:?}", other.err()),
    }

    let file = build_file("<temperature type=\"Float\">-273.15</temperature>");
    let reader = E57Reader::new(Cursor::new(file)).unwrap();
    assert_eq!(reader.pointclouds()[0].temperature, Some(-273.15));
}

#[test]
fn reject_non_positive_pressure() {
    let file = build_file("<atmosphericPressure type=\"Float\">0</atmosphericPressure>");
    match E57Reader::new(Cursor::new(file)) {
        Err(Error::ConstraintViolation { field, actual, .. }) => {
            assert_eq!(field, "/data3D/0/atmosphericPressure");
            assert_eq!(actual, "0");
        }
        other => panic!("Unexpected result {:?}", other.err()),
    }
}

#[test]
fn accept_environment_values() {
    let file = build_file(
        "<temperature type=\"Float\">-20.5</temperature>\
         <relativeHumidity type=\"Float\">55</relativeHumidity>\
         <atmosphericPressure type=\"Float\">101325</atmosphericPressure>",
    );
    let reader = E57Reader::new(Cursor::new(file)).unwrap();
    let pointclouds = reader.pointclouds();
    let pc = &pointclouds[0];
    assert_eq!(pc.temperature, Some(-20.5));
    assert_eq!(pc.humidity, Some(55.0));
    assert_eq!(pc.atmospheric_pressure, Some(101325.0));
}

#[test]
fn reject_integer_maximum_below_minimum() {
    let file = build_file(
        "<ext:scanCount type=\"Integer\" minimum=\"10\" maximum=\"5\">7</ext:scanCount>",
    );
    match E57Reader::new(Cursor::new(file)) {
        Err(Error::ConstraintViolation { field, .. }) => {
            assert_eq!(field, "/data3D/0/ext:scanCount")
        }
        other => panic!("Unexpected result {:?}", other.err()),
    }
}

#[test]
fn reject_unknown_element_type() {
    let file = build_file("<sensorModel type=\"Text\">abc</sensorModel>");
    match E57Reader::new(Cursor::new(file)) {
        Err(Error::UnknownElementType { path, type_name }) => {
            assert_eq!(path, "/data3D/0/sensorModel");
            assert_eq!(type_name, "Text");
        }
        other => panic!("Unexpected result {:?}", other.err()),
    }
}
