use crate::element::{parse_document, Structure};
use crate::error::Converter;
use crate::field_reader;
use crate::paged_reader::{read_logical_bytes, verify_checksums, PAGE_SIZE};
use crate::{Blob, E57Root, Error, Extension, Header, Image, PointCloud, RecordValue, Result};
use roxmltree::Document;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Default limit for the logical length of the XML section.
pub const MAX_XML_SIZE: u64 = 1024 * 1024 * 50;

/// Options for opening E57 files.
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// CRC-validate all pages of the file before parsing anything else.
    pub verify_checksums: bool,
    /// XML sections with more logical bytes are rejected.
    pub max_xml_length: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            max_xml_length: MAX_XML_SIZE,
        }
    }
}

/// Main interface for reading E57 files.
pub struct E57Reader<T: Read + Seek> {
    reader: T,
    header: Header,
    xml: String,
    elements: Structure,
    root: E57Root,
    extensions: Vec<Extension>,
}

impl<T: Read + Seek> E57Reader<T> {
    /// Creates a new E57 instance from a reader with default options.
    pub fn new(reader: T) -> Result<Self> {
        Self::with_options(reader, ReaderOptions::default())
    }

    /// Creates a new E57 instance from a reader.
    pub fn with_options(mut reader: T, options: ReaderOptions) -> Result<Self> {
        // Read, parse and validate E57 header
        let header = Header::read(&mut reader)?;

        if options.verify_checksums {
            let length = stream_length(&mut reader)?;
            verify_checksums(&mut reader, length)?;
        }

        // Read and parse XML data
        let xml_raw = Self::extract_xml(&mut reader, &header, options.max_xml_length)?;
        let xml = String::from_utf8(xml_raw).invalid_err("Failed to parse XML as UTF8")?;
        let document = Document::parse(&xml).invalid_err("Failed to parse XML data")?;
        let (elements, extensions) = parse_document(&document, &mut reader)?;
        let root = E57Root::from_element(&elements, &extensions)?;

        tracing::debug!(
            xml_length = header.xml_length,
            pointclouds = root.data3d.len(),
            images = root.images2d.len(),
            "Opened E57 file"
        );

        Ok(Self {
            reader,
            header,
            xml,
            elements,
            root,
            extensions,
        })
    }

    /// Returns the contents of E57 binary file header structure.
    pub fn header(&self) -> Header {
        self.header.clone()
    }

    /// Returns the XML section of the E57 file.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Returns the typed root of the XML section.
    pub fn root(&self) -> &E57Root {
        &self.root
    }

    /// Returns the generic element tree of the XML section.
    ///
    /// This gives access to extension elements that have no typed representation.
    pub fn elements(&self) -> &Structure {
        &self.elements
    }

    /// Returns format name stored in the XML section.
    pub fn format_name(&self) -> &str {
        &self.root.format
    }

    /// Returns GUID stored in the XML section.
    pub fn guid(&self) -> &str {
        &self.root.guid
    }

    /// Returns a list of all extensions defined in this file.
    pub fn extensions(&self) -> Vec<Extension> {
        self.extensions.clone()
    }

    /// Returns a list of all point cloud descriptors in the file.
    pub fn pointclouds(&self) -> Vec<PointCloud> {
        self.root.data3d.clone()
    }

    /// Returns a list of all image descriptors in the file.
    pub fn images(&self) -> Vec<Image> {
        self.root.images2d.clone()
    }

    /// Reads the content of a blob and copies it into the supplied writer.
    /// Returns the number of written bytes.
    pub fn blob(&mut self, blob: &Blob, writer: &mut dyn Write) -> Result<u64> {
        blob.read(&mut self.reader, writer)
    }

    /// Decodes the raw values of all point attributes of a point cloud.
    ///
    /// Returns one vector per prototype field in prototype order.
    /// Scaled integers are not scaled, see [`RecordValue::to_f64`] for that.
    pub fn read_fields(&mut self, pc: &PointCloud) -> Result<Vec<Vec<RecordValue>>> {
        field_reader::read_fields(&mut self.reader, pc)
    }

    /// Checks the CRC checksums of all pages of the file.
    pub fn verify_checksums(&mut self) -> Result<()> {
        let length = stream_length(&mut self.reader)?;
        verify_checksums(&mut self.reader, length)
    }

    /// Iterate over an reader to check an E57 file for CRC errors.
    ///
    /// This standalone function does not read or check the XML data.
    /// Returns the number of validated pages.
    pub fn validate_crc(mut reader: T) -> Result<u64> {
        Header::read(&mut reader)?;
        let length = stream_length(&mut reader)?;
        verify_checksums(&mut reader, length)?;
        Ok(length / PAGE_SIZE)
    }

    /// Returns the raw unparsed binary XML data of the E57 file as bytes.
    ///
    /// This standalone function does only the minimal parsing required
    /// to get the XML section without any checksum or schema validation.
    pub fn raw_xml(mut reader: T) -> Result<Vec<u8>> {
        let header = Header::read(&mut reader)?;
        Self::extract_xml(&mut reader, &header, MAX_XML_SIZE)
    }

    fn extract_xml(reader: &mut T, header: &Header, max_length: u64) -> Result<Vec<u8>> {
        if header.xml_length > max_length {
            Error::not_implemented(format!(
                "XML sections larger than {max_length} bytes are not supported"
            ))?
        }
        let xml = read_logical_bytes(reader, header.phys_xml_offset, header.xml_length)?;
        tracing::debug!(
            offset = header.phys_xml_offset,
            length = xml.len(),
            "Read XML section"
        );
        Ok(xml)
    }
}

impl E57Reader<BufReader<File>> {
    /// Creates an E57 instance from a Path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path).read_err("Unable to open file")?;
        let reader = BufReader::new(file);
        Self::new(reader)
    }
}

fn stream_length<R: Seek>(reader: &mut R) -> Result<u64> {
    reader
        .seek(SeekFrom::End(0))
        .read_err("Cannot seek to end of E57 file")
}
