use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Main schema of the FSA029-style fixture bundle; its import path is written for a
/// different directory layout
pub const FSA029_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="urn:fsa:fsa029"
           xmlns:ct="urn:fsa:common-types"
           targetNamespace="urn:fsa:fsa029"
           elementFormDefault="qualified">
    <xs:import namespace="urn:fsa:common-types"
               schemaLocation="../../CommonTypes/v14/CommonTypes-Schema.xsd"/>
    <xs:element name="FSA029-Data">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="FirmReference" type="ct:FirmReferenceType"/>
                <xs:element name="TotalCapital" type="ct:MonetaryType"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

/// Shared types; includes the version-specific types file via a relative folder path
pub const COMMON_TYPES_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:fsa:common-types">
    <xs:include schemaLocation="./v14/Monetary.xsd"/>
    <xs:simpleType name="FirmReferenceType">
        <xs:restriction base="xs:string">
            <xs:pattern value="[0-9]{6}"/>
        </xs:restriction>
    </xs:simpleType>
</xs:schema>"#;

pub const MONETARY_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:fsa:common-types">
    <xs:simpleType name="MonetaryType">
        <xs:restriction base="xs:decimal">
            <xs:fractionDigits value="2"/>
        </xs:restriction>
    </xs:simpleType>
</xs:schema>"#;

pub const VALID_SUBMISSION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FSA029-Data xmlns="urn:fsa:fsa029">
    <FirmReference>123456</FirmReference>
    <TotalCapital>1500000.00</TotalCapital>
</FSA029-Data>"#;

/// TotalCapital is not a decimal
pub const INVALID_SUBMISSION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FSA029-Data xmlns="urn:fsa:fsa029">
    <FirmReference>123456</FirmReference>
    <TotalCapital>one million</TotalCapital>
</FSA029-Data>"#;

/// A schema folder plus a scratch directory for submissions, both removed on drop
pub struct BundleFixture {
    pub schemas: TempDir,
    pub work: TempDir,
}

impl BundleFixture {
    /// Empty schema folder
    pub fn empty() -> Self {
        Self {
            schemas: TempDir::new().expect("Failed to create schema folder"),
            work: TempDir::new().expect("Failed to create work folder"),
        }
    }

    /// FSA029 main schema, CommonTypes and Monetary, all flat in one folder
    pub fn fsa029() -> Self {
        let fixture = Self::empty();
        fixture.write_schema("FSA029-Schema.xsd", FSA029_SCHEMA);
        fixture.write_schema("CommonTypes-Schema.xsd", COMMON_TYPES_SCHEMA);
        fixture.write_schema("Monetary.xsd", MONETARY_SCHEMA);
        fixture
    }

    pub fn folder(&self) -> &Path {
        self.schemas.path()
    }

    pub fn write_schema(&self, name: &str, content: &str) -> PathBuf {
        let path = self.schemas.path().join(name);
        fs::write(&path, content).expect("Failed to write schema");
        path
    }

    pub fn write_submission(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work.path().join(name);
        fs::write(&path, content).expect("Failed to write submission");
        path
    }

    /// Every file in the schema folder with its content, for before/after comparisons
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = fs::read_dir(self.folder())
            .expect("Failed to list schema folder")
            .map(|entry| entry.expect("Failed to read entry").path())
            .filter(|path| path.is_file())
            .map(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                let content = fs::read_to_string(&path).expect("Failed to read schema");
                (name, content)
            })
            .collect();
        files.sort();
        files
    }
}

/// Minimal schema importing or including each of `locations`
pub fn schema_referencing(locations: &[&str]) -> String {
    let mut schema =
        String::from(r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">"#);
    for location in locations {
        schema.push_str(&format!("\n    <xs:include schemaLocation=\"{}\"/>", location));
    }
    schema.push_str("\n</xs:schema>");
    schema
}

/// Number of entries directly inside `dir`
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).expect("Failed to list directory").count()
}
