//! LibXML2 FFI Wrapper Module
//!
//! This module provides a safe wrapper around the libxml2 calls used for XML Schema
//! compilation and instance validation. It is the only place in the crate that touches
//! the schema engine; everything upstream prepares input for it.
//!
//! The Rust ecosystem has no mature pure Rust XSD validator (roxmltree, quick-xml and
//! xml-rs parse but do not validate), so validation is delegated to libxml2 through
//! direct FFI, with RAII ownership of every libxml2 allocation.
//!
//! Schemas are compiled from a *file path* rather than from memory. libxml2 resolves
//! relative `xs:include`/`xs:import` locations against the URL of the including
//! document, so compiling the sandboxed main schema by path makes every rewritten
//! sibling reference resolve inside the sandbox.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::Once;

use libc::{c_char, c_int, c_uint, c_void};

use crate::error::{LibXml2Error, LibXml2Result};

/// Global initialization flag for libxml2
///
/// libxml2's initialization functions are NOT thread-safe, so they run exactly once.
static LIBXML2_INIT: Once = Once::new();

/// libxml2 error domain of the XML parser (`XML_FROM_PARSER`)
const XML_FROM_PARSER: c_int = 1;

/// libxml2 error domain of the schema parser (`XML_FROM_SCHEMASP`)
const XML_FROM_SCHEMASP: c_int = 16;

/// libxml2 error level for warnings (`XML_ERR_WARNING`)
const XML_ERR_WARNING: c_int = 1;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();
    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Schema parsing functions
    pub fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateFile(
        ctxt: *const XmlSchemaValidCtxt,
        file_name: *const c_char,
        options: c_uint,
    ) -> c_int;
}

/// One diagnostic reported by libxml2 through a structured error callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub domain: i32,
    pub level: i32,
    pub file: Option<String>,
    pub line: i32,
    pub message: String,
}

impl Diagnostic {
    fn is_warning(&self) -> bool {
        self.level == XML_ERR_WARNING
    }

    /// Parser and schema-parser diagnostics mean the schema text itself is at fault
    fn is_parse_error(&self) -> bool {
        !self.is_warning() && (self.domain == XML_FROM_PARSER || self.domain == XML_FROM_SCHEMASP)
    }

    /// The document is not well-formed XML
    fn is_well_formedness_error(&self) -> bool {
        !self.is_warning() && self.domain == XML_FROM_PARSER
    }

    fn render(&self) -> String {
        if self.line > 0 {
            format!("line {}: {}", self.line, self.message)
        } else {
            self.message.clone()
        }
    }

    /// Like `render`, prefixed with the reporting file when libxml2 names one
    fn render_located(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), line) if line > 0 => format!("{}:{}: {}", file, line, self.message),
            (Some(file), _) => format!("{}: {}", file, self.message),
            (None, _) => self.render(),
        }
    }
}

/// Callback for libxml2 to report parser and validation errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut xmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }

    let diagnostics = unsafe { &mut *(user_data as *mut Vec<Diagnostic>) };
    let error = unsafe { &*error };

    let message = if error.message.is_null() {
        String::from("unknown libxml2 error")
    } else {
        unsafe { CStr::from_ptr(error.message) }
            .to_string_lossy()
            .trim()
            .to_string()
    };

    let file = (!error.file.is_null())
        .then(|| unsafe { CStr::from_ptr(error.file) }.to_string_lossy().into_owned());

    diagnostics.push(Diagnostic {
        domain: error.domain,
        level: error.level,
        file,
        line: error.line,
        message,
    });
}

/// Routes libxml2's global structured error handler into a diagnostics sink until dropped
///
/// Parser errors for documents libxml2 opens by itself (included or imported schemas,
/// the submission read by `xmlSchemaValidateFile`) skip the context handlers and reach
/// the global handler, which otherwise prints them to stderr. The handler is
/// thread-local in libxml2, so the capture only affects the calling thread.
struct GlobalErrorCapture;

impl GlobalErrorCapture {
    /// # Safety
    ///
    /// `sink` must stay valid until the returned guard is dropped.
    unsafe fn install(sink: *mut Vec<Diagnostic>) -> Self {
        unsafe { xmlSetStructuredErrorFunc(sink as *mut c_void, Some(structured_error_callback)) };
        GlobalErrorCapture
    }
}

impl Drop for GlobalErrorCapture {
    fn drop(&mut self) {
        unsafe { xmlSetStructuredErrorFunc(ptr::null_mut(), None) };
    }
}

fn path_to_cstring(path: &Path) -> LibXml2Result<CString> {
    path.to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or_else(|| LibXml2Error::InvalidPath {
            path: path.to_path_buf(),
        })
}

/// Owner of a compiled libxml2 schema
///
/// The schema is freed exactly once when this value is dropped. A compiled schema does
/// not reference the files it was compiled from, so it stays usable after the sandbox
/// directory holding those files has been removed.
#[derive(Debug)]
pub struct XmlSchemaPtr {
    ptr: *mut XmlSchema,
}

// Safety: libxml2 documents xmlSchema structures as read-only after parsing.
unsafe impl Send for XmlSchemaPtr {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// The pointer must come from `xmlSchemaParse` and must not be freed elsewhere.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Option<Self> {
        if ptr.is_null() { None } else { Some(Self { ptr }) }
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.ptr
    }
}

impl Drop for XmlSchemaPtr {
    fn drop(&mut self) {
        unsafe {
            xmlSchemaFree(self.ptr);
        }
    }
}

/// Validation result from libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Validation succeeded (return code 0)
    Valid,
    /// Validation failed with errors (return code > 0)
    Invalid {
        error_count: i32,
        errors: Vec<String>,
    },
    /// Internal error occurred (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Create ValidationResult from libxml2 return code and captured errors
    pub fn from_code(code: c_int, errors: Vec<String>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                errors,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationResult::InternalError { .. })
    }
}

/// The schema engine the resolver feeds with normalized input.
///
/// `compile_schema` turns a schema file into a compiled validator object and
/// `validate_file` checks one document against it, reporting the engine's error log.
pub trait SchemaEngine {
    type Schema;

    fn compile_schema(&self, schema_path: &Path) -> LibXml2Result<Self::Schema>;

    fn validate_file(
        &self,
        schema: &Self::Schema,
        file_path: &Path,
    ) -> LibXml2Result<ValidationResult>;
}

/// LibXML2-backed [`SchemaEngine`]
#[derive(Debug, Clone, Copy)]
pub struct LibXml2Wrapper {
    _private: (),
}

impl LibXml2Wrapper {
    /// Create a new LibXML2 wrapper instance, initializing libxml2 on first use
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper { _private: () }
    }

    /// Compile the schema at `schema_path`, following its includes and imports
    ///
    /// # Errors
    ///
    /// Returns `LibXml2Error::SchemaParseFailed` when the parser or schema parser rejected
    /// the schema text, `LibXml2Error::SchemaLoadFailed` for any other compile failure.
    pub fn parse_schema_file(&self, schema_path: &Path) -> LibXml2Result<XmlSchemaPtr> {
        let c_path = path_to_cstring(schema_path)?;
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sink = &mut diagnostics as *mut Vec<Diagnostic>;

        let schema_ptr = unsafe {
            let parser_ctxt = xmlSchemaNewParserCtxt(c_path.as_ptr());
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                sink as *mut c_void,
            );

            let capture = GlobalErrorCapture::install(sink);
            let schema_ptr = xmlSchemaParse(parser_ctxt);
            drop(capture);

            // Always free the parser context
            xmlSchemaFreeParserCtxt(parser_ctxt);
            schema_ptr
        };

        match unsafe { XmlSchemaPtr::from_raw(schema_ptr) } {
            Some(schema) => Ok(schema),
            None => Err(classify_compile_failure(&diagnostics)),
        }
    }

    /// Validate an XML file against a compiled schema
    ///
    /// A document that is not well-formed is reported as `Invalid`, with the parser
    /// messages as its error log.
    pub fn validate_file(
        &self,
        schema: &XmlSchemaPtr,
        file_path: &Path,
    ) -> LibXml2Result<ValidationResult> {
        let c_path = path_to_cstring(file_path)?;
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sink = &mut diagnostics as *mut Vec<Diagnostic>;

        let result_code = unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                sink as *mut c_void,
            );

            let capture = GlobalErrorCapture::install(sink);
            let result_code = xmlSchemaValidateFile(valid_ctxt, c_path.as_ptr(), 0);
            drop(capture);

            // Always free the validation context
            xmlSchemaFreeValidCtxt(valid_ctxt);
            result_code
        };

        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| !d.is_warning())
            .map(Diagnostic::render)
            .collect();

        // libxml2 gives up with a negative code on a submission that is not well-formed
        if result_code < 0 && diagnostics.iter().any(Diagnostic::is_well_formedness_error) {
            return Ok(ValidationResult::Invalid {
                error_count: errors.len() as i32,
                errors,
            });
        }

        match ValidationResult::from_code(result_code, errors) {
            ValidationResult::InternalError { code } => Err(LibXml2Error::ValidationFailed {
                code,
                file: file_path.to_path_buf(),
            }),
            result => Ok(result),
        }
    }
}

fn classify_compile_failure(diagnostics: &[Diagnostic]) -> LibXml2Error {
    let errors: Vec<String> = diagnostics
        .iter()
        .filter(|d| !d.is_warning())
        .map(Diagnostic::render_located)
        .collect();

    if diagnostics.iter().any(Diagnostic::is_parse_error) {
        LibXml2Error::SchemaParseFailed { errors }
    } else {
        LibXml2Error::SchemaLoadFailed { errors }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaEngine for LibXml2Wrapper {
    type Schema = XmlSchemaPtr;

    fn compile_schema(&self, schema_path: &Path) -> LibXml2Result<XmlSchemaPtr> {
        self.parse_schema_file(schema_path)
    }

    fn validate_file(
        &self,
        schema: &XmlSchemaPtr,
        file_path: &Path,
    ) -> LibXml2Result<ValidationResult> {
        LibXml2Wrapper::validate_file(self, schema, file_path)
    }
}
