//! Response status handling
//!
//! The server reports a raw 16-bit status code on every response. The codec
//! translates it into a semantic [`ResponseStatus`] for the caller while
//! keeping the raw code available on the typed response, so callers that
//! care about the exact server condition (NOT_MY_VBUCKET vs BUSY, the
//! individual sub-document path errors) can still see it.

/// Raw wire status codes
///
/// Values are part of the wire contract.
pub mod code {
    pub const SUCCESS: u16 = 0x00;
    pub const ERR_NOT_FOUND: u16 = 0x01;
    pub const ERR_EXISTS: u16 = 0x02;
    pub const ERR_TOO_BIG: u16 = 0x03;
    pub const ERR_INVALID: u16 = 0x04;
    pub const ERR_NOT_STORED: u16 = 0x05;
    pub const ERR_DELTA_BADVAL: u16 = 0x06;
    pub const ERR_NOT_MY_VBUCKET: u16 = 0x07;
    pub const ERR_UNKNOWN_COMMAND: u16 = 0x81;
    pub const ERR_NO_MEM: u16 = 0x82;
    pub const ERR_NOT_SUPPORTED: u16 = 0x83;
    pub const ERR_INTERNAL: u16 = 0x84;
    pub const ERR_BUSY: u16 = 0x85;
    pub const ERR_TEMP_FAIL: u16 = 0x86;

    pub const SUBDOC_PATH_NOT_FOUND: u16 = 0xC0;
    pub const SUBDOC_PATH_MISMATCH: u16 = 0xC1;
    pub const SUBDOC_PATH_INVALID: u16 = 0xC2;
    pub const SUBDOC_PATH_TOO_BIG: u16 = 0xC3;
    pub const SUBDOC_DOC_TOO_DEEP: u16 = 0xC4;
    pub const SUBDOC_VALUE_CANT_INSERT: u16 = 0xC5;
    pub const SUBDOC_DOC_NOT_JSON: u16 = 0xC6;
    pub const SUBDOC_NUM_RANGE: u16 = 0xC7;
    pub const SUBDOC_DELTA_RANGE: u16 = 0xC8;
    pub const SUBDOC_PATH_EXISTS: u16 = 0xC9;
    pub const SUBDOC_VALUE_TOO_DEEP: u16 = 0xCA;
    pub const SUBDOC_INVALID_COMBO: u16 = 0xCB;
    pub const SUBDOC_MULTI_PATH_FAILURE: u16 = 0xCC;
}

/// Semantic response status surfaced on every typed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The operation succeeded
    Success,

    /// The requested document does not exist
    NotExists,

    /// The document exists (or a CAS check failed)
    Exists,

    /// The document is larger than the server accepts
    TooBig,

    /// The document could not be stored (append/prepend on missing doc)
    NotStored,

    /// The request arguments were rejected by the server
    InvalidArguments,

    /// The request must be reissued unchanged (vbucket moved, server busy)
    Retry,

    /// The server does not know or support the command
    CommandUnavailable,

    /// The server is out of memory
    OutOfMemory,

    /// The server failed internally
    Internal,

    /// A transient server condition; back off and retry later
    TemporaryFailure,

    /// A sub-document path does not exist in the document
    SubdocPathNotFound,

    /// A sub-document path conflicts with the document structure
    SubdocPathMismatch,

    /// A sub-document path is syntactically invalid
    SubdocPathInvalid,

    /// A sub-document path is too long or too deep
    SubdocPathTooBig,

    /// The document is too deep to operate on
    SubdocDocTooDeep,

    /// The supplied value cannot be inserted at the path
    SubdocValueCantInsert,

    /// The target document is not JSON
    SubdocDocNotJson,

    /// A numeric sub-document operation is out of range
    SubdocNumRange,

    /// A sub-document counter delta is out of range
    SubdocDeltaRange,

    /// The sub-document path already exists
    SubdocPathExists,

    /// The resulting value would be too deep
    SubdocValueTooDeep,

    /// The combination of sub-document commands is invalid
    SubdocInvalidCombo,

    /// At least one path of a multi sub-document operation failed
    SubdocMultiPathFailure,

    /// Any other server-reported failure; consult the raw code
    Failure,
}

impl ResponseStatus {
    /// Translate a raw wire status code into its semantic status
    pub fn from_wire(status: u16) -> ResponseStatus {
        match status {
            code::SUCCESS => ResponseStatus::Success,
            code::ERR_NOT_FOUND => ResponseStatus::NotExists,
            code::ERR_EXISTS => ResponseStatus::Exists,
            code::ERR_TOO_BIG => ResponseStatus::TooBig,
            code::ERR_NOT_STORED => ResponseStatus::NotStored,
            code::ERR_INVALID | code::ERR_DELTA_BADVAL => ResponseStatus::InvalidArguments,
            // A vbucket move and a busy server both resolve by reissuing
            // the identical request, so they share the Retry status.
            code::ERR_NOT_MY_VBUCKET | code::ERR_BUSY => ResponseStatus::Retry,
            code::ERR_UNKNOWN_COMMAND | code::ERR_NOT_SUPPORTED => {
                ResponseStatus::CommandUnavailable
            }
            code::ERR_NO_MEM => ResponseStatus::OutOfMemory,
            code::ERR_INTERNAL => ResponseStatus::Internal,
            code::ERR_TEMP_FAIL => ResponseStatus::TemporaryFailure,
            code::SUBDOC_PATH_NOT_FOUND => ResponseStatus::SubdocPathNotFound,
            code::SUBDOC_PATH_MISMATCH => ResponseStatus::SubdocPathMismatch,
            code::SUBDOC_PATH_INVALID => ResponseStatus::SubdocPathInvalid,
            code::SUBDOC_PATH_TOO_BIG => ResponseStatus::SubdocPathTooBig,
            code::SUBDOC_DOC_TOO_DEEP => ResponseStatus::SubdocDocTooDeep,
            code::SUBDOC_VALUE_CANT_INSERT => ResponseStatus::SubdocValueCantInsert,
            code::SUBDOC_DOC_NOT_JSON => ResponseStatus::SubdocDocNotJson,
            code::SUBDOC_NUM_RANGE => ResponseStatus::SubdocNumRange,
            code::SUBDOC_DELTA_RANGE => ResponseStatus::SubdocDeltaRange,
            code::SUBDOC_PATH_EXISTS => ResponseStatus::SubdocPathExists,
            code::SUBDOC_VALUE_TOO_DEEP => ResponseStatus::SubdocValueTooDeep,
            code::SUBDOC_INVALID_COMBO => ResponseStatus::SubdocInvalidCombo,
            code::SUBDOC_MULTI_PATH_FAILURE => ResponseStatus::SubdocMultiPathFailure,
            _ => ResponseStatus::Failure,
        }
    }

    /// Whether the operation succeeded
    pub fn is_success(self) -> bool {
        self == ResponseStatus::Success
    }

    /// Whether the caller should reissue the identical request
    ///
    /// Payload buffers stay retained on the request for exactly these
    /// statuses so the retry can re-encode the same bytes.
    pub fn should_retry(self) -> bool {
        self == ResponseStatus::Retry
    }
}
