//! Opcode definitions
//!
//! Byte values are part of the wire contract and must never change.
//! Opcodes above 0x80 are CoralKV-specific extensions to the memcached
//! binary protocol.

/// Wire opcodes understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Get = 0x00,
    Upsert = 0x01,
    Insert = 0x02,
    Replace = 0x03,
    Remove = 0x04,
    CounterIncr = 0x05,
    CounterDecr = 0x06,
    Noop = 0x0A,
    Append = 0x0E,
    Prepend = 0x0F,
    Stat = 0x10,
    Touch = 0x1C,
    GetAndTouch = 0x1D,
    GetAllMutationTokens = 0x48,
    GetReplica = 0x83,
    ObserveSeq = 0x91,
    Observe = 0x92,
    GetAndLock = 0x94,
    Unlock = 0x95,
    GetBucketConfig = 0xB5,
    SubdocGet = 0xC5,
    SubdocExists = 0xC6,
    SubdocDictAdd = 0xC7,
    SubdocDictUpsert = 0xC8,
    SubdocDelete = 0xC9,
    SubdocReplace = 0xCA,
    SubdocArrayPushLast = 0xCB,
    SubdocArrayPushFirst = 0xCC,
    SubdocArrayInsert = 0xCD,
    SubdocArrayAddUnique = 0xCE,
    SubdocCounter = 0xCF,
    SubdocMultiLookup = 0xD0,
    SubdocMultiMutation = 0xD1,
}

impl Opcode {
    /// The raw opcode byte
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Sub-document operations that travel as a single-path request
///
/// The opcode of a single sub-document frame is taken from the operation
/// itself; lookups (`Get`, `Exists`) never carry a CAS, expiry or the
/// MKDIR_P flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdocOp {
    Get,
    Exists,
    DictAdd,
    DictUpsert,
    Delete,
    Replace,
    ArrayPushLast,
    ArrayPushFirst,
    ArrayInsert,
    ArrayAddUnique,
    Counter,
}

impl SubdocOp {
    /// The wire opcode for this operation
    pub fn opcode(self) -> Opcode {
        match self {
            SubdocOp::Get => Opcode::SubdocGet,
            SubdocOp::Exists => Opcode::SubdocExists,
            SubdocOp::DictAdd => Opcode::SubdocDictAdd,
            SubdocOp::DictUpsert => Opcode::SubdocDictUpsert,
            SubdocOp::Delete => Opcode::SubdocDelete,
            SubdocOp::Replace => Opcode::SubdocReplace,
            SubdocOp::ArrayPushLast => Opcode::SubdocArrayPushLast,
            SubdocOp::ArrayPushFirst => Opcode::SubdocArrayPushFirst,
            SubdocOp::ArrayInsert => Opcode::SubdocArrayInsert,
            SubdocOp::ArrayAddUnique => Opcode::SubdocArrayAddUnique,
            SubdocOp::Counter => Opcode::SubdocCounter,
        }
    }

    /// Whether this operation mutates the document
    pub fn is_mutation(self) -> bool {
        !matches!(self, SubdocOp::Get | SubdocOp::Exists)
    }
}

/// Bitmask for the "command" byte of sub-document extras (third extras
/// byte) that activates creation of missing intermediate JSON path nodes
pub const SUBDOC_BITMASK_MKDIR_P: u8 = 0x01;
