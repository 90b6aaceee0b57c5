use thiserror::Error;

/// A class file that cannot be read or is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFileError {
    #[error("invalid magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("unexpected end of class file at offset {offset}: {needed} more bytes needed")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("invalid constant pool tag {tag} at index {index}")]
    InvalidConstantTag { tag: u8, index: u16 },

    #[error("constant pool index {index} is not a {expected} entry")]
    BadConstantIndex { index: u16, expected: &'static str },

    #[error("constant pool entry {index} is not valid modified UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("invalid {kind} descriptor '{descriptor}'")]
    InvalidDescriptor {
        kind: &'static str,
        descriptor: String,
    },

    #[error("{name} attribute declares {declared} bytes but its contents span {actual}")]
    AttributeLength {
        name: &'static str,
        declared: u32,
        actual: usize,
    },

    #[error("invalid opcode {opcode:#04x} at code offset {pc}")]
    InvalidOpcode { opcode: u8, pc: usize },

    #[error("malformed switch table at code offset {pc}")]
    MalformedSwitch { pc: usize },

    #[error("instruction at code offset {pc} runs past the end of the code array")]
    TruncatedInstruction { pc: usize },

    #[error("{0} trailing bytes after the class attributes")]
    TrailingBytes(usize),
}
