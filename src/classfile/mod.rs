//! Just enough of the JVM class-file format to find and rewrite access flags.
//!
//! [`ClassFile::parse`] walks the whole structure and validates it, recording
//! the byte offset of every access-flag word it may later rewrite.
//! [`ClassFile::accept`] hands each class, field, method and inner-class
//! entry to a [`ClassVisitor`] and writes the returned flags into a copy of
//! the original bytes. Nothing else in the file is re-encoded.

pub mod code;
pub mod descriptor;
mod constant_pool;
mod error;
mod flags;
mod reader;

use std::borrow::Cow;
use std::convert::Infallible;
use std::ops::Range;

pub use constant_pool::{Constant, ConstantPool, MethodRef};
pub use error::ClassFileError;
pub use flags::{ClassAccess, FieldAccess, InnerClassAccess, MethodAccess};

pub(crate) use reader::ByteReader;
use reader::write_u2;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// JDK 1.0.2. Anything older never existed.
pub const MIN_MAJOR_VERSION: u16 = 45;

/// A parsed, validated class file borrowing the buffer it was read from.
#[derive(Debug, Clone)]
pub struct ClassFile<'a> {
    bytes: &'a [u8],
    minor_version: u16,
    major_version: u16,
    constant_pool: ConstantPool<'a>,
    access_flags: u16,
    access_offset: usize,
    this_class: Cow<'a, str>,
    super_class: Option<Cow<'a, str>>,
    interfaces: Vec<Cow<'a, str>>,
    fields: Vec<FieldInfo<'a>>,
    methods: Vec<MethodInfo<'a>>,
    inner_classes: Vec<InnerClassInfo<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo<'a> {
    pub access_flags: u16,
    pub name: Cow<'a, str>,
    pub descriptor: Cow<'a, str>,
    flags_offset: usize,
}

impl FieldInfo<'_> {
    #[must_use]
    pub fn access(&self) -> FieldAccess {
        FieldAccess::from_bits_retain(self.access_flags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo<'a> {
    pub access_flags: u16,
    pub name: Cow<'a, str>,
    pub descriptor: Cow<'a, str>,
    flags_offset: usize,
    code: Option<Range<usize>>,
}

impl MethodInfo<'_> {
    #[must_use]
    pub fn access(&self) -> MethodAccess {
        MethodAccess::from_bits_retain(self.access_flags)
    }

    /// Whether the method carries a `Code` attribute.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    /// Offset of the first byte of the instruction array within the class
    /// file.
    #[must_use]
    pub fn code_offset(&self) -> Option<usize> {
        self.code.as_ref().map(|range| range.start)
    }

    /// `name` followed by `descriptor`, the form method rules are keyed by.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }
}

/// One entry of the `InnerClasses` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo<'a> {
    pub access_flags: u16,
    /// Binary name of the inner class, `/`-separated.
    pub inner_class: Cow<'a, str>,
    pub outer_class: Option<Cow<'a, str>>,
    /// Simple source name; absent for anonymous classes.
    pub inner_name: Option<Cow<'a, str>>,
    flags_offset: usize,
}

impl InnerClassInfo<'_> {
    #[must_use]
    pub fn access(&self) -> InnerClassAccess {
        InnerClassAccess::from_bits_retain(self.access_flags)
    }
}

/// Callbacks for each access-flag bearing element of a class file.
///
/// Every method returns the flags to write back. The defaults return the
/// current flags unchanged, so a visitor only overrides what it rewrites.
pub trait ClassVisitor {
    type Error;

    fn visit_class(&mut self, class: &ClassFile<'_>) -> Result<u16, Self::Error> {
        Ok(class.access_flags())
    }

    fn visit_field(
        &mut self,
        class: &ClassFile<'_>,
        field: &FieldInfo<'_>,
    ) -> Result<u16, Self::Error> {
        let _ = class;
        Ok(field.access_flags)
    }

    /// `code` is the method's instruction array inside the output buffer, or
    /// `None` for abstract and native methods. Opcode bytes may be rewritten
    /// in place as long as instruction lengths are preserved.
    fn visit_method(
        &mut self,
        class: &ClassFile<'_>,
        method: &MethodInfo<'_>,
        code: Option<&mut [u8]>,
    ) -> Result<u16, Self::Error> {
        let _ = (class, code);
        Ok(method.access_flags)
    }

    fn visit_inner_class(
        &mut self,
        class: &ClassFile<'_>,
        inner: &InnerClassInfo<'_>,
    ) -> Result<u16, Self::Error> {
        let _ = class;
        Ok(inner.access_flags)
    }
}

/// Visitor that leaves every flag as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ClassVisitor for Identity {
    type Error = Infallible;
}

impl<'a> ClassFile<'a> {
    /// Parse and validate a complete class file.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError`] for any structural defect: bad magic, an
    /// unsupported version, truncation, unresolvable constant-pool
    /// references, malformed descriptors, inconsistent attribute lengths,
    /// undecodable bytecode or trailing bytes.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ClassFileError> {
        let mut r = ByteReader::new(bytes);

        let magic = r.u4()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor_version = r.u2()?;
        let major_version = r.u2()?;
        if major_version < MIN_MAJOR_VERSION {
            return Err(ClassFileError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let constant_pool = ConstantPool::parse(&mut r)?;

        let access_offset = r.position();
        let access_flags = r.u2()?;
        let this_class = constant_pool.class_name_cow(r.u2()?)?;
        let super_class = match r.u2()? {
            0 => None,
            index => Some(constant_pool.class_name_cow(index)?),
        };

        let interface_count = r.u2()?;
        let interfaces = (0..interface_count)
            .map(|_| constant_pool.class_name_cow(r.u2()?))
            .collect::<Result<Vec<_>, _>>()?;

        let field_count = r.u2()?;
        let mut fields = Vec::with_capacity(usize::from(field_count));
        for _ in 0..field_count {
            fields.push(parse_field(&mut r, &constant_pool)?);
        }

        let method_count = r.u2()?;
        let mut methods = Vec::with_capacity(usize::from(method_count));
        for _ in 0..method_count {
            methods.push(parse_method(&mut r, &constant_pool)?);
        }

        let mut inner_classes = Vec::new();
        let attribute_count = r.u2()?;
        for _ in 0..attribute_count {
            let attr = Attribute::read(&mut r, &constant_pool)?;
            if attr.name == "InnerClasses" {
                inner_classes = parse_inner_classes(&attr, &constant_pool)?;
            }
        }

        if r.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            bytes,
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            access_offset,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            inner_classes,
        })
    }

    /// Run `visitor` over the class and return a copy of the input with the
    /// returned flags (and any in-place code edits) applied.
    ///
    /// Elements are visited in file order: class, fields, methods, inner
    /// classes.
    ///
    /// # Errors
    ///
    /// Propagates the first error a visitor callback returns.
    pub fn accept<V: ClassVisitor>(&self, visitor: &mut V) -> Result<Vec<u8>, V::Error> {
        let mut out = self.bytes.to_vec();

        let flags = visitor.visit_class(self)?;
        write_u2(&mut out, self.access_offset, flags);

        for field in &self.fields {
            let flags = visitor.visit_field(self, field)?;
            write_u2(&mut out, field.flags_offset, flags);
        }

        for method in &self.methods {
            let code = method.code.clone().map(|range| &mut out[range]);
            let flags = visitor.visit_method(self, method, code)?;
            write_u2(&mut out, method.flags_offset, flags);
        }

        for inner in &self.inner_classes {
            let flags = visitor.visit_inner_class(self, inner)?;
            write_u2(&mut out, inner.flags_offset, flags);
        }

        Ok(out)
    }

    /// Binary name of this class, `/`-separated.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.this_class
    }

    #[must_use]
    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    #[must_use]
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|i| i.as_ref())
    }

    #[must_use]
    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    #[must_use]
    pub fn access(&self) -> ClassAccess {
        ClassAccess::from_bits_retain(self.access_flags)
    }

    #[must_use]
    pub fn version(&self) -> (u16, u16) {
        (self.major_version, self.minor_version)
    }

    #[must_use]
    pub fn constant_pool(&self) -> &ConstantPool<'a> {
        &self.constant_pool
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldInfo<'a>] {
        &self.fields
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodInfo<'a>] {
        &self.methods
    }

    #[must_use]
    pub fn inner_classes(&self) -> &[InnerClassInfo<'a>] {
        &self.inner_classes
    }

    /// The instruction array of `method` in the original buffer.
    #[must_use]
    pub fn code(&self, method: &MethodInfo<'_>) -> Option<&'a [u8]> {
        method.code.clone().and_then(|range| self.bytes.get(range))
    }
}

// -- Members ------------------------------------------------------------------

struct MemberHeader<'a> {
    flags_offset: usize,
    access_flags: u16,
    name: Cow<'a, str>,
    descriptor: Cow<'a, str>,
}

fn member_header<'a>(
    r: &mut ByteReader<'a>,
    pool: &ConstantPool<'a>,
) -> Result<MemberHeader<'a>, ClassFileError> {
    let flags_offset = r.position();
    let access_flags = r.u2()?;
    let name = pool.utf8_cow(r.u2()?)?;
    let descriptor = pool.utf8_cow(r.u2()?)?;
    Ok(MemberHeader {
        flags_offset,
        access_flags,
        name,
        descriptor,
    })
}

fn parse_field<'a>(
    r: &mut ByteReader<'a>,
    pool: &ConstantPool<'a>,
) -> Result<FieldInfo<'a>, ClassFileError> {
    let header = member_header(r, pool)?;
    if !descriptor::is_field_descriptor(&header.descriptor) {
        return Err(ClassFileError::InvalidDescriptor {
            kind: "field",
            descriptor: header.descriptor.into_owned(),
        });
    }
    let attribute_count = r.u2()?;
    for _ in 0..attribute_count {
        Attribute::read(r, pool)?;
    }
    Ok(FieldInfo {
        access_flags: header.access_flags,
        name: header.name,
        descriptor: header.descriptor,
        flags_offset: header.flags_offset,
    })
}

fn parse_method<'a>(
    r: &mut ByteReader<'a>,
    pool: &ConstantPool<'a>,
) -> Result<MethodInfo<'a>, ClassFileError> {
    let header = member_header(r, pool)?;
    if !descriptor::is_method_descriptor(&header.descriptor) {
        return Err(ClassFileError::InvalidDescriptor {
            kind: "method",
            descriptor: header.descriptor.into_owned(),
        });
    }
    let mut code = None;
    let attribute_count = r.u2()?;
    for _ in 0..attribute_count {
        let attr = Attribute::read(r, pool)?;
        if attr.name == "Code" {
            code = Some(parse_code(&attr)?);
        }
    }
    Ok(MethodInfo {
        access_flags: header.access_flags,
        name: header.name,
        descriptor: header.descriptor,
        flags_offset: header.flags_offset,
        code,
    })
}

// -- Attributes ---------------------------------------------------------------

struct Attribute<'a> {
    name: Cow<'a, str>,
    /// Absolute offset of `body` within the class file.
    offset: usize,
    body: &'a [u8],
}

impl<'a> Attribute<'a> {
    fn read(r: &mut ByteReader<'a>, pool: &ConstantPool<'a>) -> Result<Self, ClassFileError> {
        let name = pool.utf8_cow(r.u2()?)?;
        let len = r.u4()? as usize;
        let offset = r.position();
        let body = r.take(len)?;
        Ok(Self { name, offset, body })
    }

    fn length_mismatch(&self, name: &'static str, actual: usize) -> ClassFileError {
        ClassFileError::AttributeLength {
            name,
            declared: u32::try_from(self.body.len()).unwrap_or(u32::MAX),
            actual,
        }
    }
}

/// Locate and validate the instruction array of a `Code` attribute.
fn parse_code(attr: &Attribute<'_>) -> Result<Range<usize>, ClassFileError> {
    let mut r = ByteReader::new(attr.body);
    let truncated = |_| attr.length_mismatch("Code", attr.body.len() + 1);

    r.skip(4).map_err(truncated)?; // max_stack, max_locals
    let code_length = r.u4().map_err(truncated)? as usize;
    let code_start = r.position();
    let code = r.take(code_length).map_err(truncated)?;
    code::validate(code)?;

    let exception_count = usize::from(r.u2().map_err(truncated)?);
    r.skip(exception_count * 8).map_err(truncated)?;
    let attribute_count = r.u2().map_err(truncated)?;
    for _ in 0..attribute_count {
        r.skip(2).map_err(truncated)?;
        let len = r.u4().map_err(truncated)? as usize;
        r.skip(len).map_err(truncated)?;
    }
    if r.remaining() != 0 {
        return Err(attr.length_mismatch("Code", r.position()));
    }

    let start = attr.offset + code_start;
    Ok(start..start + code_length)
}

fn parse_inner_classes<'a>(
    attr: &Attribute<'a>,
    pool: &ConstantPool<'a>,
) -> Result<Vec<InnerClassInfo<'a>>, ClassFileError> {
    const ENTRY_LEN: usize = 8;

    let mut r = ByteReader::new(attr.body);
    let count = usize::from(r.u2().map_err(|_| attr.length_mismatch("InnerClasses", 0))?);
    let expected = 2 + count * ENTRY_LEN;
    if attr.body.len() != expected {
        return Err(attr.length_mismatch("InnerClasses", expected));
    }

    let optional = |index: u16, resolve: fn(&ConstantPool<'a>, u16) -> Result<Cow<'a, str>, ClassFileError>| {
        if index == 0 {
            Ok(None)
        } else {
            resolve(pool, index).map(Some)
        }
    };

    (0..count)
        .map(|_| {
            let inner_class = pool.class_name_cow(r.u2()?)?;
            let outer_class = optional(r.u2()?, ConstantPool::class_name_cow)?;
            let inner_name = optional(r.u2()?, ConstantPool::utf8_cow)?;
            let flags_offset = attr.offset + r.position();
            let access_flags = r.u2()?;
            Ok(InnerClassInfo {
                access_flags,
                inner_class,
                outer_class,
                inner_name,
                flags_offset,
            })
        })
        .collect()
}
