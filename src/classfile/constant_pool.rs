use std::borrow::Cow;

use super::error::ClassFileError;
use super::reader::ByteReader;

/// The parts of a constant pool entry that access transformation needs.
///
/// Entries that only carry literal values are kept as [`Constant::Other`]
/// with their tag so the pool stays index-accurate.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant<'a> {
    Utf8(Cow<'a, str>),
    Class {
        name_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    Other {
        tag: u8,
    },
    /// Slot 0, and the second slot of every `Long`/`Double`.
    Unusable,
}

/// A resolved `Methodref` or `InterfaceMethodref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRef<'p> {
    /// Binary name of the owning class, `/`-separated.
    pub owner: &'p str,
    pub name: &'p str,
    pub descriptor: &'p str,
    /// Whether the entry is an `InterfaceMethodref`.
    pub interface: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool<'a> {
    entries: Vec<Constant<'a>>,
}

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

impl<'a> ConstantPool<'a> {
    pub(crate) fn parse(reader: &mut ByteReader<'a>) -> Result<Self, ClassFileError> {
        let count = reader.u2()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u1()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = usize::from(reader.u2()?);
                    let raw = reader.take(len)?;
                    let text = decode_modified_utf8(raw)
                        .ok_or(ClassFileError::InvalidUtf8 { index })?;
                    Constant::Utf8(text)
                }
                TAG_CLASS => Constant::Class {
                    name_index: reader.u2()?,
                },
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: reader.u2()?,
                    descriptor_index: reader.u2()?,
                },
                TAG_FIELDREF => Constant::FieldRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_METHODREF => Constant::MethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_INTERFACE_METHODREF => Constant::InterfaceMethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                    reader.skip(2)?;
                    Constant::Other { tag }
                }
                TAG_METHOD_HANDLE => {
                    reader.skip(3)?;
                    Constant::Other { tag }
                }
                TAG_INTEGER | TAG_FLOAT | TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => {
                    reader.skip(4)?;
                    Constant::Other { tag }
                }
                TAG_LONG | TAG_DOUBLE => {
                    reader.skip(8)?;
                    entries.push(Constant::Other { tag });
                    index = index.saturating_add(1);
                    Constant::Unusable
                }
                tag => return Err(ClassFileError::InvalidConstantTag { tag, index }),
            };
            entries.push(entry);
            index = index.saturating_add(1);
        }

        Ok(Self { entries })
    }

    /// Number of slots, including the unusable slot 0.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Constant<'a>> {
        self.entries.get(usize::from(index))
    }

    /// The string held by the `Utf8` entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::BadConstantIndex`] if the entry is missing or
    /// not a `Utf8`.
    pub fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(Constant::Utf8(text)) => Ok(text),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub(crate) fn utf8_cow(&self, index: u16) -> Result<Cow<'a, str>, ClassFileError> {
        match self.get(index) {
            Some(Constant::Utf8(text)) => Ok(text.clone()),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// The binary name of the `Class` entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::BadConstantIndex`] if the entry is not a
    /// `Class` or its name is not a `Utf8`.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Class",
            }),
        }
    }

    pub(crate) fn class_name_cow(&self, index: u16) -> Result<Cow<'a, str>, ClassFileError> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8_cow(*name_index),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Class",
            }),
        }
    }

    /// Resolve a `Methodref` or `InterfaceMethodref` to owner, name and
    /// descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::BadConstantIndex`] if `index` or any entry it
    /// points at has the wrong type.
    pub fn method_ref(&self, index: u16) -> Result<MethodRef<'_>, ClassFileError> {
        let (class_index, name_and_type_index, interface) = match self.get(index) {
            Some(Constant::MethodRef {
                class_index,
                name_and_type_index,
            }) => (*class_index, *name_and_type_index, false),
            Some(Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            }) => (*class_index, *name_and_type_index, true),
            _ => {
                return Err(ClassFileError::BadConstantIndex {
                    index,
                    expected: "Methodref or InterfaceMethodref",
                })
            }
        };

        let (name_index, descriptor_index) = match self.get(name_and_type_index) {
            Some(Constant::NameAndType {
                name_index,
                descriptor_index,
            }) => (*name_index, *descriptor_index),
            _ => {
                return Err(ClassFileError::BadConstantIndex {
                    index: name_and_type_index,
                    expected: "NameAndType",
                })
            }
        };

        Ok(MethodRef {
            owner: self.class_name(class_index)?,
            name: self.utf8(name_index)?,
            descriptor: self.utf8(descriptor_index)?,
            interface,
        })
    }
}

/// Decode the class-file flavour of UTF-8: `NUL` is written as `C0 80` and
/// supplementary characters as two three-byte surrogates.
fn decode_modified_utf8(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if !bytes.contains(&0) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return Some(Cow::Borrowed(text));
        }
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = u16::from(bytes[i]);
        if b & 0x80 == 0 {
            if b == 0 {
                return None;
            }
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = continuation(bytes.get(i + 1))?;
            units.push(((b & 0x1F) << 6) | b2);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = continuation(bytes.get(i + 1))?;
            let b3 = continuation(bytes.get(i + 2))?;
            units.push(((b & 0x0F) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok().map(Cow::Owned)
}

fn continuation(byte: Option<&u8>) -> Option<u16> {
    let b = *byte?;
    (b & 0xC0 == 0x80).then_some(u16::from(b & 0x3F))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(bytes: &[u8]) -> Result<ConstantPool<'_>, ClassFileError> {
        ConstantPool::parse(&mut ByteReader::new(bytes))
    }

    #[test]
    fn modified_utf8_plain_ascii_is_borrowed() {
        assert!(matches!(
            decode_modified_utf8(b"java/lang/Object"),
            Some(Cow::Borrowed("java/lang/Object"))
        ));
    }

    #[test]
    fn modified_utf8_nul() {
        assert_eq!(
            decode_modified_utf8(&[b'a', 0xC0, 0x80, b'b']).as_deref(),
            Some("a\0b")
        );
        assert_eq!(decode_modified_utf8(&[b'a', 0x00]), None);
    }

    #[test]
    fn modified_utf8_surrogate_pair() {
        // U+1F600 as a CESU-8 surrogate pair
        let bytes = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert_eq!(decode_modified_utf8(&bytes).as_deref(), Some("\u{1F600}"));
    }

    #[test]
    fn long_takes_two_slots() {
        // count=4: #1 Long, #2 unusable, #3 Utf8 "x"
        let bytes = [
            0x00, 0x04, 5, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0x00, 0x01, b'x',
        ];
        let cp = pool(&bytes).unwrap();
        assert_eq!(cp.len(), 4);
        assert_eq!(cp.get(2), Some(&Constant::Unusable));
        assert_eq!(cp.utf8(3).unwrap(), "x");
    }

    #[test]
    fn resolves_method_ref() {
        let bytes = [
            0x00, 0x08, // count
            1, 0x00, 0x01, b'C', // #1 Utf8 C
            7, 0x00, 0x01, // #2 Class #1
            1, 0x00, 0x03, b'f', b'o', b'o', // #3 Utf8 foo
            1, 0x00, 0x03, b'(', b')', b'V', // #4 Utf8 ()V
            12, 0x00, 0x03, 0x00, 0x04, // #5 NameAndType
            10, 0x00, 0x02, 0x00, 0x05, // #6 Methodref
            11, 0x00, 0x02, 0x00, 0x05, // #7 InterfaceMethodref
        ];
        let cp = pool(&bytes).unwrap();
        let m = cp.method_ref(6).unwrap();
        assert_eq!(
            m,
            MethodRef {
                owner: "C",
                name: "foo",
                descriptor: "()V",
                interface: false
            }
        );
        assert!(cp.method_ref(7).unwrap().interface);
        assert!(matches!(
            cp.method_ref(1),
            Err(ClassFileError::BadConstantIndex { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_unknown_tag() {
        assert_eq!(
            pool(&[0x00, 0x02, 2, 0x00]),
            Err(ClassFileError::InvalidConstantTag { tag: 2, index: 1 })
        );
    }

    #[test]
    fn rejects_truncated_pool() {
        assert!(matches!(
            pool(&[0x00, 0x02, 1, 0x00, 0x05, b'a']),
            Err(ClassFileError::UnexpectedEof { .. })
        ));
    }
}
