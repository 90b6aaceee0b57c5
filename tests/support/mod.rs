//! A tiny class-file assembler for integration tests.
//!
//! Produces structurally valid class files with a constant pool, fields,
//! methods (optionally with a `Code` attribute) and an `InnerClasses` table.
//! Constants are deduplicated so the same name always maps to one index.

#![allow(dead_code)]

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_ABSTRACT: u16 = 0x0400;

pub const ALOAD_0: u8 = 0x2a;
pub const ICONST_0: u8 = 0x03;
pub const IRETURN: u8 = 0xac;
pub const RETURN: u8 = 0xb1;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
}

struct Member {
    access: u16,
    name: u16,
    descriptor: u16,
    code: Option<Vec<u8>>,
}

struct Inner {
    inner: u16,
    outer: u16,
    name: u16,
    access: u16,
}

pub struct ClassBuilder {
    pool: Vec<Key>,
    lookup: HashMap<Key, u16>,
    access: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<Member>,
    methods: Vec<Member>,
    inner_classes: Vec<Inner>,
}

impl ClassBuilder {
    /// A class with binary name `name` extending `java/lang/Object`.
    pub fn new(name: &str, access: u16) -> Self {
        let mut b = Self {
            pool: Vec::new(),
            lookup: HashMap::new(),
            access,
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
        };
        b.this_class = b.class(name);
        b.super_class = b.class("java/lang/Object");
        b
    }

    fn intern(&mut self, key: Key) -> u16 {
        if let Some(&idx) = self.lookup.get(&key) {
            return idx;
        }
        self.pool.push(key.clone());
        let idx = u16::try_from(self.pool.len()).unwrap();
        self.lookup.insert(key, idx);
        idx
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.intern(Key::Utf8(s.to_owned()))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.intern(Key::Class(name))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.intern(Key::NameAndType(name, descriptor))
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        self.intern(Key::MethodRef(owner, nat))
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let owner = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        self.intern(Key::InterfaceMethodRef(owner, nat))
    }

    pub fn field(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.fields.push(Member {
            access,
            name,
            descriptor,
            code: None,
        });
        self
    }

    /// Add a method. `code` is the raw instruction array; `None` for
    /// abstract and native methods.
    pub fn method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        code: Option<Vec<u8>>,
    ) -> &mut Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        if code.is_some() {
            self.utf8("Code");
        }
        self.methods.push(Member {
            access,
            name,
            descriptor,
            code,
        });
        self
    }

    pub fn inner_class(
        &mut self,
        inner: &str,
        outer: Option<&str>,
        simple_name: Option<&str>,
        access: u16,
    ) -> &mut Self {
        self.utf8("InnerClasses");
        let inner = self.class(inner);
        let outer = outer.map_or(0, |o| self.class(o));
        let name = simple_name.map_or(0, |n| self.utf8(n));
        self.inner_classes.push(Inner {
            inner,
            outer,
            name,
            access,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABE_u32.to_be_bytes());
        u2(&mut out, 0);
        u2(&mut out, 52);

        u2(&mut out, u16::try_from(self.pool.len() + 1).unwrap());
        for key in &self.pool {
            match key {
                Key::Utf8(s) => {
                    out.push(1);
                    u2(&mut out, u16::try_from(s.len()).unwrap());
                    out.extend_from_slice(s.as_bytes());
                }
                Key::Class(name) => {
                    out.push(7);
                    u2(&mut out, *name);
                }
                Key::NameAndType(name, descriptor) => {
                    out.push(12);
                    u2(&mut out, *name);
                    u2(&mut out, *descriptor);
                }
                Key::MethodRef(owner, nat) => {
                    out.push(10);
                    u2(&mut out, *owner);
                    u2(&mut out, *nat);
                }
                Key::InterfaceMethodRef(owner, nat) => {
                    out.push(11);
                    u2(&mut out, *owner);
                    u2(&mut out, *nat);
                }
            }
        }

        u2(&mut out, self.access);
        u2(&mut out, self.this_class);
        u2(&mut out, self.super_class);
        u2(&mut out, 0);

        u2(&mut out, u16::try_from(self.fields.len()).unwrap());
        for field in &self.fields {
            u2(&mut out, field.access);
            u2(&mut out, field.name);
            u2(&mut out, field.descriptor);
            u2(&mut out, 0);
        }

        u2(&mut out, u16::try_from(self.methods.len()).unwrap());
        for method in &self.methods {
            u2(&mut out, method.access);
            u2(&mut out, method.name);
            u2(&mut out, method.descriptor);
            match &method.code {
                None => u2(&mut out, 0),
                Some(code) => {
                    u2(&mut out, 1);
                    u2(&mut out, self.existing_utf8("Code"));
                    u4(&mut out, 12 + code.len());
                    u2(&mut out, 8); // max_stack
                    u2(&mut out, 8); // max_locals
                    u4(&mut out, code.len());
                    out.extend_from_slice(code);
                    u2(&mut out, 0); // exception table
                    u2(&mut out, 0); // attributes
                }
            }
        }

        if self.inner_classes.is_empty() {
            u2(&mut out, 0);
        } else {
            u2(&mut out, 1);
            u2(&mut out, self.existing_utf8("InnerClasses"));
            u4(&mut out, 2 + 8 * self.inner_classes.len());
            u2(&mut out, u16::try_from(self.inner_classes.len()).unwrap());
            for inner in &self.inner_classes {
                u2(&mut out, inner.inner);
                u2(&mut out, inner.outer);
                u2(&mut out, inner.name);
                u2(&mut out, inner.access);
            }
        }
        out
    }

    fn existing_utf8(&self, s: &str) -> u16 {
        self.lookup[&Key::Utf8(s.to_owned())]
    }
}

fn u2(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn u4(out: &mut Vec<u8>, v: usize) {
    out.extend_from_slice(&u32::try_from(v).unwrap().to_be_bytes());
}

/// A three-byte invoke instruction.
pub fn invoke(opcode: u8, index: u16) -> [u8; 3] {
    let [hi, lo] = index.to_be_bytes();
    [opcode, hi, lo]
}

/// Byte offsets at which `a` and `b` differ. Both must have equal length.
pub fn diff_offsets(a: &[u8], b: &[u8]) -> Vec<usize> {
    assert_eq!(a.len(), b.len(), "transform must not change the file length");
    a.iter()
        .zip(b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect()
}
