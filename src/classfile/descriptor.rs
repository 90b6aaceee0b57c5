//! Field and method descriptor grammar.
//!
//! ```text
//! FieldType  := BaseType | 'L' ClassName ';' | '[' FieldType
//! BaseType   := 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z'
//! Method     := '(' FieldType* ')' ( FieldType | 'V' )
//! ```

use winnow::combinator::{alt, delimited, preceded, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// JVM limit on array dimensions.
const MAX_ARRAY_DIMENSIONS: usize = 255;

fn base_type(input: &mut &str) -> ModalResult<()> {
    one_of(['B', 'C', 'D', 'F', 'I', 'J', 'S', 'Z'])
        .void()
        .parse_next(input)
}

fn object_type(input: &mut &str) -> ModalResult<()> {
    delimited(
        'L',
        take_while(1.., |c: char| !matches!(c, ';' | '.' | '[')),
        ';',
    )
    .void()
    .parse_next(input)
}

fn field_type(input: &mut &str) -> ModalResult<()> {
    let _dims: usize = repeat(0..=MAX_ARRAY_DIMENSIONS, '[').parse_next(input)?;
    alt((base_type, object_type)).parse_next(input)
}

fn method_type(input: &mut &str) -> ModalResult<()> {
    let () = preceded('(', repeat(0.., field_type)).parse_next(input)?;
    ')'.parse_next(input)?;
    alt(('V'.void(), field_type)).parse_next(input)
}

/// Whether `descriptor` is a well-formed field descriptor such as `I` or
/// `[Ljava/lang/String;`.
#[must_use]
pub fn is_field_descriptor(descriptor: &str) -> bool {
    field_type.parse(descriptor).is_ok()
}

/// Whether `descriptor` is a well-formed method descriptor such as
/// `(IJ)V`.
#[must_use]
pub fn is_method_descriptor(descriptor: &str) -> bool {
    method_type.parse(descriptor).is_ok()
}
