use tracing::debug;

use crate::classfile::code::{Instructions, INVOKESPECIAL, INVOKEVIRTUAL};
use crate::classfile::{ClassFileError, ConstantPool};

/// The method whose self-calls are rewritten, named as in the class file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SelfCall<'m> {
    /// Binary name of the declaring class, `/`-separated.
    pub owner: &'m str,
    pub name: &'m str,
    pub descriptor: &'m str,
}

/// Turn `invokespecial` instructions in `code` that call `target` itself
/// into `invokevirtual`. Operands are left untouched.
///
/// Calls through an `InterfaceMethodref` and calls to any other method are
/// skipped. Returns the code offsets of the rewritten instructions.
///
/// # Errors
///
/// Returns [`ClassFileError`] if the code cannot be walked or an
/// `invokespecial` operand does not resolve to a method reference.
pub(crate) fn rewrite_self_calls(
    code: &mut [u8],
    pool: &ConstantPool<'_>,
    target: SelfCall<'_>,
) -> Result<Vec<usize>, ClassFileError> {
    let mut rewritten = Vec::new();

    for insn in Instructions::new(code) {
        let insn = insn?;
        if insn.opcode != INVOKESPECIAL {
            continue;
        }
        let Some(index) = insn.u2_operand(code) else {
            return Err(ClassFileError::TruncatedInstruction { pc: insn.pc });
        };
        let callee = pool.method_ref(index)?;
        if !callee.interface
            && callee.owner == target.owner
            && callee.name == target.name
            && callee.descriptor == target.descriptor
        {
            rewritten.push(insn.pc);
        }
    }

    for &pc in &rewritten {
        code[pc] = INVOKEVIRTUAL;
        debug!(
            owner = target.owner,
            method = target.name,
            descriptor = target.descriptor,
            pc,
            "rewrote invokespecial self-call to invokevirtual"
        );
    }
    Ok(rewritten)
}
