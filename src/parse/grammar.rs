use winnow::ascii::multispace0;
use winnow::combinator::{repeat, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{AccessLevel, EditAction, Modifier, ModifierEdit, Rule, TransformTarget};

use super::error::ParseErrorKind;

// -- Tokens -----------------------------------------------------------------

fn token<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

fn tokens<'i>(input: &mut &'i str) -> ModalResult<Vec<&'i str>> {
    multispace0.parse_next(input)?;
    repeat(1.., terminated(token, multispace0)).parse_next(input)
}

// -- Access spec: <level>(<sign><modifier>)* ---------------------------------

struct AccessSpec<'i> {
    level: &'i str,
    edits: Vec<(char, &'i str)>,
}

fn access_spec<'i>(input: &mut &'i str) -> ModalResult<AccessSpec<'i>> {
    let level = take_while(0.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let edits = repeat(
        0..,
        (any, take_while(0.., |c: char| c.is_ascii_alphanumeric())),
    )
    .parse_next(input)?;
    Ok(AccessSpec { level, edits })
}

fn resolve_access_spec(spec: &str) -> Result<(AccessLevel, Vec<ModifierEdit>), ParseErrorKind> {
    let parsed = access_spec
        .parse(spec)
        .map_err(|e| ParseErrorKind::Syntax(e.to_string()))?;

    let level = parsed
        .level
        .parse::<AccessLevel>()
        .map_err(|()| ParseErrorKind::InvalidAccessLevel(parsed.level.to_owned()))?;

    let edits = parsed
        .edits
        .into_iter()
        .map(|(sign, word)| -> Result<ModifierEdit, ParseErrorKind> {
            let action =
                EditAction::from_sign(sign).ok_or(ParseErrorKind::InvalidModifierAction(sign))?;
            let modifier = word
                .parse::<Modifier>()
                .map_err(|()| ParseErrorKind::InvalidModifier(word.to_owned()))?;
            Ok(ModifierEdit { modifier, action })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((level, edits))
}

// -- Member descriptor -------------------------------------------------------

fn resolve_target(class_name: &str, member: Option<&str>) -> Result<TransformTarget, ParseErrorKind> {
    let Some(member) = member else {
        return Ok(TransformTarget::class(class_name));
    };
    match member.find('(') {
        Some(open) if member[open..].contains(')') => {
            Ok(TransformTarget::method(class_name, member))
        }
        Some(_) => Err(ParseErrorKind::MalformedMethodDescriptor(member.to_owned())),
        None => Ok(TransformTarget::field(class_name, member)),
    }
}

// -- Whole line --------------------------------------------------------------

/// Parse one comment-free, trimmed, non-empty rule line.
pub(crate) fn parse_rule(line: &str) -> Result<Rule, ParseErrorKind> {
    let tokens = tokens
        .parse(line)
        .map_err(|e| ParseErrorKind::Syntax(e.to_string()))?;

    let (spec, class_name, member) = match tokens.as_slice() {
        [spec, class_name] => (*spec, *class_name, None),
        [spec, class_name, member] => (*spec, *class_name, Some(*member)),
        other => return Err(ParseErrorKind::TokenCount(other.len())),
    };

    let (level, edits) = resolve_access_spec(spec)?;
    let target = resolve_target(class_name, member)?;
    Ok(Rule::new(target, level, edits))
}
