//! Разбор текстовых сигнатур (`integer llAbs(integer val)`, `touch_start(integer num)`).
//!
//! Используется библиотечным файлом данных и для сверки документации с объявлениями.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::{EventSignature, FunctionSignature, LslType, Parameter};
use crate::core::errors::SignatureError;

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn lsl_type(input: &str) -> IResult<&str, LslType> {
    map_res(identifier, |w: &str| w.parse::<LslType>())(input)
}

/// `any` допустим только для variadic-хвоста.
fn param_type(input: &str) -> IResult<&str, LslType> {
    alt((map(tag("any"), |_| LslType::Void), lsl_type))(input)
}

fn parameter(input: &str) -> IResult<&str, Parameter> {
    map(
        tuple((param_type, opt(tag("...")), multispace1, identifier)),
        |(ty, dots, _, name)| Parameter { ty, name: name.to_string(), variadic: dots.is_some() },
    )(input)
}

fn parameter_list(input: &str) -> IResult<&str, Vec<Parameter>> {
    delimited(
        char('('),
        ws(separated_list0(ws(char(',')), parameter)),
        char(')'),
    )(input)
}

fn function_signature(input: &str) -> IResult<&str, FunctionSignature> {
    // тип результата необязателен: `llResetScript()`
    let with_type = map(
        tuple((terminated(lsl_type, multispace1), identifier, ws(parameter_list))),
        |(ret, name, params)| FunctionSignature::new(ret, name, params),
    );
    let without_type = map(pair(identifier, ws(parameter_list)), |(name, params)| {
        FunctionSignature::new(LslType::Void, name, params)
    });
    preceded(multispace0, alt((with_type, without_type)))(input)
}

fn event_signature(input: &str) -> IResult<&str, EventSignature> {
    map(preceded(multispace0, pair(identifier, ws(parameter_list))), |(name, params)| {
        EventSignature::new(name, params)
    })(input)
}

fn validate_variadic(text: &str, params: &[Parameter]) -> Result<(), SignatureError> {
    let misplaced = params.iter().rev().skip(1).any(|p| p.variadic);
    let any_fixed = params.iter().any(|p| !p.variadic && p.ty.is_void());
    if misplaced || any_fixed {
        return Err(SignatureError::Parse {
            text: text.to_string(),
            reason: "only the last parameter may be variadic or of type 'any'".into(),
        });
    }
    Ok(())
}

fn to_error(text: &str, e: nom::Err<nom::error::Error<&str>>) -> SignatureError {
    let reason = match e {
        nom::Err::Error(inner) | nom::Err::Failure(inner) => {
            format!("unexpected input at '{}'", inner.input.chars().take(16).collect::<String>())
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    };
    SignatureError::Parse { text: text.to_string(), reason }
}

pub fn parse_function_signature(text: &str) -> Result<FunctionSignature, SignatureError> {
    let (_, sig) = all_consuming(terminated(function_signature, opt(char(';'))))(text)
        .map_err(|e| to_error(text, e))?;
    validate_variadic(text, &sig.parameters)?;
    Ok(sig)
}

pub fn parse_event_signature(text: &str) -> Result<EventSignature, SignatureError> {
    let (_, sig) = all_consuming(terminated(event_signature, opt(char(';'))))(text)
        .map_err(|e| to_error(text, e))?;
    if sig.parameters.iter().any(|p| p.variadic || p.ty.is_void()) {
        return Err(SignatureError::Parse { text: text.to_string(), reason: "events cannot be variadic".into() });
    }
    Ok(sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_function() {
        let s = parse_function_signature("integer llAbs(integer val)").unwrap();
        assert_eq!(s.name, "llAbs");
        assert_eq!(s.return_type, LslType::Integer);
        assert_eq!(s.parameters.len(), 1);
        assert_eq!(s.parameters[0].name, "val");
        assert_eq!(s.to_string(), "integer llAbs(integer val)");
    }

    #[test]
    fn parses_void_function_and_whitespace() {
        let s = parse_function_signature("  llSay( integer channel ,string msg );").unwrap();
        assert_eq!(s.return_type, LslType::Void);
        assert_eq!(s.to_string(), "llSay(integer channel, string msg)");
        let e = parse_function_signature("llResetScript()").unwrap();
        assert!(e.parameters.is_empty());
    }

    #[test]
    fn parses_variadic_tail() {
        let s = parse_function_signature("string osFormatString(string fmt, any... values)").unwrap();
        assert!(s.has_variadic_parameter());
        assert_eq!(s.concrete_parameter_count(), 1);
        assert_eq!(s.to_string(), "string osFormatString(string fmt, any... values)");
        assert!(parse_function_signature("f(any... a, integer b)").is_err());
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_function_signature("integer (").unwrap_err();
        assert!(matches!(err, SignatureError::Parse { .. }));
        assert!(parse_function_signature("blob f()").is_err());
    }

    #[test]
    fn parses_event() {
        let e = parse_event_signature("listen(integer channel, string name, key id, string message)").unwrap();
        assert_eq!(e.name, "listen");
        assert_eq!(e.parameters.len(), 4);
        assert_eq!(e.parameters[2].ty, LslType::Key);
    }
}
