use crate::error::ParseError;
use crate::lexer::{Lexer, Pos, Token};
use crate::message::{Field, FieldValue, Message};

/// Parses a complete text-format document into a [`Message`].
pub fn parse(src: &str) -> Result<Message, ParseError> {
    Parser::new(src).fields(None)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<(Pos, Token)>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            peeked: None,
        }
    }

    fn peek(&mut self) -> Result<Option<&(Pos, Token)>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn next(&mut self) -> Result<Option<(Pos, Token)>, ParseError> {
        match self.peeked.take() {
            Some(t) => Ok(Some(t)),
            None => self.lexer.next_token(),
        }
    }

    fn eof_error(&self, what: &str) -> ParseError {
        let pos = self.lexer.position();
        ParseError::new(
            pos.line,
            pos.col,
            format!("expected {what}, found end of input"),
        )
    }

    /// fields up to `close` (or end of input at top level)
    fn fields(&mut self, close: Option<Token>) -> Result<Message, ParseError> {
        let mut fields = Vec::new();
        loop {
            match self.peek()? {
                None => {
                    if let Some(close) = close {
                        return Err(self.eof_error(&describe(&close)));
                    }
                    return Ok(Message { fields });
                }
                Some((_, tok)) if close.as_ref() == Some(tok) => {
                    self.next()?;
                    return Ok(Message { fields });
                }
                _ => self.field(&mut fields)?,
            }
        }
    }

    fn field(&mut self, out: &mut Vec<Field>) -> Result<(), ParseError> {
        let name = self.field_name()?;
        match self.peek()? {
            Some((_, Token::Colon)) => {
                self.next()?;
                self.field_value(name, out)?;
            }
            // message fields may omit the colon
            Some((_, Token::LBrace | Token::LAngle)) => {
                let value = self.message_value()?;
                out.push(Field { name, value });
            }
            Some((pos, tok)) => {
                return Err(ParseError::new(
                    pos.line,
                    pos.col,
                    format!("expected ':' or '{{' after field name, found {}", describe(tok)),
                ))
            }
            None => return Err(self.eof_error("':' or '{' after field name")),
        }
        // separators between fields are optional
        if let Some((_, Token::Comma | Token::Semi)) = self.peek()? {
            self.next()?;
        }
        Ok(())
    }

    fn field_name(&mut self) -> Result<String, ParseError> {
        match self.next()? {
            Some((_, Token::Ident(name))) => Ok(name),
            Some((_, Token::LBracket)) => self.extension_name(),
            Some((pos, tok)) => Err(ParseError::new(
                pos.line,
                pos.col,
                format!("expected field name, found {}", describe(&tok)),
            )),
            None => Err(self.eof_error("field name")),
        }
    }

    /// extension or Any field name, kept bracketed the way protobuf JSON
    /// prints it
    fn extension_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::from("[");
        loop {
            match self.next()? {
                Some((_, Token::Ident(part))) => name.push_str(&part),
                Some((_, Token::Dot)) => name.push('.'),
                Some((_, Token::Slash)) => name.push('/'),
                Some((_, Token::RBracket)) => {
                    name.push(']');
                    return Ok(name);
                }
                Some((pos, tok)) => {
                    return Err(ParseError::new(
                        pos.line,
                        pos.col,
                        format!("unexpected {} in extension field name", describe(&tok)),
                    ))
                }
                None => return Err(self.eof_error("']'")),
            }
        }
    }

    fn field_value(&mut self, name: String, out: &mut Vec<Field>) -> Result<(), ParseError> {
        match self.peek()? {
            Some((_, Token::LBrace | Token::LAngle)) => {
                let value = self.message_value()?;
                out.push(Field { name, value });
                Ok(())
            }
            // list shorthand flattens into repeated occurrences
            Some((_, Token::LBracket)) => {
                self.next()?;
                if let Some((_, Token::RBracket)) = self.peek()? {
                    self.next()?;
                    return Ok(());
                }
                loop {
                    let value = self.single_value()?;
                    out.push(Field {
                        name: name.clone(),
                        value,
                    });
                    match self.next()? {
                        Some((_, Token::Comma)) => continue,
                        Some((_, Token::RBracket)) => return Ok(()),
                        Some((pos, tok)) => {
                            return Err(ParseError::new(
                                pos.line,
                                pos.col,
                                format!("expected ',' or ']', found {}", describe(&tok)),
                            ))
                        }
                        None => return Err(self.eof_error("']'")),
                    }
                }
            }
            _ => {
                let value = self.single_value()?;
                out.push(Field { name, value });
                Ok(())
            }
        }
    }

    fn single_value(&mut self) -> Result<FieldValue, ParseError> {
        match self.peek()? {
            Some((_, Token::LBrace | Token::LAngle)) => self.message_value(),
            _ => self.scalar_value(),
        }
    }

    fn message_value(&mut self) -> Result<FieldValue, ParseError> {
        let close = match self.next()? {
            Some((_, Token::LBrace)) => Token::RBrace,
            Some((_, Token::LAngle)) => Token::RAngle,
            Some((pos, tok)) => {
                return Err(ParseError::new(
                    pos.line,
                    pos.col,
                    format!("expected '{{', found {}", describe(&tok)),
                ))
            }
            None => return Err(self.eof_error("'{'")),
        };
        Ok(FieldValue::Message(self.fields(Some(close))?))
    }

    fn scalar_value(&mut self) -> Result<FieldValue, ParseError> {
        match self.next()? {
            Some((_, Token::Str(mut bytes))) => {
                // adjacent string literals concatenate
                while matches!(self.peek()?, Some((_, Token::Str(_)))) {
                    if let Some((_, Token::Str(more))) = self.next()? {
                        bytes.extend_from_slice(&more);
                    }
                }
                Ok(FieldValue::Bytes(bytes))
            }
            Some((_, Token::Int(v))) => Ok(FieldValue::Int(v)),
            Some((_, Token::Uint(v))) => Ok(FieldValue::Uint(v)),
            Some((_, Token::Float(v))) => Ok(FieldValue::Float(v)),
            Some((_, Token::Ident(id))) => Ok(match id.as_str() {
                "true" | "True" | "t" => FieldValue::Bool(true),
                "false" | "False" | "f" => FieldValue::Bool(false),
                "inf" | "infinity" => FieldValue::Float(f64::INFINITY),
                "nan" => FieldValue::Float(f64::NAN),
                _ => FieldValue::Enum(id),
            }),
            Some((pos, tok)) => Err(ParseError::new(
                pos.line,
                pos.col,
                format!("expected value, found {}", describe(&tok)),
            )),
            None => Err(self.eof_error("value")),
        }
    }
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Ident(name) => format!("'{name}'"),
        Token::Str(_) => "string literal".into(),
        Token::Int(_) | Token::Uint(_) | Token::Float(_) => "number".into(),
        Token::LBrace => "'{'".into(),
        Token::RBrace => "'}'".into(),
        Token::LAngle => "'<'".into(),
        Token::RAngle => "'>'".into(),
        Token::LBracket => "'['".into(),
        Token::RBracket => "']'".into(),
        Token::Colon => "':'".into(),
        Token::Comma => "','".into(),
        Token::Semi => "';'".into(),
        Token::Dot => "'.'".into(),
        Token::Slash => "'/'".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(fields: Vec<(&str, FieldValue)>) -> Message {
        Message {
            fields: fields
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.into(),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn scalars_and_nesting() {
        let parsed = parse(r#"name: "basic" section { test { expr: "1" } }"#).unwrap();
        assert_eq!(
            parsed,
            msg(vec![
                ("name", FieldValue::Bytes(b"basic".to_vec())),
                (
                    "section",
                    FieldValue::Message(msg(vec![(
                        "test",
                        FieldValue::Message(msg(vec![(
                            "expr",
                            FieldValue::Bytes(b"1".to_vec())
                        )])),
                    )])),
                ),
            ])
        );
    }

    #[test]
    fn angle_bracket_messages() {
        let parsed = parse("value: < int64_value: 1 >").unwrap();
        assert_eq!(
            parsed,
            msg(vec![(
                "value",
                FieldValue::Message(msg(vec![("int64_value", FieldValue::Int(1))])),
            )])
        );
    }

    #[test]
    fn list_shorthand_flattens() {
        let parsed = parse("a: [1, 2] b: []").unwrap();
        assert_eq!(
            parsed,
            msg(vec![
                ("a", FieldValue::Int(1)),
                ("a", FieldValue::Int(2)),
            ])
        );
    }

    #[test]
    fn adjacent_strings_concatenate() {
        let parsed = parse(r#"s: "foo" 'bar'"#).unwrap();
        assert_eq!(parsed, msg(vec![("s", FieldValue::Bytes(b"foobar".to_vec()))]));
    }

    #[test]
    fn extension_field_names() {
        let parsed = parse("[cel.expr.conformance.proto2.int32_ext]: 42").unwrap();
        assert_eq!(
            parsed,
            msg(vec![(
                "[cel.expr.conformance.proto2.int32_ext]",
                FieldValue::Int(42),
            )])
        );

        let parsed = parse("[type.googleapis.com/google.protobuf.Int32Value] { value: 1 }").unwrap();
        assert_eq!(
            parsed.fields[0].name,
            "[type.googleapis.com/google.protobuf.Int32Value]"
        );
    }

    #[test]
    fn optional_separators() {
        let parsed = parse("a: 1, b: 2; c: 3").unwrap();
        assert_eq!(parsed.fields.len(), 3);
    }

    #[test]
    fn bools_enums_and_specials() {
        let parsed = parse("a: true b: false c: INT64 d: inf").unwrap();
        assert_eq!(
            parsed,
            msg(vec![
                ("a", FieldValue::Bool(true)),
                ("b", FieldValue::Bool(false)),
                ("c", FieldValue::Enum("INT64".into())),
                ("d", FieldValue::Float(f64::INFINITY)),
            ])
        );
    }

    #[test]
    fn unclosed_message_is_an_error() {
        let err = parse("section {").unwrap_err();
        assert!(err.msg.contains("'}'"), "unexpected message: {}", err.msg);
    }

    #[test]
    fn value_in_field_position_is_an_error() {
        let err = parse("a: 1 2").unwrap_err();
        assert!(err.msg.contains("field name"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = parse("a: }").unwrap_err();
        assert!(err.msg.contains("expected value"));
    }
}
