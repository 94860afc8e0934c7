// Section parser for number format strings
//
// Grammar:
//   format    := section (';' section)*
//   section   := piece*
//   piece     := '[' condition ']' | '[' anything ']' | '"' text '"' | '\' char
//              | '0' | '#' | '.' | ',' | '%' | char

use super::ast::{Condition, ConditionOp, FormatSection, FormatToken, NumberFormat};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until},
    character::complete::{anychar, char, none_of, space0},
    combinator::{all_consuming, map, value},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded, tuple},
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Condition(Condition),
    Token(FormatToken),
    /// Color tags and other bracketed directives we do not render
    Ignored,
}

fn condition_op(input: &str) -> IResult<&str, ConditionOp> {
    alt((
        value(ConditionOp::Ge, tag(">=")),
        value(ConditionOp::Le, tag("<=")),
        value(ConditionOp::Ne, tag("<>")),
        value(ConditionOp::Gt, tag(">")),
        value(ConditionOp::Lt, tag("<")),
        value(ConditionOp::Eq, tag("=")),
    ))(input)
}

/// `=null`, `>=100`, `< -5.5`
fn condition(input: &str) -> IResult<&str, Condition> {
    alt((
        value(
            Condition::Null,
            preceded(char('='), preceded(space0, tag_no_case("null"))),
        ),
        map(
            tuple((condition_op, space0, double)),
            |(op, _, bound)| Condition::Compare(op, bound),
        ),
    ))(input)
}

fn bracket(input: &str) -> IResult<&str, Piece> {
    let (rest, content) = delimited(char('['), take_until("]"), char(']'))(input)?;
    let piece = match all_consuming(delimited(space0, condition, space0))(content) {
        Ok((_, c)) => Piece::Condition(c),
        Err(_) => Piece::Ignored,
    };
    Ok((rest, piece))
}

fn literal(input: &str) -> IResult<&str, FormatToken> {
    alt((
        map(delimited(char('"'), take_until("\""), char('"')), |s: &str| {
            FormatToken::Literal(s.to_string())
        }),
        map(preceded(char('\\'), anychar), |c| {
            FormatToken::Literal(c.to_string())
        }),
        map(none_of(";[\""), |c| FormatToken::Literal(c.to_string())),
    ))(input)
}

fn token(input: &str) -> IResult<&str, FormatToken> {
    alt((
        value(FormatToken::DigitZero, char('0')),
        value(FormatToken::DigitHash, char('#')),
        value(FormatToken::DecimalPoint, char('.')),
        value(FormatToken::Comma, char(',')),
        value(FormatToken::Percent, char('%')),
        literal,
    ))(input)
}

fn piece(input: &str) -> IResult<&str, Piece> {
    alt((bracket, map(token, Piece::Token)))(input)
}

fn section(input: &str) -> IResult<&str, FormatSection> {
    let (input, pieces) = many0(piece)(input)?;

    let mut section = FormatSection::default();
    for p in pieces {
        match p {
            Piece::Condition(c) => section.condition = Some(c),
            Piece::Ignored => {}
            Piece::Token(FormatToken::Literal(text)) => match section.tokens.last_mut() {
                // merge adjacent literal runs
                Some(FormatToken::Literal(prev)) => prev.push_str(&text),
                _ => section.tokens.push(FormatToken::Literal(text)),
            },
            Piece::Token(t) => section.tokens.push(t),
        }
    }
    Ok((input, section))
}

/// Parse a complete format string
/// Format: section | section;section | section;section;section
pub fn parse_number_format(input: &str) -> IResult<&str, NumberFormat> {
    map(
        all_consuming(separated_list1(char(';'), section)),
        |sections| NumberFormat { sections },
    )(input)
}
