//! SNOMED Compositional Grammar parser.
//!
//! Parses postcoordinated expressions such as
//! `73211009 |Diabetes mellitus| : 363698007 |Finding site| = 113331007`
//! to an AST of focus concepts plus ungrouped and grouped refinements.
//! Used for client-side expression normalisation only; nothing here
//! touches the store.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ast::SctId;
use crate::error::ScgError;

/// Definition status prefix of an SCG expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefinitionStatus {
    /// `===`: equivalent to (the default).
    #[default]
    EquivalentTo,
    /// `<<<`: subtype of.
    SubtypeOf,
}

/// A concept reference with an optional discarded term annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConceptRef {
    /// The concept identifier.
    pub id: SctId,
}

/// The value of an SCG attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ScgValue {
    /// A concept value.
    Concept(ConceptRef),
    /// A nested subexpression value.
    Expression(Box<ScgSubExpression>),
    /// A `#` numeric literal.
    Number(f64),
    /// A quoted string literal.
    String(String),
}

/// One `name = value` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ScgAttribute {
    /// The attribute type concept.
    pub name: ConceptRef,
    /// The attribute value.
    pub value: ScgValue,
}

/// Focus concepts plus refinements.
#[derive(Debug, Clone, PartialEq)]
pub struct ScgSubExpression {
    /// One or more focus concepts, `+`-separated.
    pub focus_concepts: Vec<ConceptRef>,
    /// Ungrouped attributes.
    pub attributes: Vec<ScgAttribute>,
    /// Attribute groups, in source order.
    pub groups: Vec<Vec<ScgAttribute>>,
}

/// A complete SCG expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ScgExpression {
    /// Equivalence or subtype marker.
    pub definition_status: DefinitionStatus,
    /// The expression body.
    pub subexpression: ScgSubExpression,
}

/// Parses an SCG expression.
///
/// # Examples
///
/// ```
/// use sct_ecl::parse_scg;
///
/// let parsed = parse_scg(
///     "73211009 |Diabetes mellitus| : 363698007 |Finding site| = 113331007",
/// )
/// .unwrap();
/// assert_eq!(parsed.subexpression.focus_concepts[0].id, 73211009);
/// assert_eq!(parsed.subexpression.attributes.len(), 1);
/// ```
pub fn parse_scg(input: &str) -> Result<ScgExpression, ScgError> {
    match all_consuming(delimited(multispace0, expression, multispace0))(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ScgError {
            position: input.len() - e.input.len(),
            reason: format!("unexpected input near {:?}", &e.input[..e.input.len().min(24)]),
        }),
        Err(nom::Err::Incomplete(_)) => Err(ScgError {
            position: input.len(),
            reason: "incomplete expression".to_string(),
        }),
    }
}

fn concept_ref(i: &str) -> IResult<&str, ConceptRef> {
    map(
        terminated(
            map_res(digit1, |s: &str| s.parse::<u64>()),
            opt(preceded(
                multispace0,
                delimited(char('|'), take_until("|"), char('|')),
            )),
        ),
        |id| ConceptRef { id },
    )(i)
}

fn number(i: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(i)
}

fn value(i: &str) -> IResult<&str, ScgValue> {
    alt((
        map(preceded(char('#'), number), ScgValue::Number),
        map(
            delimited(char('"'), take_until("\""), char('"')),
            |s: &str| ScgValue::String(s.to_string()),
        ),
        map(
            delimited(
                pair(char('('), multispace0),
                subexpression,
                pair(multispace0, char(')')),
            ),
            |sub| ScgValue::Expression(Box::new(sub)),
        ),
        map(concept_ref, ScgValue::Concept),
    ))(i)
}

fn attribute(i: &str) -> IResult<&str, ScgAttribute> {
    map(
        tuple((
            concept_ref,
            delimited(multispace0, char('='), multispace0),
            value,
        )),
        |(name, _, value)| ScgAttribute { name, value },
    )(i)
}

fn attribute_set(i: &str) -> IResult<&str, Vec<ScgAttribute>> {
    separated_list1(
        delimited(multispace0, char(','), multispace0),
        attribute,
    )(i)
}

fn attribute_group(i: &str) -> IResult<&str, Vec<ScgAttribute>> {
    delimited(
        pair(char('{'), multispace0),
        attribute_set,
        pair(multispace0, char('}')),
    )(i)
}

fn grouped_tail(i: &str) -> IResult<&str, Vec<Vec<ScgAttribute>>> {
    many0(preceded(
        opt(delimited(multispace0, char(','), multispace0)),
        preceded(multispace0, attribute_group),
    ))(i)
}

/// Refinement: an attribute set and/or one or more groups; never empty.
fn refinement(i: &str) -> IResult<&str, (Vec<ScgAttribute>, Vec<Vec<ScgAttribute>>)> {
    alt((
        map(pair(attribute_set, grouped_tail), |(attrs, groups)| {
            (attrs, groups)
        }),
        map(
            pair(attribute_group, grouped_tail),
            |(first, mut groups)| {
                groups.insert(0, first);
                (Vec::new(), groups)
            },
        ),
    ))(i)
}

fn subexpression(i: &str) -> IResult<&str, ScgSubExpression> {
    let (i, focus_concepts) = separated_list1(
        delimited(multispace0, char('+'), multispace0),
        concept_ref,
    )(i)?;
    let (i, refined) = opt(preceded(
        delimited(multispace0, char(':'), multispace0),
        refinement,
    ))(i)?;
    let (attributes, groups) = refined.unwrap_or_default();
    Ok((
        i,
        ScgSubExpression {
            focus_concepts,
            attributes,
            groups,
        },
    ))
}

fn expression(i: &str) -> IResult<&str, ScgExpression> {
    map(
        pair(
            opt(terminated(
                alt((
                    map(tag("==="), |_| DefinitionStatus::EquivalentTo),
                    map(tag("<<<"), |_| DefinitionStatus::SubtypeOf),
                )),
                multispace0,
            )),
            subexpression,
        ),
        |(status, subexpression)| ScgExpression {
            definition_status: status.unwrap_or_default(),
            subexpression,
        },
    )(i)
}
