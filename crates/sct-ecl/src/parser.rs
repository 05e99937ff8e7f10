//! Grammar-driven ECL parser.
//!
//! Recursive-descent over nom combinators. Operator precedence, loosest
//! first: MINUS, OR, AND/comma, then refinement and dotted walks, then
//! the subexpression itself. Keywords are case-insensitive; whitespace is
//! free between tokens.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ast::{
    Attribute, Cardinality, Comparison, Constraint, Filter, Focus, NumericOp, Operator,
    Refinement, SctId, TermSearch, TypeToken,
};
use crate::error::EclError;

/// Parses an ECL expression constraint to its AST.
///
/// # Examples
///
/// ```
/// use sct_ecl::{parse_ecl, Constraint, Focus, Operator};
///
/// let constraint = parse_ecl("<< 73211009 |Diabetes mellitus|").unwrap();
/// assert_eq!(
///     constraint,
///     Constraint::Sub {
///         operator: Operator::DescendantsOrSelf,
///         focus: Focus::Id(73211009),
///         filters: vec![],
///     }
/// );
/// ```
pub fn parse_ecl(input: &str) -> Result<Constraint, EclError> {
    match all_consuming(ws(expression))(input) {
        Ok((_, constraint)) => Ok(constraint),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(EclError {
            position: input.len() - e.input.len(),
            reason: format!("unexpected input near {:?}", truncate(e.input)),
        }),
        Err(nom::Err::Incomplete(_)) => Err(EclError {
            position: input.len(),
            reason: "incomplete expression".to_string(),
        }),
    }
}

/// Returns true when the input parses as an expression constraint,
/// without evaluating it.
pub fn valid_ecl(input: &str) -> bool {
    parse_ecl(input).is_ok()
}

fn truncate(s: &str) -> &str {
    &s[..s.len().min(24)]
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

fn concept_id(i: &str) -> IResult<&str, SctId> {
    map_res(digit1, |s: &str| s.parse::<u64>())(i)
}

/// `|Multiple sclerosis|` annotations are recognised and discarded.
fn term_annotation(i: &str) -> IResult<&str, &str> {
    delimited(char('|'), take_until("|"), char('|'))(i)
}

fn concept_reference(i: &str) -> IResult<&str, SctId> {
    terminated(concept_id, opt(preceded(multispace0, term_annotation)))(i)
}

fn operator(i: &str) -> IResult<&str, Operator> {
    alt((
        value(Operator::DescendantsOrSelf, tag("<<")),
        value(Operator::Children, tag("<!")),
        value(Operator::Descendants, tag("<")),
        value(Operator::AncestorsOrSelf, tag(">>")),
        value(Operator::Parents, tag(">!")),
        value(Operator::Ancestors, tag(">")),
        value(Operator::MemberOf, tag("^")),
    ))(i)
}

fn focus(i: &str) -> IResult<&str, Focus> {
    alt((
        value(Focus::Wildcard, char('*')),
        map(concept_reference, Focus::Id),
    ))(i)
}

fn integer(i: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(i)
}

fn decimal(i: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(i)
}

fn quoted(i: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_until("\""), char('"')),
        |s: &str| s.to_string(),
    )(i)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn term_search(i: &str) -> IResult<&str, TermSearch> {
    alt((
        map(preceded(tag_no_case("wild:"), quoted), TermSearch::Wildcard),
        map(preceded(tag_no_case("match:"), quoted), TermSearch::Match),
        map(quoted, TermSearch::Match),
    ))(i)
}

fn equals(i: &str) -> IResult<&str, ()> {
    value((), tuple((multispace0, char('='), multispace0)))(i)
}

fn term_filter(i: &str) -> IResult<&str, Filter> {
    map(
        preceded(pair(tag_no_case("term"), equals), term_search),
        Filter::Term,
    )(i)
}

fn type_token(i: &str) -> IResult<&str, TypeToken> {
    alt((
        value(TypeToken::Synonym, tag_no_case("syn")),
        value(TypeToken::Fsn, tag_no_case("fsn")),
        value(TypeToken::Definition, tag_no_case("def")),
    ))(i)
}

fn type_filter(i: &str) -> IResult<&str, Filter> {
    map(
        preceded(
            pair(tag_no_case("type"), equals),
            alt((
                map(type_token, |t| vec![t]),
                delimited(char('('), many1(ws(type_token)), char(')')),
            )),
        ),
        Filter::Type,
    )(i)
}

fn locale_alias(i: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'),
        |s: &str| s.to_string(),
    )(i)
}

fn dialect_filter(i: &str) -> IResult<&str, Filter> {
    map(
        preceded(
            pair(tag_no_case("dialect"), equals),
            alt((
                delimited(char('('), many1(ws(locale_alias)), char(')')),
                map(locale_alias, |a| vec![a]),
            )),
        ),
        Filter::Dialect,
    )(i)
}

fn language_filter(i: &str) -> IResult<&str, Filter> {
    map(
        preceded(
            pair(tag_no_case("language"), equals),
            alt((
                delimited(char('('), many1(ws(locale_alias)), char(')')),
                map(locale_alias, |a| vec![a]),
            )),
        ),
        Filter::Language,
    )(i)
}

fn filter(i: &str) -> IResult<&str, Filter> {
    alt((term_filter, type_filter, dialect_filter, language_filter))(i)
}

fn filter_constraint(i: &str) -> IResult<&str, Vec<Filter>> {
    delimited(
        pair(tag("{{"), multispace0),
        separated_list1(ws(char(',')), filter),
        pair(multispace0, tag("}}")),
    )(i)
}

// ---------------------------------------------------------------------------
// Refinements
// ---------------------------------------------------------------------------

fn cardinality(i: &str) -> IResult<&str, Cardinality> {
    delimited(
        char('['),
        map(
            tuple((
                ws(integer),
                tag(".."),
                ws(alt((value(None, char('*')), map(integer, Some)))),
            )),
            |(min, _, max)| Cardinality { min, max },
        ),
        char(']'),
    )(i)
}

fn comparison(i: &str) -> IResult<&str, Comparison> {
    alt((
        map(
            tuple((
                alt((
                    value(NumericOp::LessOrEqual, tag("<=")),
                    value(NumericOp::GreaterOrEqual, tag(">=")),
                    value(NumericOp::NotEqual, tag("!=")),
                    value(NumericOp::Less, tag("<")),
                    value(NumericOp::Greater, tag(">")),
                    value(NumericOp::Equal, tag("=")),
                )),
                multispace0,
                char('#'),
                decimal,
            )),
            |(op, _, _, operand)| Comparison::Numeric(op, operand),
        ),
        map(
            preceded(pair(tag("!="), multispace0), quoted),
            Comparison::StringNotEqual,
        ),
        map(
            preceded(pair(tag("="), multispace0), quoted),
            Comparison::StringEqual,
        ),
        map(preceded(pair(tag("!="), multispace0), primary), |c| {
            Comparison::NotEqual(Box::new(c))
        }),
        map(preceded(pair(tag("="), multispace0), primary), |c| {
            Comparison::Equal(Box::new(c))
        }),
    ))(i)
}

fn attribute(i: &str) -> IResult<&str, Attribute> {
    map(
        tuple((
            opt(terminated(cardinality, multispace0)),
            opt(terminated(char('R'), multispace1)),
            sub_expression,
            ws(comparison),
        )),
        |(cardinality, reversed, name, comparison)| Attribute {
            cardinality,
            reversed: reversed.is_some(),
            name: Box::new(name),
            comparison,
        },
    )(i)
}

fn attribute_group(i: &str) -> IResult<&str, Refinement> {
    map(
        pair(
            opt(terminated(cardinality, multispace0)),
            delimited(pair(char('{'), multispace0), refinement, pair(multispace0, char('}'))),
        ),
        |(cardinality, inner)| Refinement::Group {
            cardinality,
            refinement: Box::new(inner),
        },
    )(i)
}

fn refinement_item(i: &str) -> IResult<&str, Refinement> {
    alt((attribute_group, map(attribute, Refinement::Attribute)))(i)
}

fn refinement_conjunction(i: &str) -> IResult<&str, Refinement> {
    map(
        separated_list1(
            ws(alt((value((), tag_no_case("AND")), value((), char(','))))),
            refinement_item,
        ),
        |mut items| {
            if items.len() == 1 {
                items.remove(0)
            } else {
                Refinement::And(items)
            }
        },
    )(i)
}

fn refinement(i: &str) -> IResult<&str, Refinement> {
    map(
        separated_list1(ws(tag_no_case("OR")), refinement_conjunction),
        |mut items| {
            if items.len() == 1 {
                items.remove(0)
            } else {
                Refinement::Or(items)
            }
        },
    )(i)
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn sub_expression(i: &str) -> IResult<&str, Constraint> {
    map(
        tuple((
            opt(terminated(operator, multispace0)),
            focus,
            many0(preceded(multispace0, filter_constraint)),
        )),
        |(operator, focus, filters)| Constraint::Sub {
            operator: operator.unwrap_or(Operator::SelfOnly),
            focus,
            filters: filters.into_iter().flatten().collect(),
        },
    )(i)
}

fn bracketed(i: &str) -> IResult<&str, Constraint> {
    map(
        tuple((
            opt(terminated(operator, multispace0)),
            delimited(pair(char('('), multispace0), expression, pair(multispace0, char(')'))),
            many0(preceded(multispace0, filter_constraint)),
        )),
        |(operator, inner, filters)| Constraint::Bracketed {
            operator: operator.unwrap_or(Operator::SelfOnly),
            inner: Box::new(inner),
            filters: filters.into_iter().flatten().collect(),
        },
    )(i)
}

fn primary(i: &str) -> IResult<&str, Constraint> {
    alt((bracketed, sub_expression))(i)
}

fn postfix(i: &str) -> IResult<&str, Constraint> {
    let (i, base) = primary(i)?;
    let (i, steps) = many0(preceded(ws(char('.')), sub_expression))(i)?;
    let base = if steps.is_empty() {
        base
    } else {
        Constraint::Dotted {
            focus: Box::new(base),
            steps,
        }
    };
    let (i, refined) = opt(preceded(ws(char(':')), refinement))(i)?;
    Ok((
        i,
        match refined {
            Some(refinement) => Constraint::Refined {
                focus: Box::new(base),
                refinement,
            },
            None => base,
        },
    ))
}

fn conjunction(i: &str) -> IResult<&str, Constraint> {
    map(
        separated_list1(
            ws(alt((
                value((), terminated(tag_no_case("AND"), multispace1)),
                value((), char(',')),
            ))),
            postfix,
        ),
        |mut items| {
            if items.len() == 1 {
                items.remove(0)
            } else {
                Constraint::And(items)
            }
        },
    )(i)
}

fn disjunction(i: &str) -> IResult<&str, Constraint> {
    map(
        separated_list1(
            ws(terminated(tag_no_case("OR"), multispace1)),
            conjunction,
        ),
        |mut items| {
            if items.len() == 1 {
                items.remove(0)
            } else {
                Constraint::Or(items)
            }
        },
    )(i)
}

fn expression(i: &str) -> IResult<&str, Constraint> {
    let (i, first) = disjunction(i)?;
    let (i, rest) = many0(preceded(
        ws(terminated(tag_no_case("MINUS"), multispace1)),
        disjunction,
    ))(i)?;
    Ok((
        i,
        rest.into_iter().fold(first, |acc, operand| {
            Constraint::Minus(Box::new(acc), Box::new(operand))
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(operator: Operator, id: SctId) -> Constraint {
        Constraint::Sub {
            operator,
            focus: Focus::Id(id),
            filters: vec![],
        }
    }

    #[test]
    fn test_parse_self() {
        assert_eq!(parse_ecl("73211009").unwrap(), sub(Operator::SelfOnly, 73211009));
    }

    #[test]
    fn test_parse_descendants() {
        assert_eq!(parse_ecl("< 73211009").unwrap(), sub(Operator::Descendants, 73211009));
        assert_eq!(
            parse_ecl("<<73211009").unwrap(),
            sub(Operator::DescendantsOrSelf, 73211009)
        );
    }

    #[test]
    fn test_parse_ancestors_and_children() {
        assert_eq!(parse_ecl(">> 46635009").unwrap(), sub(Operator::AncestorsOrSelf, 46635009));
        assert_eq!(parse_ecl("> 46635009").unwrap(), sub(Operator::Ancestors, 46635009));
        assert_eq!(parse_ecl("<! 73211009").unwrap(), sub(Operator::Children, 73211009));
        assert_eq!(parse_ecl(">! 73211009").unwrap(), sub(Operator::Parents, 73211009));
    }

    #[test]
    fn test_parse_member_of() {
        assert_eq!(parse_ecl("^ 700043003").unwrap(), sub(Operator::MemberOf, 700043003));
    }

    #[test]
    fn test_parse_wildcard() {
        assert_eq!(
            parse_ecl("*").unwrap(),
            Constraint::Sub {
                operator: Operator::SelfOnly,
                focus: Focus::Wildcard,
                filters: vec![],
            }
        );
    }

    #[test]
    fn test_term_annotations_are_discarded() {
        assert_eq!(
            parse_ecl("<< 73211009 |Diabetes mellitus (disorder)|").unwrap(),
            sub(Operator::DescendantsOrSelf, 73211009)
        );
    }

    #[test]
    fn test_parse_and_or_minus() {
        assert_eq!(
            parse_ecl("<< 404684003 AND << 73211009").unwrap(),
            Constraint::And(vec![
                sub(Operator::DescendantsOrSelf, 404684003),
                sub(Operator::DescendantsOrSelf, 73211009),
            ])
        );
        assert_eq!(
            parse_ecl("< 19829001 OR < 301867009").unwrap(),
            Constraint::Or(vec![
                sub(Operator::Descendants, 19829001),
                sub(Operator::Descendants, 301867009),
            ])
        );
        assert_eq!(
            parse_ecl("<< 404684003 MINUS << 73211009").unwrap(),
            Constraint::Minus(
                Box::new(sub(Operator::DescendantsOrSelf, 404684003)),
                Box::new(sub(Operator::DescendantsOrSelf, 73211009)),
            )
        );
    }

    #[test]
    fn test_comma_is_conjunction() {
        assert_eq!(
            parse_ecl("73211009 , 46635009").unwrap(),
            Constraint::And(vec![
                sub(Operator::SelfOnly, 73211009),
                sub(Operator::SelfOnly, 46635009),
            ])
        );
    }

    #[test]
    fn test_keyword_case_insensitive() {
        assert!(parse_ecl("<< 404684003 and << 73211009").is_ok());
        assert!(parse_ecl("<< 404684003 minus << 73211009").is_ok());
    }

    #[test]
    fn test_brackets() {
        let parsed = parse_ecl("(<< 404684003 MINUS << 73211009) AND << 64572001").unwrap();
        match parsed {
            Constraint::And(items) => {
                assert!(matches!(items[0], Constraint::Bracketed { .. }));
            }
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_refinement_single_attribute() {
        let parsed = parse_ecl("< 19829001: 116676008 = 79654002").unwrap();
        match parsed {
            Constraint::Refined { focus, refinement } => {
                assert_eq!(*focus, sub(Operator::Descendants, 19829001));
                match refinement {
                    Refinement::Attribute(attr) => {
                        assert_eq!(*attr.name, sub(Operator::SelfOnly, 116676008));
                        assert_eq!(
                            attr.comparison,
                            Comparison::Equal(Box::new(sub(Operator::SelfOnly, 79654002)))
                        );
                        assert!(!attr.reversed);
                        assert_eq!(attr.cardinality, None);
                    }
                    other => panic!("expected attribute, got {other:?}"),
                }
            }
            other => panic!("expected refinement, got {other:?}"),
        }
    }

    #[test]
    fn test_refinement_with_subsumed_value() {
        let parsed = parse_ecl("< 404684003: 363698007 = << 39057004").unwrap();
        match parsed {
            Constraint::Refined { refinement, .. } => match refinement {
                Refinement::Attribute(attr) => {
                    assert_eq!(
                        attr.comparison,
                        Comparison::Equal(Box::new(sub(Operator::DescendantsOrSelf, 39057004)))
                    );
                }
                other => panic!("expected attribute, got {other:?}"),
            },
            other => panic!("expected refinement, got {other:?}"),
        }
    }

    #[test]
    fn test_refinement_cardinality_and_group() {
        let parsed = parse_ecl("< 404684003: [1..3] { 363698007 = << 39057004 }").unwrap();
        match parsed {
            Constraint::Refined { refinement, .. } => match refinement {
                Refinement::Group { cardinality, .. } => {
                    assert_eq!(cardinality, Some(Cardinality { min: 1, max: Some(3) }));
                }
                other => panic!("expected group, got {other:?}"),
            },
            other => panic!("expected refinement, got {other:?}"),
        }
    }

    #[test]
    fn test_refinement_conjunction() {
        let parsed =
            parse_ecl("< 404684003: 363698007 = << 39057004, 116676008 = << 415582006").unwrap();
        match parsed {
            Constraint::Refined { refinement, .. } => {
                assert!(matches!(refinement, Refinement::And(items) if items.len() == 2));
            }
            other => panic!("expected refinement, got {other:?}"),
        }
    }

    #[test]
    fn test_concrete_value_comparison() {
        let parsed = parse_ecl("< 27658006: 1142135004 >= #500").unwrap();
        match parsed {
            Constraint::Refined { refinement, .. } => match refinement {
                Refinement::Attribute(attr) => {
                    assert_eq!(
                        attr.comparison,
                        Comparison::Numeric(NumericOp::GreaterOrEqual, 500.0)
                    );
                }
                other => panic!("expected attribute, got {other:?}"),
            },
            other => panic!("expected refinement, got {other:?}"),
        }
    }

    #[test]
    fn test_string_comparison() {
        let parsed = parse_ecl("< 27658006: 1142139005 = \"mg\"").unwrap();
        match parsed {
            Constraint::Refined { refinement, .. } => match refinement {
                Refinement::Attribute(attr) => {
                    assert_eq!(attr.comparison, Comparison::StringEqual("mg".to_string()));
                }
                other => panic!("expected attribute, got {other:?}"),
            },
            other => panic!("expected refinement, got {other:?}"),
        }
    }

    #[test]
    fn test_dotted_attribute_walk() {
        let parsed = parse_ecl("< 19829001 . 116676008").unwrap();
        match parsed {
            Constraint::Dotted { focus, steps } => {
                assert_eq!(*focus, sub(Operator::Descendants, 19829001));
                assert_eq!(steps, vec![sub(Operator::SelfOnly, 116676008)]);
            }
            other => panic!("expected dotted walk, got {other:?}"),
        }
    }

    #[test]
    fn test_term_filter() {
        let parsed = parse_ecl("< 64572001 {{ term = \"heart att\" }}").unwrap();
        match parsed {
            Constraint::Sub { filters, .. } => {
                assert_eq!(
                    filters,
                    vec![Filter::Term(TermSearch::Match("heart att".to_string()))]
                );
            }
            other => panic!("expected subexpression, got {other:?}"),
        }
    }

    #[test]
    fn test_term_type_dialect_filters() {
        let parsed = parse_ecl(
            "< 64572001 {{ term = \"mult scl\", type = syn, dialect = (en-GB) }}",
        )
        .unwrap();
        match parsed {
            Constraint::Sub { filters, .. } => {
                assert_eq!(filters.len(), 3);
                assert_eq!(filters[1], Filter::Type(vec![TypeToken::Synonym]));
                assert_eq!(filters[2], Filter::Dialect(vec!["en-GB".to_string()]));
            }
            other => panic!("expected subexpression, got {other:?}"),
        }
    }

    #[test]
    fn test_wildcard_term_filter() {
        let parsed = parse_ecl("< 64572001 {{ term = wild:\"mult*\" }}").unwrap();
        match parsed {
            Constraint::Sub { filters, .. } => {
                assert_eq!(
                    filters,
                    vec![Filter::Term(TermSearch::Wildcard("mult*".to_string()))]
                );
            }
            other => panic!("expected subexpression, got {other:?}"),
        }
    }

    #[test]
    fn test_syntax_errors_have_positions() {
        let err = parse_ecl("<< ").unwrap_err();
        assert!(err.position <= 3);

        let err = parse_ecl("<< 73211009 AND").unwrap_err();
        assert!(err.position > 0);

        assert!(parse_ecl("").is_err());
        assert!(parse_ecl("band").is_err());
    }

    #[test]
    fn test_valid_ecl_predicate() {
        assert!(valid_ecl("<< 73211009"));
        assert!(valid_ecl("^ 700043003 {{ term = \"x\" }}"));
        assert!(!valid_ecl("<<"));
        assert!(!valid_ecl("73211009 AND"));
    }
}
