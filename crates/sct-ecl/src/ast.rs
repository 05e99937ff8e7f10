//! ECL abstract syntax tree.
//!
//! The parser produces this tree; evaluation against a terminology
//! service happens elsewhere. The tree follows the shape of the grammar:
//! compound constraints over subexpressions, optional refinement, dotted
//! attribute walks and term/type/dialect filters.

/// A SNOMED CT identifier within an expression.
pub type SctId = u64;

/// A constraint operator prefixing a focus concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// No operator: the concept itself.
    SelfOnly,
    /// `<` descendants, excluding self.
    Descendants,
    /// `<<` descendants or self.
    DescendantsOrSelf,
    /// `<!` immediate children.
    Children,
    /// `>` ancestors, excluding self.
    Ancestors,
    /// `>>` ancestors or self.
    AncestorsOrSelf,
    /// `>!` immediate parents.
    Parents,
    /// `^` members of a reference set.
    MemberOf,
}

/// The focus of a subexpression: a concept or the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// A concrete concept identifier.
    Id(SctId),
    /// `*`, any concept.
    Wildcard,
}

/// Attribute cardinality, e.g. `[1..3]` or `[0..*]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    /// Minimum occurrences (inclusive).
    pub min: u32,
    /// Maximum occurrences (inclusive); `None` for `*`.
    pub max: Option<u32>,
}

impl Cardinality {
    /// Returns true if the given count satisfies this constraint.
    pub fn allows(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

/// A term search inside a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermSearch {
    /// Word-prefix matching (the default, and `match:"..."`).
    Match(String),
    /// Wildcard matching, `wild:"..."`.
    Wildcard(String),
}

/// A description type token inside a type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeToken {
    /// `syn`: synonyms.
    Synonym,
    /// `fsn`: fully specified names.
    Fsn,
    /// `def`: text definitions.
    Definition,
}

/// One filter inside a `{{ ... }}` filter constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `term = "..."` or `term = wild:"..."`.
    Term(TermSearch),
    /// `type = syn` or `type = (syn fsn)`.
    Type(Vec<TypeToken>),
    /// `dialect = (en-GB ...)`.
    Dialect(Vec<String>),
    /// `language = (en ...)`.
    Language(Vec<String>),
}

/// Comparison on the right-hand side of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// `= <subexpression>`.
    Equal(Box<Constraint>),
    /// `!= <subexpression>`.
    NotEqual(Box<Constraint>),
    /// `= #n`, `!= #n`, `< #n`, `<= #n`, `> #n`, `>= #n`.
    Numeric(NumericOp, f64),
    /// `= "..."`.
    StringEqual(String),
    /// `!= "..."`.
    StringNotEqual(String),
}

/// Numeric comparison operator for concrete values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

impl NumericOp {
    /// Applies the comparison to a candidate value.
    pub fn matches(self, candidate: f64, operand: f64) -> bool {
        match self {
            Self::Equal => candidate == operand,
            Self::NotEqual => candidate != operand,
            Self::Less => candidate < operand,
            Self::LessOrEqual => candidate <= operand,
            Self::Greater => candidate > operand,
            Self::GreaterOrEqual => candidate >= operand,
        }
    }
}

/// One attribute constraint inside a refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Optional cardinality, e.g. `[1..3]`.
    pub cardinality: Option<Cardinality>,
    /// True for reversed attributes (`R` prefix).
    pub reversed: bool,
    /// The attribute name constraint (commonly an id or `<< id`).
    pub name: Box<Constraint>,
    /// The value comparison.
    pub comparison: Comparison,
}

/// A refinement: attributes, groups and their boolean combinations.
#[derive(Debug, Clone, PartialEq)]
pub enum Refinement {
    /// A single attribute constraint.
    Attribute(Attribute),
    /// `{ ... }`: an attribute group, with optional group cardinality.
    Group {
        /// Cardinality over matching groups.
        cardinality: Option<Cardinality>,
        /// The refinement inside the braces.
        refinement: Box<Refinement>,
    },
    /// Conjunction of refinements (`AND` / `,`).
    And(Vec<Refinement>),
    /// Disjunction of refinements (`OR`).
    Or(Vec<Refinement>),
}

/// An expression constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `[op] focus [{{ filters }}]`.
    Sub {
        /// The constraint operator.
        operator: Operator,
        /// The focus concept or wildcard.
        focus: Focus,
        /// Trailing filter constraints.
        filters: Vec<Filter>,
    },
    /// A bracketed constraint, with an optional leading operator applied
    /// to the inner result set, and trailing filters.
    Bracketed {
        /// Operator distributed over the bracketed result.
        operator: Operator,
        /// The inner constraint.
        inner: Box<Constraint>,
        /// Trailing filter constraints.
        filters: Vec<Filter>,
    },
    /// Conjunction (`AND` / `,`).
    And(Vec<Constraint>),
    /// Disjunction (`OR`).
    Or(Vec<Constraint>),
    /// Exclusion (`MINUS`), left minus right.
    Minus(Box<Constraint>, Box<Constraint>),
    /// `focus : refinement`.
    Refined {
        /// The focus constraint.
        focus: Box<Constraint>,
        /// The refinement applied to it.
        refinement: Refinement,
    },
    /// `focus . attr . attr ...`: reverse attribute walk.
    Dotted {
        /// The starting constraint.
        focus: Box<Constraint>,
        /// Attribute selectors applied left to right.
        steps: Vec<Constraint>,
    },
}

impl Constraint {
    /// Convenience constructor for a bare concept constraint.
    pub fn id(id: SctId) -> Self {
        Self::Sub {
            operator: Operator::SelfOnly,
            focus: Focus::Id(id),
            filters: Vec::new(),
        }
    }
}
