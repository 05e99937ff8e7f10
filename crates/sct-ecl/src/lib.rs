//! # sct-ecl
//!
//! Parsers for the SNOMED CT Expression Constraint Language (ECL) and
//! the SNOMED Compositional Grammar (SCG).
//!
//! Both parsers are grammar-driven over nom combinators and fully
//! store-agnostic: they produce ASTs that a terminology service evaluates
//! elsewhere. Syntax failures are typed values carrying the byte offset
//! of the failure.
//!
//! ## Usage
//!
//! ```
//! use sct_ecl::{parse_ecl, valid_ecl};
//!
//! let constraint = parse_ecl("<< 73211009 AND << 404684003").unwrap();
//! assert!(valid_ecl("^ 700043003"));
//! assert!(!valid_ecl("<< "));
//! # let _ = constraint;
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod parser;
pub mod scg;

pub use ast::{
    Attribute, Cardinality, Comparison, Constraint, Filter, Focus, NumericOp, Operator,
    Refinement, SctId, TermSearch, TypeToken,
};
pub use error::{EclError, ScgError};
pub use parser::{parse_ecl, valid_ecl};
pub use scg::{parse_scg, ScgExpression};
