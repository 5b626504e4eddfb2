//! # condconf - conditional configuration
//!
//! A small language to compute variables and select parts of a configuration file based on them.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `condconf` works internally.
//!
//! ### The language
//!
//! A file has up to three parts:
//! - an optional assignment block enclosed in `{` and `}`. It must be the first thing in the file
//! - default lines, which are always part of the output
//! - sections: a predicate header `[ expression ]` on its own line, followed by raw lines
//!
//! ```text
//! # lines starting with `#` are comments inside the block and in headers
//! {
//!     var1 = (extvar1 == "foobar")
//!     var2 = var1 and "baz" in extvar2
//! }
//! default line, always included
//! [var2 or extvar1 == "quux"]
//! included when the predicate is truthy
//! [not var1]
//! raw lines are never interpreted
//! ```
//!
//! Raw lines (everything that is neither part of the block nor a header) are copied verbatim.
//!
//! ### Loading
//!
//! Text from a string, a reader or a file ends up as a [source::Source]. The whole source is held in memory.
//!
//! ### Parsing
//!
//! see [parser::parse]
//!
//! The [lexer::Lexer] has two modes. Inside the assignment block and in headers it produces [token::Token]s, for
//! all other lines it hands out the raw text of the line. A line is a header when its first non-blank character
//! is `[`. Inside the block newlines are whitespace, in headers a newline ends the header.
//!
//! The parser is a recursive descent parser building [ast::Expression] trees. The result is an
//! [ast::ParsedConfig]: ordered assignments, default lines and ordered sections.
//!
//! ### Validation
//!
//! Every variable must be defined before it is read:
//! - an assignment may read external variables and targets of earlier assignments
//! - a predicate may read every variable that exists after all assignments ran
//!
//! Undefined variables are reported with every occurrence ([token::VariableToken] carries the position).
//!
//! ### Evaluation
//!
//! [config::RawConditionalConfig] bundles parsing and validation. Once constructed it can be evaluated any number
//! of times:
//! 1. check that the context provides a value for every external variable
//! 2. run assignments in order on top of the context
//! 3. evaluate each predicate, select sections whose predicate is truthy
//!
//! ### Output
//!
//! Variables are [value::Value]s which in turn get serialized via [serde].
//!
pub mod ast;
pub mod config;
pub mod error;
mod eval;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;
pub mod validate;
pub mod value;
mod visit;
