//! AWQL Query Language
//!
//! Front end of the query pipeline:
//!
//! - **Lexer**: query text into classified tokens
//! - **Parser**: tokens into one of four statements
//! - **AST**: statement types and their stringers
//! - **Dates**: DURING literals and their resolution
//!
//! # Query Language
//!
//! ```text
//! SELECT field(,field)* FROM name [WHERE cond(AND cond)*] [DURING lit|date,date]
//!   [GROUP BY ref(,ref)*] [ORDER BY ref[DESC](,ref[DESC])*] [LIMIT [off,]n] [;|\G]
//! DESC|DESCRIBE [FULL] name [column] [;|\G]
//! SHOW [FULL] TABLES [LIKE 'pattern'] [WITH column] [;|\G]
//! CREATE [OR REPLACE] VIEW name [(col,...)] AS <select-statement>
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use awql::query::{parse_statement, Statement};
//!
//! let stmt = parse_statement("SELECT CampaignName, SUM(Cost) FROM CAMPAIGN_PERFORMANCE_REPORT GROUP BY 1")?;
//! if let Statement::Select(select) = stmt {
//!     assert_eq!(select.legacy_string(), "SELECT CampaignName, Cost FROM CAMPAIGN_PERFORMANCE_REPORT");
//! }
//! ```

mod ast;
mod dates;
mod error;
mod lexer;
mod parser;
mod token;

pub use ast::{
    quote, AggregateFunction, Column, ColumnPosition, Condition, CreateViewStatement,
    DescribeStatement, During, DynamicColumn, LikePattern, Limit, Operator, Order,
    SelectStatement, ShowStatement, Statement, Terminator, STAR,
};
pub use dates::{parse_date, DateRangeLiteral, DATE_LAYOUT};
pub use error::{ErrorCode, ParseError, ParseResult};
pub use lexer::Lexer;
pub use parser::{parse, parse_statement, Parser};
pub use token::{Token, TokenKind};
