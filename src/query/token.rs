//! Lexical tokens
//!
//! Token kinds produced by the lexer, the reserved keyword table and the
//! character classes shared by the lexer and the parser.

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Unknown rune or unterminated quoted string
    Illegal,
    /// End of the input
    End,
    Whitespace,

    // Literals
    Identifier,
    /// Literal containing a `.`, like `1.5x` or `ad.group`
    ValueLiteral,
    /// Quoted string, quotes stripped and escapes decoded
    String,
    Digit,
    Decimal,

    // Punctuation
    Asterisk,
    Comma,
    Semicolon,
    LeftParenthesis,
    RightParenthesis,
    LeftSquareBracket,
    RightSquareBracket,
    /// `\G` or `\g`, vertical output modifier
    Vertical,

    // Operators
    Equal,
    Different,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    In,
    NotIn,
    StartsWith,
    StartsWithIgnoreCase,
    Contains,
    ContainsIgnoreCase,
    DoesNotContain,
    DoesNotContainIgnoreCase,

    // Keywords
    Describe,
    Select,
    Create,
    Replace,
    View,
    Show,
    Full,
    Tables,
    Distinct,
    As,
    From,
    Where,
    Like,
    With,
    And,
    Or,
    During,
    Group,
    Order,
    By,
    Asc,
    Desc,
    Limit,
}

impl TokenKind {
    /// Look up a reserved word, case-insensitively
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word.to_ascii_uppercase().as_str() {
            "DESCRIBE" => Self::Describe,
            "SELECT" => Self::Select,
            "CREATE" => Self::Create,
            "REPLACE" => Self::Replace,
            "VIEW" => Self::View,
            "SHOW" => Self::Show,
            "FULL" => Self::Full,
            "TABLES" => Self::Tables,
            "DISTINCT" => Self::Distinct,
            "AS" => Self::As,
            "FROM" => Self::From,
            "WHERE" => Self::Where,
            "LIKE" => Self::Like,
            "WITH" => Self::With,
            "AND" => Self::And,
            "OR" => Self::Or,
            "IN" => Self::In,
            "NOT_IN" => Self::NotIn,
            "STARTS_WITH" => Self::StartsWith,
            "STARTS_WITH_IGNORE_CASE" => Self::StartsWithIgnoreCase,
            "CONTAINS" => Self::Contains,
            "CONTAINS_IGNORE_CASE" => Self::ContainsIgnoreCase,
            "DOES_NOT_CONTAIN" => Self::DoesNotContain,
            "DOES_NOT_CONTAIN_IGNORE_CASE" => Self::DoesNotContainIgnoreCase,
            "DURING" => Self::During,
            "GROUP" => Self::Group,
            "ORDER" => Self::Order,
            "BY" => Self::By,
            "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            "LIMIT" => Self::Limit,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the token is a WHERE comparison operator
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::Different
                | Self::Greater
                | Self::GreaterOrEqual
                | Self::Less
                | Self::LessOrEqual
                | Self::In
                | Self::NotIn
                | Self::StartsWith
                | Self::StartsWithIgnoreCase
                | Self::Contains
                | Self::ContainsIgnoreCase
                | Self::DoesNotContain
                | Self::DoesNotContainIgnoreCase
        )
    }

    /// Whether the token may be used as a bare (unquoted) condition value
    pub fn is_value_literal(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::ValueLiteral | Self::Digit | Self::Decimal
        )
    }
}

/// A token with the text it was scanned from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }

    /// The end-of-input token
    pub fn end() -> Self {
        Self::new(TokenKind::End, "")
    }
}

/// Space, tab and newline separate tokens
pub fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n' || c == '\r'
}

/// Characters allowed after the first letter of an identifier
pub fn is_literal_char(c: char) -> bool {
    c == '_' || c == '.' || c.is_ascii_alphanumeric()
}

pub fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}
