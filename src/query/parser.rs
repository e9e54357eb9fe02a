//! Query Parser
//!
//! Recursive-descent parser turning AWQL text into [`Statement`]s. The parser
//! pulls tokens from the [`Lexer`] one at a time and keeps a single token of
//! lookahead that can be pushed back with `unscan`.
//!
//! # Supported Syntax
//!
//! ```text
//! SELECT field(,field)* FROM name [WHERE cond(AND cond)*] [DURING lit|date,date]
//!   [GROUP BY ref(,ref)*] [ORDER BY ref[DESC](,ref[DESC])*] [LIMIT [off,]n] [;|\G]
//! DESC|DESCRIBE [FULL] name [column] [;|\G]
//! SHOW [FULL] TABLES [LIKE 'pattern'] [WITH column] [;|\G]
//! CREATE [OR REPLACE] VIEW name [(col,...)] AS <select-statement>
//! ```

use crate::query::ast::*;
use crate::query::dates::{parse_date, DateRangeLiteral};
use crate::query::error::{
    ErrorCode, ParseError, ParseResult, DURING_LITERAL_EXPECTED, DURING_NO_LITERAL_EXPECTED,
    DURING_SIZE,
};
use crate::query::lexer::Lexer;
use crate::query::token::{Token, TokenKind};

/// Parse every statement of a script
pub fn parse(input: &str) -> ParseResult<Vec<Statement>> {
    Parser::new(input).parse()
}

/// Parse the first statement of the input
pub fn parse_statement(input: &str) -> ParseResult<Statement> {
    let mut parser = Parser::new(input);
    match parser.scan_ignore_whitespace().kind {
        TokenKind::End => Err(ParseError::syntax(ErrorCode::UnknownStatement, "")),
        _ => {
            parser.unscan();
            parser.parse_one()
        }
    }
}

/// AWQL parser with one token of lookahead
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    last: Token,
    buffered: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            last: Token::end(),
            buffered: false,
        }
    }

    /// Parse statements until the end of the input
    pub fn parse(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            match self.scan_ignore_whitespace().kind {
                TokenKind::End => break,
                // Empty statement
                TokenKind::Semicolon => continue,
                _ => {
                    self.unscan();
                    statements.push(self.parse_one()?);
                }
            }
        }
        Ok(statements)
    }

    /// Parse one statement, dispatching on its leading keyword
    pub fn parse_one(&mut self) -> ParseResult<Statement> {
        let token = self.scan_ignore_whitespace();
        match token.kind {
            TokenKind::Desc | TokenKind::Describe => self.parse_describe().map(Statement::Describe),
            TokenKind::Create => self.parse_create_view().map(Statement::CreateView),
            TokenKind::Select => {
                self.unscan();
                self.parse_select().map(Statement::Select)
            }
            TokenKind::Show => self.parse_show().map(Statement::Show),
            _ => Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
        }
    }

    fn parse_describe(&mut self) -> ParseResult<DescribeStatement> {
        let mut stmt = DescribeStatement {
            full: self.accept(TokenKind::Full),
            ..Default::default()
        };

        stmt.source = self.expect_identifier(ErrorCode::InvalidSource)?;

        let token = self.scan_ignore_whitespace();
        if token.kind == TokenKind::Identifier {
            stmt.column = Some(token.literal);
        } else {
            self.unscan();
        }

        stmt.terminator = self.parse_terminator()?;
        Ok(stmt)
    }

    fn parse_show(&mut self) -> ParseResult<ShowStatement> {
        let mut stmt = ShowStatement {
            full: self.accept(TokenKind::Full),
            ..Default::default()
        };

        let token = self.scan_ignore_whitespace();
        if token.kind != TokenKind::Tables {
            return Err(ParseError::syntax(ErrorCode::InvalidMethod, token.literal));
        }

        if self.accept(TokenKind::Like) {
            let token = self.scan_ignore_whitespace();
            if token.kind != TokenKind::String {
                return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal));
            }
            stmt.like = Some(LikePattern::parse(&token.literal));
        }

        if self.accept(TokenKind::With) {
            let token = self.scan_ignore_whitespace();
            match token.kind {
                TokenKind::Identifier | TokenKind::String => stmt.with = Some(token.literal),
                _ => return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
            }
        }

        stmt.terminator = self.parse_terminator()?;
        Ok(stmt)
    }

    fn parse_create_view(&mut self) -> ParseResult<CreateViewStatement> {
        let mut stmt = CreateViewStatement::default();

        let mut token = self.scan_ignore_whitespace();
        if token.kind == TokenKind::Or {
            let next = self.scan_ignore_whitespace();
            if next.kind != TokenKind::Replace {
                return Err(ParseError::syntax(ErrorCode::InvalidMethod, next.literal));
            }
            stmt.replace = true;
            token = self.scan_ignore_whitespace();
        }
        if token.kind != TokenKind::View {
            return Err(ParseError::syntax(ErrorCode::InvalidMethod, token.literal));
        }

        stmt.name = self.expect_identifier(ErrorCode::InvalidSource)?;

        if self.accept(TokenKind::LeftParenthesis) {
            loop {
                stmt.columns.push(self.expect_identifier(ErrorCode::InvalidField)?);
                let token = self.scan_ignore_whitespace();
                match token.kind {
                    TokenKind::Comma => continue,
                    TokenKind::RightParenthesis => break,
                    _ => return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
                }
            }
        }

        let token = self.scan_ignore_whitespace();
        if token.kind != TokenKind::As {
            return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal));
        }

        stmt.select = self.parse_select()?;

        if !stmt.columns.is_empty() && stmt.columns.len() != stmt.select.fields.len() {
            return Err(ParseError::ColumnMismatch {
                expected: stmt.select.fields.len(),
                found: stmt.columns.len(),
            });
        }
        Ok(stmt)
    }

    fn parse_select(&mut self) -> ParseResult<SelectStatement> {
        let token = self.scan_ignore_whitespace();
        if token.kind != TokenKind::Select {
            return Err(ParseError::syntax(ErrorCode::InvalidMethod, token.literal));
        }

        let mut stmt = SelectStatement::default();
        loop {
            let field = self.parse_field(&stmt)?;
            stmt.fields.push(field);
            if !self.accept(TokenKind::Comma) {
                break;
            }
        }

        let token = self.scan_ignore_whitespace();
        if token.kind != TokenKind::From {
            return Err(ParseError::syntax(ErrorCode::MissingSource, token.literal));
        }
        stmt.source = self.expect_identifier(ErrorCode::InvalidSource)?;

        if self.accept(TokenKind::Where) {
            loop {
                stmt.conditions.push(self.parse_condition()?);
                if !self.accept(TokenKind::And) {
                    break;
                }
            }
        }

        if self.accept(TokenKind::During) {
            stmt.during = Some(self.parse_during()?);
        }

        if self.accept(TokenKind::Group) {
            self.expect(TokenKind::By, ErrorCode::InvalidGroupBy)?;
            loop {
                let token = self.scan_ignore_whitespace();
                let column = match token.kind {
                    TokenKind::Identifier | TokenKind::Digit => {
                        search_column(&stmt, &token.literal)
                    }
                    _ => None,
                }
                .ok_or_else(|| ParseError::syntax(ErrorCode::InvalidGroupBy, &token.literal))?;
                stmt.group_by.push(column);
                if !self.accept(TokenKind::Comma) {
                    break;
                }
            }
        }

        if self.accept(TokenKind::Order) {
            self.expect(TokenKind::By, ErrorCode::InvalidOrderBy)?;
            loop {
                let token = self.scan_ignore_whitespace();
                let column = match token.kind {
                    TokenKind::Identifier | TokenKind::Digit => {
                        search_column(&stmt, &token.literal)
                    }
                    _ => None,
                }
                .ok_or_else(|| ParseError::syntax(ErrorCode::InvalidOrderBy, &token.literal))?;
                let desc = if self.accept(TokenKind::Desc) {
                    true
                } else {
                    self.accept(TokenKind::Asc);
                    false
                };
                stmt.order_by.push(Order { column, desc });
                if !self.accept(TokenKind::Comma) {
                    break;
                }
            }
        }

        if self.accept(TokenKind::Limit) {
            let first = self.expect_count()?;
            stmt.limit = Some(if self.accept(TokenKind::Comma) {
                Limit {
                    offset: first,
                    row_count: self.expect_count()?,
                }
            } else {
                Limit {
                    offset: 0,
                    row_count: first,
                }
            });
        }

        stmt.terminator = self.parse_terminator()?;
        Ok(stmt)
    }

    /// Parse a select list entry, resolving digit arguments against the
    /// fields already parsed
    fn parse_field(&mut self, stmt: &SelectStatement) -> ParseResult<DynamicColumn> {
        let token = self.scan_ignore_whitespace();
        let mut field = match token.kind {
            TokenKind::Asterisk => DynamicColumn::new(Column::new(STAR)),
            TokenKind::Distinct => self.parse_distinct()?,
            TokenKind::Identifier => {
                // A function call needs its parenthesis right after the name
                if self.scan().kind != TokenKind::LeftParenthesis {
                    self.unscan();
                    DynamicColumn::new(Column::new(token.literal))
                } else {
                    self.parse_function(&token.literal, stmt)?
                }
            }
            _ => return Err(ParseError::syntax(ErrorCode::InvalidField, token.literal)),
        };

        let token = self.scan_ignore_whitespace();
        match token.kind {
            TokenKind::As => {
                let alias = self.expect_identifier(ErrorCode::InvalidField)?;
                field.column.alias = Some(alias);
            }
            TokenKind::Identifier => field.column.alias = Some(token.literal),
            _ => self.unscan(),
        }

        Ok(field)
    }

    fn parse_distinct(&mut self) -> ParseResult<DynamicColumn> {
        let name = self.expect_identifier(ErrorCode::InvalidField)?;
        Ok(DynamicColumn {
            column: Column::new(name),
            function: None,
            distinct: true,
        })
    }

    fn parse_function(&mut self, name: &str, stmt: &SelectStatement) -> ParseResult<DynamicColumn> {
        let function = AggregateFunction::parse(name)
            .ok_or_else(|| ParseError::UnknownFunction(name.to_string()))?;

        let token = self.scan_ignore_whitespace();
        let mut field = match token.kind {
            TokenKind::Asterisk if function == AggregateFunction::Count => {
                DynamicColumn::new(Column::new(STAR))
            }
            TokenKind::Asterisk => {
                return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal))
            }
            TokenKind::Distinct => self.parse_distinct()?,
            TokenKind::Digit => {
                let column = token
                    .literal
                    .parse::<usize>()
                    .ok()
                    .and_then(|position| column_at(stmt, position))
                    .ok_or_else(|| ParseError::syntax(ErrorCode::SyntaxNear, &token.literal))?;
                DynamicColumn::new(Column::new(column.name))
            }
            TokenKind::Identifier => DynamicColumn::new(Column::new(token.literal)),
            _ => return Err(ParseError::UnknownFunction(token.literal)),
        };
        field.function = Some(function);

        let token = self.scan_ignore_whitespace();
        if token.kind != TokenKind::RightParenthesis {
            return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal));
        }
        Ok(field)
    }

    fn parse_condition(&mut self) -> ParseResult<Condition> {
        let column = self.expect_identifier(ErrorCode::InvalidField)?;

        let token = self.scan_ignore_whitespace();
        let operator = operator(token.kind)
            .ok_or_else(|| ParseError::syntax(ErrorCode::SyntaxNear, &token.literal))?;

        let token = self.scan_ignore_whitespace();
        let (values, literal) = match token.kind {
            kind if kind.is_value_literal() => (vec![token.literal], true),
            TokenKind::String => (vec![token.literal], false),
            TokenKind::LeftSquareBracket => self.parse_value_list()?,
            _ => return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
        };

        Ok(Condition {
            column,
            operator,
            values,
            literal,
        })
    }

    /// Parse `[v, v, ...]` after its opening bracket. A list holds either
    /// quoted strings or bare literals, never both, separated by single commas.
    fn parse_value_list(&mut self) -> ParseResult<(Vec<String>, bool)> {
        let mut values = Vec::new();
        let mut literal: Option<bool> = None;
        loop {
            let token = self.scan_ignore_whitespace();
            let is_literal = match token.kind {
                kind if kind.is_value_literal() => true,
                TokenKind::String => false,
                _ => return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
            };
            if literal.is_some_and(|l| l != is_literal) {
                return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal));
            }
            literal = Some(is_literal);
            values.push(token.literal);

            let token = self.scan_ignore_whitespace();
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RightSquareBracket => break,
                _ => return Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
            }
        }
        Ok((values, literal.unwrap_or(false)))
    }

    fn parse_during(&mut self) -> ParseResult<During> {
        let mut dates = Vec::new();
        let mut literal = None;
        let mut count = 0;
        loop {
            let token = self.scan_ignore_whitespace();
            let date = match token.kind {
                TokenKind::Digit => parse_date(&token.literal),
                _ => None,
            };
            let range = match token.kind {
                TokenKind::Identifier => DateRangeLiteral::parse(&token.literal),
                _ => None,
            };
            match (date, range) {
                (Some(date), _) => dates.push(date),
                (None, Some(range)) => literal = Some(range),
                (None, None) => return Err(ParseError::DuringRange(token.literal)),
            }
            count += 1;
            if !self.accept(TokenKind::Comma) {
                break;
            }
        }

        match (count, literal) {
            (n, _) if n > 2 => Err(ParseError::DuringRange(DURING_SIZE.to_string())),
            (1, Some(range)) => Ok(During::Literal(range)),
            (1, None) => Err(ParseError::DuringRange(DURING_LITERAL_EXPECTED.to_string())),
            (_, Some(_)) => Err(ParseError::DuringRange(
                DURING_NO_LITERAL_EXPECTED.to_string(),
            )),
            _ => Ok(During::Range {
                start: dates[0],
                end: dates[1],
            }),
        }
    }

    fn parse_terminator(&mut self) -> ParseResult<Terminator> {
        let token = self.scan_ignore_whitespace();
        match token.kind {
            TokenKind::Vertical => Ok(Terminator::Vertical),
            TokenKind::Semicolon => Ok(Terminator::Semicolon),
            TokenKind::End => Ok(Terminator::End),
            _ => Err(ParseError::syntax(ErrorCode::SyntaxNear, token.literal)),
        }
    }

    fn expect(&mut self, kind: TokenKind, code: ErrorCode) -> ParseResult<()> {
        let token = self.scan_ignore_whitespace();
        if token.kind != kind {
            return Err(ParseError::syntax(code, token.literal));
        }
        Ok(())
    }

    fn expect_identifier(&mut self, code: ErrorCode) -> ParseResult<String> {
        let token = self.scan_ignore_whitespace();
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::syntax(code, token.literal));
        }
        Ok(token.literal)
    }

    fn expect_count(&mut self) -> ParseResult<usize> {
        let token = self.scan_ignore_whitespace();
        match token.kind {
            TokenKind::Digit => token
                .literal
                .parse::<usize>()
                .map_err(|_| ParseError::syntax(ErrorCode::InvalidLimit, &token.literal)),
            _ => Err(ParseError::syntax(ErrorCode::InvalidLimit, token.literal)),
        }
    }

    /// Consume the next token if it has the given kind
    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.scan_ignore_whitespace().kind == kind {
            true
        } else {
            self.unscan();
            false
        }
    }

    /// Next token, or the pushed-back one
    fn scan(&mut self) -> Token {
        if self.buffered {
            self.buffered = false;
        } else {
            self.last = self.lexer.scan();
        }
        self.last.clone()
    }

    fn scan_ignore_whitespace(&mut self) -> Token {
        let token = self.scan();
        if token.kind == TokenKind::Whitespace {
            return self.scan();
        }
        token
    }

    /// Push the last token back
    fn unscan(&mut self) {
        self.buffered = true;
    }
}

fn operator(kind: TokenKind) -> Option<Operator> {
    let operator = match kind {
        TokenKind::Equal => Operator::Equal,
        TokenKind::Different => Operator::Different,
        TokenKind::Greater => Operator::Greater,
        TokenKind::GreaterOrEqual => Operator::GreaterOrEqual,
        TokenKind::Less => Operator::Less,
        TokenKind::LessOrEqual => Operator::LessOrEqual,
        TokenKind::In => Operator::In,
        TokenKind::NotIn => Operator::NotIn,
        TokenKind::StartsWith => Operator::StartsWith,
        TokenKind::StartsWithIgnoreCase => Operator::StartsWithIgnoreCase,
        TokenKind::Contains => Operator::Contains,
        TokenKind::ContainsIgnoreCase => Operator::ContainsIgnoreCase,
        TokenKind::DoesNotContain => Operator::DoesNotContain,
        TokenKind::DoesNotContainIgnoreCase => Operator::DoesNotContainIgnoreCase,
        _ => return None,
    };
    Some(operator)
}

/// Column at a 1-based position of the select list
fn column_at(stmt: &SelectStatement, position: usize) -> Option<Column> {
    if position == 0 {
        return None;
    }
    stmt.fields.get(position - 1).map(|f| f.column.clone())
}

/// Resolve a GROUP BY / ORDER BY reference by position, name or alias
fn search_column(stmt: &SelectStatement, expr: &str) -> Option<ColumnPosition> {
    if let Ok(position) = expr.parse::<usize>() {
        return column_at(stmt, position).map(|column| ColumnPosition { column, position });
    }
    stmt.fields
        .iter()
        .position(|f| f.column.name == expr || f.column.alias.as_deref() == Some(expr))
        .map(|idx| ColumnPosition {
            column: stmt.fields[idx].column.clone(),
            position: idx + 1,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn select(input: &str) -> SelectStatement {
        match parse_statement(input).unwrap() {
            Statement::Select(stmt) => stmt,
            other => panic!("expected a select statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_select() {
        let stmt = select(
            "SELECT CampaignName, SUM(Cost) AS cost FROM CAMPAIGN_PERFORMANCE_REPORT \
             WHERE CampaignStatus = \"ENABLED\" DURING LAST_7_DAYS \
             GROUP BY 1 ORDER BY 2 DESC LIMIT 5",
        );

        assert_eq!(stmt.fields.len(), 2);
        assert_eq!(stmt.fields[0].name(), "CampaignName");
        assert!(stmt.fields[0].function.is_none());
        assert_eq!(stmt.fields[1].name(), "Cost");
        assert_eq!(stmt.fields[1].function, Some(AggregateFunction::Sum));
        assert_eq!(stmt.fields[1].column.alias.as_deref(), Some("cost"));

        assert_eq!(stmt.source, "CAMPAIGN_PERFORMANCE_REPORT");
        assert_eq!(stmt.conditions.len(), 1);
        assert_eq!(stmt.conditions[0].column, "CampaignStatus");
        assert_eq!(stmt.conditions[0].operator, Operator::Equal);
        assert_eq!(stmt.conditions[0].values, vec!["ENABLED".to_string()]);
        assert!(!stmt.conditions[0].literal);

        assert_eq!(stmt.during, Some(During::Literal(DateRangeLiteral::Last7Days)));
        assert_eq!(stmt.group_by.len(), 1);
        assert_eq!(stmt.group_by[0].position, 1);
        assert_eq!(stmt.order_by.len(), 1);
        assert_eq!(stmt.order_by[0].column.position, 2);
        assert!(stmt.order_by[0].desc);
        assert_eq!(
            stmt.limit,
            Some(Limit {
                offset: 0,
                row_count: 5
            })
        );
        assert_eq!(stmt.terminator, Terminator::End);
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let queries = [
            "DESC FULL CAMPAIGN_PERFORMANCE_REPORT",
            "DESC CAMPAIGN_PERFORMANCE_REPORT CampaignStatus",
            "SHOW FULL TABLES",
            "SHOW FULL TABLES LIKE \"%rv\"",
            "SHOW FULL TABLES LIKE \"%rv%\"",
            "SHOW FULL TABLES LIKE \"rv%\"",
            "SHOW TABLES LIKE \"rv\"",
            "SHOW TABLES WITH \"rv\"",
            "CREATE VIEW rv AS SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT LIMIT 10",
            "CREATE VIEW rv (Name, Cost) AS SELECT CampaignName, Cost FROM CAMPAIGN_PERFORMANCE_REPORT DURING TODAY",
            "CREATE OR REPLACE VIEW rv AS SELECT CampaignId, Cost FROM CAMPAIGN_PERFORMANCE_REPORT DURING TODAY",
            "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT",
            "SELECT SUM(Cost) AS c FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = \"ENABLED\"",
            "SELECT CampaignName, Cost FROM CAMPAIGN_PERFORMANCE_REPORT GROUP BY 1 ORDER BY 2 DESC",
            "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT DURING 20161224,20161225 LIMIT 10",
            "SELECT DISTINCT AdGroupId, COUNT(*) AS n FROM AD_PERFORMANCE_REPORT WHERE Id IN [1, 2, 3] LIMIT 5, 10",
            "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignName CONTAINS \"say \\\"hi\\\"\"",
        ];

        for query in queries {
            let stmt = parse_statement(query).unwrap();
            assert_eq!(stmt.to_string(), query);
            let again = parse_statement(&stmt.to_string()).unwrap();
            assert_eq!(again, stmt);
        }
    }

    #[test]
    fn test_legacy_strings() {
        let cases = [
            (
                "SELECT SUM(Cost) AS c FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = \"ENABLED\"",
                "SELECT Cost FROM CAMPAIGN_PERFORMANCE_REPORT WHERE CampaignStatus = \"ENABLED\"",
            ),
            (
                "SELECT CampaignName, Cost FROM CAMPAIGN_PERFORMANCE_REPORT GROUP BY 1 ORDER BY 2 DESC",
                "SELECT CampaignName, Cost FROM CAMPAIGN_PERFORMANCE_REPORT",
            ),
            (
                "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT DURING 20161224,20161225 LIMIT 10",
                "SELECT CampaignName FROM CAMPAIGN_PERFORMANCE_REPORT DURING 20161224,20161225",
            ),
        ];
        for (query, legacy) in cases {
            assert_eq!(select(query).legacy_string(), legacy);
        }
    }

    #[test]
    fn test_parse_alias_without_as() {
        let stmt = select("SELECT CampaignName name, MAX(Clicks) top FROM CAMPAIGN_PERFORMANCE_REPORT");
        assert_eq!(stmt.fields[0].label(), "name");
        assert_eq!(stmt.fields[1].label(), "top");
        assert_eq!(stmt.fields[1].function, Some(AggregateFunction::Max));
    }

    #[test]
    fn test_parse_function_arguments() {
        let stmt = select("SELECT CampaignName, COUNT(DISTINCT AdGroupId), SUM(1) FROM ADGROUP_PERFORMANCE_REPORT");
        assert!(stmt.fields[1].distinct);
        assert_eq!(stmt.fields[1].name(), "AdGroupId");
        assert_eq!(stmt.fields[2].name(), "CampaignName");
        assert_eq!(stmt.fields[2].function, Some(AggregateFunction::Sum));
    }

    #[test]
    fn test_star_only_counts() {
        let err = parse_statement("SELECT SUM(*) FROM CAMPAIGN_PERFORMANCE_REPORT").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxNear);
        assert!(parse_statement("SELECT COUNT(*) FROM CAMPAIGN_PERFORMANCE_REPORT").is_ok());
    }

    #[test]
    fn test_unknown_function() {
        let err = parse_statement("SELECT MEDIAN(Cost) FROM CAMPAIGN_PERFORMANCE_REPORT").unwrap_err();
        assert_eq!(err, ParseError::UnknownFunction("MEDIAN".into()));
    }

    #[test]
    fn test_function_position_out_of_range() {
        let err = parse_statement("SELECT SUM(2) FROM CAMPAIGN_PERFORMANCE_REPORT").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxNear);
        assert_eq!(err.literal(), "2");
    }

    #[test]
    fn test_missing_source() {
        let err = parse_statement("SELECT CampaignName").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingSource);
        let err = parse_statement("SELECT CampaignName FROM 'x'").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSource);
    }

    #[test]
    fn test_unknown_statement_names_token() {
        let err = parse_statement("UPDATE CAMPAIGN_PERFORMANCE_REPORT").unwrap_err();
        assert_eq!(err.to_string(), "ParserError.SYNTAX_NEAR (UPDATE)");
    }

    #[test]
    fn test_where_value_lists() {
        let stmt = select("SELECT Id FROM AD_PERFORMANCE_REPORT WHERE Status IN ['ENABLED', \"PAUSED\"] AND Id NOT_IN [1, 2.5, a.b]");
        assert_eq!(stmt.conditions.len(), 2);
        assert_eq!(stmt.conditions[0].values, vec!["ENABLED", "PAUSED"]);
        assert!(!stmt.conditions[0].literal);
        assert_eq!(stmt.conditions[1].operator, Operator::NotIn);
        assert!(stmt.conditions[1].literal);

        let err = parse_statement("SELECT Id FROM T WHERE Id IN [1, 'a']").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxNear);
        let err = parse_statement("SELECT Id FROM T WHERE Id IN []").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxNear);
    }

    #[test]
    fn test_where_value_list_separators() {
        for query in [
            "SELECT Id FROM T WHERE Id IN [1 2]",
            "SELECT Id FROM T WHERE Id IN [1,,2]",
            "SELECT Id FROM T WHERE Id IN [1,]",
            "SELECT Id FROM T WHERE Id IN [,1]",
        ] {
            let err = parse_statement(query).unwrap_err();
            assert_eq!(err.code(), ErrorCode::SyntaxNear, "{}", query);
        }
        let stmt = select("SELECT Id FROM T WHERE Id IN [1,2 , 3]");
        assert_eq!(stmt.conditions[0].values, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_where_bare_identifier_value() {
        let stmt = select("SELECT Id FROM T WHERE Status = ENABLED");
        assert_eq!(stmt.conditions[0].values, vec!["ENABLED"]);
        assert!(stmt.conditions[0].literal);
    }

    #[test]
    fn test_during_explicit_range() {
        let stmt = select("SELECT Id FROM T DURING 20170101, 20170131");
        assert_eq!(
            stmt.during,
            Some(During::Range {
                start: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2017, 1, 31).unwrap(),
            })
        );
    }

    #[test]
    fn test_during_errors() {
        let cases = [
            ("SELECT Id FROM T DURING 20170101", DURING_LITERAL_EXPECTED),
            ("SELECT Id FROM T DURING 20170101,20170102,20170103", DURING_SIZE),
            ("SELECT Id FROM T DURING TODAY,20170102", DURING_NO_LITERAL_EXPECTED),
            ("SELECT Id FROM T DURING LAST_YEAR", "LAST_YEAR"),
            ("SELECT Id FROM T DURING 20171332", "20171332"),
        ];
        for (query, reason) in cases {
            let err = parse_statement(query).unwrap_err();
            assert_eq!(err, ParseError::DuringRange(reason.to_string()), "{}", query);
        }
    }

    #[test]
    fn test_group_and_order_by_name_or_alias() {
        let stmt = select("SELECT CampaignName AS name, Cost FROM T GROUP BY name ORDER BY Cost ASC, 1 DESC");
        assert_eq!(stmt.group_by[0].position, 1);
        assert_eq!(stmt.order_by[0].column.position, 2);
        assert!(!stmt.order_by[0].desc);
        assert_eq!(stmt.order_by[1].column.position, 1);
        assert!(stmt.order_by[1].desc);
    }

    #[test]
    fn test_group_by_out_of_range() {
        let err = parse_statement("SELECT CampaignName FROM T GROUP BY 2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidGroupBy);
        let err = parse_statement("SELECT CampaignName FROM T ORDER BY Cost").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOrderBy);
    }

    #[test]
    fn test_limit_forms() {
        let stmt = select("SELECT Id FROM T LIMIT 10, 5");
        assert_eq!(
            stmt.limit,
            Some(Limit {
                offset: 10,
                row_count: 5
            })
        );
        let err = parse_statement("SELECT Id FROM T LIMIT x").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidLimit);
    }

    #[test]
    fn test_terminators() {
        let stmt = parse_statement("SELECT Id FROM T\\G").unwrap();
        assert!(stmt.vertical());
        let stmt = parse_statement("SHOW TABLES;").unwrap();
        assert_eq!(stmt.terminator(), Terminator::Semicolon);
        let err = parse_statement("SELECT Id FROM T WHERE").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidField);
        let err = parse_statement("SELECT Id FROM T FOO").unwrap_err();
        assert_eq!(err.to_string(), "ParserError.SYNTAX_NEAR (FOO)");
    }

    #[test]
    fn test_parse_multiple_statements() {
        let statements = parse("SHOW TABLES; DESC T\\G SELECT Id FROM T").unwrap();
        assert_eq!(statements.len(), 3);
        assert!(matches!(statements[0], Statement::Show(_)));
        assert!(matches!(statements[1], Statement::Describe(_)));
        assert!(statements[1].vertical());
        assert!(matches!(statements[2], Statement::Select(_)));
        assert!(parse("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_aborts_without_partial_result() {
        assert!(parse("SHOW TABLES; SELECT FROM T").is_err());
    }

    #[test]
    fn test_create_view_column_mismatch() {
        let err = parse_statement("CREATE VIEW v (a, b) AS SELECT CampaignName FROM T").unwrap_err();
        assert_eq!(
            err,
            ParseError::ColumnMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_create_view_requires_view_keyword() {
        let err = parse_statement("CREATE OR VIEW v AS SELECT Id FROM T").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidMethod);
    }

    #[test]
    fn test_show_like_requires_string() {
        let err = parse_statement("SHOW TABLES LIKE rv").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SyntaxNear);
        let stmt = parse_statement("SHOW TABLES WITH CampaignId").unwrap();
        match stmt {
            Statement::Show(show) => assert_eq!(show.with.as_deref(), Some("CampaignId")),
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_empty_input() {
        let err = parse_statement("").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownStatement);
    }
}
