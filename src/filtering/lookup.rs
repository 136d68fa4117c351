use sea_orm::{
    Value,
    sea_query::{Alias, BinOper, Expr, Func, LikeExpr, SimpleExpr},
};
use std::fmt;
use uuid::Uuid;

use crate::introspection::FieldKind;
use crate::settings::{Backend, FilterSettings};

/// Comparison applied to a field, named the way it appears after `__` in a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Regex,
    IRegex,
    /// Full-text search
    Search,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
    /// Comma separated list of values
    In,
}

const ALL_LOOKUPS: [Lookup; 17] = [
    Lookup::Exact,
    Lookup::IExact,
    Lookup::Contains,
    Lookup::IContains,
    Lookup::StartsWith,
    Lookup::IStartsWith,
    Lookup::EndsWith,
    Lookup::IEndsWith,
    Lookup::Regex,
    Lookup::IRegex,
    Lookup::Search,
    Lookup::Gt,
    Lookup::Gte,
    Lookup::Lt,
    Lookup::Lte,
    Lookup::IsNull,
    Lookup::In,
];

/// Escape LIKE wildcards so user terms match literally.
/// Escapes: % (match any) and _ (match single char)
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_bool(term: &str) -> Option<bool> {
    match term.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Convert a raw term into a value of the field's type, keeping the text when it does
/// not parse so the database reports the mismatch.
fn coerce(term: &str, kind: FieldKind) -> Value {
    match kind {
        FieldKind::Boolean => parse_bool(term).map_or_else(|| Value::from(term), Value::from),
        FieldKind::Integer => term
            .parse::<i64>()
            .map_or_else(|_| Value::from(term), Value::from),
        FieldKind::Float => term
            .parse::<f64>()
            .map_or_else(|_| Value::from(term), Value::from),
        FieldKind::Uuid => Uuid::parse_str(term).map_or_else(|_| Value::from(term), Value::from),
        _ => Value::from(term),
    }
}

impl Lookup {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_LOOKUPS.into_iter().find(|lookup| lookup.name() == name)
    }

    /// Fixed lookup selected by a one-character field prefix.
    #[must_use]
    pub const fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            '^' => Some(Self::IStartsWith),
            '=' => Some(Self::IExact),
            '@' => Some(Self::Search),
            '$' => Some(Self::IRegex),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::EndsWith => "endswith",
            Self::IEndsWith => "iendswith",
            Self::Regex => "regex",
            Self::IRegex => "iregex",
            Self::Search => "search",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::IsNull => "isnull",
            Self::In => "in",
        }
    }

    #[must_use]
    pub const fn applies_to(self, kind: FieldKind) -> bool {
        match self {
            Self::Search => kind.is_textual(),
            _ => true,
        }
    }

    /// Build `<expr> <lookup> <term>` for the configured backend.
    #[must_use]
    pub fn predicate(
        self,
        expr: SimpleExpr,
        kind: FieldKind,
        term: &str,
        settings: &FilterSettings,
    ) -> SimpleExpr {
        let backend = settings.backend;
        match self {
            Self::Exact => Expr::expr(expr).eq(coerce(term, kind)),
            Self::IExact => Expr::expr(Func::upper(as_text(expr, kind, backend)))
                .eq(Func::upper(Expr::val(term))),
            Self::Contains | Self::IContains => like(
                as_text(expr, kind, backend),
                format!("%{}%", escape_like_wildcards(term)),
                self == Self::IContains,
            ),
            Self::StartsWith | Self::IStartsWith => like(
                as_text(expr, kind, backend),
                format!("{}%", escape_like_wildcards(term)),
                self == Self::IStartsWith,
            ),
            Self::EndsWith | Self::IEndsWith => like(
                as_text(expr, kind, backend),
                format!("%{}", escape_like_wildcards(term)),
                self == Self::IEndsWith,
            ),
            Self::Regex | Self::IRegex => {
                regex(as_text(expr, kind, backend), term, self == Self::IRegex, backend)
            }
            Self::Search => search(expr, kind, term, settings),
            Self::Gt => Expr::expr(expr).gt(coerce(term, kind)),
            Self::Gte => Expr::expr(expr).gte(coerce(term, kind)),
            Self::Lt => Expr::expr(expr).lt(coerce(term, kind)),
            Self::Lte => Expr::expr(expr).lte(coerce(term, kind)),
            Self::IsNull => {
                if parse_bool(term).unwrap_or(true) {
                    Expr::expr(expr).is_null()
                } else {
                    Expr::expr(expr).is_not_null()
                }
            }
            Self::In => Expr::expr(expr).is_in(
                term.split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| coerce(value, kind)),
            ),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cast non-text columns so text operators can be applied to them.
fn as_text(expr: SimpleExpr, kind: FieldKind, backend: Backend) -> SimpleExpr {
    if kind.is_textual() {
        return expr;
    }
    let text_type = match backend {
        Backend::MySql => "CHAR",
        Backend::Postgres | Backend::Sqlite => "TEXT",
    };
    Func::cast_as(expr, Alias::new(text_type)).into()
}

/// Case-insensitive matching folds both sides in SQL, so the term is folded by the
/// same rules as the column.
fn like(expr: SimpleExpr, pattern: String, case_insensitive: bool) -> SimpleExpr {
    if case_insensitive {
        let pattern = SimpleExpr::from(Func::upper(Expr::val(pattern))).binary(
            BinOper::Escape,
            SimpleExpr::Constant(Value::from('\\')),
        );
        Expr::expr(Func::upper(expr)).binary(BinOper::Like, pattern)
    } else {
        Expr::expr(expr).like(LikeExpr::new(pattern).escape('\\'))
    }
}

fn regex(expr: SimpleExpr, term: &str, case_insensitive: bool, backend: Backend) -> SimpleExpr {
    match backend {
        Backend::Postgres => {
            let operator = if case_insensitive { "~*" } else { "~" };
            Expr::expr(expr).binary(BinOper::Custom(operator), Expr::val(term))
        }
        Backend::MySql => {
            let flags = if case_insensitive { "i" } else { "c" };
            Func::cust(Alias::new("REGEXP_LIKE"))
                .arg(expr)
                .arg(Expr::val(term))
                .arg(Expr::val(flags))
                .into()
        }
        Backend::Sqlite => {
            // SQLite's REGEXP has no flags; the inline (?i) is understood by the usual
            // regexp extensions
            let pattern = if case_insensitive {
                format!("(?i){term}")
            } else {
                term.to_string()
            };
            Expr::expr(expr).binary(BinOper::Custom("REGEXP"), Expr::val(pattern))
        }
    }
}

fn search(expr: SimpleExpr, kind: FieldKind, term: &str, settings: &FilterSettings) -> SimpleExpr {
    match settings.backend {
        Backend::Postgres => {
            // Inlined so Postgres reads it as a regconfig rather than a text parameter
            let config = Expr::cust(format!("'{}'", settings.fulltext_config()));
            let document = Func::cust(Alias::new("to_tsvector"))
                .arg(config.clone())
                .arg(expr);
            let query = Func::cust(Alias::new("plainto_tsquery"))
                .arg(config)
                .arg(Expr::val(term));
            Expr::expr(document).binary(BinOper::Custom("@@"), query)
        }
        // MATCH ... AGAINST is not a function call; `?` is MySQL's placeholder
        Backend::MySql => Expr::cust_with_exprs(
            "MATCH (?) AGAINST (? IN NATURAL LANGUAGE MODE)",
            [expr, Expr::val(term).into()],
        ),
        // No full-text operator without an FTS table
        Backend::Sqlite => Lookup::IContains.predicate(expr, kind, term, settings),
    }
}
