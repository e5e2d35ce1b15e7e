use crate::geometry::Span;

/// What a lexed piece of template text is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain text.
    Text(String),
    /// `\X` for one of `` {}\$` ``.
    EscapedChar(char),
    /// `${VISUAL}`, with the leading whitespace of its line.
    Visual { leading_whitespace: String },
    /// `${N/search/replace/options}`; `search` has `\/` already unescaped.
    Transformation {
        number: u32,
        search: String,
        replace: String,
        options: String,
    },
    /// `${N}` or `${N:initial}`; `initial` is still raw template text.
    TabStop { number: u32, initial: String },
    /// `$N`.
    Mirror { number: u32 },
    /// `` `!p code` ``.
    Script { code: String, indent: String },
    /// `` `!v code` ``.
    HostExpr { code: String },
    /// `` `code` ``.
    Shell { code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
