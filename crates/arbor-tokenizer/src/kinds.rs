//! Kinds of the test language, numbered from [`SyntaxKind::FIRST_LANGUAGE_KIND`].

use arbor_syntax::SyntaxKind;

macro_rules! kinds {
    ($($name:ident),* $(,)?) => {
        #[allow(non_camel_case_types, dead_code)]
        #[repr(u16)]
        enum Raw {
            __First = SyntaxKind::FIRST_LANGUAGE_KIND - 1,
            $($name,)*
        }

        $(pub const $name: SyntaxKind = SyntaxKind(Raw::$name as u16);)*

        pub fn name(kind: SyntaxKind) -> Option<&'static str> {
            match kind {
                $($name => Some(stringify!($name)),)*
                _ => None,
            }
        }
    };
}

kinds! {
    EOF,
    UNKNOWN,
    NAME,
    INT_NUMBER,
    STRING,

    L_PAREN,
    R_PAREN,
    L_BRACE,
    R_BRACE,
    SEMICOLON,
    COMMA,
    DOT,
    EQ,
    EQ2,
    NEQ,
    LT,
    GT,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    BANG,

    CLASS_KW,
    FN_KW,
    VAR_KW,
    RETURN_KW,
    IF_KW,
    ELSE_KW,
    WHILE_KW,
    TRUE_KW,
    FALSE_KW,

    HASH,
    DEFINE_KW,
    ENDIF_KW,
    REGION_KW,
    ENDREGION_KW,
    DIRECTIVE_TEXT,

    IF_DIRECTIVE,
    ELSE_DIRECTIVE,
    ENDIF_DIRECTIVE,
    DEFINE_DIRECTIVE,
    REGION_DIRECTIVE,
    ENDREGION_DIRECTIVE,
    BAD_DIRECTIVE,

    SOURCE_FILE,
    CLASS_DECL,
    FN_DECL,
    FIELD_DECL,
    PARAM_LIST,
    PARAM,
    BLOCK,
    VAR_STMT,
    RETURN_STMT,
    EXPR_STMT,
    IF_STMT,
    ELSE_CLAUSE,
    WHILE_STMT,
    EMPTY_STMT,
    BINARY_EXPR,
    PREFIX_EXPR,
    PAREN_EXPR,
    CALL_EXPR,
    ARG_LIST,
    FIELD_EXPR,
    NAME_REF,
    LITERAL,
    ERROR,
}

pub fn keyword(text: &str) -> Option<SyntaxKind> {
    Some(match text {
        "class" => CLASS_KW,
        "fn" => FN_KW,
        "var" => VAR_KW,
        "return" => RETURN_KW,
        "if" => IF_KW,
        "else" => ELSE_KW,
        "while" => WHILE_KW,
        "true" => TRUE_KW,
        "false" => FALSE_KW,
        _ => return None,
    })
}
