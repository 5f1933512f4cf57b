use arbor_syntax::{
    DirectiveRole, GreenToken, GreenTrivia, GreenTriviaList, Language, PlainLanguage, SyntaxKind,
    TriviaKind,
};
use arbor_tokenizer::kinds::*;

/// The curly-brace test language.
#[derive(Debug, Default)]
pub struct TestLanguage;

pub static LANGUAGE: TestLanguage = TestLanguage;

impl Language for TestLanguage {
    fn kind_name(&self, kind: SyntaxKind) -> &'static str {
        name(kind).unwrap_or_else(|| PlainLanguage.kind_name(kind))
    }

    fn is_optional_slot(&self, parent: SyntaxKind, slot: usize) -> bool {
        matches!(
            (parent, slot),
            (SOURCE_FILE, 0)
                | (CLASS_DECL, 3)
                | (FIELD_DECL | VAR_STMT, 2 | 3)
                | (PARAM_LIST | ARG_LIST | BLOCK, 1)
                | (RETURN_STMT, 1)
                | (IF_STMT, 5)
        ) || parent.is_list()
    }

    fn is_executable_body(&self, kind: SyntaxKind) -> bool {
        kind == BLOCK
    }

    fn list_separator(&self, element: SyntaxKind) -> Option<GreenToken> {
        let separated = matches!(
            element,
            PARAM
                | NAME_REF
                | LITERAL
                | BINARY_EXPR
                | PREFIX_EXPR
                | PAREN_EXPR
                | CALL_EXPR
                | FIELD_EXPR
        );
        separated.then(|| {
            let space = GreenTrivia::new(TriviaKind::Whitespace, " ");
            GreenToken::new(COMMA, ",").with_trailing(GreenTriviaList::new([space]))
        })
    }

    fn directive_role(&self, directive: SyntaxKind) -> DirectiveRole {
        match directive {
            IF_DIRECTIVE | REGION_DIRECTIVE => DirectiveRole::Open,
            ENDIF_DIRECTIVE | ENDREGION_DIRECTIVE => DirectiveRole::Close,
            DEFINE_DIRECTIVE => DirectiveRole::Definition,
            _ => DirectiveRole::Other,
        }
    }
}
