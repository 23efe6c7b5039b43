use crate::document::Document;
use lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokens, SemanticTokensLegend,
};
use ttcn3_core::line_index::utf16_len;
use ttcn3_core::TokenClass;

/// Token types in legend order. The index of a type is its wire value.
const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::NAMESPACE,
    SemanticTokenType::TYPE,
    SemanticTokenType::FUNCTION,
    SemanticTokenType::PARAMETER,
    SemanticTokenType::VARIABLE,
    SemanticTokenType::PROPERTY,
    SemanticTokenType::ENUM_MEMBER,
    SemanticTokenType::STRING,
    SemanticTokenType::NUMBER,
];

const DECLARATION: u32 = 1;

pub struct SemanticTokensProvider;

impl SemanticTokensProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn legend() -> SemanticTokensLegend {
        SemanticTokensLegend {
            token_types: TOKEN_TYPES.to_vec(),
            token_modifiers: vec![SemanticTokenModifier::DECLARATION],
        }
    }

    /// Whole-document tokens, delta encoded. Tokens spanning several lines
    /// are cut at the end of their first line.
    pub fn provide(&self, document: &Document) -> SemanticTokens {
        let tree = document.tree();
        let text = tree.text();
        let index = ttcn3_core::TreeIndex::new(tree);

        let mut data = Vec::new();
        let mut prev_line = 0;
        let mut prev_start = 0;
        for token in index.semantic_tokens() {
            let start = tree.position(token.span.start);
            let first_line = text[token.span.start..token.span.end]
                .split('\n')
                .next()
                .unwrap_or_default();
            let length = utf16_len(first_line);
            if length == 0 {
                continue;
            }

            let delta_line = start.line - prev_line;
            let delta_start = if delta_line == 0 {
                start.character - prev_start
            } else {
                start.character
            };
            data.push(SemanticToken {
                delta_line,
                delta_start,
                length,
                token_type: token_type(token.class),
                token_modifiers_bitset: if token.declaration { DECLARATION } else { 0 },
            });
            prev_line = start.line;
            prev_start = start.character;
        }

        SemanticTokens {
            result_id: None,
            data,
        }
    }
}

impl Default for SemanticTokensProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn token_type(class: TokenClass) -> u32 {
    match class {
        TokenClass::Namespace => 0,
        TokenClass::Type => 1,
        TokenClass::Function => 2,
        TokenClass::Parameter => 3,
        TokenClass::Variable => 4,
        TokenClass::Property => 5,
        TokenClass::EnumMember => 6,
        TokenClass::String => 7,
        TokenClass::Number => 8,
    }
}
