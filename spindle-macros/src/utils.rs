use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`. Only top-level commas
/// separate arguments: commas inside parentheses, brackets or braces belong
/// to a single token group. Commas inside turbofish generics (`f::<A, B>()`)
/// are not recognized; wrap such arguments in parentheses.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens back into Rust source.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Parses `key = value` pairs from an attribute's arguments.
///
/// Pairs that do not have this shape are returned as errors so the macro
/// can report them.
pub(crate) fn parse_options(attr: TokenStream) -> Result<Vec<(String, String)>, String> {
    let mut options = Vec::new();

    for arg in split_args(attr) {
        let text = tokens_to_string(&arg);

        match text.split_once('=') {
            Some((key, value)) => {
                options.push((key.trim().to_string(), value.trim().to_string()));
            }
            None => return Err(format!("expected `key = value`, found `{text}`")),
        }
    }

    Ok(options)
}

/// Returns the position of the function body: the last brace group.
pub(crate) fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Replaces the function body at `pos` with `body`, parsed as Rust source.
pub(crate) fn replace_body(tokens: &mut [TokenTree], pos: usize, body: &str) -> Result<(), String> {
    let stream = body
        .parse::<TokenStream>()
        .map_err(|err| format!("failed to expand function body: {err}"))?;

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    Ok(())
}

/// Builds a `compile_error!` invocation carrying `message`.
pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
