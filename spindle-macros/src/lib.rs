//! Procedural macros for spindle.
//!
//! - `#[spindle::main]` and `#[spindle::test]` run a function body inside a
//!   fresh runtime.
//! - `all!`, `any!`, `race!` and `all_settled!` pass a list of promises of
//!   any value types to the matching combinator.

mod utils;

use proc_macro::{TokenStream, TokenTree};

/// Expands a combinator macro into a call to `::spindle::<name>` with every
/// argument cast to `&dyn ::spindle::Observable`.
fn combinator(name: &str, input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);

    let items = args
        .iter()
        .map(|arg| {
            let expr = utils::tokens_to_string(arg);
            format!("&({expr}) as &dyn ::spindle::Observable")
        })
        .collect::<Vec<_>>()
        .join(", ");

    let output = format!("::spindle::{name}(&[{items}])");

    match output.parse::<TokenStream>() {
        Ok(ts) => ts,
        Err(err) => utils::compile_error(&format!("{name} macro error: {err}")),
    }
}

/// Waits for every promise to resolve, or for the first to reject.
///
/// Expands to `spindle::all` over the given promises, which may have
/// different value types.
///
/// ```rust,ignore
/// let failed = spindle::all!(spawn(|| Ok(1)), sleep(delay)).wait()?;
/// assert_eq!(failed, None);
/// ```
#[proc_macro]
pub fn all(input: TokenStream) -> TokenStream {
    combinator("all", input)
}

/// Waits for the first promise to resolve, or for all to reject.
#[proc_macro]
pub fn any(input: TokenStream) -> TokenStream {
    combinator("any", input)
}

/// Waits for whichever promise settles first.
#[proc_macro]
pub fn race(input: TokenStream) -> TokenStream {
    combinator("race", input)
}

/// Waits for every promise to settle, however it settles.
#[proc_macro]
pub fn all_settled(input: TokenStream) -> TokenStream {
    combinator("all_settled", input)
}

/// Builds the runtime constructor from attribute options.
fn runtime_builder(attr: TokenStream) -> Result<String, String> {
    let mut builder = String::from("::spindle::RuntimeBuilder::new()");

    for (key, value) in utils::parse_options(attr)? {
        match key.as_str() {
            "stack_size" | "idle_stack_size" | "event_capacity" => {
                let value = value
                    .replace('_', "")
                    .parse::<usize>()
                    .map_err(|_| format!("`{key}` expects an integer, found `{value}`"))?;
                builder.push_str(&format!(".{key}({value})"));
            }
            _ => return Err(format!("unknown option `{key}`")),
        }
    }

    builder.push_str(".build()");
    Ok(builder)
}

/// Wraps the body of the function in `block_on` on a fresh runtime.
fn wrap_body(attr: TokenStream, item: TokenStream, prefix: &str) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if tokens
        .iter()
        .any(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        return utils::compile_error("spindle entry points must not be `async`");
    }

    let builder = match runtime_builder(attr) {
        Ok(builder) => builder,
        Err(err) => return utils::compile_error(&err),
    };

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("expected a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => return utils::compile_error("expected a function body"),
    };

    let new_block = format!(
        "{{
            let runtime = {builder};
            runtime.block_on(move || {{ {block} }})
        }}"
    );

    if let Err(err) = utils::replace_body(&mut tokens, pos, &new_block) {
        return utils::compile_error(&err);
    }

    let mut result: Vec<TokenTree> = match prefix.parse::<TokenStream>() {
        Ok(prefix) => prefix.into_iter().collect(),
        Err(err) => return utils::compile_error(&err.to_string()),
    };
    result.extend(tokens);

    result.into_iter().collect()
}

/// Runs `main` inside a spindle runtime.
///
/// Accepts the `RuntimeBuilder` options `stack_size`, `idle_stack_size`
/// and `event_capacity`.
///
/// ```rust,ignore
/// #[spindle::main(stack_size = 1_048_576)]
/// fn main() -> spindle::Result<()> {
///     let listener = spindle::net::listen("0.0.0.0", 8080)?;
///     // ...
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    wrap_body(attr, item, "")
}

/// Marks a test that runs inside a fresh spindle runtime.
///
/// Accepts the same options as `#[spindle::main]`.
///
/// ```rust,ignore
/// #[spindle::test]
/// fn sleeps() {
///     spindle::time::sleep(Duration::from_millis(1)).wait().unwrap();
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    wrap_body(attr, item, "#[test]")
}
