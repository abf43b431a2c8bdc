//! Proc-macros for interaction tracking.
//!
//! This crate provides the `#[tracked]` attribute macro, which runs a function's
//! body inside a freshly tracked interaction.
//!
//! # Example
//!
//! ```ignore
//! use interaction_tracking::tracked;
//!
//! #[tracked("Open settings")]
//! fn open_settings(panel: &Panel) -> usize {
//!     // Runs with "Open settings" active; the return type becomes
//!     // TrackingResult<usize>
//!     panel.render()
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};
use syn::{
    Expr, ExprLit, ItemFn, Lit, ReturnType, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input, parse_quote,
    punctuated::Punctuated,
    spanned::Spanned,
};

/// Arguments for the `#[tracked]` attribute.
///
/// Supports:
/// - `#[tracked("name")]` - Interaction name, any `impl Into<String>` expression
/// - `#[tracked("name", timestamp = expr)]` - Interaction timestamp (default: `now_millis()`)
/// - `#[tracked("name", thread = expr)]` - Thread the work runs on (default: `ThreadId::DEFAULT`)
struct TrackedArgs {
    name: Expr,
    timestamp: Option<Expr>,
    thread: Option<Expr>,
}

impl Parse for TrackedArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name: Option<Expr> = None;
        let mut timestamp: Option<Expr> = None;
        let mut thread: Option<Expr> = None;

        let args = Punctuated::<Expr, Token![,]>::parse_terminated(input)?;

        for (i, arg) in args.into_iter().enumerate() {
            match arg {
                Expr::Assign(assign) => {
                    let key = assign.left.to_token_stream().to_string();
                    match key.as_str() {
                        "timestamp" => timestamp = Some(*assign.right),
                        "thread" => thread = Some(*assign.right),
                        _ => {
                            return Err(syn::Error::new(
                                assign.span(),
                                format!("unknown attribute: {}", key),
                            ));
                        }
                    }
                }
                // First positional argument is the name
                arg @ Expr::Lit(ExprLit {
                    lit: Lit::Str(_), ..
                }) if i == 0 => name = Some(arg),
                arg => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            arg.span(),
                            "only the interaction name may be given positionally",
                        ));
                    }
                    name = Some(arg);
                }
            }
        }

        let name = name.ok_or_else(|| {
            syn::Error::new(
                input.span(),
                "interaction name is required as first argument",
            )
        })?;

        Ok(TrackedArgs {
            name,
            timestamp,
            thread,
        })
    }
}

/// Attribute macro that tracks a new interaction around a function body.
///
/// # Usage
///
/// ```ignore
/// #[tracked("Save")]
/// fn save(doc: &Document) -> Result<(), SaveError> { ... }
///
/// // Caller-supplied timestamp and thread
/// #[tracked("Drag", timestamp = event.time, thread = lane)]
/// fn on_drag(event: &DragEvent, lane: ThreadId) { ... }
///
/// // Async functions keep the interaction across every poll
/// #[tracked(format!("Load {}", id))]
/// async fn load(id: u64) -> Profile { ... }
/// ```
///
/// # Expansion
///
/// The return type `T` becomes `interaction_tracking::TrackingResult<T>`:
///
/// ```ignore
/// fn save(doc: &Document) -> TrackingResult<Result<(), SaveError>> {
///     interaction_tracking::track_with_thread("Save", now_millis(), ThreadId::DEFAULT,
///         move || -> Result<(), SaveError> { /* original body */ })
/// }
/// ```
///
/// Async bodies are instrumented with `InteractionInstrument::in_interactions`
/// from inside the tracked scope, so the interaction stays pending until the
/// future completes.
#[proc_macro_attribute]
pub fn tracked(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as TrackedArgs);
    let input_fn = parse_macro_input!(input as ItemFn);

    match generate_tracked_wrapper(args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_tracked_wrapper(args: TrackedArgs, input_fn: ItemFn) -> syn::Result<TokenStream2> {
    let TrackedArgs {
        name,
        timestamp,
        thread,
    } = args;

    let fn_vis = &input_fn.vis;
    let fn_attrs = &input_fn.attrs;
    let fn_block = &input_fn.block;
    let is_async = input_fn.sig.asyncness.is_some();

    let ret_ty: Type = match &input_fn.sig.output {
        ReturnType::Default => parse_quote!(()),
        ReturnType::Type(_, ty) => {
            if let Type::ImplTrait(impl_trait) = &**ty {
                return Err(syn::Error::new(
                    impl_trait.span(),
                    "#[tracked] cannot wrap functions returning `impl Trait`",
                ));
            }
            (**ty).clone()
        }
    };

    let mut fn_sig = input_fn.sig.clone();
    fn_sig.output = parse_quote!(-> ::interaction_tracking::TrackingResult<#ret_ty>);

    let timestamp = timestamp
        .map(ToTokens::into_token_stream)
        .unwrap_or_else(|| quote! { ::interaction_tracking::now_millis() });
    let thread = thread
        .map(ToTokens::into_token_stream)
        .unwrap_or_else(|| quote! { ::interaction_tracking::ThreadId::DEFAULT });

    let output = if is_async {
        // The future is created inside the tracked scope so it captures the new interaction
        quote! {
            #(#fn_attrs)*
            #fn_vis #fn_sig {
                use ::interaction_tracking::InteractionInstrument as _;
                let __tracker = ::interaction_tracking::default_tracker();
                let __scope = __tracker.clone();
                let __thread = #thread;
                let __tracked = __tracker.track_with_thread(#name, #timestamp, __thread, move || {
                    (async move { let __value: #ret_ty = #fn_block; __value })
                        .in_interactions(&__scope, __thread)
                })??;
                __tracked.await
            }
        }
    } else {
        quote! {
            #(#fn_attrs)*
            #fn_vis #fn_sig {
                ::interaction_tracking::track_with_thread(
                    #name,
                    #timestamp,
                    #thread,
                    move || -> #ret_ty #fn_block,
                )
            }
        }
    };

    Ok(output)
}
