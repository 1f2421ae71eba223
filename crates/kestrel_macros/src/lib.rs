use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat, Type};

/// Time a simulation system when the `perf_stats` feature is enabled.
///
/// The function body is wrapped in a drop guard that measures wall time and
/// emits a `[PERF]` line through `tracing` when the body ran longer than the
/// threshold. Without `perf_stats` the guard is compiled out entirely.
///
/// If the function takes a `tick: Res<SimTick>` parameter, the guard also
/// logs every 100th tick regardless of duration.
///
/// ```ignore
/// #[profile]
/// pub fn run_collision_step(mut world: ResMut<CollisionSystem>, tick: Res<SimTick>) {
///     // ...
/// }
///
/// #[profile(2)] // threshold in milliseconds
/// pub fn record_state_checksum(/* ... */) {}
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().trim().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let takes_sim_tick = sig.inputs.iter().any(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return false;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return false;
        };
        pat_ident.ident == "tick" && type_mentions(&pat_type.ty, "SimTick")
    });

    let tick_field = if takes_sim_tick {
        quote! { Some(tick.0) }
    } else {
        quote! { None }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _perf_guard = {
                struct PerfGuard {
                    name: &'static str,
                    start: std::time::Instant,
                    tick: Option<u64>,
                }
                impl Drop for PerfGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        let periodic = self.tick.map(|t| t % 100 == 0).unwrap_or(false);
                        if elapsed.as_millis() > #threshold_ms || periodic {
                            tracing::info!("[PERF] {}: {:?} (tick {:?})", self.name, elapsed, self.tick);
                        }
                    }
                }
                PerfGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                    tick: #tick_field,
                }
            };

            #block
        }
    };

    output.into()
}

fn type_mentions(ty: &Type, needle: &str) -> bool {
    quote!(#ty).to_string().contains(needle)
}
