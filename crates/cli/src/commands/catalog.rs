//! Product listing and search.

use tokio::io::{AsyncBufReadExt, BufReader};

use qkart_storefront::flows::{CatalogFlow, SearchTrigger};

use super::{CommandError, Context};
use crate::output;

/// List the catalog, or the products matching `search`. With `refresh` the
/// cached catalog is dropped first.
///
/// # Errors
///
/// Returns an error if the catalog or the search can't be fetched.
pub async fn products(
    ctx: &Context,
    search: Option<&str>,
    refresh: bool,
) -> Result<(), CommandError> {
    let mut flow = CatalogFlow::new(ctx.client.clone(), ctx.notifier());
    if refresh {
        flow.refresh(&ctx.session).await?;
    } else {
        flow.load(&ctx.session).await?;
    }

    if let Some(text) = search {
        flow.search(text).await?;
    }

    output::emit(&output::products(flow.products()));
    Ok(())
}

/// Search as you type: every stdin line replaces the query, and the listing
/// is printed once input has been quiet for the configured delay.
///
/// Ends at end of input, after the last query's results are shown.
///
/// # Errors
///
/// Returns an error if the catalog can't be loaded or stdin can't be read.
pub async fn interactive_search(ctx: &Context) -> Result<(), CommandError> {
    let mut flow = CatalogFlow::new(ctx.client.clone(), ctx.notifier());
    flow.load(&ctx.session).await?;
    output::emit(&output::products(flow.products()));

    let (trigger, mut results) = SearchTrigger::new(ctx.client.clone(), ctx.config.search_debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let mut awaiting: Option<String> = None;

    while input_open || awaiting.is_some() {
        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(text) => {
                    trigger.input(text.clone());
                    awaiting = Some(text);
                }
                None => input_open = false,
            },
            Some(search) = results.recv() => {
                if awaiting.as_deref() == Some(search.text.as_str()) {
                    awaiting = None;
                }
                // Failures were already reported by the flow
                if flow.apply_search_result(search).is_ok() {
                    output::emit(&output::products(flow.products()));
                }
            }
            else => break,
        }
    }

    Ok(())
}
