//! Cart commands.

use qkart_core::{ProductId, QuantityChange};
use qkart_storefront::flows::CatalogFlow;

use super::{CommandError, Context};
use crate::output;

async fn loaded_flow(ctx: &Context) -> Result<CatalogFlow, CommandError> {
    let mut flow = CatalogFlow::new(ctx.client.clone(), ctx.notifier());
    flow.load(&ctx.session).await?;
    Ok(flow)
}

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the catalog can't be fetched.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let flow = loaded_flow(ctx).await?;
    output::emit(&flow.cart_view().to_string());
    Ok(())
}

/// Add a product with quantity 1.
///
/// # Errors
///
/// Returns an error if the product can't be added.
pub async fn add(ctx: &Context, product_id: &str) -> Result<(), CommandError> {
    let mut flow = loaded_flow(ctx).await?;
    flow.add_to_cart(&ctx.session, &ProductId::new(product_id))
        .await?;
    output::emit(&flow.cart_view().to_string());
    Ok(())
}

/// Step a product's quantity up or down by one.
///
/// # Errors
///
/// Returns an error if the product isn't in the cart or the update fails.
pub async fn step(
    ctx: &Context,
    product_id: &str,
    change: QuantityChange,
) -> Result<(), CommandError> {
    let mut flow = loaded_flow(ctx).await?;
    let product_id = ProductId::new(product_id);
    let item = flow
        .item(&product_id)
        .cloned()
        .ok_or(CommandError::NotInCart(product_id))?;

    flow.request_quantity_change(&ctx.session, &item, change)
        .await?;
    output::emit(&flow.cart_view().to_string());
    Ok(())
}
