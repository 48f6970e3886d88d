//! Placing an order.

use qkart_core::AddressId;
use qkart_storefront::flows::CheckoutFlow;

use super::{CommandError, Context};
use crate::output;

/// Check out the cart, shipping to `address_id`, and save the lowered
/// wallet balance.
///
/// # Errors
///
/// Returns an error if the order is refused locally or by the service, or
/// the session can't be saved.
pub async fn place_order(ctx: &mut Context, address_id: &str) -> Result<(), CommandError> {
    let mut flow = CheckoutFlow::new(ctx.client.clone(), ctx.notifier());
    flow.load(&ctx.session).await?;
    output::emit(&flow.cart_view().to_string());

    flow.select_address(&AddressId::new(address_id))?;
    let receipt = flow.place_order(&mut ctx.session).await?;
    ctx.save_session()?;

    output::emit(&output::receipt(&receipt));
    Ok(())
}
