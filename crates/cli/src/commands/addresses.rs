//! Shipping address commands.

use qkart_core::AddressId;
use qkart_storefront::flows::CheckoutFlow;

use super::{CommandError, Context};
use crate::output;

/// List saved addresses.
///
/// # Errors
///
/// Returns an error if not logged in or the checkout data can't be loaded.
pub async fn list(ctx: &Context) -> Result<(), CommandError> {
    let mut flow = CheckoutFlow::new(ctx.client.clone(), ctx.notifier());
    flow.load(&ctx.session).await?;
    output::emit(&output::addresses(flow.addresses()));
    Ok(())
}

/// Save a new address.
///
/// # Errors
///
/// Returns an error if not logged in or the service refuses the address.
pub async fn add(ctx: &Context, address: &str) -> Result<(), CommandError> {
    let mut flow = CheckoutFlow::new(ctx.client.clone(), ctx.notifier());
    flow.add_address(&ctx.session, address).await?;
    output::emit(&output::addresses(flow.addresses()));
    Ok(())
}

/// Delete a saved address.
///
/// # Errors
///
/// Returns an error if not logged in or the delete fails.
pub async fn delete(ctx: &Context, address_id: &str) -> Result<(), CommandError> {
    let mut flow = CheckoutFlow::new(ctx.client.clone(), ctx.notifier());
    flow.delete_address(&ctx.session, &AddressId::new(address_id))
        .await?;
    output::emit(&output::addresses(flow.addresses()));
    Ok(())
}
