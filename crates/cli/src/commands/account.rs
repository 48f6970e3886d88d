//! Account commands.

use qkart_core::{LoginForm, RegistrationForm};
use qkart_storefront::flows::AuthFlow;
use qkart_storefront::view::format_price;

use super::{CommandError, Context};
use crate::output;

/// Create an account.
///
/// # Errors
///
/// Returns an error if the form is invalid or the service refuses it.
pub async fn register(
    ctx: &Context,
    username: String,
    password: String,
    confirm_password: String,
) -> Result<(), CommandError> {
    let mut flow = AuthFlow::new(ctx.client.clone(), ctx.notifier());
    let form = RegistrationForm {
        username,
        password,
        confirm_password,
    };
    flow.register(&form).await?;
    Ok(())
}

/// Log in and save the session.
///
/// # Errors
///
/// Returns an error if the credentials are refused or the session can't be
/// saved.
pub async fn login(ctx: &mut Context, username: String, password: String) -> Result<(), CommandError> {
    let mut flow = AuthFlow::new(ctx.client.clone(), ctx.notifier());
    flow.login(&LoginForm { username, password }, &mut ctx.session)
        .await?;
    ctx.save_session()?;
    whoami(ctx);
    Ok(())
}

/// Clear the saved session.
///
/// # Errors
///
/// Returns an error if the session file can't be written.
pub fn logout(ctx: &mut Context) -> Result<(), CommandError> {
    let mut flow = AuthFlow::new(ctx.client.clone(), ctx.notifier());
    flow.logout(&mut ctx.session);
    ctx.save_session()
}

/// Print who is logged in.
pub fn whoami(ctx: &Context) {
    let text = match ctx.session.username() {
        Some(username) => format!(
            "{username}\nWallet balance: {}\n",
            format_price(ctx.session.balance())
        ),
        None => "Not logged in\n".to_string(),
    };
    output::emit(&text);
}
