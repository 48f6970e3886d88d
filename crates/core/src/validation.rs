//! Client-side form validation.
//!
//! Each validator runs its checks in a fixed order and stops at the first
//! failure. The error's `Display` is the message shown to the user, and no
//! network call should be issued when validation fails.

use serde::{Deserialize, Serialize};

use crate::types::{Address, AddressId};

/// Minimum length for usernames and passwords.
pub const MIN_CREDENTIAL_LENGTH: usize = 6;

// =============================================================================
// Registration
// =============================================================================

/// Input from the registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Reasons a registration form is rejected before reaching the service.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Username is a required field")]
    UsernameRequired,
    #[error("Username must be at least 6 characters")]
    UsernameTooShort,
    #[error("Password is a required field")]
    PasswordRequired,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Validate a registration form.
///
/// Checks, in order: username present, username length, password present,
/// password length, password matches confirmation. The presence and length
/// checks look at trimmed values; the confirmation must match exactly.
///
/// # Errors
///
/// Returns the first failed check.
pub fn validate_registration(form: &RegistrationForm) -> Result<(), RegistrationError> {
    let username = form.username.trim();
    let password = form.password.trim();

    if username.is_empty() {
        return Err(RegistrationError::UsernameRequired);
    }
    if username.chars().count() < MIN_CREDENTIAL_LENGTH {
        return Err(RegistrationError::UsernameTooShort);
    }
    if password.is_empty() {
        return Err(RegistrationError::PasswordRequired);
    }
    if password.chars().count() < MIN_CREDENTIAL_LENGTH {
        return Err(RegistrationError::PasswordTooShort);
    }
    if form.password != form.confirm_password {
        return Err(RegistrationError::PasswordMismatch);
    }
    Ok(())
}

// =============================================================================
// Login
// =============================================================================

/// Input from the login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Reasons a login form is rejected before reaching the service.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    #[error("Username is a required field")]
    UsernameRequired,
    #[error("Password is a required field")]
    PasswordRequired,
}

/// Validate a login form: username, then password, must be non-empty.
///
/// # Errors
///
/// Returns the first failed check.
pub fn validate_login(form: &LoginForm) -> Result<(), LoginError> {
    if form.username.trim().is_empty() {
        return Err(LoginError::UsernameRequired);
    }
    if form.password.trim().is_empty() {
        return Err(LoginError::PasswordRequired);
    }
    Ok(())
}

// =============================================================================
// Checkout
// =============================================================================

/// Reasons an order can't be placed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("You do not have enough balance in your wallet for this purchase")]
    InsufficientBalance,
    #[error("Please add a new address before proceeding.")]
    NoAddresses,
    #[error("Please select one shipping address to proceed.")]
    NoAddressSelected,
}

/// Validate a checkout request.
///
/// Checks, in order: the order total fits in the wallet balance, at least one
/// address is saved, an address is selected. The balance check wins no matter
/// what the address state is.
///
/// # Errors
///
/// Returns the first failed check.
pub fn validate_checkout(
    total: f64,
    balance: f64,
    addresses: &[Address],
    selected: Option<&AddressId>,
) -> Result<(), CheckoutError> {
    if total > balance {
        return Err(CheckoutError::InsufficientBalance);
    }
    if addresses.is_empty() {
        return Err(CheckoutError::NoAddresses);
    }
    if selected.is_none() {
        return Err(CheckoutError::NoAddressSelected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn address(id: &str) -> Address {
        Address {
            id: AddressId::new(id),
            address: format!("{id} Main Street, Springfield"),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    #[test]
    fn test_registration_username_required() {
        let form = registration("", "abcdef", "abcdef");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::UsernameRequired)
        );
    }

    #[test]
    fn test_registration_whitespace_username_is_empty() {
        let form = registration("   ", "abcdef", "abcdef");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::UsernameRequired)
        );
    }

    #[test]
    fn test_registration_username_too_short() {
        let form = registration("abc", "abcdef", "abcdef");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::UsernameTooShort)
        );
    }

    #[test]
    fn test_registration_password_required() {
        let form = registration("abcdef", "", "");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::PasswordRequired)
        );
    }

    #[test]
    fn test_registration_password_too_short() {
        let form = registration("abcdef", "abc", "abc");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::PasswordTooShort)
        );
    }

    #[test]
    fn test_registration_password_mismatch() {
        let form = registration("abcdef", "abcdef", "xyzxyz");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_registration_confirmation_compared_untrimmed() {
        let form = registration("abcdef", "abcdef ", "abcdef");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_registration_valid() {
        let form = registration("abcdef", "abcdef", "abcdef");
        assert_eq!(validate_registration(&form), Ok(()));
    }

    #[test]
    fn test_registration_first_failure_wins() {
        // Short username and mismatched passwords: username reported first
        let form = registration("abc", "abcdef", "xyzxyz");
        assert_eq!(
            validate_registration(&form),
            Err(RegistrationError::UsernameTooShort)
        );
    }

    #[test]
    fn test_registration_error_messages() {
        assert_eq!(
            RegistrationError::UsernameRequired.to_string(),
            "Username is a required field"
        );
        assert_eq!(
            RegistrationError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
    }

    // =========================================================================
    // Login
    // =========================================================================

    #[test]
    fn test_login_validation_order() {
        let empty = LoginForm::default();
        assert_eq!(validate_login(&empty), Err(LoginError::UsernameRequired));

        let no_password = LoginForm {
            username: "crio.do".to_string(),
            password: String::new(),
        };
        assert_eq!(validate_login(&no_password), Err(LoginError::PasswordRequired));

        let valid = LoginForm {
            username: "crio.do".to_string(),
            password: "learnbydoing".to_string(),
        };
        assert_eq!(validate_login(&valid), Ok(()));
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    #[test]
    fn test_checkout_insufficient_balance_wins() {
        let addresses = vec![address("a1")];
        let selected = AddressId::new("a1");

        assert_eq!(
            validate_checkout(5000.0, 100.0, &addresses, Some(&selected)),
            Err(CheckoutError::InsufficientBalance)
        );
        assert_eq!(
            validate_checkout(5000.0, 100.0, &[], None),
            Err(CheckoutError::InsufficientBalance)
        );
    }

    #[test]
    fn test_checkout_requires_address() {
        assert_eq!(
            validate_checkout(100.0, 5000.0, &[], None),
            Err(CheckoutError::NoAddresses)
        );
    }

    #[test]
    fn test_checkout_requires_selection() {
        let addresses = vec![address("a1"), address("a2")];
        assert_eq!(
            validate_checkout(100.0, 5000.0, &addresses, None),
            Err(CheckoutError::NoAddressSelected)
        );
    }

    #[test]
    fn test_checkout_valid() {
        let addresses = vec![address("a1")];
        let selected = AddressId::new("a1");
        assert_eq!(
            validate_checkout(100.0, 5000.0, &addresses, Some(&selected)),
            Ok(())
        );
    }

    #[test]
    fn test_checkout_exact_balance_is_enough() {
        let addresses = vec![address("a1")];
        let selected = AddressId::new("a1");
        assert_eq!(
            validate_checkout(5000.0, 5000.0, &addresses, Some(&selected)),
            Ok(())
        );
    }
}
