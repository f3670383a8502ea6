//! Alert recipient resolution.

use intake_governance_core::error::LookupError;
use intake_governance_core::intake::RequesterIdentifier;
use intake_governance_core::ports::{ContactInfo, EmailAddress, UserDirectory};

/// Who an expiration alert goes to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipients {
    /// Email addresses, governance mailbox last
    pub addresses: Vec<EmailAddress>,
    /// Requester contact, when the lookup succeeded
    pub requester: Option<ContactInfo>,
}

/// Resolves alert recipients for a requester.
///
/// The governance mailbox always receives the alert. The requester is added
/// when the directory knows them. A malformed or unknown identifier is
/// logged and degrades to the mailbox alone.
///
/// # Errors
///
/// Returns the lookup error when it is not one of the expected kinds (see
/// [`LookupError::is_expected`]); the caller should skip this intake.
pub async fn resolve_recipients(
    directory: &dyn UserDirectory,
    requester: &RequesterIdentifier,
    governance_mailbox: &EmailAddress,
) -> Result<Recipients, LookupError> {
    match directory.fetch_user_info(requester).await {
        Ok(contact) => Ok(Recipients {
            addresses: vec![contact.email.clone(), governance_mailbox.clone()],
            requester: Some(contact),
        }),
        Err(error) if error.is_expected() => {
            tracing::warn!(
                requester = %requester,
                %error,
                "Requester lookup failed, alerting governance mailbox only"
            );
            Ok(Recipients {
                addresses: vec![governance_mailbox.clone()],
                requester: None,
            })
        },
        Err(error) => Err(error),
    }
}
