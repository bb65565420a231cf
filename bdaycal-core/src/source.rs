//! Contact source collaborator.

use async_trait::async_trait;

use crate::contact::Contact;
use crate::error::BdayCalResult;

/// Reads the current contact set. Contacts without a birth date never reach
/// the core.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn list_contacts_with_birthday(&self) -> BdayCalResult<Vec<Contact>>;
}
