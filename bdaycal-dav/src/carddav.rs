//! Contacts read from a CardDAV address book.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bdaycal_core::config::DavConfig;
use bdaycal_core::source::ContactSource;
use bdaycal_core::{BdayCalError, BdayCalResult, Contact};
use libdav::CardDavClient;
use tracing::{debug, info};

use crate::client::{HttpClient, bounded, url_to_href, webdav_client};
use crate::requests::GetAddressBookData;
use crate::vcard::parse_vcards;

pub struct CardDavSource {
    carddav: CardDavClient<HttpClient>,
    card_href: String,
    timeout: Duration,
}

impl CardDavSource {
    pub fn new(card_url: &str, user: &str, password: &str, timeout: Duration) -> Result<Self> {
        let carddav = CardDavClient::new(webdav_client(card_url, user, password)?);
        Ok(CardDavSource {
            carddav,
            card_href: url_to_href(card_url),
            timeout,
        })
    }

    pub fn from_config(config: &DavConfig) -> Result<Self> {
        Self::new(&config.card_url, &config.user, &config.password, config.timeout)
    }

    /// Every contact in the address book that has a full birth date.
    pub async fn read_contacts(&self) -> Result<Vec<Contact>> {
        let request = GetAddressBookData::new(&self.card_href);
        let response = bounded(self.timeout, self.carddav.request(request))
            .await
            .with_context(|| format!("Failed to read address book {}", self.card_href))?;
        info!(address_book = %self.card_href, entries = response.cards.len(), "read address book");

        let mut contacts = Vec::new();

        for object in &response.cards {
            let cards = parse_vcards(&object.data)
                .with_context(|| format!("Could not read vCard {}", object.href))?;

            for card in cards {
                let contact = card
                    .to_contact()
                    .with_context(|| format!("Could not read contact in {}", object.href))?;
                match contact {
                    Some(contact) => contacts.push(contact),
                    None => debug!(href = %object.href, "no full birthday, skipping contact"),
                }
            }
        }

        Ok(contacts)
    }
}

#[async_trait]
impl ContactSource for CardDavSource {
    async fn list_contacts_with_birthday(&self) -> BdayCalResult<Vec<Contact>> {
        self.read_contacts()
            .await
            .map_err(|e| BdayCalError::Source(format!("{:#}", e)))
    }
}
