//! WebDAV requests libdav has no ready-made type for.
//!
//! Both answer with a `207 Multi-Status` body parsed with roxmltree.

use bdaycal_core::remote::DavEntry;
use http::Method;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use roxmltree::Node;

/// PROPFIND with `Depth: 1` on a collection.
///
/// The answer includes the collection itself; callers filter it out.
pub(crate) struct ListMembers<'a> {
    collection_href: &'a str,
}

impl<'a> ListMembers<'a> {
    pub fn new(collection_href: &'a str) -> Self {
        Self { collection_href }
    }
}

#[derive(Debug)]
pub(crate) struct ListMembersResponse {
    pub entries: Vec<DavEntry>,
}

impl DavRequest for ListMembers<'_> {
    type Response = ListMembersResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
    <d:getcontenttype/>
    <d:getetag/>
  </d:prop>
</d:propfind>"#;

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.collection_href.to_string(),
            body: body.to_string(),
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let text = std::str::from_utf8(body)?;
        let entries = parse_members(text)?;
        Ok(ListMembersResponse { entries })
    }
}

fn parse_members(xml: &str) -> Result<Vec<DavEntry>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;

    let mut entries = Vec::new();
    for response in doc
        .root_element()
        .descendants()
        .filter(|n| is_dav(n, "response"))
    {
        let Some(href) = response_href(&response) else {
            continue;
        };

        let media_type = prop_text(&response, "getcontenttype");

        let is_collection = response
            .descendants()
            .filter(|n| is_dav(n, "resourcetype"))
            .any(|n| n.children().any(|c| is_dav(&c, "collection")));

        entries.push(DavEntry {
            href,
            media_type,
            is_collection,
        });
    }

    Ok(entries)
}

/// CardDAV `addressbook-query` REPORT returning every vCard in one round trip.
pub(crate) struct GetAddressBookData<'a> {
    address_book_href: &'a str,
}

impl<'a> GetAddressBookData<'a> {
    pub fn new(address_book_href: &'a str) -> Self {
        Self { address_book_href }
    }
}

/// One address object and its vCard text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddressObject {
    pub href: String,
    pub data: String,
}

#[derive(Debug)]
pub(crate) struct GetAddressBookDataResponse {
    pub cards: Vec<AddressObject>,
}

impl DavRequest for GetAddressBookData<'_> {
    type Response = GetAddressBookDataResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        let body = r#"<C:addressbook-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:carddav">
    <prop>
        <getetag/>
        <C:address-data/>
    </prop>
</C:addressbook-query>"#;

        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.address_book_href.to_string(),
            body: body.to_string(),
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let text = std::str::from_utf8(body)?;
        let cards = parse_address_data(text)?;
        Ok(GetAddressBookDataResponse { cards })
    }
}

fn parse_address_data(xml: &str) -> Result<Vec<AddressObject>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;

    let mut cards = Vec::new();
    for response in doc
        .root_element()
        .descendants()
        .filter(|n| is_dav(n, "response"))
    {
        let Some(href) = response_href(&response) else {
            continue;
        };

        // Resources without data (collection, 404 propstat) are skipped
        if let Some(data) = prop_text(&response, "address-data") {
            cards.push(AddressObject { href, data });
        }
    }

    Ok(cards)
}

fn response_href(response: &Node) -> Option<String> {
    response
        .children()
        .find(|n| is_dav(n, "href"))
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn prop_text(response: &Node, name: &str) -> Option<String> {
    response
        .descendants()
        .find(|n| is_dav(n, name))
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_dav(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/dev/Calendar/birthdays/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/dev/Calendar/birthdays/abc.ics</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontenttype>text/calendar; charset=utf-8; component=vevent</d:getcontenttype>
        <d:getetag>"1"</d:getetag>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/dev/Calendar/birthdays/notes.txt</d:href>
    <d:propstat>
      <d:prop><d:resourcetype/></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
    <d:propstat>
      <d:prop><d:getcontenttype/></d:prop>
      <d:status>HTTP/1.1 404 Not Found</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_members() {
        let entries = parse_members(LISTING).unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_collection);
        assert_eq!(entries[1].href, "/dav/dev/Calendar/birthdays/abc.ics");
        assert_eq!(
            entries[1].media_type.as_deref(),
            Some("text/calendar; charset=utf-8; component=vevent")
        );
        assert!(entries[1].is_calendar_object());
        assert_eq!(entries[2].media_type, None);
    }

    #[test]
    fn test_parse_members_default_namespace() {
        let xml = r#"<multistatus xmlns="DAV:"><response><href>/c/x.vcf</href>
<propstat><prop><getcontenttype>text/vcard</getcontenttype><resourcetype/></prop></propstat>
</response></multistatus>"#;

        let entries = parse_members(xml).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].media_type.as_deref(), Some("text/vcard"));
    }

    #[test]
    fn test_parse_address_data() {
        let xml = r#"<d:multistatus xmlns:d="DAV:" xmlns:card="urn:ietf:params:xml:ns:carddav">
  <d:response>
    <d:href>/card/ada.vcf</d:href>
    <d:propstat>
      <d:prop>
        <d:getetag>"7"</d:getetag>
        <card:address-data>BEGIN:VCARD
FN:Ada Lovelace
END:VCARD
</card:address-data>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/card/broken.vcf</d:href>
    <d:propstat>
      <d:prop><card:address-data/></d:prop>
      <d:status>HTTP/1.1 404 Not Found</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let cards = parse_address_data(xml).unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].href, "/card/ada.vcf");
        assert!(cards[0].data.starts_with("BEGIN:VCARD"));
        assert!(cards[0].data.contains("FN:Ada Lovelace"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_members("<unclosed").is_err());
        assert!(parse_address_data("<unclosed").is_err());
    }
}
