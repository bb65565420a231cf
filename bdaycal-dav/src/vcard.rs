//! Minimal vCard (RFC 6350 / 2426) reader: just the properties needed to
//! build a [`Contact`].

use anyhow::{Context, Result, bail};
use bdaycal_core::Contact;
use chrono::NaiveDate;

/// One `BEGIN:VCARD` .. `END:VCARD` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCard {
    properties: Vec<(String, String)>,
}

impl VCard {
    /// Raw value of the first property called `name` (case-insensitive,
    /// groups ignored).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn formatted_name(&self) -> Option<String> {
        self.get("FN")
            .map(unescape)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// `(given, family)` from the structured `N` property; `None` when both
    /// are blank (`N:;;;;`).
    pub fn structured_name(&self) -> Option<(String, String)> {
        let value = self.get("N")?;
        let parts = split_components(value);
        let family = parts.first().map(|s| s.trim().to_string()).unwrap_or_default();
        let given = parts.get(1).map(|s| s.trim().to_string()).unwrap_or_default();
        if given.is_empty() && family.is_empty() {
            return None;
        }
        Some((given, family))
    }

    /// The birth date, `None` if absent or year-less (`--MMDD`).
    pub fn birthday(&self) -> Result<Option<NaiveDate>> {
        let Some(value) = self.get("BDAY") else {
            return Ok(None);
        };
        parse_birthday(value)
    }

    /// Build a contact; `None` when there is no usable birthday.
    pub fn to_contact(&self) -> Result<Option<Contact>> {
        let Some(birthday) = self.birthday()? else {
            return Ok(None);
        };

        let formatted = self.formatted_name();
        let (first_name, last_name) = match (self.structured_name(), &formatted) {
            (Some(names), _) => names,
            (None, Some(formatted)) => (String::new(), formatted.clone()),
            (None, None) => bail!("vCard with a birthday has neither N nor FN"),
        };

        let display_name = formatted.unwrap_or_else(|| {
            format!("{} {}", first_name, last_name).trim().to_string()
        });

        Ok(Some(Contact::new(first_name, last_name, display_name, birthday)))
    }
}

/// Parse every vCard in `content`.
pub fn parse_vcards(content: &str) -> Result<Vec<VCard>> {
    let unfolded = icalendar::parser::unfold(content);

    let mut cards = Vec::new();
    let mut current: Option<VCard> = None;

    for (index, raw) in unfolded.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let (name, value) = split_line(line)
            .with_context(|| format!("Malformed vCard line {}: {}", index + 1, line))?;

        let is_vcard = value.eq_ignore_ascii_case("VCARD");
        match name.as_str() {
            "BEGIN" if is_vcard => {
                if current.is_some() {
                    bail!("Nested BEGIN:VCARD at line {}", index + 1);
                }
                current = Some(VCard::default());
            }
            "END" if is_vcard => {
                let card = current
                    .take()
                    .with_context(|| format!("END:VCARD without BEGIN at line {}", index + 1))?;
                cards.push(card);
            }
            _ => match current.as_mut() {
                Some(card) => card.properties.push((name.clone(), value.to_string())),
                None => bail!("Property outside of a vCard at line {}: {}", index + 1, line),
            },
        }
    }

    if current.is_some() {
        bail!("vCard is missing END:VCARD");
    }

    Ok(cards)
}

/// Split `group.NAME;PARAM=x:value` into the upper-cased name and the value.
fn split_line(line: &str) -> Option<(String, &str)> {
    let mut in_quotes = false;
    let colon = line.char_indices().find_map(|(i, c)| match c {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        ':' if !in_quotes => Some(i),
        _ => None,
    })?;

    let head = &line[..colon];
    let value = &line[colon + 1..];
    let name = head.split(';').next().unwrap_or(head);
    let name = name.rsplit('.').next().unwrap_or(name).trim();

    if name.is_empty() {
        return None;
    }

    Some((name.to_ascii_uppercase(), value))
}

/// Split a structured value on unescaped `;`, unescaping each component.
fn split_components(value: &str) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    push_escaped(parts.last_mut(), next);
                }
            }
            ';' => parts.push(String::new()),
            _ => {
                if let Some(part) = parts.last_mut() {
                    part.push(c);
                }
            }
        }
    }

    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                push_escaped(Some(&mut out), next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn push_escaped(target: Option<&mut String>, escaped: char) {
    if let Some(target) = target {
        match escaped {
            'n' | 'N' => target.push('\n'),
            other => target.push(other),
        }
    }
}

fn parse_birthday(value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();

    // Year-less birthdays cannot anchor a dated event
    if value.starts_with("--") {
        return Ok(None);
    }

    let date = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .map(Some)
        .with_context(|| format!("Unsupported BDAY value: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const ADA: &str = "BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
N:Lovelace;Ada;;;\r\n\
FN:Ada Lovelace\r\n\
item1.EMAIL;type=INTERNET:ada@example.org\r\n\
BDAY:18151210\r\n\
END:VCARD\r\n";

    #[test]
    fn test_parse_contact() {
        let cards = parse_vcards(ADA).unwrap();
        assert_eq!(cards.len(), 1);

        let contact = cards[0].to_contact().unwrap().unwrap();
        assert_eq!(contact.first_name, "Ada");
        assert_eq!(contact.last_name, "Lovelace");
        assert_eq!(contact.display_name, "Ada Lovelace");
        assert_eq!(contact.birthday, date(1815, 12, 10));
        assert_eq!(cards[0].get("email"), Some("ada@example.org"));
    }

    #[test]
    fn test_birthday_formats() {
        assert_eq!(parse_birthday("19800101").unwrap(), Some(date(1980, 1, 1)));
        assert_eq!(parse_birthday("1980-01-01").unwrap(), Some(date(1980, 1, 1)));
        assert_eq!(parse_birthday("1980-01-01T00:00:00Z").unwrap(), Some(date(1980, 1, 1)));
        assert_eq!(parse_birthday("19800101T120000").unwrap(), Some(date(1980, 1, 1)));
        assert_eq!(parse_birthday("--0101").unwrap(), None);
        assert!(parse_birthday("first of may").is_err());
    }

    #[test]
    fn test_folded_lines_and_escapes() {
        let content = concat!(
            "BEGIN:VCARD\r\n",
            r"N:O\;Brien;Con",
            "\r\n an;;;\r\n",
            "FN:Conan O'Brien\r\n",
            "BDAY;VALUE=date:1963-04-18\r\n",
            "END:VCARD\r\n",
        );

        let contact = parse_vcards(content).unwrap()[0].to_contact().unwrap().unwrap();

        assert_eq!(contact.first_name, "Conan");
        assert_eq!(contact.last_name, "O;Brien");
        assert_eq!(contact.birthday, date(1963, 4, 18));
    }

    #[test]
    fn test_name_fallbacks() {
        let only_fn = "BEGIN:VCARD\nFN:Prince\nBDAY:19580607\nEND:VCARD\n";
        let contact = parse_vcards(only_fn).unwrap()[0].to_contact().unwrap().unwrap();
        assert_eq!(contact.first_name, "");
        assert_eq!(contact.last_name, "Prince");
        assert_eq!(contact.display_name, "Prince");

        let only_n = "BEGIN:VCARD\nN:Hopper;Grace;;;\nBDAY:19061209\nEND:VCARD\n";
        let contact = parse_vcards(only_n).unwrap()[0].to_contact().unwrap().unwrap();
        assert_eq!(contact.display_name, "Grace Hopper");
    }

    #[test]
    fn test_blank_structured_name_falls_back_to_formatted_name() {
        let blank_n = "BEGIN:VCARD\nN:;;;;\nFN:Prince\nBDAY:19580607\nEND:VCARD\n";
        let contact = parse_vcards(blank_n).unwrap()[0].to_contact().unwrap().unwrap();
        assert_eq!(contact.first_name, "");
        assert_eq!(contact.last_name, "Prince");
        assert_eq!(contact.display_name, "Prince");

        let nothing = "BEGIN:VCARD\nN: ; ;;;\nBDAY:19580607\nEND:VCARD\n";
        assert!(parse_vcards(nothing).unwrap()[0].to_contact().is_err());
    }

    #[test]
    fn test_without_birthday_is_skipped() {
        let content = "BEGIN:VCARD\nN:Doe;Jane;;;\nFN:Jane Doe\nEND:VCARD\n";
        assert_eq!(parse_vcards(content).unwrap()[0].to_contact().unwrap(), None);

        let yearless = "BEGIN:VCARD\nN:Doe;Jane;;;\nBDAY:--0412\nEND:VCARD\n";
        assert_eq!(parse_vcards(yearless).unwrap()[0].to_contact().unwrap(), None);
    }

    #[test]
    fn test_multiple_cards() {
        let content = format!("{ADA}{ADA}");
        assert_eq!(parse_vcards(&content).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse_vcards("BEGIN:VCARD\nFN:Open\n").is_err());
        assert!(parse_vcards("FN:Loose\n").is_err());
        assert!(parse_vcards("BEGIN:VCARD\nno colon here\nEND:VCARD\n").is_err());
    }
}
