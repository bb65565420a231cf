//! In-memory collaborators for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::contact::Contact;
use crate::error::{BdayCalError, BdayCalResult};
use crate::ics::{CALENDAR_MEDIA_TYPE, EventCodec};
use crate::identity::identify;
use crate::remote::{DavEntry, Reachability, RemoteStore, event_href};
use crate::source::ContactSource;

pub fn contact(first: &str, last: &str, year: i32, month: u32, day: u32) -> Contact {
    Contact::new(
        first,
        last,
        format!("{first} {last}"),
        NaiveDate::from_ymd_opt(year, month, day).unwrap(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Get(String),
    Put(String),
    Delete(String),
    Probe(String),
}

#[derive(Default)]
struct State {
    resources: BTreeMap<String, (String, Vec<u8>)>,
    failing: HashSet<String>,
    unreachable_probes: u32,
    calls: Vec<Call>,
}

/// Store that keeps resources in memory and records every call.
pub struct FakeStore {
    collection: String,
    state: Mutex<State>,
}

impl FakeStore {
    pub fn new(collection: &str) -> Self {
        FakeStore {
            collection: collection.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    /// Store the encoded event for `contact` where the engine would put it.
    pub fn insert_event(&self, codec: &EventCodec, contact: &Contact) -> String {
        let href = event_href(&self.collection, &identify(contact));
        let ics = codec.encode(contact).unwrap();
        self.insert_raw(&href, CALENDAR_MEDIA_TYPE, &ics);
        href
    }

    pub fn insert_raw(&self, href: &str, media_type: &str, content: &str) {
        self.state.lock().unwrap().resources.insert(
            href.to_string(),
            (media_type.to_string(), content.as_bytes().to_vec()),
        );
    }

    /// Every call touching `href` fails with a transport error.
    pub fn fail_on(&self, href: &str) {
        self.state.lock().unwrap().failing.insert(href.to_string());
    }

    /// The next `count` probes report the store unreachable.
    pub fn unreachable_for(&self, count: u32) {
        self.state.lock().unwrap().unreachable_probes = count;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn get_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Get(_)))
    }

    pub fn probe_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Probe(_)))
    }

    pub fn mutation_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Put(_) | Call::Delete(_)))
    }

    pub fn contains(&self, href: &str) -> bool {
        self.state.lock().unwrap().resources.contains_key(href)
    }

    pub fn body(&self, href: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(href)
            .map(|(_, body)| String::from_utf8_lossy(body).into_owned())
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| predicate(*c)).count()
    }

    fn record(&self, call: Call, href: &str) -> BdayCalResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(href) {
            return Err(BdayCalError::Transport(format!("injected failure for {href}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list(&self, collection: &str) -> BdayCalResult<Vec<DavEntry>> {
        self.record(Call::List(collection.to_string()), collection)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .resources
            .iter()
            .map(|(href, (media_type, _))| DavEntry {
                href: href.clone(),
                media_type: Some(media_type.clone()),
                is_collection: false,
            })
            .collect())
    }

    async fn get(&self, href: &str) -> BdayCalResult<Vec<u8>> {
        self.record(Call::Get(href.to_string()), href)?;
        self.state
            .lock()
            .unwrap()
            .resources
            .get(href)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| BdayCalError::Transport(format!("404 Not Found: {href}")))
    }

    async fn put(&self, href: &str, body: Vec<u8>) -> BdayCalResult<()> {
        self.record(Call::Put(href.to_string()), href)?;
        self.state
            .lock()
            .unwrap()
            .resources
            .insert(href.to_string(), (CALENDAR_MEDIA_TYPE.to_string(), body));
        Ok(())
    }

    async fn delete(&self, href: &str) -> BdayCalResult<()> {
        self.record(Call::Delete(href.to_string()), href)?;
        self.state.lock().unwrap().resources.remove(href);
        Ok(())
    }

    async fn probe(&self, base_address: &str) -> Reachability {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Probe(base_address.to_string()));
        if state.unreachable_probes > 0 {
            state.unreachable_probes -= 1;
            return Reachability::Unreachable("connection refused".to_string());
        }
        Reachability::Reachable
    }
}

/// Contact source backed by a fixed list.
pub struct StaticSource(pub Result<Vec<Contact>, String>);

#[async_trait]
impl ContactSource for StaticSource {
    async fn list_contacts_with_birthday(&self) -> BdayCalResult<Vec<Contact>> {
        self.0.clone().map_err(BdayCalError::Source)
    }
}
