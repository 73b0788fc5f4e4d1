use crate::client::SiteClient;
use std::collections::HashMap;
use texting_robots::Robot;
use tracing::{debug, warn};
use url::Url;

/// Cached robots state for one host.
enum HostRules {
    /// Parsed rule set, consulted on every lookup for the host.
    Rules(Box<Robot>),
    /// robots.txt came back but did not parse; treat the host as open.
    AllowAll,
    /// robots.txt could not be fetched at all. Permanent for the run: every
    /// further URL on the host is reported as a connection error, with no
    /// re-fetch attempt.
    Unreachable(String),
}

/// Answer of the gate for one URL.
pub enum RobotsVerdict {
    Allowed,
    Denied,
    FetchFailed(String),
}

/// Per-host cache of parsed robots.txt rules. robots.txt is fetched at most
/// once per host per run.
pub struct RobotsGate {
    user_agent: String,
    hosts: HashMap<String, HostRules>,
}

impl RobotsGate {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            hosts: HashMap::new(),
        }
    }

    /// Drop all cached rule sets, including poisoned hosts.
    pub fn reset(&mut self) {
        self.hosts.clear();
    }

    pub async fn check(&mut self, client: &SiteClient, url: &Url) -> RobotsVerdict {
        let netloc = url.authority().to_string();

        if !self.hosts.contains_key(&netloc) {
            let entry = match client.fetch_robots(url.scheme(), &netloc).await {
                Ok(body) => match Robot::new(&self.user_agent, body.as_bytes()) {
                    Ok(robot) => HostRules::Rules(Box::new(robot)),
                    Err(err) => {
                        debug!("unparseable robots.txt for {}: {}", netloc, err);
                        HostRules::AllowAll
                    }
                },
                Err(err) => {
                    warn!("robots.txt fetch failed for {}: {}", netloc, err);
                    HostRules::Unreachable(err.to_string())
                }
            };
            self.hosts.insert(netloc.clone(), entry);
        }

        match &self.hosts[&netloc] {
            HostRules::Rules(robot) if !robot.allowed(url.as_str()) => RobotsVerdict::Denied,
            HostRules::Rules(_) | HostRules::AllowAll => RobotsVerdict::Allowed,
            HostRules::Unreachable(err) => RobotsVerdict::FetchFailed(err.clone()),
        }
    }
}
