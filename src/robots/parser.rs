//! Robots.txt parser implementation
//!
//! Allow/disallow decisions go through the robotstxt crate's matcher.
//! `Crawl-delay` and `Request-rate` are not covered by that crate and are read
//! from the user-agent group that applies to the requesting agent.

use robotstxt::DefaultMatcher;

/// A declared `Request-rate: <requests>/<seconds>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRate {
    pub requests: u32,
    pub seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blanket {
    None,
    AllowAll,
    DisallowAll,
}

/// Parsed robots.txt data
///
/// Wraps the raw document; rules are evaluated on demand.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    blanket: Blanket,
}

/// One `User-agent` group and the extension directives it declared
#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
    request_rate: Option<RequestRate>,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            blanket: Blanket::None,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when the site has no policy document (e.g. a 404).
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            blanket: Blanket::AllowAll,
        }
    }

    /// Creates a ParsedRobots that refuses everything
    ///
    /// Used when the policy document itself is access-controlled (401/403).
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            blanket: Blanket::DisallowAll,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check (full URL or path)
    /// * `user_agent` - The agent token; `*` evaluates only the wildcard group
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.blanket {
            Blanket::AllowAll => return true,
            Blanket::DisallowAll => return false,
            Blanket::None => {}
        }

        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay (seconds) for a specific user agent
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.with_group(user_agent, |group| group.crawl_delay)
    }

    /// Gets the declared request rate for a specific user agent
    pub fn request_rate(&self, user_agent: &str) -> Option<RequestRate> {
        self.with_group(user_agent, |group| group.request_rate)
    }

    fn with_group<T>(&self, user_agent: &str, pick: impl Fn(&Group) -> Option<T>) -> Option<T> {
        if self.blanket != Blanket::None {
            return None;
        }

        let groups = parse_groups(&self.content);
        select_group(&groups, user_agent).and_then(pick)
    }
}

/// Splits the document into user-agent groups
///
/// Consecutive `User-agent` lines share a group; the first `User-agent` line
/// after any other directive starts a new one.
fn parse_groups(content: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut in_agent_run = false;

    for line in content.lines() {
        // Strip trailing comments
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        if key == "user-agent" {
            if !in_agent_run {
                groups.push(Group::default());
                in_agent_run = true;
            }
            if let Some(group) = groups.last_mut() {
                group.agents.push(value.to_lowercase());
            }
            continue;
        }

        in_agent_run = false;

        // Directives before the first User-agent line belong to no group
        let Some(group) = groups.last_mut() else {
            continue;
        };

        match key.as_str() {
            "crawl-delay" => {
                if let Ok(delay) = value.parse::<f64>() {
                    if delay.is_finite() && delay >= 0.0 && group.crawl_delay.is_none() {
                        group.crawl_delay = Some(delay);
                    }
                }
            }
            "request-rate" => {
                if let Some(rate) = parse_request_rate(value) {
                    if group.request_rate.is_none() {
                        group.request_rate = Some(rate);
                    }
                }
            }
            _ => {}
        }
    }

    groups
}

/// Picks the first group naming the agent, else the first `*` group
fn select_group<'a>(groups: &'a [Group], user_agent: &str) -> Option<&'a Group> {
    // "arana/1.0" is matched on its product token
    let token = user_agent
        .split('/')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let specific = groups.iter().find(|group| {
        group
            .agents
            .iter()
            .any(|agent| agent != "*" && !token.is_empty() && token != "*" && token.contains(agent.as_str()))
    });

    specific.or_else(|| {
        groups
            .iter()
            .find(|group| group.agents.iter().any(|agent| agent == "*"))
    })
}

fn parse_request_rate(value: &str) -> Option<RequestRate> {
    let (requests, seconds) = value.split_once('/')?;
    Some(RequestRate {
        requests: requests.trim().parse().ok()?,
        seconds: seconds.trim().parse().ok()?,
    })
}
