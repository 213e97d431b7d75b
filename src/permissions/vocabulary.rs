//! Known AI-crawler identities
//!
//! The vocabulary is a plain value passed to the detectors, so tests and
//! configuration can substitute their own list.

/// Built-in lowercase identity substrings of crawlers that collect AI data
pub const DEFAULT_AI_AGENTS: &[&str] = &[
    "gptbot",
    "claudebot",
    "claude-user",
    "claude-searchbot",
    "ccbot",
    "google-extended",
    "applebot-extended",
    "facebookbot",
    "meta-externalagent",
    "diffbot",
    "perplexitybot",
    "perplexity-user",
    "omgili",
    "omgilibot",
    "imagesiftbot",
    "bytespider",
    "tiktokspider",
    "amazonbot",
    "youbot",
    "semrushbot-ocob",
    "petalbot",
    "velenpublicwebcrawler",
    "turnitinbot",
    "timpibot",
    "oai-searchbot",
    "icc-crawler",
    "ai2bot",
    "dataforseobot",
    "awariobot",
    "google-cloudvertexbot",
    "pangu-bot",
    "kangaroo bot",
    "sentibot",
    "img2dataset",
    "meltwater",
    "seekr",
    "peer39_crawler",
    "cohere",
    "duckassistbot",
    "scrapy",
    "cotoyogi",
    "aihitbot",
    "factset_spyderbot",
    "firecrawlagent",
];

/// An ordered list of lowercase crawler identity substrings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentVocabulary {
    agents: Vec<String>,
}

impl AgentVocabulary {
    /// Builds a vocabulary, lowercasing entries and dropping blanks and repeats
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for agent in agents {
            let agent = agent.as_ref().trim().to_lowercase();
            if !agent.is_empty() && !list.contains(&agent) {
                list.push(agent);
            }
        }
        Self { agents: list }
    }

    /// The built-in vocabulary
    pub fn builtin() -> Self {
        Self::new(DEFAULT_AI_AGENTS.iter())
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns true if the lowercased identity contains any known substring
    pub fn is_known(&self, agent: &str) -> bool {
        let lowered = agent.to_lowercase();
        self.agents.iter().any(|known| lowered.contains(known.as_str()))
    }
}

impl Default for AgentVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}
