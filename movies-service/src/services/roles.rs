//! Authority names and the static role hierarchy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ROLE_PREFIX: &str = "ROLE_";

/// A role name carried in tokens and stored on user records.
///
/// Names are upper-cased and an optional `ROLE_` prefix is dropped, so
/// `role_admin`, `ROLE_ADMIN` and `ADMIN` are the same authority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Authority(String);

pub type AuthoritySet = BTreeSet<Authority>;

impl Authority {
    pub const ADMIN: &'static str = "ADMIN";
    pub const USER: &'static str = "USER";

    pub fn new(name: &str) -> Result<Self, RoleHierarchyError> {
        let trimmed = name.trim();
        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix(ROLE_PREFIX).unwrap_or(&upper);

        if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RoleHierarchyError::InvalidName(name.to_string()));
        }

        Ok(Self(bare.to_string()))
    }

    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Authority {
    type Err = RoleHierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Authority {
    type Error = RoleHierarchyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Authority> for String {
    fn from(value: Authority) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleHierarchyError {
    #[error("invalid authority name: {0:?}")]
    InvalidName(String),

    #[error("authority {0} cannot imply itself")]
    SelfLoop(Authority),

    #[error("role hierarchy contains a cycle through {0}")]
    Cycle(Authority),

    #[error("invalid hierarchy rule {0:?}, expected SENIOR>JUNIOR")]
    InvalidRule(String),
}

/// Directed "implies" graph between authorities, fixed at startup.
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    implies: BTreeMap<Authority, BTreeSet<Authority>>,
}

impl Default for RoleHierarchy {
    /// `ADMIN > USER`
    fn default() -> Self {
        let mut implies = BTreeMap::new();
        implies.insert(Authority::admin(), BTreeSet::from([Authority::user()]));
        Self { implies }
    }
}

impl RoleHierarchy {
    /// Build from `(senior, junior)` pairs. Rejects self-loops and cycles.
    pub fn new<I>(edges: I) -> Result<Self, RoleHierarchyError>
    where
        I: IntoIterator<Item = (Authority, Authority)>,
    {
        let mut implies: BTreeMap<Authority, BTreeSet<Authority>> = BTreeMap::new();
        for (senior, junior) in edges {
            if senior == junior {
                return Err(RoleHierarchyError::SelfLoop(senior));
            }
            implies.entry(senior).or_default().insert(junior);
        }

        let hierarchy = Self { implies };
        hierarchy.check_acyclic()?;
        Ok(hierarchy)
    }

    /// Parse `ADMIN>MODERATOR,MODERATOR>USER`.
    pub fn parse(rules: &str) -> Result<Self, RoleHierarchyError> {
        let mut edges = Vec::new();
        for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let (senior, junior) = rule
                .split_once('>')
                .ok_or_else(|| RoleHierarchyError::InvalidRule(rule.to_string()))?;
            edges.push((Authority::new(senior)?, Authority::new(junior)?));
        }
        Self::new(edges)
    }

    /// Closure of `authorities` under the implies relation.
    pub fn expand(&self, authorities: &AuthoritySet) -> AuthoritySet {
        let mut expanded = authorities.clone();
        let mut pending: Vec<&Authority> = authorities.iter().collect();

        while let Some(current) = pending.pop() {
            if let Some(juniors) = self.implies.get(current) {
                for junior in juniors {
                    if expanded.insert(junior.clone()) {
                        pending.push(junior);
                    }
                }
            }
        }

        expanded
    }

    pub fn satisfies(&self, held: &AuthoritySet, required: &Authority) -> bool {
        held.contains(required) || self.expand(held).contains(required)
    }

    fn check_acyclic(&self) -> Result<(), RoleHierarchyError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            node: &'a Authority,
            graph: &'a BTreeMap<Authority, BTreeSet<Authority>>,
            marks: &mut BTreeMap<&'a Authority, Mark>,
        ) -> Result<(), RoleHierarchyError> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(RoleHierarchyError::Cycle(node.clone())),
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            if let Some(children) = graph.get(node) {
                for child in children {
                    visit(child, graph, marks)?;
                }
            }
            marks.insert(node, Mark::Done);
            Ok(())
        }

        let mut marks = BTreeMap::new();
        for node in self.implies.keys() {
            visit(node, &self.implies, &mut marks)?;
        }
        Ok(())
    }
}
