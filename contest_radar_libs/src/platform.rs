use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed enumeration of the contest platforms we aggregate.
///
/// String identifiers coming from the outside (HTTP paths, configuration,
/// upstream `resource` fields) are resolved to a `Platform` exactly once at
/// the boundary; everything past that point dispatches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Codeforces,
    CodeChef,
    AtCoder,
    LeetCode,
    HackerRank,
    HackerEarth,
    GeeksforGeeks,
    #[serde(rename = "CS Academy")]
    CsAcademy,
    TopCoder,
}

impl Platform {
    pub fn all() -> &'static [Platform] {
        &[
            Platform::Codeforces,
            Platform::CodeChef,
            Platform::AtCoder,
            Platform::LeetCode,
            Platform::HackerRank,
            Platform::HackerEarth,
            Platform::GeeksforGeeks,
            Platform::CsAcademy,
            Platform::TopCoder,
        ]
    }

    /// Canonical display name, matching what gets stored and shown.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Codeforces => "Codeforces",
            Platform::CodeChef => "CodeChef",
            Platform::AtCoder => "AtCoder",
            Platform::LeetCode => "LeetCode",
            Platform::HackerRank => "HackerRank",
            Platform::HackerEarth => "HackerEarth",
            Platform::GeeksforGeeks => "GeeksforGeeks",
            Platform::CsAcademy => "CS Academy",
            Platform::TopCoder => "TopCoder",
        }
    }

    /// Numeric resource id used by the clist.by contest API.
    pub fn clist_resource_id(&self) -> u32 {
        match self {
            Platform::Codeforces => 1,
            Platform::CodeChef => 2,
            Platform::AtCoder => 93,
            Platform::LeetCode => 102,
            Platform::HackerRank => 63,
            Platform::HackerEarth => 73,
            Platform::GeeksforGeeks => 126,
            Platform::CsAcademy => 111,
            Platform::TopCoder => 12,
        }
    }

    /// Resolves an upstream `resource` domain string to a platform.
    pub fn from_resource(raw: &str) -> Option<Platform> {
        match raw.trim().to_lowercase().as_str() {
            "codeforces.com" => Some(Platform::Codeforces),
            "codechef.com" => Some(Platform::CodeChef),
            "atcoder.jp" => Some(Platform::AtCoder),
            "leetcode.com" => Some(Platform::LeetCode),
            "hackerrank.com" => Some(Platform::HackerRank),
            "hackerearth.com" => Some(Platform::HackerEarth),
            "geeksforgeeks.org" | "practice.geeksforgeeks.org" => Some(Platform::GeeksforGeeks),
            "csacademy.com" => Some(Platform::CsAcademy),
            "topcoder.com" => Some(Platform::TopCoder),
            _ => None,
        }
    }
}

/// Display name for an upstream resource identifier. Known domains map to
/// their canonical names; anything else comes back as a capitalized copy of
/// the raw string rather than being rejected.
pub fn display_name_for_resource(raw: &str) -> String {
    let raw = raw.trim();
    match Platform::from_resource(raw) {
        Some(platform) => platform.as_str().to_string(),
        None => {
            let mut chars = raw.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown platform: {0:?}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Case-insensitive, separator-insensitive: "cs academy", "csacademy"
        // and "CS-Academy" all resolve to the same platform.
        let folded: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "codeforces" => Ok(Platform::Codeforces),
            "codechef" => Ok(Platform::CodeChef),
            "atcoder" => Ok(Platform::AtCoder),
            "leetcode" => Ok(Platform::LeetCode),
            "hackerrank" => Ok(Platform::HackerRank),
            "hackerearth" => Ok(Platform::HackerEarth),
            "geeksforgeeks" | "gfg" => Ok(Platform::GeeksforGeeks),
            "csacademy" => Ok(Platform::CsAcademy),
            "topcoder" => Ok(Platform::TopCoder),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}
