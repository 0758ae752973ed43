//! Wiring of adapters into the strategy registry the orchestrators consume.
//! Per platform there is one fallback chain for contest fetching (clist
//! first where credentials exist, then the native source) and one adapter
//! for handle verification (always the native one).

use crate::fetch::atcoder::AtCoderAdapter;
use crate::fetch::clist::{ClistAdapter, ClistCredentials};
use crate::fetch::codechef::CodeChefAdapter;
use crate::fetch::codeforces::CodeforcesAdapter;
use crate::fetch::fallback::FallbackChain;
use crate::fetch::leetcode::LeetCodeAdapter;
use crate::fetch::profile::ProfileProbeAdapter;
use crate::fetch::retry::RetryPolicy;
use crate::fetch::{build_client, FetchError, SourceAdapter};
use crate::platform::Platform;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub clist: Option<ClistCredentials>,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            clist: None,
            http_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct AdapterRegistry {
    chains: HashMap<Platform, FallbackChain>,
    verifiers: HashMap<Platform, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn build(config: &RegistryConfig) -> Result<Self, FetchError> {
        let client = build_client(config.http_timeout)?;

        let mut verifiers: HashMap<Platform, Arc<dyn SourceAdapter>> = HashMap::new();
        verifiers.insert(
            Platform::Codeforces,
            Arc::new(CodeforcesAdapter::new(client.clone())),
        );
        verifiers.insert(
            Platform::CodeChef,
            Arc::new(CodeChefAdapter::new(client.clone())),
        );
        verifiers.insert(
            Platform::AtCoder,
            Arc::new(AtCoderAdapter::new(client.clone())),
        );
        verifiers.insert(
            Platform::LeetCode,
            Arc::new(LeetCodeAdapter::new(client.clone())),
        );
        verifiers.insert(
            Platform::HackerRank,
            Arc::new(ProfileProbeAdapter::hackerrank(client.clone())),
        );
        verifiers.insert(
            Platform::HackerEarth,
            Arc::new(ProfileProbeAdapter::hackerearth(client.clone())),
        );
        verifiers.insert(
            Platform::GeeksforGeeks,
            Arc::new(ProfileProbeAdapter::geeksforgeeks(client.clone())),
        );
        verifiers.insert(
            Platform::CsAcademy,
            Arc::new(ProfileProbeAdapter::csacademy(client.clone())),
        );
        verifiers.insert(
            Platform::TopCoder,
            Arc::new(ProfileProbeAdapter::topcoder(client.clone())),
        );

        if config.clist.is_none() {
            tracing::warn!(
                "clist credentials are not configured; platforms without a native contest source will contribute zero records"
            );
        }

        let mut chains = HashMap::new();
        for &platform in Platform::all() {
            let mut chain = FallbackChain::new(platform, config.retry.clone());
            if let Some(credentials) = &config.clist {
                chain = chain.with_strategy(
                    "clist",
                    Arc::new(ClistAdapter::new(
                        platform,
                        credentials.clone(),
                        client.clone(),
                    )),
                );
            }
            // The native source doubles as the fallback when clist is
            // unavailable or dry; for the profile-probe platforms it is a
            // known zero-record source and the chain simply exhausts.
            if let Some(native) = verifiers.get(&platform) {
                chain = chain.with_strategy("native", native.clone());
            }
            chains.insert(platform, chain);
        }

        Ok(Self { chains, verifiers })
    }

    /// Assembles a registry from pre-built parts. Test seam.
    pub fn from_parts(
        chains: HashMap<Platform, FallbackChain>,
        verifiers: HashMap<Platform, Arc<dyn SourceAdapter>>,
    ) -> Self {
        Self { chains, verifiers }
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.chains.keys().copied().collect();
        platforms.sort();
        platforms
    }

    pub fn chain(&self, platform: Platform) -> Option<&FallbackChain> {
        self.chains.get(&platform)
    }

    pub fn verifier(&self, platform: Platform) -> Option<&Arc<dyn SourceAdapter>> {
        self.verifiers.get(&platform)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_covers_every_platform() {
        let registry = AdapterRegistry::build(&RegistryConfig::default()).unwrap();
        for &platform in Platform::all() {
            assert!(registry.chain(platform).is_some(), "chain for {}", platform);
            assert!(
                registry.verifier(platform).is_some(),
                "verifier for {}",
                platform
            );
            assert_eq!(registry.verifier(platform).unwrap().platform(), platform);
        }
    }

    #[test]
    fn test_clist_credentials_add_a_primary_strategy() {
        let config = RegistryConfig {
            clist: Some(ClistCredentials {
                api_url: String::from("https://clist.by/api/v4"),
                username: String::from("radar"),
                api_key: String::from("secret"),
            }),
            ..RegistryConfig::default()
        };
        let registry = AdapterRegistry::build(&config).unwrap();
        // Every chain has at least the clist strategy, so none are empty.
        for &platform in Platform::all() {
            assert!(!registry.chain(platform).unwrap().is_empty());
        }
    }
}
