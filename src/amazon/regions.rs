//! Amazon marketplaces the tracker can fetch listings from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported Amazon marketplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Ca,
    Au,
    Jp,
    #[default]
    In,
    Br,
    Mx,
    Nl,
    Se,
    Pl,
}

/// Static facts about one marketplace.
struct Marketplace {
    code: &'static str,
    name: &'static str,
    domain: &'static str,
    accept_language: &'static str,
}

impl Region {
    fn marketplace(&self) -> Marketplace {
        let (code, name, domain, accept_language) = match self {
            Region::Us => ("us", "united states", "amazon.com", "en-US,en;q=0.9"),
            Region::Uk => ("uk", "united kingdom", "amazon.co.uk", "en-GB,en;q=0.9"),
            Region::De => ("de", "germany", "amazon.de", "de-DE,de;q=0.9,en;q=0.8"),
            Region::Fr => ("fr", "france", "amazon.fr", "fr-FR,fr;q=0.9,en;q=0.8"),
            Region::Es => ("es", "spain", "amazon.es", "es-ES,es;q=0.9,en;q=0.8"),
            Region::It => ("it", "italy", "amazon.it", "it-IT,it;q=0.9,en;q=0.8"),
            Region::Ca => ("ca", "canada", "amazon.ca", "en-CA,en;q=0.9,fr;q=0.8"),
            Region::Au => ("au", "australia", "amazon.com.au", "en-AU,en;q=0.9"),
            Region::Jp => ("jp", "japan", "amazon.co.jp", "ja-JP,ja;q=0.9,en;q=0.8"),
            Region::In => ("in", "india", "amazon.in", "en-IN,en;q=0.9,hi;q=0.8"),
            Region::Br => ("br", "brazil", "amazon.com.br", "pt-BR,pt;q=0.9,en;q=0.8"),
            Region::Mx => ("mx", "mexico", "amazon.com.mx", "es-MX,es;q=0.9,en;q=0.8"),
            Region::Nl => ("nl", "netherlands", "amazon.nl", "nl-NL,nl;q=0.9,en;q=0.8"),
            Region::Se => ("se", "sweden", "amazon.se", "sv-SE,sv;q=0.9,en;q=0.8"),
            Region::Pl => ("pl", "poland", "amazon.pl", "pl-PL,pl;q=0.9,en;q=0.8"),
        };
        Marketplace { code, name, domain, accept_language }
    }

    /// Returns the Amazon domain for this region.
    pub fn domain(&self) -> &'static str {
        self.marketplace().domain
    }

    /// Human-readable country name, lowercase.
    pub fn name(&self) -> &'static str {
        self.marketplace().name
    }

    /// Returns the base URL for this region.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the Accept-Language header value for this region.
    pub fn accept_language(&self) -> &'static str {
        self.marketplace().accept_language
    }

    /// Returns all supported regions.
    pub fn all() -> &'static [Region] {
        &[
            Region::Us,
            Region::Uk,
            Region::De,
            Region::Fr,
            Region::Es,
            Region::It,
            Region::Ca,
            Region::Au,
            Region::Jp,
            Region::In,
            Region::Br,
            Region::Mx,
            Region::Nl,
            Region::Se,
            Region::Pl,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marketplace().code)
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let alias = match wanted.as_str() {
            "gb" => "uk",
            "usa" => "us",
            other => other,
        };

        Region::all()
            .iter()
            .copied()
            .find(|r| {
                let m = r.marketplace();
                m.code == alias || m.name == alias || m.domain == alias
            })
            .ok_or_else(|| RegionParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, Error)]
#[error(
    "Unknown region '{0}'. Valid regions: us, uk, de, fr, es, it, ca, au, jp, in, br, mx, nl, se, pl"
)]
pub struct RegionParseError(String);
