use std::{fmt, str::FromStr};

use parse_display::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

// `url::Url::scheme()` returns lower-cased ASCII string without `:`
const SCHEMES: [&str; 2] = ["http", "https"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid scheme '{0}', only 'http' & 'https' are allowed")]
    InvalidScheme(String),
    #[error("The Url has to be a base, i.e. `data:`, `mailto:` etc. are not allowed")]
    ShouldBeABase,
    #[error("Having a fragment (i.e. `#fragment`) is not allowed")]
    HasFragment,
    #[error("Having a query parameters (i.e. `?query_param=value`) is not allowed")]
    HasQuery,
    #[error("Parsing the url: {0}")]
    Parsing(#[from] url::ParseError),
}

/// Base Url of a REST API, e.g. the creative gateway.
///
/// The path always ends with `/`, so endpoints can be joined to it without dropping
/// the last path segment. Only `http` & `https` base urls without a query or a fragment are allowed.
#[derive(Clone, Hash, Display, Eq, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Url", into = "Url")]
pub struct ApiUrl(Url);

impl ApiUrl {
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::from_str(input)
    }

    /// Joins the endpoint to the base url, a leading `/` of the endpoint is ignored.
    ///
    /// `https://gateway.example/api/` joined with `/upload-asset` results in
    /// `https://gateway.example/api/upload-asset`.
    pub fn join(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let stripped = endpoint.strip_prefix('/').unwrap_or(endpoint);

        self.0.join(stripped)
    }

    pub fn to_url(&self) -> Url {
        self.0.clone()
    }
}

impl fmt::Debug for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiUrl({})", self)
    }
}

impl TryFrom<Url> for ApiUrl {
    type Error = Error;

    fn try_from(mut url: Url) -> Result<Self, Self::Error> {
        if url.cannot_be_a_base() {
            return Err(Error::ShouldBeABase);
        }

        if !SCHEMES.contains(&url.scheme()) {
            return Err(Error::InvalidScheme(url.scheme().to_string()));
        }

        if url.fragment().is_some() {
            return Err(Error::HasFragment);
        }

        if url.query().is_some() {
            return Err(Error::HasQuery);
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self(url))
    }
}

impl From<ApiUrl> for Url {
    fn from(api_url: ApiUrl) -> Self {
        api_url.0
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.parse::<Url>()?)
    }
}
