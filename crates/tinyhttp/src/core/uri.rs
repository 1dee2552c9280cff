use url::Url;

use crate::error::{Error, Result};

/// Transport scheme of a resolved URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Classify a URL, rejecting anything other than `http` and `https`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tinyhttp::core::Scheme;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://example.test").unwrap();
    /// assert_eq!(Scheme::from_url(&url).unwrap(), Scheme::Https);
    ///
    /// let url = Url::parse("ftp://example.test").unwrap();
    /// assert!(Scheme::from_url(&url).is_err());
    /// ```
    pub fn from_url(url: &Url) -> Result<Self> {
        // `Url` lowercases the scheme while parsing.
        match url.scheme() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(Error::InvalidUrl(format!("unsupported scheme '{other}' in {url}"))),
        }
    }

    pub fn is_secure(&self) -> bool { matches!(self, Scheme::Https) }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Resolve a request target against an optional base URL.
///
/// With a non-empty base, `target` may be relative, protocol-relative or
/// absolute. Without one it must be an absolute URL.
///
/// # Examples
///
/// ```
/// use tinyhttp::core::resolve;
///
/// let url = resolve("users/1", Some("https://example.test/api/")).unwrap();
/// assert_eq!(url.as_str(), "https://example.test/api/users/1");
///
/// assert!(resolve("users/1", None).is_err());
/// ```
pub fn resolve(target: &str, base: Option<&str>) -> Result<Url> {
    match base.filter(|base| !base.is_empty()) {
        Some(base) => {
            let base = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
            base.join(target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")))
        }
        None => Url::parse(target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}"))),
    }
}

/// Reject root-relative targets when the client has no base URL.
pub fn check_target(target: &str, has_base: bool) -> Result<()> {
    if !has_base && target.starts_with('/') {
        return Err(Error::InvalidUrl(format!(
            "'{target}' is root-relative but the client has no base URL"
        )));
    }
    Ok(())
}

/// `true` for `/path` locations, `false` for `//host/path` and absolute ones.
pub fn is_path_rooted(location: &str) -> bool { location.starts_with('/') && !location.starts_with("//") }

/// Merge query parameters over the URL's existing ones and apply a port override.
///
/// A parameter whose key already appears in the query replaces the first
/// occurrence in place; new keys are appended in order.
pub fn apply_overrides(mut url: Url, params: &[(String, String)], port: Option<u16>) -> Result<Url> {
    if !params.is_empty() {
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        for (key, value) in params {
            match pairs.iter_mut().find(|(existing, _)| existing == key) {
                Some(slot) => slot.1 = value.clone(),
                None => pairs.push((key.clone(), value.clone())),
            }
        }
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    if let Some(port) = port {
        url.set_port(Some(port))
            .map_err(|()| Error::InvalidUrl(format!("cannot set port {port} on {url}")))?;
    }

    Ok(url)
}
