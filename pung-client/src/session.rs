use std::collections::BTreeMap;
use std::fmt;

/// Authentication cookies for the current run.
///
/// The forum rotates cookies on nearly every response, so operations return
/// the newly issued cookies and callers rebind their session to the merge
/// result. Nothing mutates a `Session` in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cookies: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Collect the cookies issued by a response's `set-cookie` headers.
    ///
    /// Each header value is truncated at its first `;` (attributes are not
    /// modeled) and split on the first `=`. Malformed values are skipped.
    pub fn from_set_cookie_headers<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cookies = BTreeMap::new();
        for value in values {
            let pair = value.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    cookies.insert(name.to_string(), value.to_string());
                }
            }
        }
        Self { cookies }
    }

    /// Merge `incoming` over this session, returning the updated session.
    ///
    /// Keys present in `incoming` override the same keys here; every other
    /// key is carried forward unchanged.
    #[must_use]
    pub fn merge(&self, incoming: &Session) -> Session {
        let mut cookies = self.cookies.clone();
        for (name, value) in &incoming.cookies {
            cookies.insert(name.clone(), value.clone());
        }
        Session { cookies }
    }

    /// Render the session as a `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Cookie values are credentials. Display shows names only.
impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cookie(s): {}",
            self.cookies.len(),
            self.names().collect::<Vec<_>>().join(", ")
        )
    }
}
