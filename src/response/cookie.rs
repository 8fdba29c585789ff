use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Display for SameSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// A `Set-Cookie` value attached to a response.
///
/// Attributes follow the usual cookie grammar; `expires` renders in the
/// IMF-fixdate format the header requires.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<i64>,
    expires: Option<DateTime<Utc>>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            expires: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn same_site(mut self, policy: SameSite) -> Self {
        self.same_site = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the full `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut rendered = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            rendered.push_str("; Path=");
            rendered.push_str(path);
        }
        if let Some(domain) = &self.domain {
            rendered.push_str("; Domain=");
            rendered.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            rendered.push_str("; Max-Age=");
            rendered.push_str(&max_age.to_string());
        }
        if let Some(expires) = self.expires {
            rendered.push_str("; Expires=");
            rendered.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        if self.secure {
            rendered.push_str("; Secure");
        }
        if self.http_only {
            rendered.push_str("; HttpOnly");
        }
        if let Some(policy) = self.same_site {
            rendered.push_str("; SameSite=");
            rendered.push_str(&policy.to_string());
        }
        rendered
    }
}
