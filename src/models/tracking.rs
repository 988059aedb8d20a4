use std::collections::BTreeMap;

/// Query keys carried through by default: campaign and click identifiers.
pub const DEFAULT_TRACKING_KEYS: [&str; 9] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "msclkid",
    "ref",
];

/// Marketing/attribution parameters captured from the inbound query string.
///
/// Built per request and moved into the relay task; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingParams {
    values: BTreeMap<String, String>,
}

impl TrackingParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only whitelisted, non-empty keys from a raw query string.
    /// The first occurrence of a repeated key wins.
    pub fn from_query(query: &str, allowed: &[String]) -> Self {
        let mut values = BTreeMap::new();
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            let key: &str = &k;
            if v.is_empty() || !allowed.iter().any(|a| a == key) {
                continue;
            }
            values.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }
        Self { values }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append the parameters to a redirect target, preserving any query it already has.
    pub fn append_to(&self, url: &str) -> String {
        if self.values.is_empty() {
            return url.to_string();
        }

        let (base, fragment) = match url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (url, None),
        };

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(self.values.iter());
        let query = serializer.finish();

        let separator = if base.contains('?') {
            if base.ends_with('?') || base.ends_with('&') { "" } else { "&" }
        } else {
            "?"
        };

        match fragment {
            Some(fragment) => format!("{base}{separator}{query}#{fragment}"),
            None => format!("{base}{separator}{query}"),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TrackingParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
