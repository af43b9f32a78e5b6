use std::collections::BTreeMap;

/// Untrusted route/query parameters.
///
/// Keys are kept sorted; every value of a repeated key is retained in
/// arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawParams {
    values: BTreeMap<String, Vec<String>>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=x%20y`. A leading `?` and anything up to it are ignored;
    /// `+` decodes to a space; a bare `flag` means `flag=True`.
    pub fn from_query(query: &str) -> Self {
        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let mut raw = Self::new();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, "True"));
            let key = decode(key);
            if key.is_empty() {
                continue;
            }
            raw.append(key, decode(value));
        }

        raw
    }

    /// Replace all values of `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    /// Add one more value to `key`
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.values.remove(key)
    }

    /// First value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `(key, value)` pairs, keys sorted, repeated keys expanded
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Percent-encoded query string, keys sorted, empty values dropped
    pub fn to_query(&self) -> String {
        self.pairs()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Shareable hash-route form, `#/path?k=v&...`
    pub fn canonical_path(&self, path: &str) -> String {
        let path = if path.is_empty() { "/" } else { path };
        let query = self.to_query();
        if query.is_empty() {
            format!("#{path}")
        } else {
            format!("#{path}?{query}")
        }
    }
}

impl<K, V> FromIterator<(K, V)> for RawParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = Self::new();
        for (k, v) in iter {
            raw.append(k, v);
        }
        raw
    }
}

fn decode(part: &str) -> String {
    let spaced = part.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query() {
        let raw = RawParams::from_query("#/?for=alice&for=bob&search=tic+tac%20toe&flag&=x");
        assert_eq!(raw.get_all("for"), ["alice", "bob"]);
        assert_eq!(raw.get("search"), Some("tic tac toe"));
        assert_eq!(raw.get("flag"), Some("True"));
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_to_query_sorted_and_encoded() {
        let raw: RawParams = [("search", "a&b"), ("for", "alice"), ("empty", "")]
            .into_iter()
            .collect();
        assert_eq!(raw.to_query(), "for=alice&search=a%26b");
    }

    #[test]
    fn test_canonical_path() {
        let raw: RawParams = [("playerCount", "4"), ("for", "alice,bob")].into_iter().collect();
        assert_eq!(raw.canonical_path("/"), "#/?for=alice%2Cbob&playerCount=4");
        assert_eq!(RawParams::new().canonical_path("/game/13"), "#/game/13");
    }
}
