use indexmap::IndexMap;
use reqwest::header::HeaderMap;

/// Response headers with case-insensitive lookups.
///
/// Lookups, `contains` and equality ignore ASCII case, while iteration yields
/// names with the casing they were last inserted with, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    store: IndexMap<String, (String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.store
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.store
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.store
            .shift_remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.store
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .store
                .iter()
                .all(|(key, (_, value))| other.store.get(key).is_some_and(|(_, v)| v == value))
    }
}

impl Eq for Headers {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Names arrive lowercased from the HTTP stack, so headers built from a
/// response iterate in lowercase whatever casing the server sent.
impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    #[test]
    fn test_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("Location", "http://h/queue/item/1/");

        assert_eq!(headers.get("location"), Some("http://h/queue/item/1/"));
        assert_eq!(headers.get("LOCATION"), Some("http://h/queue/item/1/"));
        assert!(headers.contains("lOcAtIoN"));
        assert!(!headers.contains("Content-Type"));
    }

    #[test]
    fn test_iteration_keeps_last_inserted_casing() {
        let mut headers = Headers::new();
        headers.insert("Accept", "text/plain");
        headers.insert("X-Jenkins", "2.400");
        headers.insert("aCCEPT", "application/json");

        let items: Vec<_> = headers.iter().collect();
        assert_eq!(
            items,
            vec![("aCCEPT", "application/json"), ("X-Jenkins", "2.400")]
        );
    }

    #[test]
    fn test_equality_is_case_insensitive() {
        let left: Headers = [("Content-Type", "text/plain")].into_iter().collect();
        let right: Headers = [("content-type", "text/plain")].into_iter().collect();
        let different: Headers = [("content-type", "text/html")].into_iter().collect();

        assert_eq!(left, right);
        assert_ne!(left, different);
    }

    #[test]
    fn test_from_response_header_map() {
        let mut map = HeaderMap::new();
        let location: HeaderName = "Location".parse().unwrap();
        let version: HeaderName = "X-Jenkins".parse().unwrap();
        map.insert(location, "http://h/queue/item/2/".parse().unwrap());
        map.insert(version, "2.400".parse().unwrap());

        let headers = Headers::from(&map);
        assert_eq!(headers.get("LOCATION"), Some("http://h/queue/item/2/"));
        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["location", "x-jenkins"]);
    }

    #[test]
    fn test_remove() {
        let mut headers: Headers = [("Set-Cookie", "a=b")].into_iter().collect();
        assert_eq!(headers.remove("set-cookie").as_deref(), Some("a=b"));
        assert!(headers.is_empty());
    }
}
