use reqwest::Url;

/// Per-subscription stream parameters forwarded to the backend.
///
/// Every field is optional; an absent field is not sent so the backend
/// falls back to its own default.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamOptions {
    /// File to stream, relative to the backend's working directory.
    pub path: Option<String>,
    /// Characters per `chunk` event.
    pub chunk_size: Option<u32>,
    /// Pause between `chunk` events, in milliseconds.
    pub delay_ms: Option<u64>,
}

impl StreamOptions {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// Query parameters for the provided fields, in a stable order.
    ///
    /// An empty `path` is treated as not provided.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            pairs.push(("path", path.to_string()));
        }
        if let Some(chunk_size) = self.chunk_size {
            pairs.push(("chunk_size", chunk_size.to_string()));
        }
        if let Some(delay_ms) = self.delay_ms {
            pairs.push(("delay_ms", delay_ms.to_string()));
        }
        pairs
    }

    /// Replaces the query of `url` with the provided options.
    pub fn apply_to(&self, url: &mut Url) {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            url.set_query(None);
            return;
        }
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:8000/api/streaming/notepad").expect("url")
    }

    #[test]
    fn omitted_fields_produce_no_query() {
        let mut url = base();
        StreamOptions::default().apply_to(&mut url);
        assert_eq!(url.query(), None);
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/streaming/notepad"
        );
    }

    #[test]
    fn provided_fields_are_stringified() {
        let mut url = base();
        StreamOptions::default()
            .path("data/notepad.txt")
            .chunk_size(256)
            .delay_ms(10)
            .apply_to(&mut url);
        assert_eq!(
            url.query(),
            Some("path=data%2Fnotepad.txt&chunk_size=256&delay_ms=10")
        );
    }

    #[test]
    fn partial_options_load_from_json() {
        let options: StreamOptions =
            serde_json::from_str(r#"{ "chunk_size": 64 }"#).expect("deserialize");
        assert_eq!(options, StreamOptions::default().chunk_size(64));
        assert_eq!(options.query_pairs(), vec![("chunk_size", "64".to_string())]);
    }

    #[test]
    fn each_field_is_independent() {
        let only_delay = StreamOptions::default().delay_ms(0).query_pairs();
        assert_eq!(only_delay, vec![("delay_ms", "0".to_string())]);

        let only_chunk = StreamOptions::default().chunk_size(1).query_pairs();
        assert_eq!(only_chunk, vec![("chunk_size", "1".to_string())]);
    }

    #[test]
    fn empty_path_is_not_sent() {
        let pairs = StreamOptions::default().path("").chunk_size(8).query_pairs();
        assert_eq!(pairs, vec![("chunk_size", "8".to_string())]);
    }

    #[test]
    fn applying_replaces_existing_query() {
        let mut url = base();
        url.set_query(Some("stale=1"));
        StreamOptions::default().path("a.txt").apply_to(&mut url);
        assert_eq!(url.query(), Some("path=a.txt"));
    }
}
