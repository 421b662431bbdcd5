//! Pull-based decoding of RSS 2.0 and Atom documents into raw entries.
//!
//! [`FeedEntries`] walks the document with a `quick-xml` reader and yields one
//! [`RawFeedEntry`] each time an `<item>`/`<entry>` closes. Nothing past the
//! current entry is read until the caller asks for the next one.

use livemap_core::Coordinate;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::error::FeedError;

const ROOT_TAGS: [&[u8]; 3] = [b"rss", b"feed", b"RDF"];
const ENTRY_TAGS: [&[u8]; 2] = [b"item", b"entry"];

/// A geographic field as different feed integrations expose it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawGeo {
    /// `{"#": "-31.95"}`, the text-node shape produced by XML-to-object mappers.
    Nested {
        #[serde(rename = "#")]
        text: String,
    },
    Text(String),
    Number(f64),
}

impl RawGeo {
    #[must_use]
    pub fn to_coordinate(&self) -> Coordinate {
        match self {
            Self::Nested { text } | Self::Text(text) => Coordinate::parse(text),
            Self::Number(value) => Coordinate::from_number(*value),
        }
    }
}

/// One undecorated feed item: only the fields the snapshot builder needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFeedEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "pubDate", alias = "pubdate")]
    pub published: Option<String>,
    #[serde(default, alias = "geo:lat", alias = "geo_lat")]
    pub latitude: Option<RawGeo>,
    #[serde(default, alias = "geo:long", alias = "geo_long")]
    pub longitude: Option<RawGeo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Published,
    Updated,
    Latitude,
    Longitude,
    Point,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"pubDate" | b"published" | b"date" => Some(Self::Published),
            b"updated" => Some(Self::Updated),
            b"lat" => Some(Self::Latitude),
            b"long" | b"lon" => Some(Self::Longitude),
            b"point" => Some(Self::Point),
            _ => None,
        }
    }

    /// Geo fields may sit inside a wrapper such as `<geo:Point>`; text fields
    /// only count as direct children of the entry.
    fn nests(self) -> bool {
        matches!(self, Self::Latitude | Self::Longitude | Self::Point)
    }
}

/// In-progress state for the entry currently being read.
struct EntryState {
    entry: RawFeedEntry,
    depth: usize,
    field: Option<(Field, usize)>,
    text: String,
}

impl EntryState {
    fn new(depth: usize) -> Self {
        Self {
            entry: RawFeedEntry::default(),
            depth,
            field: None,
            text: String::new(),
        }
    }

    fn open(&mut self, name: &[u8], depth: usize) {
        if self.field.is_some() {
            return;
        }
        let Some(field) = Field::from_local_name(name) else {
            return;
        };
        if depth == self.depth + 1 || field.nests() {
            self.field = Some((field, depth));
            self.text.clear();
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.field.is_some() {
            self.text.push_str(text);
        }
    }

    fn close(&mut self, depth: usize) {
        let Some((field, field_depth)) = self.field else {
            return;
        };
        if field_depth != depth {
            return;
        }
        self.field = None;

        let text = std::mem::take(&mut self.text);
        let value = text.trim();
        let entry = &mut self.entry;
        match field {
            Field::Title => entry.title = value.to_string(),
            Field::Published => entry.published = Some(value.to_string()),
            Field::Updated => {
                if entry.published.is_none() {
                    entry.published = Some(value.to_string());
                }
            }
            Field::Latitude => entry.latitude = Some(RawGeo::Text(value.to_string())),
            Field::Longitude => entry.longitude = Some(RawGeo::Text(value.to_string())),
            Field::Point => {
                let mut parts = value.split_whitespace();
                if let (Some(lat), Some(long)) = (parts.next(), parts.next()) {
                    entry
                        .latitude
                        .get_or_insert_with(|| RawGeo::Text(lat.to_string()));
                    entry
                        .longitude
                        .get_or_insert_with(|| RawGeo::Text(long.to_string()));
                }
            }
        }
    }
}

/// Lazy, finite, non-restartable sequence of entries over a feed document.
///
/// Yields `Err` at most once; iteration ends after an error or at the end of
/// the document. A document that ends inside an open element, or whose root
/// is not `<rss>`, `<feed>`, or `<rdf:RDF>`, is a decode error.
pub struct FeedEntries<'a> {
    reader: Reader<&'a [u8]>,
    depth: usize,
    saw_root: bool,
    finished: bool,
}

impl<'a> FeedEntries<'a> {
    #[must_use]
    pub fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            depth: 0,
            saw_root: false,
            finished: false,
        }
    }

    fn check_root(&mut self, name: &[u8]) -> Result<(), FeedError> {
        self.saw_root = true;
        if ROOT_TAGS.contains(&name) {
            Ok(())
        } else {
            Err(FeedError::Decode(format!(
                "root element <{}> is not an RSS or Atom feed",
                String::from_utf8_lossy(name)
            )))
        }
    }

    /// Reads until the next entry closes or the document ends.
    fn advance(&mut self) -> Result<Option<RawFeedEntry>, FeedError> {
        let mut current: Option<EntryState> = None;

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    self.depth += 1;
                    let name = e.local_name();
                    let name = name.as_ref();
                    if !self.saw_root {
                        self.check_root(name)?;
                        continue;
                    }
                    match current.as_mut() {
                        Some(state) => state.open(name, self.depth),
                        None if ENTRY_TAGS.contains(&name) => {
                            current = Some(EntryState::new(self.depth));
                        }
                        None => {}
                    }
                }
                Event::Empty(e) => {
                    if !self.saw_root {
                        self.check_root(e.local_name().as_ref())?;
                    }
                }
                Event::Text(e) => {
                    if let Some(state) = current.as_mut() {
                        match e.unescape() {
                            Ok(text) => state.push_text(&text),
                            Err(err) => {
                                let raw = String::from_utf8_lossy(&e);
                                tracing::warn!(
                                    text = %raw,
                                    error = %err,
                                    "keeping unescapable feed text as-is"
                                );
                                state.push_text(&raw);
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(state) = current.as_mut() {
                        state.push_text(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Event::End(_) => {
                    let closing = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    if let Some(state) = current.as_mut() {
                        if closing == state.depth {
                            return Ok(current.take().map(|state| state.entry));
                        }
                        state.close(closing);
                    }
                }
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(FeedError::Decode(
                            "document ended inside an open element".to_string(),
                        ));
                    }
                    if !self.saw_root {
                        return Err(FeedError::Decode(
                            "document has no root element".to_string(),
                        ));
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl Iterator for FeedEntries<'_> {
    type Item = Result<RawFeedEntry, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:geo="http://www.w3.org/2003/01/geo/wgs84_pos#">
  <channel>
    <title>Emergency WA incidents</title>
    <item>
      <title>Vehicle Fire (BELMONT, City of Belmont, CAD-ID: 12345)</title>
      <pubDate>Sat, 01 Jun 2024 04:30:00 GMT</pubDate>
      <geo:lat>-31.9505</geo:lat>
      <geo:long>115.9296</geo:long>
    </item>
    <item>
      <title><![CDATA[Road Crash (MIDLAND, City of Swan, CAD-ID: 555)]]></title>
      <pubDate>Sat, 01 Jun 2024 05:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    fn collect(xml: &str) -> Result<Vec<RawFeedEntry>, FeedError> {
        FeedEntries::new(xml).collect()
    }

    #[test]
    fn decodes_rss_items_with_geo_fields() {
        let entries = collect(SAMPLE_RSS).expect("valid RSS");
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(
            first.title,
            "Vehicle Fire (BELMONT, City of Belmont, CAD-ID: 12345)"
        );
        assert_eq!(
            first.published.as_deref(),
            Some("Sat, 01 Jun 2024 04:30:00 GMT")
        );
        assert_eq!(first.latitude, Some(RawGeo::Text("-31.9505".to_string())));
        assert_eq!(first.longitude, Some(RawGeo::Text("115.9296".to_string())));

        let second = &entries[1];
        assert_eq!(second.title, "Road Crash (MIDLAND, City of Swan, CAD-ID: 555)");
        assert!(second.latitude.is_none());
        assert!(second.longitude.is_none());
    }

    #[test]
    fn channel_title_is_not_an_entry() {
        let entries = collect(SAMPLE_RSS).expect("valid RSS");
        assert!(entries.iter().all(|e| e.title != "Emergency WA incidents"));
    }

    #[test]
    fn georss_point_fills_both_coordinates() {
        let xml = r#"<rss><channel><item>
            <title>Rescue (COOGEE, City of Cockburn, CAD-ID: 42)</title>
            <georss:point>-32.1187 115.7646</georss:point>
        </item></channel></rss>"#;
        let entries = collect(xml).expect("valid RSS");
        assert_eq!(entries[0].latitude, Some(RawGeo::Text("-32.1187".to_string())));
        assert_eq!(entries[0].longitude, Some(RawGeo::Text("115.7646".to_string())));
    }

    #[test]
    fn atom_entries_prefer_published_over_updated() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <title>ignored</title>
            <entry>
                <title>Bushfire (WOOROLOO, Shire of Mundaring, CAD-ID: 9)</title>
                <updated>2024-06-01T06:00:00Z</updated>
                <published>2024-06-01T04:30:00Z</published>
            </entry>
            <entry>
                <title>Rescue (X, Y, CAD-ID: 10)</title>
                <updated>2024-06-02T06:00:00Z</updated>
            </entry>
        </feed>"#;
        let entries = collect(xml).expect("valid Atom");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].published.as_deref(), Some("2024-06-01T04:30:00Z"));
        assert_eq!(entries[1].published.as_deref(), Some("2024-06-02T06:00:00Z"));
    }

    #[test]
    fn escaped_entities_are_unescaped() {
        let xml = "<rss><channel><item><title>Hazmat &amp; Spill (A, B, CAD-ID: 1)</title></item></channel></rss>";
        let entries = collect(xml).expect("valid RSS");
        assert_eq!(entries[0].title, "Hazmat & Spill (A, B, CAD-ID: 1)");
    }

    #[test]
    fn nested_media_title_does_not_replace_item_title() {
        let xml = r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel><item>
            <title>Bushfire (CHIDLOW, Shire of Mundaring, CAD-ID: 77)</title>
            <media:content url="https://example.com/p.jpg"><media:title>Photo</media:title></media:content>
            <pubDate>Sat, 01 Jun 2024 04:30:00 GMT</pubDate>
        </item></channel></rss>"#;
        let entries = collect(xml).expect("valid RSS");
        assert_eq!(
            entries[0].title,
            "Bushfire (CHIDLOW, Shire of Mundaring, CAD-ID: 77)"
        );
    }

    #[test]
    fn atom_source_metadata_is_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <title>Rescue (COOGEE, City of Cockburn, CAD-ID: 42)</title>
            <source>
                <title>Upstream aggregator</title>
                <updated>2020-01-01T00:00:00Z</updated>
            </source>
            <updated>2024-06-01T04:30:00Z</updated>
        </entry></feed>"#;
        let entries = collect(xml).expect("valid Atom");
        assert_eq!(entries[0].title, "Rescue (COOGEE, City of Cockburn, CAD-ID: 42)");
        assert_eq!(entries[0].published.as_deref(), Some("2024-06-01T04:30:00Z"));
    }

    #[test]
    fn wrapped_geo_point_is_still_read() {
        let xml = r#"<rss><channel><item>
            <title>Rescue (A, B, CAD-ID: 3)</title>
            <geo:Point><geo:lat>-32.1</geo:lat><geo:long>115.7</geo:long></geo:Point>
        </item></channel></rss>"#;
        let entries = collect(xml).expect("valid RSS");
        assert_eq!(entries[0].latitude, Some(RawGeo::Text("-32.1".to_string())));
        assert_eq!(entries[0].longitude, Some(RawGeo::Text("115.7".to_string())));
    }

    #[test]
    fn undeclared_entity_keeps_raw_title() {
        let xml = "<rss><channel><item><title>Fire &nbsp; (A, B, CAD-ID: 5)</title></item></channel></rss>";
        let entries = collect(xml).expect("valid RSS");
        assert_eq!(entries[0].title, "Fire &nbsp; (A, B, CAD-ID: 5)");
    }

    #[test]
    fn empty_channel_yields_nothing() {
        let entries = collect(r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#)
            .expect("valid RSS");
        assert!(entries.is_empty());
    }

    #[test]
    fn truncated_document_is_an_error() {
        let err = collect("<rss><channel><item><title>Unclosed").unwrap_err();
        assert!(err.is_decode(), "expected decode error, got {err}");
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        let err = collect("<rss><channel><item></channel></item></rss>").unwrap_err();
        assert!(err.is_decode(), "expected decode error, got {err}");
    }

    #[test]
    fn html_document_is_not_a_feed() {
        let err = collect("<html><body>Service Unavailable</body></html>").unwrap_err();
        assert!(matches!(err, FeedError::Decode(ref msg) if msg.contains("<html>")));
    }

    #[test]
    fn plain_text_body_is_not_a_feed() {
        let err = collect("Service Unavailable").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn entries_are_yielded_before_a_later_error() {
        let xml = "<rss><channel>\
            <item><title>First (A, B, CAD-ID: 1)</title></item>\
            <item><title>Second</item>";
        let mut entries = FeedEntries::new(xml);
        let first = entries.next().expect("one item").expect("first item decodes");
        assert_eq!(first.title, "First (A, B, CAD-ID: 1)");
        assert!(entries.next().expect("error item").is_err());
        assert!(entries.next().is_none(), "iteration ends after an error");
    }

    #[test]
    fn raw_entry_accepts_nested_and_flat_geo_shapes() {
        let nested: RawFeedEntry = serde_json::from_value(serde_json::json!({
            "title": "Vehicle Fire (BELMONT, City of Belmont, CAD-ID: 12345)",
            "pubDate": "2024-06-01T04:30:00Z",
            "geo:lat": { "#": "-31.95" },
            "geo:long": { "#": "115.93" }
        }))
        .expect("nested shape");
        assert_eq!(nested.latitude.map(|g| g.to_coordinate()), Some(Coordinate::parse("-31.95")));
        assert_eq!(nested.published.as_deref(), Some("2024-06-01T04:30:00Z"));

        let flat: RawFeedEntry = serde_json::from_value(serde_json::json!({
            "title": "t",
            "geo_lat": "-31.95",
            "geo_long": 115.93
        }))
        .expect("flat shape");
        assert_eq!(flat.latitude.map(|g| g.to_coordinate()), Some(Coordinate::parse("-31.95")));
        assert_eq!(
            flat.longitude.map(|g| g.to_coordinate()),
            Some(Coordinate::Known("115.93".to_string()))
        );

        let missing: RawFeedEntry =
            serde_json::from_value(serde_json::json!({ "title": "t" })).expect("no geo");
        assert!(missing.latitude.is_none());
    }
}
