//! The local scripture corpus.
//!
//! A [`Corpus`] is an ordered, read-only collection of [`VerseRecord`]s loaded
//! once at startup from a JSON array. When the document does not exist yet a
//! small built-in set of verses is written first, so a fresh installation can
//! serve lookups immediately. Existing documents are never overwritten.
//!
//! Lookups are full scans over a lower-cased haystack prepared at load time.
//! Corpora are small enough that no index is warranted.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ShlokaError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub id: String,
    pub book: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hymn: Option<u32>,
    pub sanskrit: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

impl VerseRecord {
    /// All textual fields joined by newlines, in declaration order.
    /// Translations follow in language-code order.
    pub fn serialized_text(&self) -> String {
        let mut parts = vec![
            self.id.as_str(),
            self.book.as_str(),
            self.sanskrit.as_str(),
            self.source.as_str(),
        ];
        parts.extend(self.translations.values().map(String::as_str));
        parts.join("\n")
    }
}

#[derive(Debug, Default)]
pub struct Corpus {
    records: Vec<VerseRecord>,
    // lower-cased serialized text, index-aligned with records
    haystacks: Vec<String>,
}

impl Corpus {
    /// Builds a corpus from records, rejecting empty verses and duplicate ids.
    pub fn new(records: Vec<VerseRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if record.sanskrit.trim().is_empty() {
                return Err(ShlokaError::Corpus(format!(
                    "record '{}' has no sanskrit text",
                    record.id
                )));
            }
            if !seen.insert(record.id.as_str()) {
                return Err(ShlokaError::Corpus(format!(
                    "duplicate record id '{}'",
                    record.id
                )));
            }
        }
        let haystacks = records
            .iter()
            .map(|r| r.serialized_text().to_lowercase())
            .collect();
        Ok(Self { records, haystacks })
    }

    /// Reads the corpus document at `path`, seeding it with the built-in
    /// verses first if it is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            seed(path)?;
        }
        let text = fs::read_to_string(path)?;
        let records: Vec<VerseRecord> = serde_json::from_str(&text).map_err(|e| {
            ShlokaError::Corpus(format!("malformed corpus '{}': {}", path.display(), e))
        })?;
        let corpus = Self::new(records)?;
        info!(path=%path.display(), records=corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// Case-insensitive substring search over the serialized text of every
    /// record. Matches keep corpus order. An empty query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&VerseRecord> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        let found: Vec<&VerseRecord> = self
            .records
            .iter()
            .zip(&self.haystacks)
            .filter(|(_, haystack)| haystack.contains(&needle))
            .map(|(record, _)| record)
            .collect();
        debug!(query, matches = found.len(), "corpus search");
        found
    }

    /// Records whose book contains the category token, ignoring case.
    pub fn match_category(&self, category: &str) -> Vec<&VerseRecord> {
        let token = category.trim().to_lowercase();
        if token.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| r.book.to_lowercase().contains(&token))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&VerseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[VerseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn seed(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let document = serde_json::to_string_pretty(&default_records())?;
    fs::write(path, document)?;
    info!(path=%path.display(), "seeded corpus with built-in verses");
    Ok(())
}

fn verse(
    id: &str,
    book: &str,
    (chapter, hymn, verse): (Option<u32>, Option<u32>, Option<u32>),
    sanskrit: &str,
    source: &str,
    english: &str,
) -> VerseRecord {
    let mut translations = BTreeMap::new();
    translations.insert("en".to_string(), english.to_string());
    VerseRecord {
        id: id.to_string(),
        book: book.to_string(),
        chapter,
        verse,
        hymn,
        sanskrit: sanskrit.to_string(),
        source: source.to_string(),
        translations,
    }
}

/// The verses written to a fresh corpus document.
pub fn default_records() -> Vec<VerseRecord> {
    vec![
        verse(
            "gita_2_47",
            "gita",
            (Some(2), None, Some(47)),
            "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन। मा कर्मफलहेतुर्भूर्मा ते सङ्गोऽस्त्वकर्मणि॥",
            "Bhagavad Gita 2.47",
            "You have a right to your actions alone, never to their fruits. Let not the fruits of action be your motive, nor let your attachment be to inaction.",
        ),
        verse(
            "gita_4_7",
            "gita",
            (Some(4), None, Some(7)),
            "यदा यदा हि धर्मस्य ग्लानिर्भवति भारत। अभ्युत्थानमधर्मस्य तदात्मानं सृजाम्यहम्॥",
            "Bhagavad Gita 4.7",
            "Whenever righteousness declines and unrighteousness rises, O Bharata, then I manifest myself.",
        ),
        verse(
            "rigveda_1_1_1",
            "rigveda",
            (Some(1), Some(1), Some(1)),
            "अग्निमीळे पुरोहितं यज्ञस्य देवमृत्विजम्। होतारं रत्नधातमम्॥",
            "Rigveda 1.1.1",
            "I praise Agni, the household priest, the divine minister of the sacrifice, the invoker, most rich in treasure.",
        ),
        verse(
            "rigveda_3_62_10",
            "rigveda",
            (Some(3), Some(62), Some(10)),
            "तत्सवितुर्वरेण्यं भर्गो देवस्य धीमहि। धियो यो नः प्रचोदयात्॥",
            "Rigveda 3.62.10 (Gayatri)",
            "We meditate on the glorious radiance of the divine Savitr; may he inspire our thoughts.",
        ),
        verse(
            "yajurveda_36_17",
            "yajurveda",
            (Some(36), None, Some(17)),
            "द्यौः शान्तिरन्तरिक्षं शान्तिः पृथिवी शान्तिरापः शान्तिरोषधयः शान्तिः।",
            "Shukla Yajurveda 36.17",
            "May there be peace in the heavens, peace in the sky, peace on earth, peace in the waters, peace in the plants.",
        ),
        verse(
            "isha_upanishad_1",
            "upanishad",
            (None, None, Some(1)),
            "ईशा वास्यमिदं सर्वं यत्किञ्च जगत्यां जगत्। तेन त्यक्तेन भुञ्जीथा मा गृधः कस्यस्विद्धनम्॥",
            "Isha Upanishad 1",
            "All this that moves in the world is pervaded by the Lord. Enjoy through renunciation; do not covet anyone's wealth.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        Corpus::new(default_records()).expect("default corpus is valid")
    }

    #[test]
    fn search_is_case_insensitive_and_ordered() {
        let c = corpus();
        let ids: Vec<&str> = c.search("BHAGAVAD").into_iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["gita_2_47", "gita_4_7"]);
    }

    #[test]
    fn search_matches_translations() {
        let c = corpus();
        let found = c.search("renunciation");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "isha_upanishad_1");
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(corpus().search("").is_empty());
    }

    #[test]
    fn category_matches_substring_of_book() {
        let c = corpus();
        let books: Vec<&str> = c.match_category("Veda").into_iter().map(|r| r.book.as_str()).collect();
        assert_eq!(books, vec!["rigveda", "rigveda", "yajurveda"]);
        assert!(c.match_category("  ").is_empty());
    }

    #[test]
    fn rejects_duplicates_and_empty_verses() {
        let mut records = default_records();
        records.push(records[0].clone());
        assert!(matches!(Corpus::new(records), Err(ShlokaError::Corpus(_))));

        let mut records = default_records();
        records[1].sanskrit = " ".into();
        assert!(matches!(Corpus::new(records), Err(ShlokaError::Corpus(_))));
    }

    #[test]
    fn serialized_text_skips_numbers() {
        let c = corpus();
        let gita = c.get("gita_2_47").unwrap();
        let text = gita.serialized_text();
        assert!(text.starts_with("gita_2_47\ngita\n"));
        assert!(text.ends_with(&gita.translations["en"]));
    }
}
