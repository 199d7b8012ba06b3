//! The closed menu vocabulary every resolved slot value must come from.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("could not read vocabulary file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse vocabulary file `{path}`: {message}")]
    ParseFile { path: PathBuf, message: String },
    #[error("vocabulary list `{list}` contains duplicate entry `{name}`")]
    DuplicateEntry { list: &'static str, name: String },
    #[error("vocabulary list `{list}` contains a blank entry")]
    BlankEntry { list: &'static str },
}

/// Five ordered name lists. Built once at startup and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    mains: Vec<String>,
    breads: Vec<String>,
    cheeses: Vec<String>,
    vegetables: Vec<String>,
    sauces: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    mains: Vec<String>,
    breads: Vec<String>,
    cheeses: Vec<String>,
    #[serde(alias = "veggies")]
    vegetables: Vec<String>,
    sauces: Vec<String>,
}

impl Vocabulary {
    pub fn new(
        mains: Vec<String>,
        breads: Vec<String>,
        cheeses: Vec<String>,
        vegetables: Vec<String>,
        sauces: Vec<String>,
    ) -> Result<Self, VocabularyError> {
        check_list("mains", &mains)?;
        check_list("breads", &breads)?;
        check_list("cheeses", &cheeses)?;
        check_list("vegetables", &vegetables)?;
        check_list("sauces", &sauces)?;
        Ok(Self { mains, breads, cheeses, vegetables, sauces })
    }

    /// Menu the kiosk ships with when no vocabulary file is configured.
    pub fn kiosk_default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|name| (*name).to_string()).collect()
        }

        Self {
            mains: owned(&[
                "에그마요",
                "이탈리안비엠티",
                "비엘티",
                "써브웨이클럽",
                "로티세리바비큐치킨",
                "로스트치킨",
                "참치",
                "햄",
                "베지",
                "스테이크앤치즈",
                "치킨데리야끼",
                "슈림프",
            ]),
            breads: owned(&["위트", "허니오트", "파마산오레가노", "화이트", "플랫브레드"]),
            cheeses: owned(&["아메리칸", "슈레드", "모짜렐라"]),
            vegetables: owned(&[
                "양상추", "토마토", "오이", "피망", "양파", "피클", "올리브", "할라피뇨",
            ]),
            sauces: owned(&[
                "렌치",
                "마요네즈",
                "스위트어니언",
                "허니머스타드",
                "스위트칠리",
                "사우스웨스트",
                "핫칠리",
                "올리브오일",
            ]),
        }
    }

    /// Loads a vocabulary file. `.json` files are read as JSON, anything else as TOML.
    pub fn from_path(path: &Path) -> Result<Self, VocabularyError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| VocabularyError::ReadFile { path: path.to_path_buf(), source })?;

        let is_json =
            path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext == "json");
        let file = if is_json {
            serde_json::from_str::<VocabularyFile>(&raw).map_err(|error| {
                VocabularyError::ParseFile { path: path.to_path_buf(), message: error.to_string() }
            })?
        } else {
            toml::from_str::<VocabularyFile>(&raw).map_err(|error| VocabularyError::ParseFile {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?
        };

        Self::new(file.mains, file.breads, file.cheeses, file.vegetables, file.sauces)
    }

    pub fn mains(&self) -> &[String] {
        &self.mains
    }

    pub fn breads(&self) -> &[String] {
        &self.breads
    }

    pub fn cheeses(&self) -> &[String] {
        &self.cheeses
    }

    pub fn vegetables(&self) -> &[String] {
        &self.vegetables
    }

    pub fn sauces(&self) -> &[String] {
        &self.sauces
    }

    /// Vegetables followed by sauces, the pool exclusions and "only" items resolve against.
    pub fn toppings(&self) -> Vec<String> {
        self.vegetables.iter().chain(self.sauces.iter()).cloned().collect()
    }

    pub fn is_vegetable(&self, name: &str) -> bool {
        self.vegetables.iter().any(|candidate| candidate == name)
    }

    pub fn is_sauce(&self, name: &str) -> bool {
        self.sauces.iter().any(|candidate| candidate == name)
    }

    pub fn len(&self) -> usize {
        self.mains.len()
            + self.breads.len()
            + self.cheeses.len()
            + self.vegetables.len()
            + self.sauces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_list(list: &'static str, names: &[String]) -> Result<(), VocabularyError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(VocabularyError::BlankEntry { list });
        }
        if !seen.insert(name.as_str()) {
            return Err(VocabularyError::DuplicateEntry { list, name: name.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Vocabulary, VocabularyError};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn rejects_duplicates_within_one_list() {
        let error = Vocabulary::new(
            names(&["햄", "햄"]),
            names(&["위트"]),
            names(&["아메리칸"]),
            names(&["양파"]),
            names(&["렌치"]),
        )
        .expect_err("duplicate main should be rejected");

        assert!(matches!(error, VocabularyError::DuplicateEntry { list: "mains", .. }));
    }

    #[test]
    fn same_name_may_appear_in_vegetables_and_sauces() {
        let vocabulary = Vocabulary::new(
            names(&["햄"]),
            names(&["위트"]),
            names(&["아메리칸"]),
            names(&["올리브"]),
            names(&["올리브"]),
        )
        .expect("cross-list duplicates are allowed");

        assert!(vocabulary.is_vegetable("올리브"));
        assert!(vocabulary.is_sauce("올리브"));
        assert_eq!(vocabulary.toppings(), names(&["올리브", "올리브"]));
    }

    #[test]
    fn loads_json_menu_with_veggies_alias() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("menu.json");
        fs::write(
            &path,
            r#"{"mains":["햄"],"breads":["위트"],"cheeses":["슈레드"],"veggies":["양파","피클"],"sauces":["렌치"]}"#,
        )
        .expect("write menu");

        let vocabulary = Vocabulary::from_path(&path).expect("json menu should load");
        assert_eq!(vocabulary.vegetables(), names(&["양파", "피클"]).as_slice());
        assert_eq!(vocabulary.len(), 6);
    }

    #[test]
    fn loads_toml_menu() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("menu.toml");
        fs::write(
            &path,
            r#"
mains = ["슈림프"]
breads = ["허니오트"]
cheeses = ["아메리칸"]
vegetables = ["양상추"]
sauces = ["마요네즈"]
"#,
        )
        .expect("write menu");

        let vocabulary = Vocabulary::from_path(&path).expect("toml menu should load");
        assert_eq!(vocabulary.mains(), names(&["슈림프"]).as_slice());
        assert_eq!(vocabulary.sauces(), names(&["마요네즈"]).as_slice());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("menu.toml");
        fs::write(&path, "mains = [").expect("write menu");

        let error = Vocabulary::from_path(&path).expect_err("broken toml should fail");
        assert!(matches!(error, VocabularyError::ParseFile { .. }));
    }

    #[test]
    fn default_menu_passes_validation() {
        let menu = Vocabulary::kiosk_default();
        let rebuilt = Vocabulary::new(
            menu.mains().to_vec(),
            menu.breads().to_vec(),
            menu.cheeses().to_vec(),
            menu.vegetables().to_vec(),
            menu.sauces().to_vec(),
        )
        .expect("default menu should be valid");
        assert_eq!(rebuilt, menu);
    }
}
