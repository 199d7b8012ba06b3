use std::sync::LazyLock;

use regex::Regex;

/// Known mis-hearings, applied in order as literal substring replacements.
const CORRECTIONS: &[(&str, &str)] = &[
    ("슈렘프", "슈림프"),
    ("쉬림프", "슈림프"),
    ("시림프", "슈림프"),
    ("허니 옷", "허니오트"),
    ("허니옷", "허니오트"),
    ("허니오토", "허니오트"),
    ("허니오토로", "허니오트"),
    ("스위트 칠리", "스위트칠리"),
];

/// Stripping a particle can expose a new correction or a new trailing particle, so the
/// whole pass repeats until nothing changes.
const MAX_PASSES: usize = 4;

static TRAILING_PARTICLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:은|는|이|가|을|를|으로|로|에|에서|와|과|의)+\b")
        .expect("particle pattern is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

/// Lower-cases, repairs known mis-hearings, drops word-final particles and collapses
/// whitespace. `normalize(normalize(x)) == normalize(x)` for any input.
///
/// Particle stripping is pattern-based, so a name that happens to end in a particle
/// syllable loses it (`오이` becomes `오`).
pub fn normalize(raw: &str) -> String {
    let mut current = normalize_pass(raw);
    for _ in 1..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(text: &str) -> String {
    let mut text = text.to_lowercase();
    for (heard, meant) in CORRECTIONS {
        if text.contains(heard) {
            text = text.replace(heard, meant);
        }
    }

    let stripped = TRAILING_PARTICLES.replace_all(&text, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn corrects_known_mishearings() {
        assert_eq!(normalize("쉬림프 하나"), "슈림프 하나");
        assert_eq!(normalize("허니 옷 빵"), "허니오트 빵");
        assert_eq!(normalize("스위트 칠리 소스"), "스위트칠리 소스");
    }

    #[test]
    fn lowercases_latin_text() {
        assert_eq!(normalize("30CM 라지"), "30cm 라지");
    }

    #[test]
    fn strips_trailing_particles() {
        assert_eq!(normalize("빵은 허니오트로 해주세요"), "빵 허니오트 해주세요");
        assert_eq!(normalize("치즈는 아메리칸으로"), "치즈 아메리칸");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(normalize("  슈림프    30   "), "슈림프 30");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn correction_exposed_by_particle_stripping_is_applied() {
        assert_eq!(normalize("허니를 옷"), "허니오트");
    }

    #[test]
    fn is_idempotent_on_order_phrases() {
        let phrases = [
            "30cm 슈림프 빵 허니오트 치즈 아메리칸 양파 빼고 다",
            "에그마요를 15로, 빵은 위트에 치즈는 슈레드",
            "렌치만",
            "야채는 전부 넣고 소스는 스위트 칠리랑 마요네즈",
            "허니오토로 빵 주세요",
            "오이와 피클을 빼고 다",
            "Shrimp 30CM please",
            "가가가 이이 는는",
            "  ,  .  ",
        ];

        for phrase in phrases {
            let once = normalize(phrase);
            assert_eq!(normalize(&once), once, "not idempotent for `{phrase}`");
        }
    }
}
