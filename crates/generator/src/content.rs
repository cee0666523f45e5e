//! File content fabrication.
//!
//! Textual extensions get generated prose in the requested language;
//! anything else gets an opaque random payload. Sizes are clamped to
//! a sane window so one unlucky draw cannot fill the disk.

use rand::seq::SliceRandom;
use rand::Rng;

pub const MIN_CONTENT_BYTES: usize = 1024;
pub const MAX_CONTENT_BYTES: usize = 5 * 1024 * 1024;

const TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "log", "csv"];

struct SentencePattern {
    subjects: &'static [&'static str],
    verbs: &'static [&'static str],
    objects: &'static [&'static str],
    adjectives: &'static [&'static str],
    connectors: &'static [&'static str],
    // Subject-object-verb order (Korean, Japanese).
    sov: bool,
    terminator: &'static str,
}

fn pattern_for(lang: &str) -> &'static SentencePattern {
    match lang {
        "cn" => &SentencePattern {
            subjects: &["天空", "森林", "鸟儿", "河流", "月亮", "孩子", "风", "山峰"],
            verbs: &["歌唱", "舞动", "流动", "闪耀", "低语", "攀登", "翱翔", "休息"],
            objects: &[
                "甜美的旋律", "穿过树林", "轻轻地", "在夜晚", "优雅地", "向星星", "平静地",
                "在阳光下",
            ],
            adjectives: &[
                "宁静的", "光芒四射的", "平静的", "雄伟的", "温柔的", "生动的", "安静的",
                "闪亮的",
            ],
            connectors: &["并且", "当", "如同", "穿过", "超越"],
            sov: false,
            terminator: "。",
        },
        "kn" => &SentencePattern {
            subjects: &["하늘", "숲", "새", "강", "달", "아이", "바람", "산"],
            verbs: &[
                "노래한다", "춤춘다", "흐른다", "빛난다", "속삭인다", "오른다", "날아오른다",
                "쉰다",
            ],
            objects: &[
                "달콤한 멜로디를", "나무 사이를", "부드럽게", "밤에", "우아하게", "별을 향해",
                "평화롭게", "태양 아래",
            ],
            adjectives: &[
                "고요한", "찬란한", "평온한", "웅장한", "온화한", "생생한", "조용한",
                "반짝이는",
            ],
            connectors: &["그리고", "하면서", "처럼", "건너", "넘어"],
            sov: true,
            terminator: ".",
        },
        "jp" => &SentencePattern {
            subjects: &["空", "森", "鳥", "川", "月", "子", "風", "山"],
            verbs: &["歌う", "踊る", "流れる", "輝く", "囁く", "登る", "飛ぶ", "休む"],
            objects: &[
                "甘いメロディーを", "木々の間を", "優しく", "夜に", "優雅に", "星に向かって",
                "平和に", "太陽の下で",
            ],
            adjectives: &[
                "静かな", "輝く", "穏やかな", "壮大な", "優しい", "鮮やかな", "静寂な",
                "きらめく",
            ],
            connectors: &["そして", "ながら", "ように", "越えて", "超えて"],
            sov: true,
            terminator: "。",
        },
        _ => &SentencePattern {
            subjects: &[
                "The sky", "The forest", "A bird", "The river", "The moon", "A child",
                "The wind", "The mountain",
            ],
            verbs: &[
                "sings", "dances", "flows", "shines", "whispers", "climbs", "soars", "rests",
            ],
            objects: &[
                "a sweet melody",
                "through the trees",
                "gently",
                "in the night",
                "with grace",
                "to the stars",
                "peacefully",
                "under the sun",
            ],
            adjectives: &[
                "tranquil", "radiant", "serene", "majestic", "gentle", "vibrant", "quiet",
                "sparkling",
            ],
            connectors: &["and", "while", "as", "beneath", "beyond"],
            sov: false,
            terminator: ".",
        },
    }
}

fn clause<R: Rng + ?Sized>(pattern: &SentencePattern, rng: &mut R, adjective_odds: f64) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(4);
    let adjective = rng.gen_bool(adjective_odds);
    if adjective {
        parts.push(pattern.adjectives.choose(rng).expect("table non-empty"));
    }
    let subject = pattern.subjects.choose(rng).expect("table non-empty");
    let verb = pattern.verbs.choose(rng).expect("table non-empty");
    let object = pattern.objects.choose(rng).expect("table non-empty");
    parts.push(subject);
    if pattern.sov {
        parts.push(object);
        parts.push(verb);
    } else {
        parts.push(verb);
        parts.push(object);
    }
    parts.join(" ")
}

/// One sentence in the given language, English for unknown codes.
pub fn sentence<R: Rng + ?Sized>(lang: &str, rng: &mut R) -> String {
    let pattern = pattern_for(lang);
    let mut sentence = clause(pattern, rng, 0.7);

    if rng.gen_bool(0.4) {
        let connector = pattern.connectors.choose(rng).expect("table non-empty");
        sentence.push(' ');
        sentence.push_str(connector);
        sentence.push(' ');
        sentence.push_str(&clause(pattern, rng, 0.5));
    }

    sentence.push_str(pattern.terminator);
    sentence
}

fn truncate_at_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

/// Fabricate the payload for one file.
pub fn fabricate<R: Rng + ?Sized>(
    extension: &str,
    lang: &str,
    target_size: usize,
    rng: &mut R,
) -> Vec<u8> {
    let target = target_size.clamp(MIN_CONTENT_BYTES, MAX_CONTENT_BYTES);

    if TEXT_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
        let mut content = String::with_capacity(target + 128);
        while content.len() < target {
            content.push_str(&sentence(lang, rng));
            content.push('\n');
        }
        truncate_at_char_boundary(&mut content, target);
        content.into_bytes()
    } else {
        let mut payload = vec![0u8; target];
        rng.fill(payload.as_mut_slice());
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sentences_terminate() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sentence("en", &mut rng).ends_with('.'));
        assert!(sentence("cn", &mut rng).ends_with('。'));
    }

    #[test]
    fn text_content_hits_target_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let payload = fabricate("txt", "en", 2048, &mut rng);
        // Truncation may shave a partial character off the tail.
        assert!(payload.len() <= 2048);
        assert!(payload.len() > 2048 - 8);
        assert!(std::str::from_utf8(&payload).is_ok());
    }

    #[test]
    fn multibyte_truncation_stays_valid_utf8() {
        let mut rng = StdRng::seed_from_u64(3);
        let payload = fabricate("txt", "jp", 1500, &mut rng);
        assert!(std::str::from_utf8(&payload).is_ok());
    }

    #[test]
    fn binary_content_is_exactly_target_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let payload = fabricate("pdf", "en", 4096, &mut rng);
        assert_eq!(payload.len(), 4096);
    }

    #[test]
    fn sizes_are_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(fabricate("bin", "en", 1, &mut rng).len(), MIN_CONTENT_BYTES);
        let huge = fabricate("bin", "en", usize::MAX, &mut rng);
        assert_eq!(huge.len(), MAX_CONTENT_BYTES);
    }
}
