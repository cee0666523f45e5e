//! Word and name synthesis.
//!
//! Produces plausible words in a handful of languages, in native
//! script. English words alternate consonant and vowel clusters;
//! other languages compose one or two syllables from a per-language
//! table, with an optional suffix.

use rand::seq::SliceRandom;
use rand::Rng;

const VOWELS: [&str; 8] = ["a", "e", "i", "o", "u", "ai", "ea", "ou"];
const CONSONANTS: [&str; 21] = [
    "b", "c", "d", "f", "g", "h", "j", "k", "l", "m", "n", "p", "r", "s", "t", "v", "w", "y",
    "sh", "ch", "th",
];

struct LangPattern {
    syllables: &'static [&'static str],
    suffixes: &'static [&'static str],
}

fn pattern_for(lang: &str) -> &'static LangPattern {
    match lang {
        "ge" => &LangPattern {
            syllables: &[
                "mü", "schön", "wald", "stern", "bau", "feld", "himmel", "licht", "tag",
                "nacht", "straße", "berg", "fluss", "baum", "grün", "weiß",
            ],
            suffixes: &["en", "er", "d", "e", "in"],
        },
        "cn" => &LangPattern {
            syllables: &[
                "好", "星", "美", "兰", "君", "伟", "青", "书", "天", "花", "月", "山", "水",
                "风", "云", "龙", "凤", "春", "秋",
            ],
            suffixes: &[],
        },
        "kn" => &LangPattern {
            syllables: &[
                "하", "나", "별", "미", "지", "라", "고", "타", "영", "수", "강", "산", "바",
                "람", "꽃", "하늘", "달", "빛", "소리",
            ],
            suffixes: &["ㄴ", "ㅁ", "이"],
        },
        "tl" => &LangPattern {
            syllables: &[
                "ชัย", "สุข", "รถ", "ผัด", "ใหม่", "น้ำ", "ขาว", "ลม", "ดิน", "ไฟ", "ฟ้า",
                "ต้น", "ใบ", "หิน", "แสง", "เงา",
            ],
            suffixes: &["ต", "น", "ม"],
        },
        "jp" => &LangPattern {
            syllables: &[
                "さ", "く", "ら", "み", "な", "き", "ゆ", "め", "ひ", "ろ", "か", "ぜ", "そ",
                "つ", "や", "ま", "は",
            ],
            suffixes: &["ん", "い", "う"],
        },
        "ar" => &LangPattern {
            syllables: &[
                "نور", "سلا", "رح", "مح", "زي", "حل", "جم", "فر", "قمر", "شمس", "نجم",
                "سماء", "بحر", "رمل", "ضوء", "هواء",
            ],
            suffixes: &["ة", "ي", "ات"],
        },
        // Vietnamese doubles as the fallback for unknown codes.
        _ => &LangPattern {
            syllables: &[
                "nâm", "hỏa", "lân", "thư", "mình", "ngọc", "tâm", "việt", "phố", "sông",
                "hà", "nội", "đà", "nẵng", "huế", "cần",
            ],
            suffixes: &[],
        },
    }
}

fn english_word<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.gen_range(3..=7);
    let mut word = String::new();
    for i in 0..length {
        let cluster = if i % 2 == 0 {
            CONSONANTS.choose(rng)
        } else {
            VOWELS.choose(rng)
        };
        word.push_str(cluster.expect("cluster tables are non-empty"));
    }
    word
}

/// One word in the given language.
pub fn word<R: Rng + ?Sized>(lang: &str, rng: &mut R) -> String {
    if lang == "en" {
        return english_word(rng);
    }
    let pattern = pattern_for(lang);
    let syllable_count = rng.gen_range(1..=2);
    let mut word = String::new();
    for _ in 0..syllable_count {
        word.push_str(pattern.syllables.choose(rng).expect("syllable table empty"));
    }
    if !pattern.suffixes.is_empty() && rng.gen_bool(0.5) {
        word.push_str(pattern.suffixes.choose(rng).expect("suffix table empty"));
    }
    word
}

/// A 2-5 word phrase, all words from one language picked uniformly
/// out of `langs`. Words within the phrase are distinct.
pub fn phrase<R: Rng + ?Sized>(langs: &[String], rng: &mut R) -> String {
    let fallback = "en".to_string();
    let lang = langs.choose(rng).unwrap_or(&fallback);
    let word_count = rng.gen_range(2..=5);

    let mut words: Vec<String> = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        let mut candidate = word(lang, rng);
        let mut attempts = 0;
        while words.contains(&candidate) && attempts < 16 {
            candidate = word(lang, rng);
            attempts += 1;
        }
        words.push(candidate);
    }
    words.join(" ")
}

/// Random alphanumeric identifier with a length drawn from the range.
pub fn alphanumeric<R: Rng + ?Sized>(rng: &mut R, min_len: usize, max_len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let length = rng.gen_range(min_len..=max_len);
    (0..length)
        .map(|_| *CHARSET.choose(rng).expect("charset is non-empty") as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn english_words_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let w = word("en", &mut rng);
            assert!(w.is_ascii());
            assert!(w.len() >= 3);
        }
    }

    #[test]
    fn unknown_language_falls_back() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = word("xx", &mut rng);
        assert!(!w.is_empty());
    }

    #[test]
    fn phrase_joins_two_to_five_words() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let p = phrase(&["en".into()], &mut rng);
            let n = p.split(' ').count();
            assert!((2..=5).contains(&n), "unexpected word count {n} in {p:?}");
        }
    }

    #[test]
    fn alphanumeric_respects_length_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let s = alphanumeric(&mut rng, 6, 12);
            assert!((6..=12).contains(&s.len()));
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn same_seed_same_words() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(word("cn", &mut a), word("cn", &mut b));
    }
}
